//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Slave-helper IPC (§4.6).
//!
//! Two long-lived child processes do privileged or blocking work the event
//! loop must not do inline: a resolver (reverse DNS plus RFC 1413 ident)
//! and a stub-RPC helper for arbitrary blocking calls. Per `DESIGN.md`'s
//! resolution of the transport open question, both are spawned with
//! `tokio::process::Command` and framed over their piped stdio with
//! `tokio_util::codec::LengthDelimitedCodec`, the same framing idiom the
//! sibling `nvt-codec` crate's `Framed` usage already establishes for this
//! workspace.

use crate::types::HostInfo;
use futures::{SinkExt, StreamExt};
use std::net::IpAddr;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tokio_util::bytes::Bytes;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{error, warn};

/// A request line sent to the resolver helper: look up a peer by address,
/// optionally including the ident port pair needed for an RFC 1413 query.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub peer_ip: IpAddr,
    /// `(remote_port, local_port)`, present when an ident lookup should
    /// also be attempted.
    pub ident_ports: Option<(u16, u16)>,
}

impl ResolveRequest {
    fn encode(&self) -> String {
        match self.ident_ports {
            Some((remote, local)) => format!("{},{},{}\n", self.peer_ip, remote, local),
            None => format!("{}\n", self.peer_ip),
        }
    }
}

/// A resolver helper response: either a hostname line or an ident line,
/// both keyed by peer IP so the caller can match it back to a pending
/// `HostInfo`.
#[derive(Debug, Clone)]
pub enum ResolveResponse {
    Hostname { peer_ip: IpAddr, hostname: String },
    Ident { peer_ip: IpAddr, username: String },
}

/// Parse one line of resolver helper output (§4.6):
/// `<peer-ip> <hostname>` or `<peer-ip> <remote-port> , <local-port> : <os> : <type> : <userid>`.
pub fn parse_resolver_line(line: &str) -> Option<ResolveResponse> {
    let line = line.trim_end();
    let (ip_part, rest) = line.split_once(' ')?;
    let peer_ip: IpAddr = ip_part.parse().ok()?;

    if rest.contains(':') {
        let userid = rest.rsplit(':').next()?.trim();
        Some(ResolveResponse::Ident {
            peer_ip,
            username: userid.chars().take(10).collect(),
        })
    } else {
        Some(ResolveResponse::Hostname {
            peer_ip,
            hostname: rest.trim().to_string(),
        })
    }
}

/// Apply a resolver response to a pending `HostInfo`, if it matches by IP
/// (§4.6's match-by-IP rule; match-by-port is left to the caller, which
/// knows which descriptor owns which port pair).
pub fn apply_resolver_response(info: &mut HostInfo, response: &ResolveResponse) -> bool {
    match response {
        ResolveResponse::Hostname { peer_ip, hostname } if *peer_ip == info.peer_ip() => {
            info.hostname = hostname.clone();
            true
        }
        ResolveResponse::Ident { peer_ip, username } if *peer_ip == info.peer_ip() => {
            info.username = username.clone();
            true
        }
        _ => false,
    }
}

/// Whether a helper child process is currently live.
pub enum HelperState {
    /// No helper process is running (never started, or it died and has
    /// not yet been restarted).
    Down,
    /// A helper process is running, framed over its piped stdio.
    Live(HelperHandle),
}

/// A running helper child process, framed for length-delimited request/
/// response exchange.
pub struct HelperHandle {
    child: Child,
    framed: Framed<HelperStdio, LengthDelimitedCodec>,
}

/// Combines a child's stdout/stdin pipes into one `AsyncRead + AsyncWrite`
/// so they can share a single `Framed` codec instance.
struct HelperStdio {
    stdin: tokio::process::ChildStdin,
    stdout: tokio::process::ChildStdout,
}

impl tokio::io::AsyncRead for HelperStdio {
    fn poll_read(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        let this = self.get_mut();
        std::pin::Pin::new(&mut this.stdout).poll_read(cx, buf)
    }
}

impl tokio::io::AsyncWrite for HelperStdio {
    fn poll_write(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<std::io::Result<usize>> {
        let this = self.get_mut();
        std::pin::Pin::new(&mut this.stdin).poll_write(cx, buf)
    }

    fn poll_flush(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        let this = self.get_mut();
        std::pin::Pin::new(&mut this.stdin).poll_flush(cx)
    }

    fn poll_shutdown(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        let this = self.get_mut();
        std::pin::Pin::new(&mut this.stdin).poll_shutdown(cx)
    }
}

impl HelperHandle {
    /// Spawn `program` with piped stdio, framed length-delimited.
    fn spawn(program: &str, args: &[&str]) -> std::io::Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take().expect("piped stdin");
        let stdout = child.stdout.take().expect("piped stdout");
        let framed = Framed::new(HelperStdio { stdin, stdout }, LengthDelimitedCodec::new());

        Ok(Self { child, framed })
    }

    /// Send one framed request.
    pub async fn send(&mut self, payload: Bytes) -> std::io::Result<()> {
        self.framed
            .send(payload)
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
    }

    /// Receive one framed response, or `None` if the helper has exited.
    pub async fn recv(&mut self) -> Option<std::io::Result<Bytes>> {
        self.framed
            .next()
            .await
            .map(|r| r.map(|b| b.freeze()))
    }

    /// Whether the child process has exited, without blocking.
    pub fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }
}

impl HelperState {
    /// Start the helper, replacing any previous state.
    pub fn restart(program: &str, args: &[&str]) -> Self {
        match HelperHandle::spawn(program, args) {
            Ok(handle) => HelperState::Live(handle),
            Err(e) => {
                error!(error = %e, program, "failed to spawn slave helper");
                HelperState::Down
            }
        }
    }

    /// Whether the helper is currently usable; reaps a dead child into
    /// `Down` as a side effect.
    pub fn is_live(&mut self) -> bool {
        match self {
            HelperState::Live(handle) if handle.has_exited() => {
                warn!("slave helper process exited; marking down");
                *self = HelperState::Down;
                false
            }
            HelperState::Live(_) => true,
            HelperState::Down => false,
        }
    }
}
