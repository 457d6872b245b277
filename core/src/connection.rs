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

//! A single descriptor: the Telnet codec framing a TCP socket, plus the
//! per-descriptor state named in §4.3 (host info, encoding, output queue,
//! line accumulator, timestamps).

use crate::accounting::{DisconnectAccounting, SiteEvent, SiteMonitor};
use crate::input::LineAccumulator;
use crate::output::{DrainOutcome, OutputChain};
use crate::slave::ResolveResponse;
use crate::types::{ConnectionId, DisconnectReason, Encoding, HostInfo};
use crate::{Result, TelnetError};
use bytes::BytesMut;
use futures_util::StreamExt;
use muxnet_nvt::args::naws::WindowSize;
use muxnet_nvt::args::status::CharsetNegotiation;
use muxnet_nvt::args::{new_environ, status};
use muxnet_nvt::{TelnetArgument, TelnetCodec, TelnetEvent, TelnetFrame, TelnetOption, TelnetSide};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::{Encoder, Framed};
use tracing::debug;

/// Telnet options we actively request the peer to enable on accept, and
/// again (via `next()`'s transition dispatch) whenever the peer offers
/// one unprompted. TLS/STARTTLS is omitted: no TLS support is compiled
/// in, so `desired_him(STARTTLS)` is unconditionally false.
const DESIRED_HIM: [TelnetOption; 6] = [
    TelnetOption::NAWS,
    TelnetOption::EOR,
    TelnetOption::SuppressGoAhead,
    TelnetOption::NewEnvironment,
    TelnetOption::TransmitBinary,
    TelnetOption::Charset,
];

/// A high-level event delivered to a connection's owner: either a
/// completed command line or an application-visible Telnet event the
/// connection layer didn't consume itself (GMCP, option status changes,
/// and the rest of the low-level sidechannel).
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// A complete input line (§4.2 action 3).
    Line(String),
    /// A Telnet-level event not otherwise handled inline.
    Telnet(TelnetEvent),
}

struct DescriptorState {
    framed: Framed<TcpStream, TelnetCodec>,
    output: OutputChain,
    line: LineAccumulator,
    host_info: HostInfo,
    encoding: Encoding,
    negotiated_encoding: Option<Encoding>,
    window_size: Option<WindowSize>,
    term_type: Option<String>,
    connected_at: Instant,
    last_input_at: Instant,
}

/// A single client connection (a "descriptor" in the legacy vocabulary).
///
/// Cloning shares the underlying state: other tasks (the manager's
/// broadcast, the slave-helper response dispatcher) can queue output or
/// read metadata without owning the read loop, which per `DESIGN.md`'s
/// resolution of the LOCKED-block open question remains the exclusive
/// business of whichever task called `next()`.
#[derive(Clone)]
pub struct TelnetConnection {
    inner: Arc<Mutex<DescriptorState>>,
    id: ConnectionId,
    peer_addr: SocketAddr,
    bytes_sent: Arc<AtomicU64>,
    bytes_received: Arc<AtomicU64>,
    messages_sent: Arc<AtomicU64>,
    messages_received: Arc<AtomicU64>,
}

impl TelnetConnection {
    /// Wrap a freshly accepted TCP stream into a descriptor.
    pub fn wrap(socket: TcpStream, id: ConnectionId, output_cap_bytes: usize) -> Result<Self> {
        let peer_addr = socket.peer_addr()?;
        let now = Instant::now();

        let state = DescriptorState {
            framed: Framed::new(socket, TelnetCodec::new()),
            output: OutputChain::new(output_cap_bytes),
            line: LineAccumulator::new(Encoding::Latin1),
            host_info: HostInfo::unresolved(peer_addr),
            encoding: Encoding::Latin1,
            negotiated_encoding: None,
            window_size: None,
            term_type: None,
            connected_at: now,
            last_input_at: now,
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(state)),
            id,
            peer_addr,
            bytes_sent: Arc::new(AtomicU64::new(0)),
            bytes_received: Arc::new(AtomicU64::new(0)),
            messages_sent: Arc::new(AtomicU64::new(0)),
            messages_received: Arc::new(AtomicU64::new(0)),
        })
    }

    /// The connection's id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The peer's raw address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Bytes sent so far.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    /// Bytes received so far.
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }

    /// Messages (lines) sent so far.
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Messages (lines) received so far.
    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    /// A snapshot of the descriptor's resolved host information.
    pub async fn host_info(&self) -> HostInfo {
        self.inner.lock().await.host_info.clone()
    }

    /// Apply a resolver helper response to this descriptor, if it matches
    /// (§4.6's match-by-IP rule).
    pub async fn apply_resolved(&self, response: &ResolveResponse) -> bool {
        let mut state = self.inner.lock().await;
        crate::slave::apply_resolver_response(&mut state.host_info, response)
    }

    /// The descriptor's currently active encoding.
    pub async fn encoding(&self) -> Encoding {
        self.inner.lock().await.encoding
    }

    /// The negotiated window size, if NAWS has been received.
    pub async fn window_size(&self) -> Option<WindowSize> {
        self.inner.lock().await.window_size
    }

    /// When the connection was accepted.
    pub async fn connected_at(&self) -> Instant {
        self.inner.lock().await.connected_at
    }

    /// When the last input byte was received.
    pub async fn last_input_at(&self) -> Instant {
        self.inner.lock().await.last_input_at
    }

    /// Total input bytes dropped for encoding or `LINE_MAX` violations.
    pub async fn input_lost(&self) -> u64 {
        self.inner.lock().await.line.input_lost()
    }

    /// Queue raw bytes onto the output chain (C4). Never blocks; excess
    /// past the backpressure cap is dropped and counted.
    pub async fn queue_bytes(&self, bytes: &[u8]) {
        self.inner.lock().await.output.queue_bytes(bytes);
    }

    /// Queue a line of text followed by a CRLF terminator, the common
    /// case for sending a reply to the peer.
    pub async fn queue_line(&self, text: &str) {
        let mut state = self.inner.lock().await;
        state.output.queue_bytes(text.as_bytes());
        state.output.queue_bytes(b"\r\n");
    }

    /// Whether there is output waiting to be drained.
    pub async fn has_pending_output(&self) -> bool {
        self.inner.lock().await.output.has_pending()
    }

    /// Drain as much queued output as the socket accepts without
    /// blocking.
    pub async fn drain(&self) -> DrainOutcome {
        let mut state = self.inner.lock().await;
        let DescriptorState { framed, output, .. } = &mut *state;
        output.drain(framed.get_mut()).await
    }

    /// Initiate the server's desired option negotiations on a freshly
    /// accepted descriptor (§4.5 step 5): `DO` for everything in
    /// `desired_him`, and `WILL EOR` on our own side (`desired_us`'s SGA
    /// entry only applies once EOR succeeds, so it isn't requested here —
    /// `next()` picks it up reactively on the EOR transition-to-YES).
    pub async fn telnet_setup(&self) {
        let mut state = self.inner.lock().await;
        for option in DESIRED_HIM {
            if let Some(frame) = state.framed.codec_mut().enable_remote(option) {
                send_frame(&mut state, frame);
            }
        }
        if let Some(frame) = state.framed.codec_mut().enable_local(TelnetOption::EOR) {
            send_frame(&mut state, frame);
        }
    }

    /// Receive the next high-level event, applying inline business logic
    /// (NAWS/CHARSET/TTYPE/AYT/erase handling) before surfacing anything
    /// the caller needs to act on.
    pub async fn next(&mut self) -> Result<Option<ConnectionEvent>> {
        loop {
            let mut state = self.inner.lock().await;
            let frame = state.framed.next().await;
            let event = match frame {
                Some(Ok(event)) => event,
                Some(Err(e)) => return Err(TelnetError::Protocol(e)),
                None => return Ok(None),
            };
            self.bytes_received.fetch_add(1, Ordering::Relaxed);

            // The Q-method engine may have computed a reply (e.g. `Do(NAWS)`
            // answering a received `Will(NAWS)`) while decoding this frame;
            // it can't send it itself, so send it now.
            let replies = state.framed.codec_mut().take_pending_replies();
            for reply in replies {
                send_frame(&mut state, reply);
            }

            match event {
                TelnetEvent::Data(byte) => {
                    state.last_input_at = Instant::now();
                    if let Some(line) = state.line.feed_byte(byte) {
                        self.messages_received.fetch_add(1, Ordering::Relaxed);
                        return Ok(Some(ConnectionEvent::Line(line)));
                    }
                }
                TelnetEvent::EraseCharacter => {
                    state.line.erase_character();
                    state.output.queue_bytes(b"\x08 \x08");
                }
                TelnetEvent::EraseLine => {
                    state.line.erase_line();
                }
                TelnetEvent::AreYouThere => {
                    state.output.queue_bytes(b"\r\n[Yes]\r\n");
                }
                TelnetEvent::Subnegotiate(TelnetArgument::NAWSWindowSize(size)) => {
                    state.window_size = Some(size);
                }
                TelnetEvent::Subnegotiate(TelnetArgument::TerminalType(name)) => {
                    state.term_type = Some(name);
                }
                TelnetEvent::Subnegotiate(TelnetArgument::Charset(negotiation)) => {
                    apply_charset_negotiation(&mut state, &negotiation);
                }
                TelnetEvent::Subnegotiate(TelnetArgument::Environment(vars)) => {
                    apply_environment_vars(&mut state, &vars);
                }
                TelnetEvent::OptionStatus(option, side, enabled) => {
                    apply_option_transition(&mut state, option, side, enabled);
                    return Ok(Some(ConnectionEvent::Telnet(TelnetEvent::OptionStatus(
                        option, side, enabled,
                    ))));
                }
                other => return Ok(Some(ConnectionEvent::Telnet(other))),
            }
        }
    }

    /// Build the disconnect accounting record's site portion from this
    /// descriptor's current host info, and notify a site monitor.
    pub async fn notify_disconnect(&self, reason: DisconnectReason, monitor: &dyn SiteMonitor) {
        monitor.notify(&SiteEvent::Disconnected { id: self.id, reason });
    }

    /// Build a partial `DisconnectAccounting` record carrying this
    /// descriptor's site; the caller fills in the player-specific fields
    /// it alone knows (dbref, flags, money, location).
    pub async fn accounting_site(&self) -> Option<String> {
        let info = self.host_info().await;
        if info.hostname.is_empty() {
            None
        } else {
            Some(info.hostname)
        }
    }
}

fn apply_charset_negotiation(state: &mut DescriptorState, negotiation: &CharsetNegotiation) {
    match negotiation {
        CharsetNegotiation::Accepted(name) => {
            let encoding = encoding_for_charset_name(name);
            state.encoding = encoding;
            state.negotiated_encoding = Some(encoding);
            state.line.set_encoding(encoding);
            set_binary(state, is_binary_charset(name));
        }
        CharsetNegotiation::Rejected => {
            state.encoding = Encoding::Latin1;
            state.negotiated_encoding = Some(Encoding::Latin1);
            state.line.set_encoding(Encoding::Latin1);
            set_binary(state, false);
        }
        CharsetNegotiation::Request(_) => {
            debug!("ignoring peer-initiated CHARSET REQUEST");
        }
    }
}

fn encoding_for_charset_name(name: &str) -> Encoding {
    if name.eq_ignore_ascii_case("UTF-8") {
        Encoding::Utf8
    } else {
        Encoding::Latin1
    }
}

/// Whether an accepted charset name should run with BINARY on: true for
/// UTF-8/Latin-1-like charsets, false for ASCII (§4.2).
fn is_binary_charset(name: &str) -> bool {
    !name.eq_ignore_ascii_case("US-ASCII") && !name.eq_ignore_ascii_case("ASCII")
}

/// Enable or disable TRANSMIT-BINARY on both sides, encoding and queueing
/// whatever negotiation frame the Q method produces.
fn set_binary(state: &mut DescriptorState, enable: bool) {
    let frame = if enable {
        state.framed.codec_mut().enable_local(TelnetOption::TransmitBinary)
    } else {
        state.framed.codec_mut().disable_local(TelnetOption::TransmitBinary)
    };
    if let Some(frame) = frame {
        send_frame(state, frame);
    }
    let frame = if enable {
        state.framed.codec_mut().enable_remote(TelnetOption::TransmitBinary)
    } else {
        state.framed.codec_mut().disable_remote(TelnetOption::TransmitBinary)
    };
    if let Some(frame) = frame {
        send_frame(state, frame);
    }
}

/// Apply NEW-ENVIRON/OLD-ENVIRON variables reported via `IS` (§4.2):
/// `USER` becomes the descriptor's username (bounded to 10 characters),
/// and an `LC_CTYPE`/`LC_ALL` locale ending in `.utf-8` switches the
/// descriptor to UTF-8 and turns on BINARY.
fn apply_environment_vars(state: &mut DescriptorState, vars: &[new_environ::EnvironVar]) {
    for var in vars {
        let Some(value) = &var.value else { continue };
        match var.name.as_str() {
            "USER" => {
                state.host_info.username = value.chars().take(10).collect();
            }
            "LC_CTYPE" | "LC_ALL" => {
                if let Some((_, suffix)) = value.rsplit_once('.') {
                    if suffix.eq_ignore_ascii_case("utf-8") && state.encoding != Encoding::Utf8 {
                        state.encoding = Encoding::Utf8;
                        state.negotiated_encoding = Some(Encoding::Utf8);
                        state.line.set_encoding(Encoding::Utf8);
                        set_binary(state, true);
                    }
                }
            }
            _ => {}
        }
    }
}

/// React to a Q-method transition to/from YES (§4.2): fire the active
/// sub-option request or side-effect the transition triggers, if any.
fn apply_option_transition(
    state: &mut DescriptorState,
    option: TelnetOption,
    side: TelnetSide,
    enabled: bool,
) {
    match (option, side, enabled) {
        (TelnetOption::EOR, TelnetSide::Local, true) => {
            if let Some(frame) = state
                .framed
                .codec_mut()
                .enable_local(TelnetOption::SuppressGoAhead)
            {
                send_frame(state, frame);
            }
        }
        (TelnetOption::TTYPE, TelnetSide::Remote, true) => {
            send_frame(
                state,
                TelnetFrame::Subnegotiate(TelnetArgument::Unknown(
                    TelnetOption::TTYPE,
                    BytesMut::from(&status::request_ttype()[..]),
                )),
            );
        }
        (TelnetOption::NewEnvironment, TelnetSide::Remote, true) => {
            send_frame(
                state,
                TelnetFrame::Subnegotiate(TelnetArgument::Unknown(
                    TelnetOption::NewEnvironment,
                    BytesMut::from(&new_environ::request()[..]),
                )),
            );
        }
        (TelnetOption::Charset, TelnetSide::Remote, true) => {
            send_frame(
                state,
                TelnetFrame::Subnegotiate(TelnetArgument::Charset(CharsetNegotiation::Request(
                    vec![
                        "UTF-8".to_string(),
                        "ISO-8859-1".to_string(),
                        "US-ASCII".to_string(),
                    ],
                ))),
            );
        }
        (TelnetOption::TransmitBinary, TelnetSide::Remote, enabled) => {
            let frame = if enabled {
                state.framed.codec_mut().enable_local(TelnetOption::TransmitBinary)
            } else {
                state.framed.codec_mut().disable_local(TelnetOption::TransmitBinary)
            };
            if let Some(frame) = frame {
                send_frame(state, frame);
            }
        }
        _ => {}
    }
}

/// Encode a frame through the descriptor's codec and queue it onto the
/// output chain (C4). Negotiation replies and active sub-option requests
/// all funnel through here so they share the codec's IAC-escaping.
fn send_frame(state: &mut DescriptorState, frame: TelnetFrame) {
    let mut buf = BytesMut::new();
    match state.framed.codec_mut().encode(frame, &mut buf) {
        Ok(()) => state.output.queue_bytes(&buf),
        Err(e) => tracing::warn!("failed to encode outgoing telnet frame: {e}"),
    }
}

impl std::fmt::Debug for TelnetConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelnetConnection")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DisconnectReason;
    use tokio::net::{TcpListener, TcpStream};

    async fn create_test_connection() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client_task = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });
        let (server, _) = listener.accept().await.unwrap();
        let client = client_task.await.unwrap();
        (server, client)
    }

    #[tokio::test]
    async fn s1_line_framing_end_to_end() {
        let (server, mut client) = create_test_connection().await;
        let id = ConnectionId::new(1);
        let mut connection = TelnetConnection::wrap(server, id, 1024).unwrap();

        use tokio::io::AsyncWriteExt;
        client.write_all(b"hello\r\nworld\n").await.unwrap();

        let first = connection.next().await.unwrap().unwrap();
        let second = connection.next().await.unwrap().unwrap();
        match (first, second) {
            (ConnectionEvent::Line(a), ConnectionEvent::Line(b)) => {
                assert_eq!(a, "hello");
                assert_eq!(b, "world");
            }
            other => panic!("expected two lines, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn s4_ayt_replies_yes() {
        let (server, mut client) = create_test_connection().await;
        let id = ConnectionId::new(1);
        let mut connection = TelnetConnection::wrap(server, id, 1024).unwrap();

        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        client.write_all(&[0xFF, 0xF6]).await.unwrap(); // IAC AYT

        // Drive the event loop until the inline AYT handler has queued a reply.
        tokio::time::timeout(std::time::Duration::from_millis(200), async {
            loop {
                if connection.has_pending_output().await {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        connection.drain().await;
        let mut buf = [0u8; 32];
        let n = tokio::time::timeout(std::time::Duration::from_millis(200), client.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..n], b"\r\n[Yes]\r\n");
    }

    #[tokio::test]
    async fn disconnect_notifies_site_monitor() {
        let (server, _client) = create_test_connection().await;
        let id = ConnectionId::new(7);
        let connection = TelnetConnection::wrap(server, id, 1024).unwrap();

        struct RecordingMonitor(std::sync::Mutex<Vec<DisconnectReason>>);
        impl SiteMonitor for RecordingMonitor {
            fn notify(&self, event: &SiteEvent) {
                if let SiteEvent::Disconnected { reason, .. } = event {
                    self.0.lock().unwrap().push(*reason);
                }
            }
        }
        let monitor = RecordingMonitor(std::sync::Mutex::new(Vec::new()));
        connection.notify_disconnect(DisconnectReason::Quit, &monitor).await;
        assert_eq!(monitor.0.lock().unwrap().as_slice(), &[DisconnectReason::Quit]);
    }
}
