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

//! Core types for the connection layer

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

/// Unique identifier for a connection (monotonically increasing, never reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a new connection ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Connection state (stored as atomic u8 for lock-free state management)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// Connection is being established
    Connecting = 0,
    /// Connection is active and processing events
    Active = 1,
    /// Connection is idle (no recent activity)
    Idle = 2,
    /// Connection is closing (cleanup in progress)
    Closing = 3,
    /// Connection is closed
    Closed = 4,
}

impl ConnectionState {
    /// Convert from u8 (for atomic operations)
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Active,
            2 => Self::Idle,
            3 => Self::Closing,
            4 => Self::Closed,
            _ => Self::Closed,
        }
    }

    /// Convert to u8 (for atomic operations)
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Check if the connection is in a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }

    /// Check if the connection is active
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active | Self::Idle)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Active => write!(f, "active"),
            Self::Idle => write!(f, "idle"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Reason a connection was or is being torn down.
///
/// `Logout` is special: the socket is retained, per-session state is reset,
/// and the welcome banner is re-issued rather than closing the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// No reason recorded (should not normally be observed externally).
    Unknown,
    /// The peer sent QUIT or equivalent.
    Quit,
    /// `now - last_input_at` exceeded the idle timeout.
    IdleTimeout,
    /// An operator forcibly disconnected the session.
    Booted,
    /// The socket died (peer reset, broken pipe, zero-byte read).
    SockDied,
    /// The server is going down.
    GoingDown,
    /// Too many failed login attempts.
    BadLogin,
    /// Logins are currently disabled.
    NoLogins,
    /// The player logged out, retaining the socket for a fresh login.
    Logout,
    /// The server is at its connection limit.
    GameFull,
    /// The server is restarting in place.
    Restart,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "UNKNOWN",
            Self::Quit => "QUIT",
            Self::IdleTimeout => "IDLE_TIMEOUT",
            Self::Booted => "BOOTED",
            Self::SockDied => "SOCKDIED",
            Self::GoingDown => "GOING_DOWN",
            Self::BadLogin => "BAD_LOGIN",
            Self::NoLogins => "NO_LOGINS",
            Self::Logout => "LOGOUT",
            Self::GameFull => "GAME_FULL",
            Self::Restart => "RESTART",
        };
        write!(f, "{name}")
    }
}

/// Character encoding negotiated for a descriptor's line framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// ISO-8859-1, the NVT default: every byte is a valid code point.
    Latin1,
    /// UTF-8, entered via CHARSET negotiation.
    Utf8,
}

/// Outcome of the access-list lookup performed when a connection is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostVerdict {
    /// The peer may connect.
    Allowed,
    /// The peer is refused; no banner, no TLS handshake.
    Forbidden,
}

/// Site ban / allow gate consulted immediately after `accept()`, before any
/// bytes are exchanged with the peer (§4.1 step 3).
pub trait AccessList: Send + Sync {
    /// Decide whether a newly accepted peer may proceed.
    fn check(&self, peer_addr: SocketAddr) -> HostVerdict;
}

/// The permissive default: every peer is allowed.
pub struct AllowAll;

impl AccessList for AllowAll {
    fn check(&self, _peer_addr: SocketAddr) -> HostVerdict {
        HostVerdict::Allowed
    }
}

/// Reverse-DNS / ident information about a connected peer, as resolved by
/// the slave helper (§4.6). Until the helper responds, `hostname` mirrors
/// the raw peer IP and `username` is empty.
#[derive(Debug, Clone)]
pub struct HostInfo {
    /// The peer's raw address, always known immediately at accept time.
    pub peer_addr: SocketAddr,
    /// Resolved hostname, or the dotted IP if resolution hasn't completed.
    pub hostname: String,
    /// RFC 1413 ident response, truncated to 10 characters; empty if unknown.
    pub username: String,
}

impl HostInfo {
    /// The host info for a freshly accepted connection, before the resolver
    /// helper has replied.
    pub fn unresolved(peer_addr: SocketAddr) -> Self {
        Self {
            peer_addr,
            hostname: peer_addr.ip().to_string(),
            username: String::new(),
        }
    }

    /// The bare peer IP, used to match resolver responses (§4.6).
    pub fn peer_ip(&self) -> IpAddr {
        self.peer_addr.ip()
    }
}

/// Connection information snapshot (for non-blocking queries)
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Connection ID
    pub id: ConnectionId,
    /// Current state
    pub state: ConnectionState,
    /// Peer address
    pub peer_addr: SocketAddr,
    /// When the connection was created
    pub created_at: Instant,
    /// Last activity timestamp
    pub last_activity: Instant,
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Total bytes received
    pub bytes_received: u64,
    /// Total messages sent
    pub messages_sent: u64,
    /// Total messages received
    pub messages_received: u64,
}

impl ConnectionInfo {
    /// Get the connection duration
    pub fn duration(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Get the idle duration
    pub fn idle_duration(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

/// Server snapshot for non-blocking debug information
#[derive(Debug, Clone)]
pub struct ServerSnapshot {
    /// Number of active connections
    pub active_connections: usize,
    /// Total connections since server start
    pub total_connections: u64,
    /// Server bind addresses
    pub bind_addresses: Vec<SocketAddr>,
    /// Server uptime
    pub uptime: Duration,
    /// Server start time
    pub started_at: Instant,
}

impl fmt::Display for ServerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Server {{ active: {}, total: {}, addrs: {:?}, uptime: {:?} }}",
            self.active_connections, self.total_connections, self.bind_addresses, self.uptime
        )
    }
}
