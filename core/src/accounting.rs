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

//! Disconnect accounting, site-monitor notifications, and the idle-eligibility
//! policy seam.
//!
//! These give the external collaborators named by §1/§6 ("the accounting
//! collaborator", "the announce-disconnect collaborator", "policy of an
//! external collaborator") concrete trait shapes to compile a connection
//! layer against, the same way the teacher gives its own command
//! interpreter seam a concrete `ServerHandler` shape.

use crate::types::{ConnectionId, DisconnectReason};
use std::fmt;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// One line of the disconnect accounting log (§6):
/// `<dbref> <flags> <cmds> <secs> <loc> <money> [<site>] <reason> <name>`.
#[derive(Debug, Clone)]
pub struct DisconnectAccounting {
    /// The player object's dbref, as an opaque integer (the object
    /// subsystem owns its meaning).
    pub dbref: i64,
    /// The player's flag letters at disconnect time, as produced by
    /// `muxnet_dbref::FlagRegistry::decode_flags`.
    pub flags: String,
    /// Commands executed this session.
    pub commands: u64,
    /// Session length, in seconds.
    pub seconds: u64,
    /// Dbref of the player's location at disconnect.
    pub location: i64,
    /// In-game currency balance at disconnect.
    pub money: i64,
    /// Resolved site (hostname), if known.
    pub site: Option<String>,
    /// Symbolic disconnect reason.
    pub reason: DisconnectReason,
    /// The player's name.
    pub name: String,
}

impl fmt::Display for DisconnectAccounting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} [{}] {} {}",
            self.dbref,
            self.flags,
            self.commands,
            self.seconds,
            self.location,
            self.money,
            self.site.as_deref().unwrap_or(""),
            self.reason,
            self.name,
        )
    }
}

/// Distinct site-monitor notifications the connection layer emits.
#[derive(Debug, Clone)]
pub enum SiteEvent {
    /// A connection was refused because the peer's address is FORBIDDEN.
    Refused { peer_addr: SocketAddr },
    /// A connection was accepted and initialized.
    Connected { id: ConnectionId, peer_addr: SocketAddr },
    /// A connection was torn down.
    Disconnected { id: ConnectionId, reason: DisconnectReason },
}

/// Sink for disconnect accounting records. An external collaborator; the
/// connection layer only constructs and emits records, never interprets
/// them.
pub trait AccountingSink: Send + Sync {
    /// Record one disconnect accounting line.
    fn record(&self, accounting: &DisconnectAccounting);
}

/// Sink for site-monitor notifications, kept separate from
/// `AccountingSink` because not every deployment wants both.
pub trait SiteMonitor: Send + Sync {
    /// Observe one site event. Default implementation is a no-op; actual
    /// formatting/delivery is out of scope here.
    fn notify(&self, _event: &SiteEvent) {}
}

/// A `SiteMonitor`/`AccountingSink` that discards everything. Useful as a
/// default when the host application hasn't wired a real collaborator yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMonitor;

impl SiteMonitor for NullMonitor {}
impl AccountingSink for NullMonitor {
    fn record(&self, _accounting: &DisconnectAccounting) {}
}

/// Whether a descriptor is eligible for idle-timeout disconnection. Gated
/// by "not K-alive, not staff-exempt" in the legacy text (§5) — policy an
/// external collaborator owns.
pub trait IdlePolicy: Send + Sync {
    /// Return `true` if this connection may be disconnected for being
    /// idle past `idle_timeout`.
    fn is_idle_eligible(&self, id: ConnectionId) -> bool;
}

/// The permissive default: every connection is idle-eligible.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysIdleEligible;

impl IdlePolicy for AlwaysIdleEligible {
    fn is_idle_eligible(&self, _id: ConnectionId) -> bool {
        true
    }
}

/// Pure function form of §4.7 step 10's idle check, independent of any
/// particular clock or connection representation.
pub fn is_idle_timed_out(
    now: Instant,
    last_input_at: Instant,
    idle_timeout: Duration,
    id: ConnectionId,
    policy: &dyn IdlePolicy,
) -> bool {
    now.saturating_duration_since(last_input_at) > idle_timeout && policy.is_idle_eligible(id)
}
