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

//! Server configuration
//!
//! A single builder-pattern configuration struct for the connection
//! server (§6). There is no client-side configuration in this crate: the
//! connection layer only ever runs as a server.
//!
//! # Examples
//!
//! ```
//! use muxnet_core::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::new()
//!     .with_bind_address("0.0.0.0:4201".parse().unwrap())
//!     .with_idle_timeout(Duration::from_secs(3600))
//!     .with_max_connections(500);
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server-side connection configuration (§6's two configured sets of
/// ports, idle/read/write timeouts, output cap, and slave-helper paths).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Plain-text listen addresses.
    pub bind_addresses: Vec<SocketAddr>,

    /// TLS listen addresses (STARTTLS is negotiated per-connection on
    /// plain ports too; these are ports that require TLS immediately).
    pub tls_bind_addresses: Vec<SocketAddr>,

    /// Maximum number of simultaneous connections (0 means unlimited).
    pub max_connections: usize,

    /// How long a descriptor may go without input before it is eligible
    /// for `shutdown(IDLE_TIMEOUT)`, subject to `IdlePolicy`.
    pub idle_timeout: Duration,

    /// Per-read timeout used by the event loop's single wait.
    pub read_timeout: Duration,

    /// Per-write timeout applied to an individual `drain` call.
    pub write_timeout: Duration,

    /// How long a socket with output still draining may remain open
    /// after `shutdown` before the deferred-close timer forces it
    /// (§8 scenario S7).
    pub shutdown_timeout: Duration,

    /// Per-descriptor output-chain backpressure cap, in bytes.
    pub output_cap_bytes: usize,

    /// Path to the resolver helper binary (reverse DNS + ident, §4.6).
    pub helper_resolver_path: Option<PathBuf>,

    /// Path to the stub-RPC helper binary (§4.6).
    pub helper_stub_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addresses: Vec::new(),
            tls_bind_addresses: Vec::new(),
            max_connections: 0,
            idle_timeout: Duration::from_secs(3600),
            read_timeout: Duration::from_secs(300),
            write_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(5),
            output_cap_bytes: 1024 * 1024,
            helper_resolver_path: None,
            helper_stub_path: None,
        }
    }
}

impl ServerConfig {
    /// Create a configuration with no bound ports and every other field
    /// defaulted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain-text listen address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_addresses.push(addr);
        self
    }

    /// Add a TLS listen address.
    pub fn with_tls_bind_address(mut self, addr: SocketAddr) -> Self {
        self.tls_bind_addresses.push(addr);
        self
    }

    /// Set the maximum number of simultaneous connections.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the per-read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the per-write timeout.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the deferred-close timer duration.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the per-descriptor output backpressure cap, in bytes.
    pub fn with_output_cap_bytes(mut self, cap: usize) -> Self {
        self.output_cap_bytes = cap;
        self
    }

    /// Set the resolver helper binary path.
    pub fn with_helper_resolver_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.helper_resolver_path = Some(path.into());
        self
    }

    /// Set the stub-RPC helper binary path.
    pub fn with_helper_stub_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.helper_stub_path = Some(path.into());
        self
    }

    /// Every listen address, plain and TLS combined (§4.5's `setup_ports`
    /// iterates both sets uniformly when creating listeners).
    pub fn all_bind_addresses(&self) -> impl Iterator<Item = &SocketAddr> {
        self.bind_addresses.iter().chain(self.tls_bind_addresses.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_multiple_bind_addresses() {
        let config = ServerConfig::new()
            .with_bind_address("0.0.0.0:4201".parse().unwrap())
            .with_bind_address("0.0.0.0:4202".parse().unwrap())
            .with_tls_bind_address("0.0.0.0:4443".parse().unwrap());

        assert_eq!(config.bind_addresses.len(), 2);
        assert_eq!(config.tls_bind_addresses.len(), 1);
        assert_eq!(config.all_bind_addresses().count(), 3);
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = ServerConfig::default();
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
        assert!(config.helper_resolver_path.is_none());
    }
}
