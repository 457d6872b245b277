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

//! Error types for the connection server

use crate::types::ConnectionId;
use thiserror::Error;

/// Result type for operations
pub type Result<T> = std::result::Result<T, TelnetError>;

/// Connection server error types
#[derive(Debug, Error)]
pub enum TelnetError {
    /// I/O error from the underlying TCP stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Protocol error from the NVT codec layer
    #[error("Protocol error: {0}")]
    Protocol(#[from] muxnet_nvt::CodecError),

    /// Connection with the given ID was not found
    #[error("Connection {0} not found")]
    ConnectionNotFound(ConnectionId),

    /// Connection has been closed
    #[error("Connection closed")]
    ConnectionClosed,

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,

    /// Server is not running
    #[error("Server not running")]
    ServerNotRunning,

    /// Server is shutting down
    #[error("Server is shutting down")]
    ServerShuttingDown,

    /// Maximum number of connections reached
    #[error("Maximum connections ({0}) reached")]
    MaxConnectionsReached(usize),

    /// Resource cleanup failed
    #[error("Resource cleanup failed: {0}")]
    CleanupFailed(String),

    /// A configured listen port could not be bound
    #[error("Failed to bind port {0}: {1}")]
    PortBindFailed(std::net::SocketAddr, String),

    /// The peer's address was refused by the access list
    #[error("Connection from {0} refused (forbidden)")]
    Forbidden(std::net::SocketAddr),

    /// A slave helper process died and has not been restarted
    #[error("Slave helper '{0}' is not running")]
    HelperDied(String),

    /// Generic error with a message
    #[error("{0}")]
    Other(String),
}

impl TelnetError {
    /// Check if the error is recoverable
    ///
    /// Recoverable errors are those that don't indicate a fatal condition
    /// and where retrying the operation might succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TelnetError::Timeout | TelnetError::ConnectionClosed | TelnetError::Io(_)
        )
    }

    /// Check if the error is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            TelnetError::ConnectionNotFound(_) | TelnetError::ConnectionClosed | TelnetError::Io(_)
        )
    }

    /// Check if the error is a protocol error
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, TelnetError::Protocol(_))
    }
}
