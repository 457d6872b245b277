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

//! Connection-layer core for a multi-user text server
//!
//! This crate provides a production-ready, async-first Telnet server
//! implementation:
//!
//! - No race conditions in connection management
//! - Guaranteed resource cleanup with timeouts
//! - Proper timeout handling for idle connections
//! - Concurrent broadcast with backpressure
//! - Lock-free metrics and monitoring
//! - Clear separation of concerns
//!
//! # Architecture
//!
//! ```text
//! TelnetServer
//!     ↓
//! ConnectionManager
//!     ↓
//! ConnectionWorker → TelnetConnection
//! ```
//!
//! # Example
//!
//! ```no_run
//! use muxnet_core::{TelnetServer, ServerConfig, ServerHandler, ConnectionId, TelnetConnection, ConnectionEvent};
//! use async_trait::async_trait;
//!
//! struct MyHandler;
//!
//! #[async_trait]
//! impl ServerHandler for MyHandler {
//!     async fn on_event(
//!         &self,
//!         id: ConnectionId,
//!         conn: &TelnetConnection,
//!         event: ConnectionEvent,
//!     ) {
//!         // Handle events
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default().with_bind_address("127.0.0.1:4201".parse()?);
//!     let server = TelnetServer::new(config).await?;
//!     server.start(std::sync::Arc::new(MyHandler)).await?;
//!     Ok(())
//! }
//! ```

mod accounting;
mod config;
mod connection;
mod error;
mod handler;
mod input;
mod manager;
mod metrics;
mod output;
mod result;
mod scheduler;
mod server;
mod slave;
mod types;
mod worker;

pub use accounting::{
    AccountingSink, AlwaysIdleEligible, DisconnectAccounting, IdlePolicy, NullMonitor, SiteEvent,
    SiteMonitor,
};
pub use config::ServerConfig;
pub use connection::{ConnectionEvent, TelnetConnection};
pub use error::{Result, TelnetError};
pub use handler::{CallbackHandler, EventHandler, ServerHandler};
pub use input::LineAccumulator;
pub use manager::{BroadcastResult, ConnectionManager};
pub use metrics::{MetricsSnapshot, ServerMetrics};
pub use output::{DrainOutcome, OutputChain};
pub use result::{ConnectionError, ConnectionResult};
pub use scheduler::{Scheduler, TaskId};
pub use server::TelnetServer;
pub use slave::{HelperHandle, HelperState, ResolveRequest, ResolveResponse};
pub use types::{
    AccessList, AllowAll, ConnectionId, ConnectionInfo, ConnectionState, DisconnectReason,
    Encoding, HostInfo, HostVerdict, ServerSnapshot,
};
pub use worker::{ConnectionWorker, ControlMessage, WorkerConfig};
