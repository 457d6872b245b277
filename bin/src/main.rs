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

//! Minimal Telnet server binary.
//!
//! Wires `muxnet_core::TelnetServer` to a Tokio runtime with a default
//! config and a logging-only handler. Configuration from a file or CLI
//! flags is intentionally out of scope; adjust `ServerConfig` in code
//! to bind elsewhere or tune limits.

use std::sync::Arc;

use muxnet_core::{CallbackHandler, ServerConfig, TelnetServer};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = ServerConfig::default().with_bind_address("127.0.0.1:2323".parse()?);
    let server = TelnetServer::new(config).await?;
    let handler = Arc::new(CallbackHandler::default());

    info!(addrs = ?server.bind_addresses(), "telnet server listening");
    server.start(handler).await?;

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    server.shutdown().await?;

    Ok(())
}
