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

//! Telnet server implementation
//!
//! The TelnetServer is the main entry point for the connection-layer core.
//! It manages one or more TCP listeners (§4.1 supports multiple configured
//! ports), accepts connections, gates them through an access list before any
//! bytes are exchanged, and coordinates with the ConnectionManager.

use crate::accounting::{NullMonitor, SiteEvent, SiteMonitor};
use crate::types::{AccessList, AllowAll, HostVerdict};
use crate::{
    ConnectionId, ConnectionManager, Result, ServerConfig, ServerHandler, ServerMetrics,
    ServerSnapshot, TelnetConnection, TelnetError, WorkerConfig,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Telnet server: the connection-layer core's main entry point.
///
/// This is the main server that accepts connections and manages their lifecycle.
///
/// # Example
///
/// ```no_run
/// use muxnet_core::{TelnetServer, ServerConfig, ServerHandler};
/// use async_trait::async_trait;
///
/// struct MyHandler;
///
/// #[async_trait]
/// impl ServerHandler for MyHandler {
///     // Implement handler methods
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ServerConfig::default().with_bind_address("127.0.0.1:4201".parse()?);
///     let server = TelnetServer::new(config).await?;
///
///     server.start(std::sync::Arc::new(MyHandler)).await?;
///
///     // Server is now running, wait for shutdown signal
///     // tokio::signal::ctrl_c().await?;
///     server.shutdown().await?;
///
///     Ok(())
/// }
/// ```
pub struct TelnetServer {
    config: ServerConfig,
    manager: Arc<ConnectionManager>,
    metrics: Arc<ServerMetrics>,
    listeners: Vec<(Arc<tokio::sync::Mutex<TcpListener>>, SocketAddr)>,
    started_at: Instant,
    running: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
    accept_handles: Arc<tokio::sync::Mutex<Vec<JoinHandle<()>>>>,
    access_list: Arc<dyn AccessList>,
    monitor: Arc<dyn SiteMonitor>,
}

impl TelnetServer {
    /// Create a new server with the given configuration
    ///
    /// This binds to every configured address (plain and TLS) but does not
    /// start accepting connections. Call `start()` to begin accepting.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let mut listeners = Vec::new();
        for addr in config.all_bind_addresses() {
            let listener = TcpListener::bind(addr)
                .await
                .map_err(|e| TelnetError::PortBindFailed(*addr, e.to_string()))?;
            let actual_addr = listener.local_addr()?;
            tracing::info!("Telnet server bound to {}", actual_addr);
            listeners.push((Arc::new(tokio::sync::Mutex::new(listener)), actual_addr));
        }

        let metrics = Arc::new(ServerMetrics::new());
        let worker_config = WorkerConfig {
            read_timeout: config.read_timeout,
            idle_timeout: config.idle_timeout,
            write_timeout: config.write_timeout,
            shutdown_timeout: config.shutdown_timeout,
            control_buffer_size: 100,
        };
        let manager = Arc::new(ConnectionManager::new(metrics.clone(), worker_config));

        Ok(Self {
            config,
            manager,
            metrics,
            listeners,
            started_at: Instant::now(),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_notify: Arc::new(Notify::new()),
            accept_handles: Arc::new(tokio::sync::Mutex::new(Vec::new())),
            access_list: Arc::new(AllowAll),
            monitor: Arc::new(NullMonitor),
        })
    }

    /// Install a non-default access list (§4.1 step 3's site ban gate).
    pub fn with_access_list(mut self, access_list: Arc<dyn AccessList>) -> Self {
        self.access_list = access_list;
        self
    }

    /// Install a non-default site monitor, notified on refusal/connect/disconnect.
    pub fn with_site_monitor(mut self, monitor: Arc<dyn SiteMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Start the server with the given handler
    ///
    /// This begins accepting connections on every bound listener and spawns
    /// one accept-loop task per listener. The server runs until `shutdown()`
    /// is called.
    pub async fn start(&self, handler: Arc<dyn ServerHandler>) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(TelnetError::Other("Server already running".to_string()));
        }

        tracing::info!("Starting Telnet server on {} listener(s)", self.listeners.len());

        let mut handles = self.accept_handles.lock().await;
        for (listener, _addr) in &self.listeners {
            handles.push(self.spawn_accept_loop(listener.clone(), handler.clone()).await);
        }

        Ok(())
    }

    /// Spawn the accept loop task for a single listener
    async fn spawn_accept_loop(
        &self,
        listener: Arc<tokio::sync::Mutex<TcpListener>>,
        handler: Arc<dyn ServerHandler>,
    ) -> JoinHandle<()> {
        let manager = self.manager.clone();
        let metrics = self.metrics.clone();
        let config = self.config.clone();
        let running = self.running.clone();
        let shutdown_notify = self.shutdown_notify.clone();
        let access_list = self.access_list.clone();
        let monitor = self.monitor.clone();

        tokio::spawn(async move {
            loop {
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                let accept_result = tokio::select! {
                    result = async {
                        listener.lock().await.accept().await
                    } => result,
                    _ = shutdown_notify.notified() => break,
                };

                match accept_result {
                    Ok((socket, peer_addr)) => {
                        tracing::debug!("Accepted connection from {}", peer_addr);

                        if access_list.check(peer_addr) == HostVerdict::Forbidden {
                            tracing::warn!("Refusing connection from {} (access list)", peer_addr);
                            monitor.notify(&SiteEvent::Refused { peer_addr });
                            metrics.connection_error();
                            drop(socket);
                            continue;
                        }

                        if manager.connection_count() >= config.max_connections {
                            tracing::warn!(
                                "Connection limit reached ({}), rejecting connection from {}",
                                config.max_connections,
                                peer_addr
                            );
                            metrics.connection_error();
                            drop(socket);
                            continue;
                        }

                        let temp_id = ConnectionId::new(0);

                        match TelnetConnection::wrap(socket, temp_id, config.output_cap_bytes) {
                            Ok(connection) => {
                                connection.telnet_setup().await;
                                match manager.add_connection(connection, handler.clone()) {
                                    Ok(id) => {
                                        monitor.notify(&SiteEvent::Connected { id, peer_addr });
                                        tracing::info!(
                                            "Connection {} established from {}",
                                            id,
                                            peer_addr
                                        );
                                    }
                                    Err(e) => {
                                        tracing::error!("Failed to add connection: {}", e);
                                        metrics.connection_error();
                                    }
                                }
                            }
                            Err(e) => {
                                tracing::error!("Failed to wrap connection: {}", e);
                                metrics.connection_error();
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to accept connection: {}", e);
                        metrics.connection_error();
                        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                    }
                }
            }

            tracing::info!("Accept loop terminated");
        })
    }

    /// Shutdown the server gracefully
    ///
    /// This stops accepting new connections and waits for existing connections
    /// to close gracefully (up to the configured shutdown timeout).
    pub async fn shutdown(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(TelnetError::ServerNotRunning);
        }

        tracing::info!("Shutting down Telnet server");

        self.shutdown_notify.notify_waiters();

        let handles: Vec<_> = self.accept_handles.lock().await.drain(..).collect();
        for handle in handles {
            let _ = tokio::time::timeout(self.config.shutdown_timeout, handle).await;
        }

        self.manager.shutdown().await;

        tracing::info!("Telnet server shutdown complete");

        Ok(())
    }

    /// Check if the server is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the server's bound addresses, one per configured listener.
    pub fn bind_addresses(&self) -> Vec<SocketAddr> {
        self.listeners.iter().map(|(_, addr)| *addr).collect()
    }

    /// Get the number of active connections
    pub fn connection_count(&self) -> usize {
        self.manager.connection_count()
    }

    /// Get a snapshot of the server state
    pub fn snapshot(&self) -> ServerSnapshot {
        ServerSnapshot {
            active_connections: self.manager.connection_count(),
            total_connections: self.metrics.total_connections(),
            bind_addresses: self.bind_addresses(),
            uptime: self.started_at.elapsed(),
            started_at: self.started_at,
        }
    }

    /// Get the server metrics
    pub fn metrics(&self) -> Arc<ServerMetrics> {
        self.metrics.clone()
    }

    /// Get the connection manager
    pub fn manager(&self) -> Arc<ConnectionManager> {
        self.manager.clone()
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl std::fmt::Debug for TelnetServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelnetServer")
            .field("bind_addresses", &self.bind_addresses())
            .field("running", &self.is_running())
            .field("connection_count", &self.connection_count())
            .field("uptime", &self.started_at.elapsed())
            .finish()
    }
}

impl Drop for TelnetServer {
    fn drop(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            tracing::warn!("TelnetServer dropped while still running");
            self.running.store(false, Ordering::SeqCst);
            self.shutdown_notify.notify_waiters();
        }
    }
}
