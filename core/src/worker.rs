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

//! Connection worker implementation
//!
//! The ConnectionWorker is responsible for managing the lifecycle of a single
//! connection, including:
//! - Event processing loop
//! - Timeout management (read, idle, write)
//! - Control message handling
//! - Broadcast message handling
//! - Deferred close while output is still draining (§4.7 / S7)
//! - Resource cleanup and disconnect accounting

use crate::accounting::{
    is_idle_timed_out, AlwaysIdleEligible, IdlePolicy, NullMonitor, SiteEvent, SiteMonitor,
};
use crate::connection::ConnectionEvent;
use crate::output::DrainOutcome;
use crate::scheduler::Scheduler;
use crate::types::DisconnectReason;
use crate::{ConnectionId, ConnectionState, Result, ServerHandler, TelnetConnection, TelnetError};
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

/// Control messages for the worker
#[derive(Debug, Clone)]
pub enum ControlMessage {
    /// Gracefully close the connection, recording the given reason.
    Close(DisconnectReason),
    /// Queue raw bytes for this connection alone.
    SendBytes(Bytes),
    /// Queue raw bytes as part of a broadcast to every connection.
    Broadcast(Bytes),
}

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Read timeout (max time to wait for data)
    pub read_timeout: Duration,
    /// Idle timeout (max time without activity)
    pub idle_timeout: Duration,
    /// Write timeout (max time for send operations)
    pub write_timeout: Duration,
    /// How long a graceful close waits for queued output to drain before
    /// forcing the socket shut (§4.7 step 5 / S7).
    pub shutdown_timeout: Duration,
    /// Control channel buffer size
    pub control_buffer_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(300),
            idle_timeout: Duration::from_secs(600),
            write_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(5),
            control_buffer_size: 100,
        }
    }
}

/// Connection worker that manages a single connection's lifecycle
pub struct ConnectionWorker {
    id: ConnectionId,
    connection: TelnetConnection,
    handler: Arc<dyn ServerHandler>,
    config: WorkerConfig,
    state: Arc<AtomicU8>,
    control_rx: mpsc::Receiver<ControlMessage>,
    last_activity: Instant,
    idle_policy: Arc<dyn IdlePolicy>,
    monitor: Arc<dyn SiteMonitor>,
}

impl ConnectionWorker {
    /// Create a new connection worker
    pub fn new(
        id: ConnectionId,
        connection: TelnetConnection,
        handler: Arc<dyn ServerHandler>,
        config: WorkerConfig,
        state: Arc<AtomicU8>,
    ) -> (Self, mpsc::Sender<ControlMessage>) {
        let (control_tx, control_rx) = mpsc::channel(config.control_buffer_size);

        let worker = Self {
            id,
            connection,
            handler,
            config,
            state,
            control_rx,
            last_activity: Instant::now(),
            idle_policy: Arc::new(AlwaysIdleEligible),
            monitor: Arc::new(NullMonitor),
        };

        (worker, control_tx)
    }

    /// Override the idle-eligibility policy (§5's "not K-alive, not
    /// staff-exempt" gate). Defaults to always-eligible.
    pub fn with_idle_policy(mut self, policy: Arc<dyn IdlePolicy>) -> Self {
        self.idle_policy = policy;
        self
    }

    /// Override the site monitor notified on connect/disconnect.
    /// Defaults to a no-op.
    pub fn with_site_monitor(mut self, monitor: Arc<dyn SiteMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Get the current state
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, new_state: ConnectionState) {
        self.state.store(new_state.as_u8(), Ordering::Release);
    }

    fn update_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    async fn is_idle_timed_out(&self) -> bool {
        let last_input_at = self.connection.last_input_at().await;
        is_idle_timed_out(
            Instant::now(),
            last_input_at,
            self.config.idle_timeout,
            self.id,
            self.idle_policy.as_ref(),
        )
    }

    /// Run the worker event loop
    ///
    /// This is the main entry point for the worker. It will run until the
    /// connection is closed or an error occurs.
    pub async fn run(mut self) {
        self.set_state(ConnectionState::Active);
        self.monitor.notify(&SiteEvent::Connected {
            id: self.id,
            peer_addr: self.connection.peer_addr(),
        });
        self.handler.on_connect(self.id, &self.connection).await;

        let outcome = self.event_loop().await;

        let reason = match &outcome {
            Ok(reason) => *reason,
            Err(e) => {
                self.handler.on_error(self.id, &self.connection, error_clone(e)).await;
                DisconnectReason::SockDied
            }
        };

        self.cleanup(reason).await;
    }

    /// Main event processing loop. Returns the reason the loop ended.
    async fn event_loop(&mut self) -> Result<DisconnectReason> {
        loop {
            if self.is_idle_timed_out().await {
                self.handler
                    .on_idle_timeout(self.id, &self.connection)
                    .await;
                return Ok(DisconnectReason::IdleTimeout);
            }

            if self.connection.has_pending_output().await {
                let _ = self.connection.drain().await;
            }

            select! {
                result = timeout(self.config.read_timeout, self.connection.next()) => {
                    match result {
                        Ok(Ok(Some(event))) => {
                            self.update_activity();
                            self.set_state(ConnectionState::Active);
                            self.handle_event(event).await;
                        }
                        Ok(Ok(None)) => return Ok(DisconnectReason::SockDied),
                        Ok(Err(e)) => return Err(e),
                        Err(_) => {
                            self.handler.on_timeout(self.id, &self.connection).await;
                            return Ok(DisconnectReason::SockDied);
                        }
                    }
                }

                msg = self.control_rx.recv() => {
                    match msg {
                        Some(ControlMessage::Close(reason)) => {
                            self.graceful_close().await;
                            return Ok(reason);
                        }
                        Some(ControlMessage::SendBytes(bytes)) => {
                            self.connection.queue_bytes(&bytes).await;
                            if let Err(e) = timeout(self.config.write_timeout, self.connection.drain()).await {
                                tracing::warn!(connection_id = %self.id, error = ?e, "write timed out");
                            }
                            self.update_activity();
                        }
                        Some(ControlMessage::Broadcast(bytes)) => {
                            self.connection.queue_bytes(&bytes).await;
                            let _ = timeout(self.config.write_timeout, self.connection.drain()).await;
                            self.update_activity();
                        }
                        None => return Ok(DisconnectReason::GoingDown),
                    }
                }

                _ = sleep(Duration::from_secs(10)) => {
                    if self.last_activity.elapsed() > Duration::from_secs(60) {
                        self.set_state(ConnectionState::Idle);
                    }
                }
            }
        }
    }

    async fn handle_event(&mut self, event: ConnectionEvent) {
        self.handler
            .on_event(self.id, &self.connection, event)
            .await;
    }

    /// Wait up to `shutdown_timeout` for queued output to drain before
    /// the socket is torn down (§4.7 step 5, S7).
    async fn graceful_close(&mut self) {
        if !self.connection.has_pending_output().await {
            return;
        }

        let mut scheduler = Scheduler::new();
        let force_close_at = tokio::time::Instant::now() + self.config.shutdown_timeout;
        let forced = Arc::new(AtomicBool::new(false));
        let forced_flag = forced.clone();
        scheduler.schedule(
            force_close_at,
            Box::new(move || {
                forced_flag.store(true, Ordering::SeqCst);
            }),
        );

        while self.connection.has_pending_output().await && !forced.load(Ordering::SeqCst) {
            match self.connection.drain().await {
                DrainOutcome::Drained => break,
                DrainOutcome::Fatal => break,
                DrainOutcome::WouldBlock => {
                    let deadline = scheduler.next_deadline().unwrap_or(force_close_at);
                    select! {
                        _ = tokio::time::sleep_until(deadline) => {
                            scheduler.run_due(tokio::time::Instant::now());
                        }
                        _ = sleep(Duration::from_millis(20)) => {}
                    }
                }
            }
        }
    }

    async fn cleanup(&mut self, reason: DisconnectReason) {
        self.set_state(ConnectionState::Closing);

        self.handler
            .on_disconnect(self.id, &self.connection, reason)
            .await;
        self.monitor
            .notify(&SiteEvent::Disconnected { id: self.id, reason });

        while self.control_rx.try_recv().is_ok() {}

        self.set_state(ConnectionState::Closed);
    }
}

fn error_clone(error: &TelnetError) -> TelnetError {
    TelnetError::Other(error.to_string())
}

impl std::fmt::Debug for ConnectionWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionWorker")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("last_activity", &self.last_activity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServerHandler;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool as StdAtomicBool, AtomicUsize};
    use tokio::net::{TcpListener, TcpStream};

    struct TestHandler {
        connected: StdAtomicBool,
        disconnected: StdAtomicBool,
        event_count: AtomicUsize,
    }

    impl TestHandler {
        fn new() -> Self {
            Self {
                connected: StdAtomicBool::new(false),
                disconnected: StdAtomicBool::new(false),
                event_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ServerHandler for TestHandler {
        async fn on_connect(&self, _id: ConnectionId, _conn: &TelnetConnection) {
            self.connected.store(true, Ordering::SeqCst);
        }

        async fn on_event(&self, _id: ConnectionId, _conn: &TelnetConnection, _event: ConnectionEvent) {
            self.event_count.fetch_add(1, Ordering::SeqCst);
        }

        async fn on_disconnect(
            &self,
            _id: ConnectionId,
            _conn: &TelnetConnection,
            _reason: DisconnectReason,
        ) {
            self.disconnected.store(true, Ordering::SeqCst);
        }
    }

    async fn create_test_connection() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server_task = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            socket
        });
        let client = TcpStream::connect(addr).await.unwrap();
        let server = server_task.await.unwrap();
        (server, client)
    }

    #[tokio::test]
    async fn test_worker_lifecycle() {
        let (server, client) = create_test_connection().await;
        let id = ConnectionId::new(1);
        let connection = TelnetConnection::wrap(server, id, 1024).unwrap();
        let handler = Arc::new(TestHandler::new());
        let config = WorkerConfig::default();
        let state = Arc::new(AtomicU8::new(ConnectionState::Connecting.as_u8()));

        let (worker, control_tx) = ConnectionWorker::new(id, connection, handler.clone(), config, state);

        let worker_task = tokio::spawn(async move {
            worker.run().await;
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handler.connected.load(Ordering::SeqCst));

        control_tx.send(ControlMessage::Close(DisconnectReason::Quit)).await.unwrap();
        drop(control_tx);

        worker_task.await.unwrap();
        assert!(handler.disconnected.load(Ordering::SeqCst));
        drop(client);
    }

    #[tokio::test]
    async fn test_worker_control_messages() {
        let (server, client) = create_test_connection().await;
        let id = ConnectionId::new(1);
        let connection = TelnetConnection::wrap(server, id, 1024).unwrap();
        let handler = Arc::new(TestHandler::new());
        let config = WorkerConfig::default();
        let state = Arc::new(AtomicU8::new(ConnectionState::Connecting.as_u8()));

        let (worker, control_tx) = ConnectionWorker::new(id, connection, handler.clone(), config, state);

        let worker_task = tokio::spawn(async move {
            worker.run().await;
        });

        control_tx
            .send(ControlMessage::SendBytes(Bytes::from_static(b"hello\r\n")))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        control_tx.send(ControlMessage::Close(DisconnectReason::Quit)).await.unwrap();
        drop(control_tx);

        worker_task.await.unwrap();
        drop(client);
    }
}
