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

//! Integration tests for the Telnet server

use async_trait::async_trait;
use bytes::Bytes;
use muxnet_core::{ConnectionEvent, ConnectionId, ServerConfig, ServerHandler, TelnetConnection, TelnetServer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

fn test_config() -> ServerConfig {
    ServerConfig::default().with_bind_address("127.0.0.1:0".parse().unwrap())
}

/// Test handler that tracks events
struct TestHandler {
    connect_count: Arc<AtomicUsize>,
    event_count: Arc<AtomicUsize>,
    disconnect_count: Arc<AtomicUsize>,
}

impl TestHandler {
    fn new() -> Self {
        Self {
            connect_count: Arc::new(AtomicUsize::new(0)),
            event_count: Arc::new(AtomicUsize::new(0)),
            disconnect_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn connect_count(&self) -> usize {
        self.connect_count.load(Ordering::SeqCst)
    }

    fn event_count(&self) -> usize {
        self.event_count.load(Ordering::SeqCst)
    }

    fn disconnect_count(&self) -> usize {
        self.disconnect_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServerHandler for TestHandler {
    async fn on_connect(&self, _id: ConnectionId, _conn: &TelnetConnection) {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_event(&self, _id: ConnectionId, _conn: &TelnetConnection, _event: ConnectionEvent) {
        self.event_count.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_disconnect(
        &self,
        _id: ConnectionId,
        _conn: &TelnetConnection,
        _reason: muxnet_core::DisconnectReason,
    ) {
        self.disconnect_count.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_server_accepts_connections() {
    let server = TelnetServer::new(test_config()).await.unwrap();
    let addr = server.bind_addresses()[0];

    let handler = Arc::new(TestHandler::new());
    server.start(handler.clone()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let client = TcpStream::connect(addr).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(server.connection_count(), 1);
    assert_eq!(handler.connect_count(), 1);

    drop(client);
    tokio::time::sleep(Duration::from_millis(100)).await;
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_server_handles_multiple_connections() {
    let config = test_config().with_max_connections(10);
    let server = TelnetServer::new(config).await.unwrap();
    let addr = server.bind_addresses()[0];

    let handler = Arc::new(TestHandler::new());
    server.start(handler.clone()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut clients = Vec::new();
    for _ in 0..5 {
        let client = TcpStream::connect(addr).await.unwrap();
        clients.push(client);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(server.connection_count(), 5);
    assert_eq!(handler.connect_count(), 5);

    drop(clients);
    tokio::time::sleep(Duration::from_millis(200)).await;
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_server_enforces_connection_limit() {
    let config = test_config().with_max_connections(3);
    let server = TelnetServer::new(config).await.unwrap();
    let addr = server.bind_addresses()[0];

    let handler = Arc::new(TestHandler::new());
    server.start(handler.clone()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut clients = Vec::new();
    for _ in 0..5 {
        if let Ok(client) = TcpStream::connect(addr).await {
            clients.push(client);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    assert!(server.connection_count() <= 3);

    drop(clients);
    tokio::time::sleep(Duration::from_millis(200)).await;
    server.shutdown().await.unwrap();
}

#[tokio::test]
#[ignore] // Timing-sensitive test, may be flaky in CI
async fn test_server_graceful_shutdown() {
    let server = TelnetServer::new(test_config()).await.unwrap();
    let addr = server.bind_addresses()[0];

    let handler = Arc::new(TestHandler::new());
    server.start(handler.clone()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut clients = Vec::new();
    for _ in 0..3 {
        let client = TcpStream::connect(addr).await.unwrap();
        clients.push(client);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(server.connection_count(), 3);

    server.shutdown().await.unwrap();

    assert!(!server.is_running());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(server.connection_count(), 0);

    assert!(handler.disconnect_count() >= 3);

    drop(clients);
}

#[tokio::test]
async fn test_connection_receives_data() {
    let server = TelnetServer::new(test_config()).await.unwrap();
    let addr = server.bind_addresses()[0];

    let handler = Arc::new(TestHandler::new());
    server.start(handler.clone()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut client = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    client.write_all(b"Hello, Server!\n").await.unwrap();
    client.flush().await.unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(handler.event_count() > 0);

    drop(client);
    tokio::time::sleep(Duration::from_millis(100)).await;
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_server_metrics() {
    let server = TelnetServer::new(test_config()).await.unwrap();
    let addr = server.bind_addresses()[0];

    let handler = Arc::new(TestHandler::new());
    server.start(handler).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let metrics = server.metrics();
    let initial_total = metrics.total_connections();

    let mut clients = Vec::new();
    for _ in 0..3 {
        let client = TcpStream::connect(addr).await.unwrap();
        clients.push(client);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(metrics.total_connections(), initial_total + 3);
    assert_eq!(metrics.active_connections(), 3);

    let snapshot = server.snapshot();
    assert_eq!(snapshot.active_connections, 3);
    assert_eq!(snapshot.total_connections, initial_total + 3);

    drop(clients);
    tokio::time::sleep(Duration::from_millis(200)).await;
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_broadcast_to_connections() {
    let server = TelnetServer::new(test_config()).await.unwrap();
    let addr = server.bind_addresses()[0];

    let handler = Arc::new(TestHandler::new());
    server.start(handler).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut clients = Vec::new();
    for _ in 0..3 {
        let client = TcpStream::connect(addr).await.unwrap();
        clients.push(client);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let manager = server.manager();
    let result = manager.broadcast(Bytes::from_static(b"\r\n")).await;

    assert_eq!(result.total, 3);
    assert!(result.all_succeeded());

    drop(clients);
    tokio::time::sleep(Duration::from_millis(100)).await;
    server.shutdown().await.unwrap();
}

#[tokio::test]
#[ignore] // Timing-sensitive test, may be flaky in CI
async fn test_connection_timeout() {
    let config = test_config().with_idle_timeout(Duration::from_millis(500));
    let server = TelnetServer::new(config).await.unwrap();
    let addr = server.bind_addresses()[0];

    let handler = Arc::new(TestHandler::new());
    server.start(handler.clone()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let client = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(server.connection_count(), 1);

    tokio::time::sleep(Duration::from_millis(1000)).await;

    assert!(
        server.connection_count() <= 1,
        "Expected 0-1 connections, got {}",
        server.connection_count()
    );
    assert!(
        handler.disconnect_count() >= 1,
        "Expected at least 1 disconnect, got {}",
        handler.disconnect_count()
    );

    drop(client);
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_connections() {
    let config = test_config().with_max_connections(50);
    let server = TelnetServer::new(config).await.unwrap();
    let addr = server.bind_addresses()[0];

    let handler = Arc::new(TestHandler::new());
    server.start(handler.clone()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut handles = Vec::new();
    for _ in 0..20 {
        handles.push(tokio::spawn(async move {
            let _client = TcpStream::connect(addr).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(handler.connect_count(), 20);

    server.shutdown().await.unwrap();
}

/// Handler that tracks a conversation: a welcome line, then canned replies
/// keyed off the received command line.
struct ConversationHandler {
    connect_count: Arc<AtomicUsize>,
    messages: Arc<tokio::sync::Mutex<Vec<(ConnectionId, String)>>>,
    disconnect_count: Arc<AtomicUsize>,
}

impl ConversationHandler {
    fn new() -> Self {
        Self {
            connect_count: Arc::new(AtomicUsize::new(0)),
            messages: Arc::new(tokio::sync::Mutex::new(Vec::new())),
            disconnect_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn disconnect_count(&self) -> usize {
        self.disconnect_count.load(Ordering::SeqCst)
    }

    async fn get_messages(&self) -> Vec<(ConnectionId, String)> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl ServerHandler for ConversationHandler {
    async fn on_connect(&self, _id: ConnectionId, conn: &TelnetConnection) {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        conn.queue_line("Welcome to the test server!").await;
        conn.drain().await;
    }

    async fn on_event(&self, id: ConnectionId, conn: &TelnetConnection, event: ConnectionEvent) {
        if let ConnectionEvent::Line(line) = event {
            self.messages.lock().await.push((id, line.clone()));

            let response = match line.trim() {
                "hello" => "Hello there!",
                "ping" => "pong",
                "quit" => {
                    conn.queue_line("Goodbye!").await;
                    conn.drain().await;
                    return;
                }
                _ => "Unknown command",
            };
            conn.queue_line(response).await;
            conn.drain().await;
        }
    }

    async fn on_disconnect(
        &self,
        _id: ConnectionId,
        _conn: &TelnetConnection,
        _reason: muxnet_core::DisconnectReason,
    ) {
        self.disconnect_count.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_client_server_conversation() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let server = TelnetServer::new(test_config()).await.unwrap();
    let addr = server.bind_addresses()[0];

    let handler = Arc::new(ConversationHandler::new());
    server.start(handler.clone()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut client = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut buf = vec![0u8; 1024];
    let n = tokio::time::timeout(Duration::from_secs(1), client.read(&mut buf))
        .await
        .unwrap()
        .unwrap();
    let welcome = String::from_utf8_lossy(&buf[..n]);
    assert!(welcome.contains("Welcome"));

    client.write_all(b"hello\n").await.unwrap();
    client.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let n = tokio::time::timeout(Duration::from_secs(1), client.read(&mut buf))
        .await
        .unwrap()
        .unwrap();
    let response = String::from_utf8_lossy(&buf[..n]);
    assert!(response.contains("Hello there"));

    let messages = handler.get_messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].1.trim(), "hello");

    drop(client);
    tokio::time::sleep(Duration::from_millis(100)).await;
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_multiple_clients_conversation() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let server = TelnetServer::new(test_config()).await.unwrap();
    let addr = server.bind_addresses()[0];

    let handler = Arc::new(ConversationHandler::new());
    server.start(handler.clone()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut client1 = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut client2 = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut buf1 = vec![0u8; 1024];
    let mut buf2 = vec![0u8; 1024];
    let _ = tokio::time::timeout(Duration::from_secs(1), client1.read(&mut buf1))
        .await
        .unwrap()
        .unwrap();
    let _ = tokio::time::timeout(Duration::from_secs(1), client2.read(&mut buf2))
        .await
        .unwrap()
        .unwrap();

    client1.write_all(b"hello\n").await.unwrap();
    client1.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    client2.write_all(b"ping\n").await.unwrap();
    client2.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let n1 = tokio::time::timeout(Duration::from_secs(1), client1.read(&mut buf1))
        .await
        .unwrap()
        .unwrap();
    let response1 = String::from_utf8_lossy(&buf1[..n1]);
    assert!(response1.contains("Hello there"));

    let n2 = tokio::time::timeout(Duration::from_secs(1), client2.read(&mut buf2))
        .await
        .unwrap()
        .unwrap();
    let response2 = String::from_utf8_lossy(&buf2[..n2]);
    assert!(response2.contains("pong"));

    let messages = handler.get_messages().await;
    assert_eq!(messages.len(), 2);

    let msg_texts: Vec<String> = messages.iter().map(|(_, msg)| msg.trim().to_string()).collect();
    assert!(msg_texts.contains(&"hello".to_string()));
    assert!(msg_texts.contains(&"ping".to_string()));

    drop(client1);
    drop(client2);
    tokio::time::sleep(Duration::from_millis(100)).await;
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sequential_commands() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let server = TelnetServer::new(test_config()).await.unwrap();
    let addr = server.bind_addresses()[0];

    let handler = Arc::new(ConversationHandler::new());
    server.start(handler.clone()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut client = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut buf = vec![0u8; 1024];
    let _ = tokio::time::timeout(Duration::from_secs(1), client.read(&mut buf))
        .await
        .unwrap()
        .unwrap();

    let commands = vec!["hello", "ping", "hello", "ping"];
    let expected_responses = vec!["Hello there", "pong", "Hello there", "pong"];

    for (cmd, expected) in commands.iter().zip(expected_responses.iter()) {
        client.write_all(cmd.as_bytes()).await.unwrap();
        client.write_all(b"\n").await.unwrap();
        client.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        let n = tokio::time::timeout(Duration::from_secs(1), client.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let response = String::from_utf8_lossy(&buf[..n]);
        assert!(
            response.contains(expected),
            "Expected '{}' in response, got: {}",
            expected,
            response
        );
    }

    let messages = handler.get_messages().await;
    assert_eq!(messages.len(), 4);

    drop(client);
    tokio::time::sleep(Duration::from_millis(100)).await;
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_connection_state_tracking() {
    let server = TelnetServer::new(test_config()).await.unwrap();
    let addr = server.bind_addresses()[0];

    let handler = Arc::new(ConversationHandler::new());
    server.start(handler.clone()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(server.connection_count(), 0);

    let client1 = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.connection_count(), 1);

    let client2 = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.connection_count(), 2);

    drop(client1);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.connection_count(), 1);
    assert_eq!(handler.disconnect_count(), 1);

    drop(client2);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(server.connection_count(), 0);
    assert_eq!(handler.disconnect_count(), 2);

    server.shutdown().await.unwrap();
}
