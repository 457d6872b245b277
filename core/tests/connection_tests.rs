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

//! Integration tests for `TelnetConnection` driven over a real TCP loopback
//! pair, exercising the scenarios described alongside the event loop.

use muxnet_core::{ConnectionEvent, ConnectionId, Encoding, TelnetConnection};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};

async fn create_test_connection() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let client_task = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });
    let (server, _) = listener.accept().await.unwrap();
    let client = client_task.await.unwrap();
    (server, client)
}

#[tokio::test]
async fn lines_split_on_cr_and_lf() {
    let (server, mut client) = create_test_connection().await;
    let mut connection = TelnetConnection::wrap(server, ConnectionId::new(1), 1024).unwrap();

    client.write_all(b"look\r\ninventory\n").await.unwrap();

    let first = connection.next().await.unwrap().unwrap();
    let second = connection.next().await.unwrap().unwrap();
    match (first, second) {
        (ConnectionEvent::Line(a), ConnectionEvent::Line(b)) => {
            assert_eq!(a, "look");
            assert_eq!(b, "inventory");
        }
        other => panic!("expected two lines, got {other:?}"),
    }
    assert_eq!(connection.messages_received(), 2);
}

#[tokio::test]
async fn charset_accepted_switches_encoding_to_utf8() {
    let (server, mut client) = create_test_connection().await;
    let mut connection = TelnetConnection::wrap(server, ConnectionId::new(2), 1024).unwrap();

    assert_eq!(connection.encoding().await, Encoding::Latin1);

    // IAC SB CHARSET ACCEPTED "UTF-8" IAC SE
    let mut frame = vec![0xFFu8, 0xFA, 42, 2];
    frame.extend_from_slice(b"UTF-8");
    frame.extend_from_slice(&[0xFF, 0xF0]);
    client.write_all(&frame).await.unwrap();

    let event = timeout(Duration::from_millis(200), connection.next())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, Some(ConnectionEvent::Telnet(_))));
    assert_eq!(connection.encoding().await, Encoding::Utf8);
}

#[tokio::test]
async fn charset_rejected_forces_latin1() {
    let (server, mut client) = create_test_connection().await;
    let mut connection = TelnetConnection::wrap(server, ConnectionId::new(3), 1024).unwrap();

    // IAC SB CHARSET REJECTED IAC SE
    let frame = [0xFFu8, 0xFA, 42, 3, 0xFF, 0xF0];
    client.write_all(&frame).await.unwrap();

    timeout(Duration::from_millis(200), connection.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(connection.encoding().await, Encoding::Latin1);
}

#[tokio::test]
async fn erase_character_queues_backspace_echo() {
    let (server, mut client) = create_test_connection().await;
    let mut connection = TelnetConnection::wrap(server, ConnectionId::new(4), 1024).unwrap();

    client.write_all(&[0xFFu8, 0xF7]).await.unwrap(); // IAC EC

    timeout(Duration::from_millis(200), async {
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
    let mut buf = [0u8; 8];
    let n = timeout(Duration::from_millis(200), client.read(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&buf[..n], b"\x08 \x08");
}

#[tokio::test]
async fn queue_line_appends_crlf() {
    let (server, mut client) = create_test_connection().await;
    let connection = TelnetConnection::wrap(server, ConnectionId::new(5), 1024).unwrap();

    connection.queue_line("Welcome").await;
    assert!(connection.has_pending_output().await);
    connection.drain().await;

    let mut buf = [0u8; 16];
    let n = timeout(Duration::from_millis(200), client.read(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&buf[..n], b"Welcome\r\n");
}

#[tokio::test]
async fn connection_reports_peer_addr_and_id() {
    let (server, _client) = create_test_connection().await;
    let id = ConnectionId::new(42);
    let connection = TelnetConnection::wrap(server, id, 1024).unwrap();

    assert_eq!(connection.id(), id);
    assert_eq!(connection.peer_addr().ip().to_string(), "127.0.0.1");
}

#[tokio::test]
async fn peer_disconnect_yields_none() {
    let (server, client) = create_test_connection().await;
    let mut connection = TelnetConnection::wrap(server, ConnectionId::new(6), 1024).unwrap();

    drop(client);

    let result = timeout(Duration::from_secs(1), connection.next())
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_none());
}
