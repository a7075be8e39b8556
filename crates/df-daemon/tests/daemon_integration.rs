//! Registry daemon integration tests
//!
//! Drives a real daemon over TCP with raw request lines.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use df_core::{Endpoint, Registry};
use df_daemon::{DaemonSettings, RegistryDaemon};
use df_protocol::RegistryResponse;

struct TestDaemon {
    addr: SocketAddr,
    cancel: CancellationToken,
    handle: JoinHandle<anyhow::Result<Registry>>,
}

async fn start_daemon(max_frame_len: usize, read_timeout: Duration) -> TestDaemon {
    start_seeded_daemon(max_frame_len, read_timeout, Registry::new()).await
}

async fn start_seeded_daemon(
    max_frame_len: usize,
    read_timeout: Duration,
    registry: Registry,
) -> TestDaemon {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();

    let daemon = RegistryDaemon::new(DaemonSettings {
        address: addr.to_string(),
        max_frame_len,
        read_timeout,
        write_timeout: read_timeout,
    })
    .with_registry(registry)
    .with_shutdown_token(cancel.clone());

    let handle = tokio::spawn(daemon.serve(listener));
    TestDaemon {
        addr,
        cancel,
        handle,
    }
}

async fn start_default_daemon() -> TestDaemon {
    start_daemon(64 * 1024, Duration::from_secs(5)).await
}

/// Send one raw request line and return the reply (None if closed silently)
async fn request(addr: SocketAddr, line: &str) -> Option<String> {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    writer
        .write_all(format!("{}\n", line).as_bytes())
        .await
        .unwrap();

    let mut reader = BufReader::new(reader);
    let mut reply = String::new();
    let n = timeout(Duration::from_secs(5), reader.read_line(&mut reply))
        .await
        .expect("Timeout waiting for reply")
        .unwrap_or(0);
    if n == 0 {
        None
    } else {
        Some(reply.trim_end().to_string())
    }
}

fn endpoints(reply: &str) -> Vec<Endpoint> {
    match RegistryResponse::parse(reply).unwrap() {
        RegistryResponse::Endpoints(mut list) => {
            list.sort();
            list
        }
        other => panic!("Expected endpoint list, got {:?}", other),
    }
}

#[tokio::test]
async fn test_list_after_merge() {
    let daemon = start_default_daemon().await;

    let merged = request(daemon.addr, r#"["10.0.0.5:5037","10.0.0.6:5037"]"#)
        .await
        .unwrap();
    assert!(merged.contains("merged"));

    let listed = request(daemon.addr, "list").await.unwrap();
    assert_eq!(
        endpoints(&listed),
        vec![
            "10.0.0.5:5037".parse().unwrap(),
            "10.0.0.6:5037".parse().unwrap()
        ]
    );

    daemon.handle.abort();
}

#[tokio::test]
async fn test_bare_list_merge_and_dedup() {
    let daemon = start_default_daemon().await;

    request(daemon.addr, "[10.0.0.7:5037, 10.0.0.8:5037]").await.unwrap();
    let reply = request(daemon.addr, r#"["10.0.0.7:5037"]"#).await.unwrap();
    assert_eq!(reply, r#"{"type":"merged","added":0,"total":2}"#);

    let listed = request(daemon.addr, "list").await.unwrap();
    assert_eq!(endpoints(&listed).len(), 2);

    daemon.handle.abort();
}

#[tokio::test]
async fn test_empty_registry_lists_empty() {
    let daemon = start_default_daemon().await;
    assert_eq!(request(daemon.addr, "list").await.unwrap(), "[]");
    daemon.handle.abort();
}

#[tokio::test]
async fn test_malformed_request_is_dropped() {
    let daemon = start_default_daemon().await;

    assert_eq!(request(daemon.addr, "hello").await, None);
    assert_eq!(request(daemon.addr, "[not-an-endpoint]").await, None);
    assert_eq!(request(daemon.addr, r#"["10.0.0.5:0"]"#).await, None);

    // Still serving
    request(daemon.addr, r#"["10.0.0.5:5037"]"#).await.unwrap();
    assert_eq!(
        request(daemon.addr, "list").await.unwrap(),
        r#"["10.0.0.5:5037"]"#
    );

    daemon.handle.abort();
}

#[tokio::test]
async fn test_oversize_request_is_dropped() {
    let daemon = start_daemon(32, Duration::from_secs(5)).await;

    let long = format!(
        "[{}]",
        (1..=10)
            .map(|i| format!("\"10.0.0.{}:5037\"", i))
            .collect::<Vec<_>>()
            .join(",")
    );
    assert_eq!(request(daemon.addr, &long).await, None);
    assert_eq!(request(daemon.addr, "list").await.unwrap(), "[]");

    daemon.handle.abort();
}

#[tokio::test]
async fn test_silent_client_does_not_block_daemon() {
    let daemon = start_daemon(64 * 1024, Duration::from_millis(200)).await;

    // Connect and say nothing
    let _idle = TcpStream::connect(daemon.addr).await.unwrap();

    let reply = timeout(Duration::from_secs(3), request(daemon.addr, "list"))
        .await
        .expect("Daemon wedged by silent client");
    assert_eq!(reply.as_deref(), Some("[]"));

    daemon.handle.abort();
}

#[tokio::test]
async fn test_client_not_reading_reply_does_not_block_daemon() {
    let mut registry = Registry::new();
    registry.merge((0..400_000u32).map(|i| {
        Endpoint::new(
            format!("10.{}.{}.{}", (i >> 16) & 0xff, (i >> 8) & 0xff, i & 0xff),
            5037,
        )
        .unwrap()
    }));
    let daemon = start_seeded_daemon(64 * 1024, Duration::from_millis(200), registry).await;

    // Ask for the multi-megabyte listing and never read it
    let socket = TcpSocket::new_v4().unwrap();
    socket.set_recv_buffer_size(4096).unwrap();
    let mut stalled = socket.connect(daemon.addr).await.unwrap();
    stalled.write_all(b"list\n").await.unwrap();

    let reply = timeout(
        Duration::from_secs(5),
        request(daemon.addr, r#"["192.168.1.1:5037"]"#),
    )
    .await
    .expect("Daemon wedged by client not reading");
    assert_eq!(
        reply.as_deref(),
        Some(r#"{"type":"merged","added":1,"total":400001}"#)
    );

    drop(stalled);
    daemon.handle.abort();
}

#[tokio::test]
async fn test_stop_request() {
    let daemon = start_default_daemon().await;

    request(daemon.addr, r#"["10.0.0.5:5037"]"#).await.unwrap();
    let reply = request(daemon.addr, "stop").await.unwrap();
    assert_eq!(reply, r#"{"type":"stopping"}"#);

    let registry = timeout(Duration::from_secs(5), daemon.handle)
        .await
        .expect("Daemon did not stop")
        .unwrap()
        .unwrap();
    assert_eq!(registry.len(), 1);

    // Listener is closed
    assert!(TcpStream::connect(daemon.addr).await.is_err());
}

#[tokio::test]
async fn test_json_object_requests() {
    let daemon = start_default_daemon().await;

    request(
        daemon.addr,
        r#"{"type":"merge","endpoints":["10.0.0.9:5037"]}"#,
    )
    .await
    .unwrap();
    assert_eq!(
        request(daemon.addr, r#"{"type":"list"}"#).await.unwrap(),
        r#"["10.0.0.9:5037"]"#
    );

    daemon.handle.abort();
}

#[tokio::test]
async fn test_shutdown_token_stops_daemon() {
    let daemon = start_default_daemon().await;
    daemon.cancel.cancel();

    let result = timeout(Duration::from_secs(5), daemon.handle)
        .await
        .expect("Daemon ignored shutdown token")
        .unwrap();
    assert!(result.unwrap().is_empty());
}
