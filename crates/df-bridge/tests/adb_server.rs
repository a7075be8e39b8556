//! AdbBridge against a scripted in-process ADB server

use std::time::Duration;

use futures::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use df_bridge::AdbBridge;
use df_core::config::BridgeConfig;
use df_core::error::BridgeError;
use df_core::{Bridge, Endpoint, Session, SessionStatus};

fn prefixed(payload: &str) -> Vec<u8> {
    let mut out = format!("{:04x}", payload.len()).into_bytes();
    out.extend_from_slice(payload.as_bytes());
    out
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut len = [0u8; 4];
    stream.read_exact(&mut len).await.unwrap();
    let len = usize::from_str_radix(std::str::from_utf8(&len).unwrap(), 16).unwrap();
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await.unwrap();
    String::from_utf8(payload).unwrap()
}

async fn start_server() -> (TcpListener, AdbBridge) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let bridge = AdbBridge::new(&BridgeConfig {
        host: "127.0.0.1".to_string(),
        port,
        adb_path: "adb".to_string(),
        ..BridgeConfig::default()
    });
    (listener, bridge)
}

#[tokio::test]
async fn test_connect_returns_reply() {
    let (listener, bridge) = start_server().await;

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        stream.write_all(b"OKAY").await.unwrap();
        stream
            .write_all(&prefixed("connected to 10.0.0.5:5037"))
            .await
            .unwrap();
        request
    });

    let endpoint = Endpoint::new("10.0.0.5", 5037).unwrap();
    let reply = bridge
        .connect(&endpoint, Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(reply, "connected to 10.0.0.5:5037");
    assert_eq!(server.await.unwrap(), "host:connect:10.0.0.5:5037");
}

#[tokio::test]
async fn test_connect_times_out() {
    let (listener, bridge) = start_server().await;

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut stream).await;
        // Never answer
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let endpoint = Endpoint::new("10.0.0.99", 5037).unwrap();
    let result = bridge.connect(&endpoint, Duration::from_millis(100)).await;
    assert!(matches!(result, Err(BridgeError::Timeout(_))));
    server.abort();
}

#[tokio::test]
async fn test_list_sessions() {
    let (listener, bridge) = start_server().await;

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(read_request(&mut stream).await, "host:devices");
        stream.write_all(b"OKAY").await.unwrap();
        stream
            .write_all(&prefixed("10.0.0.5:5037\tdevice\n10.0.0.6:5037\tunauthorized\n"))
            .await
            .unwrap();
    });

    let sessions = bridge.list_sessions().await.unwrap();
    assert_eq!(
        sessions,
        vec![
            Session::new("10.0.0.5:5037", SessionStatus::Device),
            Session::new("10.0.0.6:5037", SessionStatus::Unauthorized),
        ]
    );
}

#[tokio::test]
async fn test_shell_switches_transport() {
    let (listener, bridge) = start_server().await;

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let transport = read_request(&mut stream).await;
        stream.write_all(b"OKAY").await.unwrap();
        let shell = read_request(&mut stream).await;
        stream.write_all(b"OKAY").await.unwrap();
        stream.write_all(b"Android 14\n").await.unwrap();
        stream.shutdown().await.unwrap();
        (transport, shell)
    });

    let output = bridge
        .shell("10.0.0.5:5037", "getprop ro.build.version.release")
        .await
        .unwrap();
    assert_eq!(output, "Android 14\n");

    let (transport, shell) = server.await.unwrap();
    assert_eq!(transport, "host:transport:10.0.0.5:5037");
    assert_eq!(shell, "shell:getprop ro.build.version.release");
}

#[tokio::test]
async fn test_shell_times_out_on_silent_device() {
    let (listener, bridge) = start_server().await;
    let bridge = bridge.with_command_timeout(Duration::from_millis(200));

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut stream).await;
        stream.write_all(b"OKAY").await.unwrap();
        let _ = read_request(&mut stream).await;
        stream.write_all(b"OKAY").await.unwrap();
        // Output starts but the stream is never closed
        stream.write_all(b"partial").await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let started = std::time::Instant::now();
    let result = bridge.shell("10.0.0.5:5037", "logcat").await;
    assert!(matches!(result, Err(BridgeError::Timeout(t)) if t == Duration::from_millis(200)));
    assert!(started.elapsed() < Duration::from_secs(5));
    server.abort();
}

#[tokio::test]
async fn test_shell_unknown_device() {
    let (listener, bridge) = start_server().await;

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut stream).await;
        stream.write_all(b"FAIL").await.unwrap();
        stream
            .write_all(&prefixed("device '10.0.0.9:5037' not found"))
            .await
            .unwrap();
    });

    let result = bridge.shell("10.0.0.9:5037", "id").await;
    assert!(matches!(result, Err(BridgeError::DeviceNotFound(_))));
}

#[tokio::test]
async fn test_track_sessions_reports_absent() {
    let (listener, bridge) = start_server().await;

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(read_request(&mut stream).await, "host:track-devices");
        stream.write_all(b"OKAY").await.unwrap();
        stream
            .write_all(&prefixed("10.0.0.5:5037\toffline\n"))
            .await
            .unwrap();
        stream
            .write_all(&prefixed("10.0.0.6:5037\tdevice\n"))
            .await
            .unwrap();
    });

    let updates: Vec<Session> = bridge
        .track_sessions()
        .await
        .unwrap()
        .map(|s| s.unwrap())
        .collect()
        .await;

    assert_eq!(
        updates,
        vec![
            Session::new("10.0.0.5:5037", SessionStatus::Offline),
            Session::absent("10.0.0.5:5037"),
            Session::new("10.0.0.6:5037", SessionStatus::Device),
        ]
    );
}
