//! CLI integration tests
//!
//! Tests the droidfleet CLI using assert_cmd. Every test runs against a
//! private config so nothing touches the user's cache or bridge.

use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn droidfleet() -> Command {
    Command::cargo_bin("droidfleet")
        .expect("Failed to locate droidfleet binary - ensure it's built before running tests")
}

/// A port nothing listens on
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

struct Sandbox {
    dir: TempDir,
    config: PathBuf,
    daemon_port: u16,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        let daemon_port = closed_port();
        let content = format!(
            "cache_dir = '{}'\nconnect_timeout_ms = 500\n\n[bridge]\nport = {}\n\n[daemon]\naddress = '127.0.0.1:{}'\n\n[scanner]\nprogram = 'droidfleet-missing-scanner'\noutput_file = '{}'\n",
            dir.path().join("cache").display(),
            closed_port(),
            daemon_port,
            dir.path().join("devices.json").display(),
        );
        std::fs::write(&config, content).unwrap();
        Self {
            dir,
            config,
            daemon_port,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = droidfleet();
        cmd.arg("--config").arg(&self.config);
        cmd.env_remove("DROIDFLEET_DAEMON");
        cmd
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cache_file(&self) -> PathBuf {
        self.path("cache").join("devices.json")
    }

    fn write_scan(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, content).unwrap();
        path
    }
}

const SCAN_RESULTS: &str = r#"[
{"ip": "10.0.0.5", "timestamp": "1700000000", "ports": [ {"port": 5037, "proto": "tcp", "status": "open", "reason": "syn-ack", "ttl": 64} ] },
{"ip": "10.0.0.6", "timestamp": "1700000001", "ports": [ {"port": 5555, "proto": "tcp", "status": "open", "reason": "syn-ack", "ttl": 64} ] }
]"#;

#[test]
fn test_cli_help() {
    droidfleet()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("droidfleet"))
        .stdout(predicate::str::contains("broadcast"))
        .stdout(predicate::str::contains("kill-server"));
}

#[test]
fn test_cli_version() {
    droidfleet()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("droidfleet"));
}

#[test]
fn test_cli_daemon_help() {
    droidfleet()
        .args(["daemon", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("registry daemon"));
}

#[test]
fn test_broad_cmd_alias() {
    droidfleet()
        .args(["broad-cmd", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("every connected device"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    droidfleet()
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("clear-cache")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_scan_rejects_invalid_network() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["scan", "10.0.0.0/33", "5555"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid network"));
}

#[test]
fn test_scan_rejects_invalid_ports() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["scan", "10.0.0.0/24", "70000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid port specification"));
}

#[test]
fn test_scan_reports_missing_scanner() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["-q", "scan", "10.0.0.0/24", "5555"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("droidfleet-missing-scanner"));
}

#[test]
fn test_load_missing_file_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("load")
        .arg("--file")
        .arg(sandbox.path("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
    assert!(!sandbox.cache_file().exists());
}

#[test]
fn test_load_excludes_bridge_port_and_clear_cache() {
    let sandbox = Sandbox::new();
    let scan = sandbox.write_scan("scan.json", SCAN_RESULTS);

    sandbox
        .cmd()
        .arg("load")
        .arg("--file")
        .arg(&scan)
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 1 endpoint(s)"));

    let cache = std::fs::read_to_string(sandbox.cache_file()).unwrap();
    assert!(cache.contains("10.0.0.5:5037"));
    assert!(!cache.contains("10.0.0.6"));

    // Loading again adds nothing new
    sandbox
        .cmd()
        .arg("load")
        .arg("--file")
        .arg(&scan)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 new, 1 cached"));

    sandbox
        .cmd()
        .arg("clear-cache")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared cache"));
    assert!(!sandbox.cache_file().exists());

    sandbox
        .cmd()
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("already empty"));
}

#[test]
fn test_load_uses_configured_output_file() {
    let sandbox = Sandbox::new();
    sandbox.write_scan(
        "devices.json",
        r#"[{"ip":"10.0.0.5","ports":[{"port":"5555"}]}]"#,
    );

    sandbox
        .cmd()
        .arg("load")
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 0 endpoint(s)"));
    assert!(sandbox.cache_file().exists());
}

#[test]
fn test_connect_without_cache_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("connect")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No registry cache found"));
}

#[test]
fn test_connect_with_unreachable_bridge_fails() {
    let sandbox = Sandbox::new();
    let scan = sandbox.write_scan("scan.json", SCAN_RESULTS);
    sandbox
        .cmd()
        .arg("load")
        .arg("--file")
        .arg(&scan)
        .assert()
        .success();

    sandbox
        .cmd()
        .arg("connect")
        .assert()
        .failure()
        .stdout(predicate::str::contains("10.0.0.5:5037"))
        .stderr(predicate::str::contains("No endpoint could be connected"));
}

#[test]
fn test_connect_rejects_invalid_socket() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["connect", "--socket", "not-an-endpoint"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid endpoint"));
}

#[test]
fn test_broadcast_flags_conflict() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["broadcast", "--yes", "--no", "uname"])
        .assert()
        .failure();
}

#[test]
fn test_broadcast_requires_command() {
    let sandbox = Sandbox::new();
    sandbox.cmd().arg("broadcast").assert().failure();
}

#[test]
fn test_push_requires_absolute_remote() {
    let sandbox = Sandbox::new();
    let local = sandbox.write_scan("app.apk", "apk");
    sandbox
        .cmd()
        .arg("push")
        .arg(&local)
        .arg("sdcard/Download")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be absolute"));
}

#[test]
fn test_pull_requires_absolute_remote() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("pull")
        .arg("10.0.0.5:5037")
        .arg("data/log.txt")
        .arg(sandbox.path("log.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be absolute"));
}

#[test]
fn test_install_missing_package_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("install")
        .arg(sandbox.path("missing.apk"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Package not found"));
}

#[test]
fn test_daemon_stop_when_not_running() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["daemon", "stop"])
        .assert()
        .success()
        .stderr(predicate::str::contains("not running"));
}

#[test]
fn test_daemon_list_when_not_running_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["daemon", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Is it running?"));
}

fn wait_for_port(port: u16) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if std::net::TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    panic!("daemon did not start listening on port {}", port);
}

fn wait_for_exit(child: &mut std::process::Child) -> std::process::ExitStatus {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    let _ = child.kill();
    panic!("daemon did not exit after stop");
}

fn spawn_foreground_daemon(sandbox: &Sandbox, config: &Path) -> std::process::Child {
    std::process::Command::new(assert_cmd::cargo::cargo_bin("droidfleet"))
        .arg("--config")
        .arg(config)
        .args(["daemon", "start", "--foreground"])
        .env_remove("DROIDFLEET_DAEMON")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .current_dir(sandbox.dir.path())
        .spawn()
        .unwrap()
}

#[test]
fn test_shared_registry_through_daemon() {
    let sandbox = Sandbox::new();
    let mut daemon = spawn_foreground_daemon(&sandbox, &sandbox.config);
    wait_for_port(sandbox.daemon_port);

    let scan = sandbox.write_scan("scan.json", SCAN_RESULTS);
    sandbox
        .cmd()
        .arg("load")
        .arg("--file")
        .arg(&scan)
        .arg("--share")
        .assert()
        .success()
        .stdout(predicate::str::contains("Shared with registry daemon"));

    sandbox
        .cmd()
        .args(["daemon", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10.0.0.5"))
        .stdout(predicate::str::contains("5037"))
        .stdout(predicate::str::contains("10.0.0.6").not());

    sandbox
        .cmd()
        .args(["daemon", "stop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stopped"));

    assert!(wait_for_exit(&mut daemon).success());
}
