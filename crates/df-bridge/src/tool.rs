//! Runner for the `adb` executable

use std::ffi::OsStr;
use std::process::Stdio;

use tokio::process::Command;

use df_core::config::BridgeConfig;
use df_core::error::BridgeError;

/// Invokes the `adb` executable against a specific ADB server
#[derive(Debug, Clone)]
pub struct AdbTool {
    program: String,
    host: String,
    port: u16,
}

impl AdbTool {
    /// Create a runner for `program` talking to `host:port`
    pub fn new(program: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            program: program.into(),
            host: host.into(),
            port,
        }
    }

    /// Create a runner from bridge configuration
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(&config.adb_path, &config.host, config.port)
    }

    /// Executable being run
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run `adb -H host -P port -s serial <args>` and return its stdout
    pub async fn run<I, A>(&self, serial: &str, args: I) -> Result<String, BridgeError>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<OsStr>,
    {
        let port = self.port.to_string();
        let mut command = Command::new(&self.program);
        command
            .args(["-H", self.host.as_str(), "-P", port.as_str(), "-s", serial])
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        tracing::debug!(program = %self.program, serial, "Running bridge tool");

        let output = command.output().await.map_err(|e| BridgeError::Tool {
            status: "not started".to_string(),
            stderr: format!("{}: {}", self.program, e),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            Ok(stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(BridgeError::Tool {
                status: output.status.to_string(),
                stderr: if stderr.is_empty() { stdout } else { stderr },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program() {
        let tool = AdbTool::new("droidfleet-no-such-adb", "127.0.0.1", 5037);
        match tool.run("emulator-5554", ["devices"]).await {
            Err(BridgeError::Tool { status, .. }) => assert_eq!(status, "not started"),
            other => panic!("Expected Tool error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_arguments_and_failure() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fake-adb");
        std::fs::write(
            &path,
            "#!/bin/sh\necho \"$@\"\n[ \"$7\" = push ] || { echo 'error: no such command' >&2; exit 1; }\n",
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let tool = AdbTool::new(path.display().to_string(), "127.0.0.1", 5037);
        let out = tool
            .run("10.0.0.5:5037", ["push", "a.txt", "/sdcard/a.txt"])
            .await
            .unwrap();
        assert_eq!(
            out.trim(),
            "-H 127.0.0.1 -P 5037 -s 10.0.0.5:5037 push a.txt /sdcard/a.txt"
        );

        match tool.run("10.0.0.5:5037", ["frobnicate"]).await {
            Err(BridgeError::Tool { stderr, .. }) => assert!(stderr.contains("no such command")),
            other => panic!("Expected Tool error, got {:?}", other),
        }
    }
}
