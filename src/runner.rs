use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::error::ProbeFailure;
use crate::host::{ProbeOutcome, TargetAddress};

/// Echo requests sent per probe. Fixed so `ping` always terminates on its own.
pub const PROBE_COUNT: u32 = 4;

#[cfg(target_os = "android")]
pub const DEFAULT_PING_PATH: &str = "/system/bin/ping";

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
))]
pub const DEFAULT_PING_PATH: &str = "/sbin/ping";

#[cfg(not(any(
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
)))]
pub const DEFAULT_PING_PATH: &str = "/bin/ping";

/// Resolved settings handed to the probe core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub ping_path: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ping_path: PathBuf::from(DEFAULT_PING_PATH),
        }
    }
}

/// Runs the system `ping` utility and collects what it printed.
#[derive(Debug, Clone)]
pub struct ProbeRunner {
    ping_path: PathBuf,
}

impl ProbeRunner {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            ping_path: config.ping_path.clone(),
        }
    }

    /// Spawns `ping -c 4 <target>`, drains stdout and stderr to EOF, then reaps
    /// the process.
    ///
    /// No timeout is imposed here; the fixed count makes `ping` exit on its own.
    /// Spawn and stream errors are returned untouched for the classifier.
    pub async fn run(&self, target: &TargetAddress) -> Result<ProbeOutcome, ProbeFailure> {
        let count = PROBE_COUNT.to_string();
        debug!(
            program = %self.ping_path.display(),
            args = ?["-c", count.as_str(), target.as_str()],
            resolved = ?target.addrs,
            "spawning ping"
        );

        let mut child = Command::new(&self.ping_path)
            .arg("-c")
            .arg(&count)
            .arg(target.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProbeFailure::Other("ping stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ProbeFailure::Other("ping stderr was not captured".to_string()))?;

        // Both pipes must reach EOF before wait(), and they are drained together so a
        // burst on one cannot stall the child while the other is being read.
        let (stdout, stderr) = tokio::try_join!(drain(stdout), drain(stderr))?;

        let status = child.wait().await?;
        let exit_code = exit_code(status);
        debug!(host = %target, exit_code, "ping exited");

        Ok(ProbeOutcome::new(exit_code, stdout, stderr, target.name.clone()))
    }
}

async fn drain<R: AsyncRead + Unpin>(stream: R) -> std::io::Result<String> {
    let mut reader = BufReader::new(stream);
    let mut text = String::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        while matches!(line.last(), Some(b'\n') | Some(b'\r')) {
            line.pop();
        }
        text.push_str(&String::from_utf8_lossy(&line));
        text.push('\n');
    }

    Ok(text)
}

// Killed by a signal means no exit code.
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
