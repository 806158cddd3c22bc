use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::config::RunnerConfig;
use crate::error::ProcessError;
use crate::util::RingBytes;

use super::io_pump::{self, LineStream, LineTap};
use super::traits::CommandRunner;
use super::types::ProcessOutcome;

/// Runs commands through the platform shell (`sh -c` / `cmd /C`).
#[derive(Debug, Clone)]
pub struct ShellRunner {
    capture_bytes: usize,
    line_channel_capacity: usize,
}

impl ShellRunner {
    pub fn new(cfg: &RunnerConfig) -> Self {
        Self {
            capture_bytes: cfg.capture_bytes,
            line_channel_capacity: cfg.line_channel_capacity.max(1),
        }
    }

    fn command(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(&RunnerConfig::default())
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    fn name(&self) -> &str {
        "shell"
    }

    #[tracing::instrument(name = "runner.exec", skip(self, cwd), fields(cwd = %cwd.display()))]
    async fn exec(&self, command: &str, cwd: &Path) -> Result<ProcessOutcome, ProcessError> {
        let started_at = Instant::now();
        let mut child = Self::command(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ProcessError::spawn(command, e))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ProcessError::spawn(command, std::io::Error::other("no stdout"))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            ProcessError::spawn(command, std::io::Error::other("no stderr"))
        })?;

        let ring_out = RingBytes::new(self.capture_bytes);
        let ring_err = RingBytes::new(self.capture_bytes);

        let (line_tx, mut line_rx) = mpsc::channel::<LineTap>(self.line_channel_capacity);
        let out_task = io_pump::pump_stdout(stdout, ring_out.clone(), line_tx.clone());
        let err_task = io_pump::pump_stderr(stderr, ring_err.clone(), line_tx);

        // Both senders live in the pump tasks; the channel closes once the child
        // has closed both pipes.
        while let Some(tap) = line_rx.recv().await {
            match tap.stream {
                LineStream::Stdout => {
                    tracing::debug!(target: "sitegen.process", stream = "stdout", "{}", tap.line)
                }
                LineStream::Stderr => {
                    tracing::warn!(target: "sitegen.process", stream = "stderr", "{}", tap.line)
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| ProcessError::spawn(command, e))?;

        for (task, label) in [(out_task, "stdout"), (err_task, "stderr")] {
            match task.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(ProcessError::stream(command, label, e)),
                Err(e) => {
                    return Err(ProcessError::stream(
                        command,
                        label,
                        std::io::Error::other(e.to_string()),
                    ))
                }
            }
        }

        let signal = exit_signal(&status);
        let stderr_tail = ring_err.to_string_lossy();

        let Some(code) = status.code() else {
            tracing::error!(command = %command, signal = ?signal, "child process terminated by signal");
            return Err(ProcessError::signaled(command, signal, stderr_tail));
        };

        if code != 0 {
            tracing::error!(command = %command, code, "child process exited with non-zero code");
            return Err(ProcessError::non_zero(command, code, signal, stderr_tail));
        }

        tracing::info!("Child process exec '{}' with exit code {}", command, code);

        Ok(ProcessOutcome {
            command: command.to_string(),
            exit_code: code,
            duration_ms: started_at.elapsed().as_millis() as u64,
            stdout_tail: ring_out.to_string_lossy(),
            stderr_tail,
        })
    }
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::ProcessErrorKind;

    #[tokio::test]
    async fn zero_exit_with_stderr_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ShellRunner::default();

        let outcome = runner
            .exec("echo out; echo warn 1>&2", dir.path())
            .await
            .expect("zero exit must succeed");

        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.stdout_tail.trim(), "out");
        assert_eq!(outcome.stderr_tail.trim(), "warn");
    }

    #[tokio::test]
    async fn non_zero_exit_carries_command_and_code() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ShellRunner::default();

        let err = runner
            .exec("echo nope 1>&2; exit 3", dir.path())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ProcessErrorKind::NonZeroExit);
        assert_eq!(err.command, "echo nope 1>&2; exit 3");
        assert_eq!(err.code, Some(3));
        assert!(err.message.contains("nope"));
    }

    #[tokio::test]
    async fn runs_in_the_given_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
        let runner = ShellRunner::default();

        let outcome = runner.exec("cat marker.txt", dir.path()).await.unwrap();
        assert_eq!(outcome.stdout_tail, "here");
    }

    #[tokio::test]
    async fn missing_cwd_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ShellRunner::default();

        let err = runner
            .exec("true", &dir.path().join("absent"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ProcessErrorKind::Spawn);
        assert_eq!(err.command, "true");
    }
}
