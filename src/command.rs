//! Scoped execution of external tools with a hard deadline.
//!
//! Every ffmpeg/ffprobe invocation in the pipeline goes through
//! [`ToolCommand`]. The child is spawned with `kill_on_drop`, so when the
//! deadline elapses and the wait future is dropped, the OS process is
//! terminated rather than left running.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;

use crate::error::{Error, Result};

/// Output captured from a completed tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for a single external tool invocation.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(300),
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, s: impl Into<String>) -> Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the kill deadline.
    pub fn timeout(mut self, d: Duration) -> Self {
        self.timeout = d;
        self
    }

    fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Run the command to completion, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Process`] if the process cannot be spawned, exits
    /// non-zero (message carries the exit status and trimmed stderr), or
    /// outlives its deadline (the child is killed via `kill_on_drop`).
    pub async fn execute(&self) -> Result<ToolOutput> {
        let tool = self.tool_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| Error::process(&tool, format!("failed to spawn: {e}")))?;

        let result = tokio::time::timeout(self.timeout, child.wait_with_output()).await;

        match result {
            Ok(Ok(output)) => {
                let tool_output = ToolOutput {
                    status: output.status,
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                if !output.status.success() {
                    return Err(Error::process(
                        &tool,
                        format!(
                            "exited with status {}: {}",
                            output.status,
                            tool_output.stderr.trim()
                        ),
                    ));
                }

                Ok(tool_output)
            }
            Ok(Err(e)) => Err(Error::process(
                &tool,
                format!("I/O error waiting for process: {e}"),
            )),
            Err(_elapsed) => {
                // Deadline hit: the wait future (and the child handle inside
                // it) was dropped, which kills the process.
                Err(Error::process(
                    &tool,
                    format!("killed after exceeding {:?}", self.timeout),
                ))
            }
        }
    }
}

/// Availability report for one external tool.
#[derive(Debug)]
pub struct ToolStatus {
    pub name: String,
    pub available: bool,
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// Resolve the configured ffmpeg/ffprobe binaries and query their versions.
pub fn check_tools(tools: &crate::config::ToolsConfig) -> Vec<ToolStatus> {
    [&tools.ffmpeg, &tools.ffprobe]
        .into_iter()
        .map(|program| {
            let name = program
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| program.to_string_lossy().to_string());

            let path = which::which(program).ok();
            let version = path.as_ref().and_then(|p| {
                std::process::Command::new(p)
                    .arg("-version")
                    .output()
                    .ok()
                    .filter(|out| out.status.success())
                    .map(|out| String::from_utf8_lossy(&out.stdout).to_string())
            });

            ToolStatus {
                name,
                available: path.is_some(),
                version,
                path,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn execute_echo() {
        let output = ToolCommand::new("echo").arg("hello").execute().await;

        match output {
            Ok(out) => {
                assert!(out.status.success());
                assert!(out.stdout.trim().contains("hello"));
            }
            Err(_) => {
                // Minimal environments may lack echo; skip.
            }
        }
    }

    #[tokio::test]
    async fn execute_nonexistent_tool() {
        let result = ToolCommand::new("nonexistent_tool_xyz_12345").execute().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn nonzero_exit_is_an_error() {
        let result = ToolCommand::new("false").execute().await;
        match result {
            Err(crate::error::Error::Process { tool, message }) => {
                assert_eq!(tool, "false");
                assert!(message.contains("exited with status"));
            }
            Err(_) => {} // false unavailable, spawn error is fine
            Ok(_) => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn deadline_kills_the_child() {
        let result = ToolCommand::new("sleep")
            .arg("10")
            .timeout(Duration::from_millis(100))
            .execute()
            .await;
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("killed after"), "unexpected error: {err}");
    }
}
