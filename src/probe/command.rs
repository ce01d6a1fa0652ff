//! Command probe.
//!
//! Runs a command line once and reports success iff it exits with status
//! zero. The line is split with shell-word rules but not run through a
//! shell, so pipes and redirections need an explicit `sh -c '...'`.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::Probe;
use crate::error::ProbeError;

/// Runs a command line to completion.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    command_line: String,
}

impl CommandProbe {
    pub fn new(command_line: impl Into<String>) -> Self {
        Self {
            command_line: command_line.into(),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> ProbeError {
        ProbeError::InvalidCommand {
            command: self.command_line.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Probe for CommandProbe {
    async fn attempt(&self) -> Result<String, ProbeError> {
        let parts = shell_words::split(&self.command_line).map_err(|e| self.invalid(e.to_string()))?;
        let (program, args) = parts
            .split_first()
            .ok_or_else(|| self.invalid("empty command"))?;

        debug!(command = %self.command_line, "Executing command");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // abandoned attempts must not leave the child running
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ProbeError::Launch {
                command: self.command_line.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        debug!(
            command = %self.command_line,
            exit_code = output.status.code(),
            "Command completed"
        );

        if output.status.success() {
            return Ok(stdout.into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = match (stdout.trim(), stderr.trim()) {
            (out, "") => out.to_string(),
            ("", err) => err.to_string(),
            (out, err) => format!("{}\n{}", out, err),
        };

        Err(ProbeError::ExitStatus {
            command: self.command_line.clone(),
            code: output.status.code(),
            output: combined,
        })
    }
}
