//! Desktop notification on completion.
//!
//! Notifications are fire-and-forget: a missing notifier binary or a failed
//! invocation is logged and otherwise ignored.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::probe::Unit;

const TITLE: &str = "wakeandwait";

/// Tells the user which services came up.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, ready: &[Unit]);
}

/// Does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _ready: &[Unit]) {}
}

/// Notification body for the given ready services, or `None` if there is
/// nothing to announce.
pub fn message(ready: &[Unit]) -> Option<String> {
    if ready.is_empty() {
        return None;
    }
    let names = ready
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!("Ready: {}", names))
}

/// Uses the platform's notification tool.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    program: String,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        let program = if cfg!(target_os = "macos") {
            "osascript"
        } else {
            "notify-send"
        };
        Self::with_program(program)
    }

    /// Uses a specific binary, called the same way as the platform default.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(&self, body: &str) -> Vec<String> {
        if self.program == "osascript" {
            vec![
                "-e".to_string(),
                format!(
                    "display notification {:?} with title {:?}",
                    body, TITLE
                ),
            ]
        } else {
            vec![TITLE.to_string(), body.to_string()]
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, ready: &[Unit]) {
        let Some(body) = message(ready) else {
            debug!("Nothing to notify");
            return;
        };

        let output = Command::new(&self.program)
            .args(self.args(&body))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                debug!(program = %self.program, "Notification sent");
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!(
                    program = %self.program,
                    exit_code = output.status.code(),
                    stderr = %stderr.trim(),
                    "Notification failed"
                );
            }
            Err(e) => warn!(program = %self.program, error = %e, "Failed to run notifier"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::ReadinessCheck;

    #[test]
    fn test_message_lists_services() {
        let ready = vec![
            Unit::Service(ReadinessCheck::new("nas", 22)),
            Unit::Service(ReadinessCheck::new("web", 80)),
        ];
        assert_eq!(message(&ready).unwrap(), "Ready: nas:22, web:80");
        assert!(message(&[]).is_none());
    }

    #[test]
    fn test_notify_send_args() {
        let notifier = DesktopNotifier::with_program("notify-send");
        assert_eq!(notifier.args("Ready: nas:22"), vec!["wakeandwait", "Ready: nas:22"]);
    }

    #[test]
    fn test_osascript_args_are_quoted() {
        let notifier = DesktopNotifier::with_program("osascript");
        let args = notifier.args("Ready: \"nas\":22");
        assert_eq!(args[0], "-e");
        assert_eq!(
            args[1],
            "display notification \"Ready: \\\"nas\\\":22\" with title \"wakeandwait\""
        );
    }

    #[tokio::test]
    async fn test_noop_notifier_as_trait_object() {
        let notifier: Box<dyn Notifier> = Box::new(NoopNotifier);
        notifier
            .notify(&[Unit::Service(ReadinessCheck::new("nas", 22))])
            .await;
    }

    #[tokio::test]
    async fn test_missing_program_is_ignored() {
        let notifier = DesktopNotifier::with_program("wakeandwait-no-such-notifier");
        notifier
            .notify(&[Unit::Service(ReadinessCheck::new("nas", 22))])
            .await;
    }

    #[tokio::test]
    async fn test_failing_program_is_ignored() {
        DesktopNotifier::with_program("false")
            .notify(&[Unit::Service(ReadinessCheck::new("nas", 22))])
            .await;
    }
}
