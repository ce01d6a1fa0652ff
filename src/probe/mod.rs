//! Probes - single readiness attempts.
//!
//! A probe performs exactly one attempt and reports the outcome. Retrying is
//! the orchestrator's job; probes never loop.

pub mod command;
pub mod tcp;


use async_trait::async_trait;
use std::fmt;
use std::time::{Duration, Instant};

use crate::destination::{DestinationSet, ReadinessCheck};
use crate::error::ProbeError;

pub use command::CommandProbe;
pub use tcp::{ReadinessProbe, BANNER_LIMIT, BANNER_TIMEOUT};

/// A single attempt at reaching a unit of work.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Performs one attempt. `Ok` carries the captured output (banner or
    /// stdout), which may be empty.
    async fn attempt(&self) -> Result<String, ProbeError>;
}

/// One independent unit of work within a phase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Unit {
    /// Wait until a TCP connection succeeds.
    Service(ReadinessCheck),
    /// Run until the command exits with status zero.
    Command(String),
}

impl Unit {
    /// Units of the wait phase, in destination order.
    pub fn services(destinations: &DestinationSet) -> Vec<Unit> {
        destinations
            .readiness_checks
            .iter()
            .cloned()
            .map(Unit::Service)
            .collect()
    }

    /// Units of the run phase, in destination order.
    pub fn commands(destinations: &DestinationSet) -> Vec<Unit> {
        destinations
            .commands
            .iter()
            .cloned()
            .map(Unit::Command)
            .collect()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Service(check) => write!(f, "{}", check),
            Unit::Command(command) => write!(f, "{}", command),
        }
    }
}

/// Creates the probe for a unit.
pub trait ProbeFactory: Send + Sync {
    fn probe(&self, unit: &Unit) -> Box<dyn Probe>;
}

/// Real network connections and child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbes;

impl ProbeFactory for SystemProbes {
    fn probe(&self, unit: &Unit) -> Box<dyn Probe> {
        match unit {
            Unit::Service(check) => Box::new(ReadinessProbe::new(&check.host, check.port)),
            Unit::Command(command) => Box::new(CommandProbe::new(command)),
        }
    }
}

/// Progress of one unit, written only by the task retrying it.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// Attempts made so far.
    pub attempts: u32,
    /// Whether an attempt has succeeded.
    pub succeeded: bool,
    /// Output captured by the successful attempt.
    pub last_output: Option<String>,
    /// Cause of the most recent failed attempt.
    pub last_error: Option<String>,
    started: Instant,
    finished: Option<Duration>,
}

impl ProbeResult {
    /// Starts the clock for a unit entering its phase.
    pub fn start() -> Self {
        Self {
            attempts: 0,
            succeeded: false,
            last_output: None,
            last_error: None,
            started: Instant::now(),
            finished: None,
        }
    }

    /// Time since the unit's wait began, frozen once it succeeds or is
    /// abandoned.
    pub fn elapsed(&self) -> Duration {
        self.finished.unwrap_or_else(|| self.started.elapsed())
    }

    /// Returns true once no further attempts will be made.
    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    pub(crate) fn record_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }

    pub(crate) fn record_success(&mut self, output: String) {
        self.succeeded = true;
        self.last_output = Some(output);
        self.finished = Some(self.started.elapsed());
    }

    pub(crate) fn record_failure(&mut self, error: &ProbeError) {
        self.last_error = Some(error.to_string());
    }

    pub(crate) fn abandon(&mut self) {
        if self.finished.is_none() {
            self.finished = Some(self.started.elapsed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_from_destinations() {
        let set = DestinationSet {
            wake_targets: vec!["AA:BB:CC:DD:EE:FF".into()],
            readiness_checks: vec![ReadinessCheck::new("a", 22), ReadinessCheck::new("b", 80)],
            commands: vec!["true".into()],
        };

        assert_eq!(
            Unit::services(&set),
            vec![
                Unit::Service(ReadinessCheck::new("a", 22)),
                Unit::Service(ReadinessCheck::new("b", 80)),
            ]
        );
        assert_eq!(Unit::commands(&set), vec![Unit::Command("true".into())]);
    }

    #[test]
    fn test_unit_display() {
        assert_eq!(
            Unit::Service(ReadinessCheck::new("nas", 22)).to_string(),
            "nas:22"
        );
        assert_eq!(Unit::Command("echo hi".into()).to_string(), "echo hi");
    }

    #[test]
    fn test_probe_result_lifecycle() {
        let mut result = ProbeResult::start();
        assert_eq!(result.attempts, 0);
        assert!(!result.succeeded);
        assert!(!result.is_finished());

        result.record_attempt();
        result.record_failure(&ProbeError::InvalidCommand {
            command: "'".into(),
            reason: "missing closing quote".into(),
        });
        assert!(result.last_error.as_deref().unwrap().contains("missing closing quote"));
        assert!(!result.succeeded);

        result.record_attempt();
        result.record_success("SSH-2.0-OpenSSH_9.6\r\n".into());
        assert_eq!(result.attempts, 2);
        assert!(result.succeeded);
        assert!(result.is_finished());

        let frozen = result.elapsed();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(result.elapsed(), frozen);
    }

    #[test]
    fn test_attempt_count_saturates() {
        let mut result = ProbeResult::start();
        result.attempts = u32::MAX;
        result.record_attempt();
        assert_eq!(result.attempts, u32::MAX);
    }

    #[test]
    fn test_abandon_keeps_failure_state() {
        let mut result = ProbeResult::start();
        result.record_attempt();
        result.abandon();
        assert!(result.is_finished());
        assert!(!result.succeeded);
    }
}
