//! Progress reporting.
//!
//! The orchestrator pushes every state change of every unit to a
//! [`Reporter`]. Reporters only observe; nothing they do affects the outcome
//! of a run.

mod live;
mod plain;

pub use live::LiveReporter;
pub use plain::PlainReporter;

use std::io::IsTerminal;
use std::sync::Arc;

use crate::orchestrator::{Phase, PhaseReport};
use crate::probe::{ProbeResult, Unit};

/// Receives progress from the orchestrator.
///
/// Called concurrently from every worker; implementations must tolerate
/// interleaved updates for different units.
pub trait Reporter: Send + Sync {
    /// The wake broadcast is about to be sent.
    fn wake_started(&self, _targets: &[String]) {}

    /// The wake broadcast was sent.
    fn wake_finished(&self, _targets: &[String]) {}

    /// A phase is about to fan out its units.
    fn phase_started(&self, _phase: Phase, _units: &[Unit]) {}

    /// A unit made an attempt, succeeded, or was abandoned.
    fn report(&self, phase: Phase, index: usize, unit: &Unit, result: &ProbeResult);

    /// Every unit of a phase is done.
    fn phase_finished(&self, _report: &PhaseReport) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn report(&self, _phase: Phase, _index: usize, _unit: &Unit, _result: &ProbeResult) {}
}

/// Picks the reporter for the current process: nothing when quiet, live
/// spinners on a terminal, plain lines otherwise.
pub fn select(quiet: bool) -> Arc<dyn Reporter> {
    if quiet {
        Arc::new(NoopReporter)
    } else if std::io::stderr().is_terminal() {
        Arc::new(LiveReporter::new())
    } else {
        Arc::new(PlainReporter)
    }
}

/// One-line description of a unit's current state.
pub fn status_text(unit: &Unit, result: &ProbeResult) -> String {
    if result.succeeded {
        let output = result.last_output.as_deref().unwrap_or_default().trim();
        if output.is_empty() {
            match unit {
                Unit::Service(_) => "Connected".to_string(),
                Unit::Command(_) => "Done".to_string(),
            }
        } else {
            output.lines().map(str::trim_end).collect::<Vec<_>>().join("|")
        }
    } else if let Some(error) = &result.last_error {
        error.clone()
    } else {
        match unit {
            Unit::Service(_) => "Connecting ...".to_string(),
            Unit::Command(_) => "Running ...".to_string(),
        }
    }
}

/// Attempt count and time spent, e.g. `#3 2.0s`.
pub fn progress_text(result: &ProbeResult) -> String {
    format!(
        "#{} {:.1}s",
        result.attempts,
        result.elapsed().as_secs_f64()
    )
}
