//! Line-oriented reporter for pipes and log files.

use tracing::{debug, info, warn};

use super::{progress_text, status_text, Reporter};
use crate::orchestrator::{Phase, PhaseReport};
use crate::probe::{ProbeResult, Unit};

/// The line printed for a unit that succeeded.
fn line(unit: &Unit, result: &ProbeResult) -> String {
    format!(
        "{:<21}\t{}\t{}",
        unit.to_string(),
        status_text(unit, result),
        progress_text(result)
    )
}

/// Prints one line per unit once it is done; retries go to the debug log.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainReporter;

impl Reporter for PlainReporter {
    fn wake_finished(&self, targets: &[String]) {
        if !targets.is_empty() {
            println!("Sent WOL magic packet to {} device(s)", targets.len());
        }
    }

    fn report(&self, phase: Phase, _index: usize, unit: &Unit, result: &ProbeResult) {
        if result.succeeded {
            println!("{}", line(unit, result));
        } else if result.is_finished() {
            warn!(
                phase = %phase,
                unit = %unit,
                attempts = result.attempts,
                elapsed_ms = result.elapsed().as_millis() as u64,
                "Gave up"
            );
        } else {
            debug!(
                phase = %phase,
                unit = %unit,
                attempt = result.attempts,
                error = result.last_error.as_deref().unwrap_or_default(),
                "Not ready yet"
            );
        }
    }

    fn phase_finished(&self, report: &PhaseReport) {
        info!(
            phase = %report.phase,
            state = %report.state,
            units = report.units.len(),
            "Phase finished"
        );
    }
}
