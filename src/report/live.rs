//! Live terminal reporter built on indicatif spinners.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::{progress_text, status_text, Reporter};
use crate::orchestrator::{Phase, PhaseReport};
use crate::probe::{ProbeResult, Unit};

const TICK: Duration = Duration::from_millis(80);
const PULSE: &[&str] = &["·", "•", "●", "•", "·"];

fn message(unit: &Unit, result: &ProbeResult) -> String {
    format!(
        "{:<21} {} {}",
        unit.to_string(),
        status_text(unit, result),
        progress_text(result)
    )
}

/// One spinner per unit plus one for the wake broadcast.
pub struct LiveReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<(Phase, usize), ProgressBar>>,
}

impl LiveReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn spinner(&self) -> ProgressBar {
        let style = ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(PULSE);

        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(style);
        bar.enable_steady_tick(TICK);
        bar
    }

    fn done_style() -> ProgressStyle {
        ProgressStyle::with_template("{prefix:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn failed_style() -> ProgressStyle {
        ProgressStyle::with_template("{prefix:.red} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar(&self, phase: Phase, index: usize) -> Option<ProgressBar> {
        self.bars
            .lock()
            .ok()
            .and_then(|bars| bars.get(&(phase, index)).cloned())
    }
}

impl Default for LiveReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for LiveReporter {
    fn wake_started(&self, targets: &[String]) {
        let bar = self.spinner();
        if targets.is_empty() {
            bar.set_message("No devices to wake");
        } else {
            bar.set_message(format!(
                "Sending WOL magic packet to {} devices ...",
                targets.len()
            ));
        }
        if let Ok(mut bars) = self.bars.lock() {
            bars.insert((Phase::Wake, 0), bar);
        }
    }

    fn wake_finished(&self, targets: &[String]) {
        if let Some(bar) = self.bar(Phase::Wake, 0) {
            bar.set_style(Self::done_style());
            bar.set_prefix("✔");
            if targets.is_empty() {
                bar.finish();
            } else {
                bar.finish_with_message("Sent WOL magic packet");
            }
        }
    }

    fn phase_started(&self, phase: Phase, units: &[Unit]) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        for (index, unit) in units.iter().enumerate() {
            let bar = self.spinner();
            bar.set_message(format!("{:<21} Connecting ...", unit.to_string()));
            bars.insert((phase, index), bar);
        }
    }

    fn report(&self, phase: Phase, index: usize, unit: &Unit, result: &ProbeResult) {
        let Some(bar) = self.bar(phase, index) else {
            return;
        };

        let message = message(unit, result);

        if result.succeeded {
            bar.set_style(Self::done_style());
            bar.set_prefix("✔");
            bar.finish_with_message(message);
        } else if result.is_finished() {
            bar.set_style(Self::failed_style());
            bar.set_prefix("✘");
            bar.abandon_with_message(message);
        } else {
            bar.set_message(message);
        }
    }

    fn phase_finished(&self, report: &PhaseReport) {
        if let Ok(mut bars) = self.bars.lock() {
            bars.retain(|(phase, _), _| *phase != report.phase);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::ReadinessCheck;
    use indicatif::ProgressDrawTarget;

    fn hidden() -> LiveReporter {
        let reporter = LiveReporter::new();
        reporter.multi.set_draw_target(ProgressDrawTarget::hidden());
        reporter
    }

    #[test]
    fn test_bars_follow_phase_lifecycle() {
        let reporter = hidden();
        let units = vec![
            Unit::Service(ReadinessCheck::new("a", 22)),
            Unit::Service(ReadinessCheck::new("b", 22)),
        ];

        reporter.phase_started(Phase::Wait, &units);
        assert!(reporter.bar(Phase::Wait, 1).is_some());

        let mut result = ProbeResult::start();
        result.record_attempt();
        result.record_success("SSH-2.0-Test".into());
        reporter.report(Phase::Wait, 0, &units[0], &result);
        assert!(reporter.bar(Phase::Wait, 0).unwrap().is_finished());

        reporter.phase_finished(&PhaseReport::collect(
            Phase::Wait,
            vec![(units[0].clone(), result)],
        ));
        assert!(reporter.bar(Phase::Wait, 0).is_none());
    }

    #[test]
    fn test_message_shows_attempts_and_elapsed() {
        let unit = Unit::Command("true".into());
        let mut result = ProbeResult::start();
        result.record_attempt();
        result.record_success(String::new());
        assert_eq!(message(&unit, &result), "true                  Done #1 0.0s");

        let reporter = hidden();
        reporter.phase_started(Phase::Run, std::slice::from_ref(&unit));
        reporter.report(Phase::Run, 0, &unit, &result);
        let bar = reporter.bar(Phase::Run, 0).unwrap();
        assert_eq!(bar.message(), "true                  Done #1 0.0s");
    }

    #[test]
    fn test_report_for_unknown_unit_is_ignored() {
        let reporter = hidden();
        reporter.report(
            Phase::Run,
            7,
            &Unit::Command("true".into()),
            &ProbeResult::start(),
        );
    }

    #[test]
    fn test_wake_spinner() {
        let reporter = hidden();
        let targets = vec!["AA:BB:CC:DD:EE:FF".to_string()];
        reporter.wake_started(&targets);
        reporter.wake_finished(&targets);
        assert!(reporter.bar(Phase::Wake, 0).unwrap().is_finished());
    }
}
