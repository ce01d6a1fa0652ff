//! Phase orchestration.
//!
//! A run is three phases in strict order:
//!
//! 1. **wake** - one broadcast carrying every hardware address
//! 2. **wait** - every readiness check retried concurrently until it connects
//! 3. **run** - every command retried concurrently until it exits zero
//!
//! Each unit of the wait and run phases gets its own task; a phase is over
//! only when every task has returned. Units retry without limit, so unless a
//! timeout or shutdown signal is attached a phase either succeeds or never
//! ends.

mod cancel;
mod phase;
mod worker;


pub use cancel::Cancellation;
pub use phase::{Phase, PhaseReport, PhaseState, RunSummary};
pub use worker::retry_until_success;

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::destination::DestinationSet;
use crate::error::Result;
use crate::probe::{ProbeFactory, ProbeResult, SystemProbes, Unit};
use crate::report::Reporter;
use crate::wake::WakeSender;

/// Default pause between attempts on the same unit.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Tunables for a run.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Pause between attempts on the same unit.
    pub interval: Duration,
    /// Per-phase limit. `None` retries forever.
    pub timeout: Option<Duration>,
    /// External shutdown, e.g. Ctrl-C.
    pub cancellation: Cancellation,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: None,
            cancellation: Cancellation::never(),
        }
    }
}

/// Drives the wake, wait and run phases for a destination set.
pub struct Orchestrator {
    waker: Arc<dyn WakeSender>,
    probes: Arc<dyn ProbeFactory>,
    reporter: Arc<dyn Reporter>,
    options: OrchestratorOptions,
}

impl Orchestrator {
    /// Creates an orchestrator using real TCP connections and processes.
    pub fn new(waker: Arc<dyn WakeSender>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            waker,
            probes: Arc::new(SystemProbes),
            reporter,
            options: OrchestratorOptions::default(),
        }
    }

    /// Replaces how probes are created.
    pub fn with_probes(mut self, probes: Arc<dyn ProbeFactory>) -> Self {
        self.probes = probes;
        self
    }

    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs all three phases.
    ///
    /// Only a failure to send the wake broadcast is returned as an error.
    /// Units that never succeed are reported through the summary.
    pub async fn run(&self, destinations: &DestinationSet) -> Result<RunSummary> {
        self.wake(&destinations.wake_targets).await?;

        let services = self.run_phase(Phase::Wait, Unit::services(destinations)).await;

        let commands = if services.is_succeeded() {
            self.run_phase(Phase::Run, Unit::commands(destinations)).await
        } else {
            warn!(
                pending = services.pending_count(),
                "Services not ready; skipping commands"
            );
            PhaseReport::pending(Phase::Run)
        };

        Ok(RunSummary {
            woken: destinations.wake_targets.clone(),
            services,
            commands,
        })
    }

    async fn wake(&self, targets: &[String]) -> Result<()> {
        self.reporter.wake_started(targets);
        if targets.is_empty() {
            info!("No devices to wake");
        } else {
            self.waker.send(targets).await?;
        }
        self.reporter.wake_finished(targets);
        Ok(())
    }

    /// Fans out one task per unit and waits for all of them.
    async fn run_phase(&self, phase: Phase, units: Vec<Unit>) -> PhaseReport {
        if units.is_empty() {
            return PhaseReport::collect(phase, Vec::new());
        }

        info!(phase = %phase, units = units.len(), "Phase started");
        self.reporter.phase_started(phase, &units);

        let mut cancel = self.options.cancellation.clone();
        if let Some(timeout) = self.options.timeout {
            cancel = cancel.with_timeout(timeout);
        }

        let mut tasks = JoinSet::new();
        for (index, unit) in units.iter().enumerate() {
            let probe = self.probes.probe(unit);
            let reporter = Arc::clone(&self.reporter);
            let unit = unit.clone();
            let interval = self.options.interval;
            let mut cancel = cancel.clone();

            tasks.spawn(async move {
                let result = retry_until_success(
                    phase,
                    index,
                    &unit,
                    probe.as_ref(),
                    interval,
                    reporter.as_ref(),
                    &mut cancel,
                )
                .await;
                (index, result)
            });
        }

        let mut results: Vec<Option<ProbeResult>> = units.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => error!(phase = %phase, error = %e, "Worker task failed"),
            }
        }

        let report = PhaseReport::collect(
            phase,
            units
                .into_iter()
                .zip(results)
                .map(|(unit, result)| {
                    let result = result.unwrap_or_else(|| {
                        let mut lost = ProbeResult::start();
                        lost.abandon();
                        lost
                    });
                    (unit, result)
                })
                .collect(),
        );

        if !report.is_succeeded() {
            warn!(
                phase = %phase,
                pending = report.pending_count(),
                "Phase abandoned before every unit succeeded"
            );
        }
        self.reporter.phase_finished(&report);
        report
    }
}
