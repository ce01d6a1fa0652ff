//! Phase and run outcome types.

use std::fmt;

use crate::error::exit_code;
use crate::probe::{ProbeResult, Unit};

/// The three ordered stages of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Broadcast magic packets.
    Wake,
    /// Poll readiness checks.
    Wait,
    /// Run commands.
    Run,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Wake => write!(f, "wake"),
            Phase::Wait => write!(f, "wait"),
            Phase::Run => write!(f, "run"),
        }
    }
}

/// Lifecycle of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    /// Not started (or skipped because an earlier phase failed).
    Pending,
    /// Units are being retried.
    Running,
    /// Every unit succeeded.
    Succeeded,
    /// The phase was cut short before every unit succeeded.
    Abandoned,
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseState::Pending => write!(f, "pending"),
            PhaseState::Running => write!(f, "running"),
            PhaseState::Succeeded => write!(f, "succeeded"),
            PhaseState::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// Outcome of the wait or run phase.
#[derive(Debug, Clone)]
pub struct PhaseReport {
    pub phase: Phase,
    pub state: PhaseState,
    /// Every unit with its final result, in destination order.
    pub units: Vec<(Unit, ProbeResult)>,
}

impl PhaseReport {
    /// A phase that never ran.
    pub fn pending(phase: Phase) -> Self {
        Self {
            phase,
            state: PhaseState::Pending,
            units: Vec::new(),
        }
    }

    /// Builds the report from collected results.
    pub fn collect(phase: Phase, units: Vec<(Unit, ProbeResult)>) -> Self {
        let state = if units.iter().all(|(_, r)| r.succeeded) {
            PhaseState::Succeeded
        } else {
            PhaseState::Abandoned
        };
        Self {
            phase,
            state,
            units,
        }
    }

    pub fn is_succeeded(&self) -> bool {
        self.state == PhaseState::Succeeded
    }

    /// Units that succeeded.
    pub fn succeeded(&self) -> impl Iterator<Item = &Unit> {
        self.units
            .iter()
            .filter(|(_, r)| r.succeeded)
            .map(|(unit, _)| unit)
    }

    /// Number of units that did not succeed.
    pub fn pending_count(&self) -> usize {
        self.units.iter().filter(|(_, r)| !r.succeeded).count()
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Hardware addresses the wake broadcast was sent to.
    pub woken: Vec<String>,
    pub services: PhaseReport,
    pub commands: PhaseReport,
}

impl RunSummary {
    /// Returns true when every phase that has work succeeded.
    pub fn is_success(&self) -> bool {
        self.exit_code() == exit_code::SUCCESS
    }

    /// Process exit code for this run.
    pub fn exit_code(&self) -> i32 {
        match (self.services.state, self.commands.state) {
            (PhaseState::Abandoned, _) => exit_code::SERVICE_FAILURE,
            (_, PhaseState::Abandoned) => exit_code::COMMAND_FAILURE,
            _ => exit_code::SUCCESS,
        }
    }
}
