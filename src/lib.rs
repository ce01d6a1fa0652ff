//! wakeandwait - Wake hosts and wait for their services
//!
//! This crate wakes machines with Wake-on-LAN magic packets, waits until
//! their TCP services accept connections, and then runs follow-up commands
//! until they succeed.
//!
//! # Overview
//!
//! Command-line tokens (and saved aliases) are resolved into a
//! [`DestinationSet`]: hardware addresses to wake, `host:port` readiness
//! checks, and commands. The [`Orchestrator`] then runs three phases in
//! order, each unit of a phase retried concurrently until it succeeds.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface definitions
//! - [`config`] - Layered configuration and the alias table
//! - [`destination`] - Token classification and alias resolution
//! - [`error`] - Error types and exit codes
//! - [`notify`] - Desktop notification on completion
//! - [`orchestrator`] - Phase sequencing and per-unit retry
//! - [`probe`] - Single TCP and command attempts
//! - [`report`] - Progress display
//! - [`wake`] - Magic packet construction and broadcast

pub mod cli;
pub mod config;
pub mod destination;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod probe;
pub mod report;
pub mod wake;

// Re-exports for convenience
pub use cli::Cli;
pub use config::{Config, ConfigStore};
pub use destination::{DestinationSet, ReadinessCheck, Resolution, Resolver};
pub use error::{Result, WakeWaitError};
pub use orchestrator::{Orchestrator, OrchestratorOptions, RunSummary};
pub use wake::{MagicPacketSender, WakeSender};
