//! Error types and error handling for wakeandwait.
//!
//! This module defines the error taxonomy used throughout the application:
//! resolution errors (non-fatal, collected), probe errors (per attempt,
//! retried), and the crate-wide error that maps to CLI exit codes.

use thiserror::Error;

/// CLI exit codes.
pub mod exit_code {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// A service never became reachable (also used for transport failures)
    pub const SERVICE_FAILURE: i32 = 1;
    /// A command never completed successfully
    pub const COMMAND_FAILURE: i32 = 2;
    /// Nothing to wake, wait for, or run
    pub const NO_DESTINATIONS: i32 = 2;
    /// Configuration error
    pub const CONFIG_ERROR: i32 = 2;
}

/// The main error type for wakeandwait.
#[derive(Debug, Error)]
pub enum WakeWaitError {
    /// Configuration file is invalid or cannot be loaded/saved.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Sending the wake broadcast failed.
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A wake target could not be parsed into a hardware address.
    #[error("Invalid hardware address: {address}")]
    InvalidHardwareAddress { address: String },

    /// Resolution produced nothing to do.
    #[error("No destinations given and no default alias configured")]
    NoDestinations,

    /// Some readiness checks never succeeded.
    #[error("{pending} service(s) did not become ready")]
    ServicesNotReady { pending: usize },

    /// Some commands never exited successfully.
    #[error("{pending} command(s) did not complete")]
    CommandsNotCompleted { pending: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl WakeWaitError {
    /// Returns the CLI exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            WakeWaitError::Config { .. } | WakeWaitError::Yaml(_) => exit_code::CONFIG_ERROR,
            WakeWaitError::NoDestinations => exit_code::NO_DESTINATIONS,
            WakeWaitError::CommandsNotCompleted { .. } => exit_code::COMMAND_FAILURE,
            WakeWaitError::ServicesNotReady { .. }
            | WakeWaitError::Transport { .. }
            | WakeWaitError::InvalidHardwareAddress { .. }
            | WakeWaitError::Io(_) => exit_code::SERVICE_FAILURE,
        }
    }

    /// Messages of the underlying causes, outermost first.
    pub fn causes(&self) -> Vec<String> {
        let mut causes = Vec::new();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        causes
    }

    /// Creates a configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        WakeWaitError::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a configuration error with a message and source.
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        WakeWaitError::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a transport error with a message and source.
    pub fn transport_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        WakeWaitError::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Problems found while expanding aliases.
///
/// These are collected next to the resolved destinations; the offending
/// entry is skipped and resolution carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The alias value is neither an alias name nor a destination set.
    #[error("Alias '{name}' has an unusable definition")]
    MalformedAlias { name: String },

    /// Following the alias chain leads back to an alias already visited.
    #[error("Alias cycle detected: {}", .chain.join(" -> "))]
    AliasCycle { chain: Vec<String> },
}

/// Failure of a single probe attempt.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The TCP connection could not be established or the banner read failed.
    #[error("{source}")]
    Connect {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// The command line could not be split into words.
    #[error("Cannot parse command '{command}': {reason}")]
    InvalidCommand { command: String, reason: String },

    /// The process could not be started.
    #[error("Failed to start '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited unsuccessfully.
    #[error("'{command}' exited with {}: {output}", .code.map_or_else(|| "signal".to_string(), |c| format!("status {}", c)))]
    ExitStatus {
        command: String,
        code: Option<i32>,
        output: String,
    },
}

/// Result type alias for wakeandwait operations.
pub type Result<T> = std::result::Result<T, WakeWaitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            WakeWaitError::config("bad").exit_code(),
            exit_code::CONFIG_ERROR
        );
        assert_eq!(
            WakeWaitError::NoDestinations.exit_code(),
            exit_code::NO_DESTINATIONS
        );
        assert_eq!(
            WakeWaitError::ServicesNotReady { pending: 1 }.exit_code(),
            exit_code::SERVICE_FAILURE
        );
        assert_eq!(
            WakeWaitError::CommandsNotCompleted { pending: 2 }.exit_code(),
            exit_code::COMMAND_FAILURE
        );

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(
            WakeWaitError::transport_with_source("send failed", io).exit_code(),
            exit_code::SERVICE_FAILURE
        );
    }

    #[test]
    fn test_service_and_command_codes_differ() {
        assert_ne!(exit_code::SERVICE_FAILURE, exit_code::COMMAND_FAILURE);
        assert_ne!(exit_code::SUCCESS, exit_code::SERVICE_FAILURE);
    }

    #[test]
    fn test_resolution_error_display() {
        let err = ResolutionError::AliasCycle {
            chain: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Alias cycle detected: a -> b -> a");

        let err = ResolutionError::MalformedAlias {
            name: "broken".into(),
        };
        assert_eq!(err.to_string(), "Alias 'broken' has an unusable definition");
    }

    #[test]
    fn test_probe_error_display() {
        let err = ProbeError::ExitStatus {
            command: "false".into(),
            code: Some(1),
            output: String::new(),
        };
        assert_eq!(err.to_string(), "'false' exited with status 1: ");

        let err = ProbeError::ExitStatus {
            command: "sleep 10".into(),
            code: None,
            output: "killed".into(),
        };
        assert_eq!(err.to_string(), "'sleep 10' exited with signal: killed");
    }

    #[test]
    fn test_config_error_display() {
        let err = WakeWaitError::config("retry.interval_ms must be > 0");
        assert_eq!(
            format!("{}", err),
            "Configuration error: retry.interval_ms must be > 0"
        );
    }

    #[test]
    fn test_causes_follow_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err = WakeWaitError::transport_with_source("Failed to send magic packet", io);
        assert_eq!(err.causes(), vec!["permission denied"]);

        let yaml = serde_yaml::from_str::<u16>("[").unwrap_err();
        let err = WakeWaitError::config_with_source("Failed to parse /etc/x.yaml", yaml);
        assert_eq!(err.causes().len(), 1);

        assert!(WakeWaitError::NoDestinations.causes().is_empty());
    }
}
