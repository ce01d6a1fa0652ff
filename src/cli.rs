//! Command-line interface definition for wakeandwait.
//!
//! This module defines the CLI structure using clap derive macros.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::LogLevel;

/// wakeandwait - Wake hosts and wait for their services
///
/// Sends Wake-on-LAN magic packets, waits until every listed service accepts
/// a TCP connection, then runs the listed commands until they succeed.
///
/// Destinations are alias names, hardware addresses, host names or IPs,
/// port numbers (applying to the preceding host), and commands prefixed
/// with '+'.
#[derive(Debug, Parser)]
#[command(name = "wakeandwait")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Destination tokens (default alias if omitted)
    #[arg(value_name = "DESTINATIONS")]
    pub destinations: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, env = "WAKEANDWAIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Save the resolved destinations as an alias
    #[arg(short, long, value_name = "NAME")]
    pub save: Option<String>,

    /// Make the saved alias the default
    #[arg(short, long, requires = "save")]
    pub default: bool,

    /// List configured aliases and exit
    #[arg(short, long)]
    pub list: bool,

    /// Show a desktop notification when services are ready
    #[arg(short, long)]
    pub notify: bool,

    /// Retry interval in milliseconds
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Give up on a phase after this many seconds (default: wait forever)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Increase verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Returns the effective log level: flags win over the configured level.
    pub fn log_level(&self, configured: LogLevel) -> LogLevel {
        if self.quiet {
            return LogLevel::Error;
        }

        match self.verbose {
            0 => configured,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval.map(Duration::from_millis)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_destinations() {
        let cli = Cli::parse_from([
            "wakeandwait",
            "office",
            "AA:BB:CC:DD:EE:FF",
            "nas",
            "2222",
            "+ssh nas uptime",
        ]);

        assert_eq!(
            cli.destinations,
            vec!["office", "AA:BB:CC:DD:EE:FF", "nas", "2222", "+ssh nas uptime"]
        );
        assert!(cli.save.is_none());
        assert!(!cli.notify);
    }

    #[test]
    fn test_no_destinations() {
        let cli = Cli::parse_from(["wakeandwait"]);
        assert!(cli.destinations.is_empty());
        assert!(cli.interval().is_none());
        assert!(cli.timeout().is_none());
    }

    #[test]
    fn test_save_as_default() {
        let cli = Cli::parse_from(["wakeandwait", "-s", "office", "-d", "nas"]);
        assert_eq!(cli.save.as_deref(), Some("office"));
        assert!(cli.default);
        assert_eq!(cli.destinations, vec!["nas"]);
    }

    #[test]
    fn test_default_requires_save() {
        let result = Cli::try_parse_from(["wakeandwait", "--default", "nas"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_option() {
        let cli = Cli::parse_from(["wakeandwait", "-c", "/custom/config.yaml", "--list"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.yaml")));
        assert!(cli.list);
    }

    #[test]
    fn test_timing_overrides() {
        let cli = Cli::parse_from(["wakeandwait", "--interval", "250", "--timeout", "30", "nas"]);
        assert_eq!(cli.interval(), Some(Duration::from_millis(250)));
        assert_eq!(cli.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(Cli::try_parse_from(["wakeandwait", "--interval", "0", "nas"]).is_err());
        assert!(Cli::try_parse_from(["wakeandwait", "--timeout", "0", "nas"]).is_err());
    }

    #[test]
    fn test_verbose_levels() {
        let cli = Cli::parse_from(["wakeandwait", "nas"]);
        assert_eq!(cli.log_level(LogLevel::Warn), LogLevel::Warn);

        let cli = Cli::parse_from(["wakeandwait", "-v", "nas"]);
        assert_eq!(cli.log_level(LogLevel::Warn), LogLevel::Debug);

        let cli = Cli::parse_from(["wakeandwait", "-vv", "nas"]);
        assert_eq!(cli.log_level(LogLevel::Warn), LogLevel::Trace);

        let cli = Cli::parse_from(["wakeandwait", "-vvv", "nas"]);
        assert_eq!(cli.log_level(LogLevel::Warn), LogLevel::Trace);
    }

    #[test]
    fn test_quiet_mode() {
        let cli = Cli::parse_from(["wakeandwait", "-q", "nas"]);
        assert_eq!(cli.log_level(LogLevel::Info), LogLevel::Error);
        assert!(cli.quiet);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["wakeandwait", "-q", "-v", "nas"]).is_err());
    }
}
