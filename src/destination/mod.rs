//! Destinations - what to wake, what to wait for, and what to run.
//!
//! Command-line tokens and saved aliases are resolved into a
//! [`DestinationSet`], which the orchestrator treats as read-only.

pub mod resolver;
pub mod token;

use crate::error::ResolutionError;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

pub use resolver::{Resolver, COMMAND_MARKER, DEFAULT_PORT};
pub use token::{as_port, classify, is_hardware_address, parse_hardware_address, TokenKind};

/// A host and port to poll until a connection succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadinessCheck {
    /// Host name or IP address.
    pub host: String,
    /// TCP port, never 0.
    #[serde(deserialize_with = "nonzero_port")]
    pub port: u16,
}

fn nonzero_port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    match u16::deserialize(deserializer)? {
        0 => Err(de::Error::custom("port must be > 0")),
        port => Ok(port),
    }
}

impl ReadinessCheck {
    /// Creates a new readiness check.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ReadinessCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            // bare IPv6 literal
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// The resolved unit of work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DestinationSet {
    /// Hardware addresses to wake, in order, duplicates kept.
    #[serde(rename = "wake", skip_serializing_if = "Vec::is_empty")]
    pub wake_targets: Vec<String>,

    /// Services to wait for.
    #[serde(rename = "services", skip_serializing_if = "Vec::is_empty")]
    pub readiness_checks: Vec<ReadinessCheck>,

    /// Command lines to run once every service is ready.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
}

impl DestinationSet {
    /// Returns true if there is nothing to wake, wait for, or run.
    pub fn is_empty(&self) -> bool {
        self.wake_targets.is_empty() && self.readiness_checks.is_empty() && self.commands.is_empty()
    }

    /// Appends everything from `other`, preserving order.
    pub fn extend(&mut self, other: &DestinationSet) {
        self.wake_targets.extend(other.wake_targets.iter().cloned());
        self.readiness_checks
            .extend(other.readiness_checks.iter().cloned());
        self.commands.extend(other.commands.iter().cloned());
    }
}

/// Output of resolving a token sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// The resolved destinations.
    pub destinations: DestinationSet,
    /// Alias entries that were skipped.
    pub errors: Vec<ResolutionError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_check_display() {
        assert_eq!(ReadinessCheck::new("nas", 22).to_string(), "nas:22");
        assert_eq!(ReadinessCheck::new("::1", 80).to_string(), "[::1]:80");
    }

    #[test]
    fn test_destination_set_extend_preserves_order() {
        let mut set = DestinationSet {
            wake_targets: vec!["AA:BB:CC:DD:EE:FF".into()],
            ..Default::default()
        };
        let other = DestinationSet {
            wake_targets: vec!["AA:BB:CC:DD:EE:FF".into(), "11:22:33:44:55:66".into()],
            readiness_checks: vec![ReadinessCheck::new("nas", 443)],
            commands: vec!["echo hi".into()],
        };
        set.extend(&other);

        assert_eq!(
            set.wake_targets,
            vec!["AA:BB:CC:DD:EE:FF", "AA:BB:CC:DD:EE:FF", "11:22:33:44:55:66"]
        );
        assert_eq!(set.readiness_checks, vec![ReadinessCheck::new("nas", 443)]);
        assert_eq!(set.commands, vec!["echo hi"]);
    }

    #[test]
    fn test_destination_set_is_empty() {
        assert!(DestinationSet::default().is_empty());
        let set = DestinationSet {
            commands: vec!["true".into()],
            ..Default::default()
        };
        assert!(!set.is_empty());
    }

    #[test]
    fn test_destination_set_yaml_shape() {
        let yaml = r#"
wake: ["AA:BB:CC:DD:EE:FF"]
services:
  - host: nas
    port: 22
"#;
        let set: DestinationSet = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(set.wake_targets, vec!["AA:BB:CC:DD:EE:FF"]);
        assert_eq!(set.readiness_checks, vec![ReadinessCheck::new("nas", 22)]);
        assert!(set.commands.is_empty());

        let out = serde_yaml::to_string(&set).unwrap();
        assert!(out.contains("wake:"));
        assert!(out.contains("services:"));
        assert!(!out.contains("commands"));
    }

    #[test]
    fn test_readiness_check_rejects_port_zero() {
        let result: Result<ReadinessCheck, _> = serde_yaml::from_str("{ host: nas, port: 0 }");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("port must be > 0"), "{}", err);

        let check: ReadinessCheck = serde_yaml::from_str("{ host: nas, port: 22 }").unwrap();
        assert_eq!(check, ReadinessCheck::new("nas", 22));
    }

    #[test]
    fn test_destination_set_rejects_unknown_keys() {
        let result: Result<DestinationSet, _> = serde_yaml::from_str("hosts: [a]");
        assert!(result.is_err());
    }
}
