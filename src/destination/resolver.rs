//! Token resolution.
//!
//! Turns an ordered token sequence plus an alias table into a
//! [`DestinationSet`]. Tokens are kept on a stack so alias indirections can
//! be pushed back and handled before the tokens that followed them.
//!
//! Bare hosts and ports pair up by position:
//!
//! - `host port` and `port host` bind the port to the host,
//! - `host1 host2` finalizes `host1` with [`DEFAULT_PORT`] once `host2` arrives,
//! - a trailing host that nothing follows is dropped.

use tracing::{debug, warn};

use super::token::{classify, TokenKind};
use super::{DestinationSet, ReadinessCheck, Resolution};
use crate::config::{AliasEntry, AliasTable};
use crate::error::ResolutionError;

/// Port used when a host is finalized without an explicit port.
pub const DEFAULT_PORT: u16 = 22;

/// Prefix marking a token as a command line rather than a host.
pub const COMMAND_MARKER: char = '+';

/// Resolves destination tokens against an alias table.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    aliases: &'a AliasTable,
}

/// A token waiting on the stack, with the aliases that led to it.
struct StackedToken {
    token: String,
    chain: Vec<String>,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver over the given aliases.
    pub fn new(aliases: &'a AliasTable) -> Self {
        Self { aliases }
    }

    /// Resolves the tokens, left to right.
    ///
    /// Never fails: malformed or cyclic aliases are recorded in
    /// [`Resolution::errors`] and skipped.
    pub fn resolve<I, S>(&self, tokens: I) -> Resolution
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stack: Vec<StackedToken> = tokens
            .into_iter()
            .map(|t| StackedToken {
                token: t.as_ref().to_string(),
                chain: Vec::new(),
            })
            .collect();
        stack.reverse();

        let mut destinations = DestinationSet::default();
        let mut errors = Vec::new();
        let mut window = HostWindow::default();

        while let Some(StackedToken { token, mut chain }) = stack.pop() {
            if let Some(entry) = self.aliases.get(&token) {
                if chain.contains(&token) {
                    chain.push(token);
                    let err = ResolutionError::AliasCycle { chain };
                    warn!(error = %err, "Skipping alias");
                    errors.push(err);
                    continue;
                }

                match entry {
                    AliasEntry::Destinations(set) => {
                        debug!(alias = %token, "Expanding alias");
                        destinations.extend(set);
                    }
                    AliasEntry::Alias(next) => {
                        debug!(alias = %token, next = %next, "Following alias");
                        chain.push(token);
                        stack.push(StackedToken {
                            token: next.clone(),
                            chain,
                        });
                    }
                    AliasEntry::Malformed(_) => {
                        let err = ResolutionError::MalformedAlias { name: token };
                        warn!(error = %err, "Skipping alias");
                        errors.push(err);
                    }
                }
                continue;
            }

            if let Some(command) = token.strip_prefix(COMMAND_MARKER) {
                let command = command.trim();
                if command.is_empty() {
                    warn!("Ignoring empty command token");
                } else {
                    destinations.commands.push(command.to_string());
                }
                continue;
            }

            match classify(&token) {
                TokenKind::HardwareAddress => destinations.wake_targets.push(token),
                TokenKind::Port(port) => {
                    if let Some(check) = window.port(port) {
                        destinations.readiness_checks.push(check);
                    }
                }
                TokenKind::Other => {
                    if let Some(check) = window.host(token) {
                        destinations.readiness_checks.push(check);
                    }
                }
            }
        }

        window.log_leftovers();

        Resolution {
            destinations,
            errors,
        }
    }
}

/// Sliding window over the last two bare hosts and an unbound port.
#[derive(Debug, Default)]
struct HostWindow {
    previous: Option<String>,
    current: Option<String>,
    port: Option<u16>,
}

impl HostWindow {
    fn port(&mut self, port: u16) -> Option<ReadinessCheck> {
        match self.current.take() {
            Some(host) => {
                self.port = None;
                Some(ReadinessCheck::new(host, port))
            }
            None => {
                self.port = Some(port);
                None
            }
        }
    }

    fn host(&mut self, host: String) -> Option<ReadinessCheck> {
        self.previous = self.current.replace(host);

        if let Some(port) = self.port.take() {
            return self
                .current
                .take()
                .map(|host| ReadinessCheck::new(host, port));
        }

        self.previous
            .take()
            .map(|host| ReadinessCheck::new(host, DEFAULT_PORT))
    }

    fn log_leftovers(&self) {
        if let Some(host) = &self.current {
            debug!(host = %host, "Trailing host has no port and is not waited for");
        }
        if let Some(port) = self.port {
            debug!(port = port, "Trailing port has no host and is ignored");
        }
    }
}
