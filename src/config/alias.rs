//! Alias table types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::destination::DestinationSet;

/// The value stored under an alias name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AliasEntry {
    /// Indirection to another token (usually another alias name).
    Alias(String),

    /// Terminal definition.
    Destinations(DestinationSet),

    /// Anything else. Kept so that one bad entry does not prevent the rest
    /// of the file from loading; the resolver reports it when used.
    Malformed(serde_yaml::Value),
}

impl From<DestinationSet> for AliasEntry {
    fn from(set: DestinationSet) -> Self {
        AliasEntry::Destinations(set)
    }
}

/// Mapping from alias name to its definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable(BTreeMap<String, AliasEntry>);

impl AliasTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an alias by name.
    pub fn get(&self, name: &str) -> Option<&AliasEntry> {
        self.0.get(name)
    }

    /// Returns true if `name` is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Iterates over all aliases in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AliasEntry)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>, E: Into<AliasEntry>> FromIterator<(S, E)> for AliasTable {
    fn from_iter<I: IntoIterator<Item = (S, E)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, entry)| (name.into(), entry.into()))
                .collect(),
        )
    }
}

impl From<&str> for AliasEntry {
    fn from(name: &str) -> Self {
        AliasEntry::Alias(name.to_string())
    }
}
