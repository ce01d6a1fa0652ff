//! Configuration module for wakeandwait.
//!
//! Configuration is YAML, read from up to two layers (system-wide, then the
//! user's file) and merged key by key. Saved aliases are written back to the
//! user's layer only.

mod alias;
mod logging;
mod retry;

pub use alias::{AliasEntry, AliasTable};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use retry::{RetryConfig, WakeConfig};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::destination::DestinationSet;
use crate::error::{Result, WakeWaitError};

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/wakeandwait/config.yaml";

/// Environment variable for an explicit configuration file path.
pub const ENV_CONFIG_PATH: &str = "WAKEANDWAIT_CONFIG";

/// Directory name under the platform configuration directory.
const CONFIG_DIR_NAME: &str = "wakeandwait";

/// File name of the user's layer.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Key whose children are replaced per name rather than merged.
const ALIASES_KEY: &str = "aliases";

/// Key holding the default alias name.
const DEFAULT_KEY: &str = "default";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Alias used when no destination tokens are given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Saved destinations.
    pub aliases: AliasTable,

    /// Retry configuration.
    pub retry: RetryConfig,

    /// Magic packet configuration.
    pub wake: WakeConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads configuration from a YAML string.
    pub fn load_from_str(content: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(content)
            .map_err(|e| WakeWaitError::config_with_source("Failed to parse config", e))?;
        Self::from_value(value)
    }

    /// Builds and validates configuration from an already merged document.
    fn from_value(value: Value) -> Result<Self> {
        let config: Config = match value {
            Value::Null => Config::default(),
            value => serde_yaml::from_value(value)
                .map_err(|e| WakeWaitError::config_with_source("Invalid configuration", e))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates configuration.
    fn validate(&self) -> Result<()> {
        if self.retry.interval_ms == 0 {
            return Err(WakeWaitError::config("retry.interval_ms must be > 0"));
        }

        if self.wake.port == 0 {
            return Err(WakeWaitError::config("wake.port must be > 0"));
        }

        if self.wake.broadcast.parse::<Ipv4Addr>().is_err() {
            return Err(WakeWaitError::config(format!(
                "wake.broadcast '{}' is not an IPv4 address",
                self.wake.broadcast
            )));
        }

        for (name, _) in self.aliases.iter() {
            if name.trim().is_empty() {
                return Err(WakeWaitError::config("alias names must not be empty"));
            }
        }

        if let Some(default) = &self.default {
            if !self.aliases.contains(default) {
                warn!(alias = %default, "Default alias is not defined");
            }
        }

        Ok(())
    }

    /// Returns the default alias name, if one is configured.
    pub fn default_alias(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Returns the socket address magic packets are sent to.
    pub fn broadcast_addr(&self) -> Result<SocketAddr> {
        let ip: Ipv4Addr = self.wake.broadcast.parse().map_err(|e| {
            WakeWaitError::config_with_source(
                format!("Invalid broadcast address '{}'", self.wake.broadcast),
                e,
            )
        })?;
        Ok(SocketAddr::from((ip, self.wake.port)))
    }
}

/// Where configuration is read from and saved to.
///
/// Layers are applied in order; the last layer is the writable one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    layers: Vec<PathBuf>,
}

impl ConfigStore {
    /// System layer followed by the user's layer.
    pub fn discover() -> Result<Self> {
        Ok(Self {
            layers: vec![PathBuf::from(SYSTEM_CONFIG_PATH), user_config_path()?],
        })
    }

    /// A single explicit file, used for both reading and saving.
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            layers: vec![path.into()],
        }
    }

    /// Uses the explicit path if one was given, otherwise discovers layers.
    pub fn from_path<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => Ok(Self::single(p.as_ref())),
            None => Self::discover(),
        }
    }

    /// Files consulted, lowest precedence first.
    pub fn layers(&self) -> &[PathBuf] {
        &self.layers
    }

    /// The file aliases are saved to.
    pub fn writable_path(&self) -> &Path {
        // constructors always provide at least one layer
        self.layers
            .last()
            .map(PathBuf::as_path)
            .unwrap_or_else(|| Path::new(SYSTEM_CONFIG_PATH))
    }

    /// Loads and merges every existing layer.
    pub fn load(&self) -> Result<Config> {
        let mut merged = Mapping::new();

        for path in &self.layers {
            if let Some(layer) = read_layer(path)? {
                debug!(path = %path.display(), "Loaded configuration layer");
                merge_layer(&mut merged, layer);
            }
        }

        Config::from_value(Value::Mapping(merged))
    }

    /// Saves `set` under `name` in the writable layer.
    ///
    /// Other keys in that file are preserved. With `make_default`, the alias
    /// also becomes the default.
    pub fn save_alias(&self, name: &str, set: &DestinationSet, make_default: bool) -> Result<()> {
        if name.trim().is_empty() {
            return Err(WakeWaitError::config("alias names must not be empty"));
        }

        let path = self.writable_path();
        let mut document = read_layer(path)?.unwrap_or_default();

        let entry = serde_yaml::to_value(set)
            .map_err(|e| WakeWaitError::config_with_source("Failed to serialize alias", e))?;

        let aliases = document
            .entry(Value::from(ALIASES_KEY))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if !aliases.is_mapping() {
            return Err(WakeWaitError::config(format!(
                "'{}' in {} is not a mapping",
                ALIASES_KEY,
                path.display()
            )));
        }
        if let Value::Mapping(aliases) = aliases {
            aliases.insert(Value::from(name), entry);
        }

        if make_default {
            document.insert(Value::from(DEFAULT_KEY), Value::from(name));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                WakeWaitError::config_with_source(
                    format!("Failed to create config directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let content = serde_yaml::to_string(&Value::Mapping(document))
            .map_err(|e| WakeWaitError::config_with_source("Failed to serialize config", e))?;
        std::fs::write(path, content).map_err(|e| {
            WakeWaitError::config_with_source(
                format!("Failed to write config file '{}'", path.display()),
                e,
            )
        })?;

        info!(alias = %name, path = %path.display(), default = make_default, "Saved alias");
        Ok(())
    }
}

/// Reads one layer. A missing file is not an error.
fn read_layer(path: &Path) -> Result<Option<Mapping>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(WakeWaitError::config_with_source(
                format!("Failed to read config file '{}'", path.display()),
                e,
            ))
        }
    };

    let value: Value = serde_yaml::from_str(&content).map_err(|e| {
        WakeWaitError::config_with_source(
            format!("Failed to parse config file '{}'", path.display()),
            e,
        )
    })?;

    match value {
        Value::Null => Ok(Some(Mapping::new())),
        Value::Mapping(mapping) => Ok(Some(mapping)),
        _ => Err(WakeWaitError::config(format!(
            "Config file '{}' must contain a mapping",
            path.display()
        ))),
    }
}

/// Merges `overlay` into `base`. Nested mappings merge recursively, except
/// aliases, which are replaced whole.
fn merge_layer(base: &mut Mapping, overlay: Mapping) {
    for (key, value) in overlay {
        let replace_children = key.as_str() == Some(ALIASES_KEY);

        match value {
            Value::Mapping(incoming) if matches!(base.get(&key), Some(Value::Mapping(_))) => {
                if let Some(Value::Mapping(existing)) = base.get_mut(&key) {
                    if replace_children {
                        for (name, entry) in incoming {
                            existing.insert(name, entry);
                        }
                    } else {
                        merge_layer(existing, incoming);
                    }
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

/// The user's `config.yaml` in the platform configuration directory.
fn user_config_path() -> Result<PathBuf> {
    user_layer(ProjectDirs::from("", "", CONFIG_DIR_NAME))
}

fn user_layer(dirs: Option<ProjectDirs>) -> Result<PathBuf> {
    dirs.map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .ok_or_else(|| {
            WakeWaitError::config("Cannot determine the user configuration directory")
        })
}
