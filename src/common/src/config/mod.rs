use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml, Yaml},
};

const ENV_PREFIX: &str = "CURATOR__";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Figment(#[from] Box<figment::Error>),

    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsupported configuration format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Invalid log level '{0}'")]
    InvalidLogLevel(String),

    #[error("Action id '{0}' is not a positive integer")]
    InvalidActionId(String),

    #[error("No actions configured")]
    NoActions,
}

/// Where cluster metadata is read from.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// JSON cluster snapshot answering the metadata queries
    pub snapshot: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
        }
    }
}

/// The operation an action would perform on its selected indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Open,
    Close,
    DeleteIndices,
    Forcemerge,
    Allocation,
    Snapshot,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Open => "open",
            ActionKind::Close => "close",
            ActionKind::DeleteIndices => "delete_indices",
            ActionKind::Forcemerge => "forcemerge",
            ActionKind::Allocation => "allocation",
            ActionKind::Snapshot => "snapshot",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActionOptions {
    /// Treat an empty selection as success
    #[serde(default)]
    pub ignore_empty_list: bool,
    #[serde(default)]
    pub disable_action: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionConfig {
    pub action: ActionKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub options: ActionOptions,
    /// Filter descriptors, applied in order
    #[serde(default)]
    pub filters: Option<Vec<serde_json::Value>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Configuration {
    pub client: ClientConfig,
    pub logging: LoggingConfig,
    /// Actions keyed by their numeric id
    pub actions: BTreeMap<String, ActionConfig>,
}

impl Configuration {
    /// Load `curator.yml` or `curator.toml` from the working directory when
    /// present, then apply `CURATOR__` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let figment = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Yaml::file("curator.yml"))
            .merge(Toml::file("curator.toml"));

        Self::extract(figment)
    }

    /// Load an explicit file; the format follows its extension.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let defaults = Figment::from(Serialized::defaults(Configuration::default()));
        let figment = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yml" | "yaml") => defaults.merge(Yaml::file(path)),
            Some("toml") => defaults.merge(Toml::file(path)),
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.level.parse::<LevelFilter>().is_err() {
            return Err(ConfigError::InvalidLogLevel(self.logging.level.clone()));
        }
        if self.actions.is_empty() {
            return Err(ConfigError::NoActions);
        }
        for id in self.actions.keys() {
            action_id(id)?;
        }
        Ok(())
    }

    /// Actions in ascending numeric id order.
    pub fn ordered_actions(&self) -> Result<Vec<(u32, &ActionConfig)>, ConfigError> {
        let mut actions = self
            .actions
            .iter()
            .map(|(id, action)| action_id(id).map(|id| (id, action)))
            .collect::<Result<Vec<_>, _>>()?;
        actions.sort_by_key(|(id, _)| *id);
        Ok(actions)
    }
}

fn action_id(id: &str) -> Result<u32, ConfigError> {
    match id.trim().parse::<u32>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidActionId(id.to_string())),
    }
}
