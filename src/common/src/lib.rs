pub mod cli;
pub mod config;

pub use config::{ActionConfig, ActionKind, ConfigError, Configuration};
