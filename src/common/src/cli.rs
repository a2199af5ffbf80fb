use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments shared by every curator command
#[derive(Parser, Debug, Clone, Default)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Enable quiet mode (minimal output)")]
    pub quiet: bool,
}

/// Commands that inspect the configuration instead of running actions
#[derive(Subcommand, Debug, Clone, Default)]
pub enum CommonCommands {
    /// Run the configured actions (default behavior)
    #[default]
    Run,
    /// Show current configuration and exit
    Config {
        #[arg(long, help = "Show configuration in JSON format")]
        json: bool,
    },
    /// Validate configuration and exit
    Validate,
}

/// Utility functions for CLI operations
pub mod utils {
    use super::*;
    use crate::config::Configuration;
    use anyhow::{Context, Result};
    use std::path::Path;
    use tracing_subscriber::EnvFilter;

    /// The level used when `RUST_LOG` is unset.
    pub fn log_level<'a>(args: &CommonArgs, configured: &'a str) -> &'a str {
        if args.quiet {
            "warn"
        } else if args.verbose {
            "debug"
        } else {
            configured
        }
    }

    /// Initialize logging on stderr; `RUST_LOG` takes precedence.
    pub fn init_logging(args: &CommonArgs, configured: &str) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(log_level(args, configured)));

        // A subscriber may already be installed by a test harness.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Load configuration with optional override from CLI
    pub fn load_config(config_path: Option<&Path>) -> Result<Configuration> {
        match config_path {
            Some(path) => Configuration::load_from_path(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display())),
            None => Configuration::load().context("Failed to load configuration"),
        }
    }

    /// Display configuration in human-readable or JSON format
    pub fn display_config(config: &Configuration, json: bool) -> Result<()> {
        if json {
            let json = serde_json::to_string_pretty(config)
                .context("Failed to serialize configuration to JSON")?;
            println!("{json}");
            return Ok(());
        }

        println!("Curator Configuration:");
        println!("======================");
        match &config.client.snapshot {
            Some(snapshot) => println!("Cluster snapshot: {}", snapshot.display()),
            None => println!("Cluster snapshot: not configured"),
        }
        println!("Log level: {}", config.logging.level);

        for (id, action) in config.ordered_actions()? {
            let filters = action.filters.as_ref().map_or(0, Vec::len);
            let state = if action.options.disable_action {
                " (disabled)"
            } else {
                ""
            };
            println!(
                "Action {id}: {} with {filters} filter(s){state}",
                action.action.as_str()
            );
            if let Some(description) = &action.description {
                println!("  {description}");
            }
        }
        Ok(())
    }

    /// Validate configuration and report any issues
    pub fn validate_config(config: &Configuration) -> Result<()> {
        tracing::info!("Validating configuration...");
        config.validate().context("Invalid configuration")?;
        tracing::info!(actions = config.actions.len(), "Configuration validation passed");
        Ok(())
    }
}
