use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use common::cli::{CommonArgs, CommonCommands, utils};
use common::{ActionConfig, Configuration};
use curator::{CuratorError, IndexList, PipelineConfig, PipelineReport, QueryClient, SnapshotClient};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(author, version, about = "Dry-run index curation against a cluster snapshot", long_about = None)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Option<CommonCommands>,

    /// Cluster snapshot to read instead of the configured one
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Only run the action with this id
    #[arg(long)]
    action: Option<u32>,

    /// Print the selection as JSON
    #[arg(long)]
    json: bool,
}

/// The indices an action would operate on.
#[derive(Debug, Serialize)]
struct ActionOutcome {
    id: u32,
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    indices: Vec<String>,
    report: PipelineReport,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = utils::load_config(args.common.config.as_deref())?;
    utils::init_logging(&args.common, &config.logging.level);

    match args.command.clone().unwrap_or_default() {
        CommonCommands::Config { json } => return utils::display_config(&config, json),
        CommonCommands::Validate => return utils::validate_config(&config),
        CommonCommands::Run => {}
    }
    utils::validate_config(&config)?;

    let snapshot = args
        .snapshot
        .clone()
        .or_else(|| config.client.snapshot.clone())
        .context("No cluster snapshot configured; pass --snapshot or set client.snapshot")?;
    let client: Arc<dyn QueryClient> = Arc::new(
        SnapshotClient::load(&snapshot)
            .await
            .with_context(|| format!("Failed to load cluster snapshot {}", snapshot.display()))?,
    );

    let actions = config.ordered_actions()?;
    if let Some(wanted) = args.action {
        if !actions.iter().any(|(id, _)| *id == wanted) {
            bail!("Action {wanted} is not configured");
        }
    }

    let mut outcomes = Vec::new();
    for (id, action) in actions {
        if args.action.is_some_and(|wanted| wanted != id) {
            continue;
        }
        if action.options.disable_action {
            tracing::info!(id, action = action.action.as_str(), "Action disabled, skipping");
            continue;
        }
        outcomes.push(run_action(client.clone(), id, action).await?);
    }

    if args.json {
        let json =
            serde_json::to_string_pretty(&outcomes).context("Failed to serialize selection")?;
        println!("{json}");
    } else {
        for outcome in &outcomes {
            println!(
                "Action {} ({}): {} indices",
                outcome.id,
                outcome.action,
                outcome.indices.len()
            );
            for index in &outcome.indices {
                println!("  {index}");
            }
        }
    }

    Ok(())
}

async fn run_action(
    client: Arc<dyn QueryClient>,
    id: u32,
    action: &ActionConfig,
) -> Result<ActionOutcome> {
    tracing::info!(
        id,
        action = action.action.as_str(),
        description = action.description.as_deref().unwrap_or_default(),
        "Preparing action"
    );

    let mut list = IndexList::new(client)
        .await
        .with_context(|| format!("Action {id}: failed to read cluster metadata"))?;
    let pipeline = PipelineConfig {
        filters: action.filters.clone(),
    };
    let report = list
        .iterate_filters(&pipeline)
        .await
        .with_context(|| format!("Action {id}: filter pipeline failed"))?;

    match list.empty_list_check() {
        Ok(()) => {}
        Err(CuratorError::NoIndices) if action.options.ignore_empty_list => {
            tracing::info!(id, "Skipping action: no indices selected");
        }
        Err(err) => return Err(err).with_context(|| format!("Action {id}")),
    }

    Ok(ActionOutcome {
        id,
        action: action.action.as_str(),
        description: action.description.clone(),
        indices: list.into_indices(),
        report,
    })
}
