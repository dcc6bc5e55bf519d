//! portlink CLI
//!
//! Applies batches of port requests to a configured store and inspects ports.

mod requests;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use portlink_core::app::validation::validate_guid;
use portlink_core::{ManagerBuilder, PortlinkConfig};
use requests::{Outcome, RequestRunner, parse_requests};

#[derive(Parser)]
#[command(name = "portlink")]
#[command(version, about = "Port relationship manager for a lineage metadata store", long_about = None)]
struct Cli {
    /// Path to the TOML configuration
    #[arg(short, long, default_value = "portlink.toml", global = true)]
    config: PathBuf,

    /// Calling user; defaults to `user_id` from the configuration
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// External source recorded on mutations; defaults to the first configured one
    #[arg(short, long, global = true)]
    external_source: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a JSON array of requests in order, printing one JSON line per result
    Apply {
        /// Path to the requests file
        requests: PathBuf,
    },

    /// Show the port with the given qualified name and its schema type
    Show {
        qualified_name: String,
    },

    /// Show any stored entity by GUID
    Get {
        guid: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = PortlinkConfig::load(&cli.config)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let user = cli.user.unwrap_or_else(|| config.user_id.clone());
    let external_source = match cli.external_source {
        Some(name) => name,
        None => match config.external_sources.first() {
            Some(source) => source.qualified_name.clone(),
            None => bail!("no external source given and none configured"),
        },
    };

    let manager = ManagerBuilder::from_config(&config).await?;
    let runner = RequestRunner::new(manager, user.clone(), external_source);

    match cli.command {
        Commands::Apply { requests } => apply(&runner, &requests).await,
        Commands::Show { qualified_name } => {
            let outcome = runner.find(&qualified_name).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Commands::Get { guid } => {
            let guid = validate_guid(&guid, "guid", "get")?;
            let entity = runner.manager().store().get_entity(&user, &guid).await?;
            match entity {
                Some(entity) => println!("{}", serde_json::to_string_pretty(&entity)?),
                None => bail!("no entity with guid {guid}"),
            }
            Ok(())
        }
    }
}

async fn apply(runner: &RequestRunner, path: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read requests file {}", path.display()))?;
    let requests = parse_requests(&raw)?;

    let mut failed = 0usize;
    for request in &requests {
        let outcome = match runner.apply(request).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(?request, error = %err, "request failed");
                failed += 1;
                Outcome::from_error(&err)
            }
        };
        println!("{}", serde_json::to_string(&outcome)?);
    }

    tracing::info!(total = requests.len(), failed, "requests applied");
    if failed > 0 {
        bail!("{failed} of {} requests failed", requests.len());
    }
    Ok(())
}
