//! coa-artifacts - inspect and register execution artifacts from the shell

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use coa_artifact::{render_references, ArtifactReference};
use coa_core::{
    ArtifactConfig, ArtifactLifecycle, RegisterArtifactRequest, RegistrationOutcome,
};
use coa_detection::{LocalStorage, Producer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Artifact detection and registration for an execution directory
#[derive(Parser, Debug)]
#[command(name = "coa-artifacts")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan an execution directory and print the artifacts found
    Scan {
        /// Execution root
        root: PathBuf,

        /// Only files modified in the last N seconds
        #[arg(long)]
        since_secs: Option<i64>,

        /// Print JSON instead of XML
        #[arg(long)]
        json: bool,
    },
    /// Register one file explicitly
    Register {
        /// Execution root
        root: PathBuf,

        /// File to register, absolute or relative to the root
        #[arg(long)]
        file: String,

        #[arg(long)]
        name: String,

        /// Artifact type, e.g. report or data_processed
        #[arg(long = "type")]
        artifact_type: String,

        #[arg(long)]
        description: String,

        /// Comma-separated parent artifact ids
        #[arg(long)]
        derived_from: Option<String>,
    },
}

fn scan_start(since_secs: Option<i64>) -> DateTime<Utc> {
    match since_secs {
        Some(secs) => Utc::now() - Duration::seconds(secs.max(0)),
        None => DateTime::<Utc>::UNIX_EPOCH,
    }
}

fn execution_id(root: &std::path::Path) -> String {
    root.file_name()
        .map_or_else(|| "cli".to_string(), |n| n.to_string_lossy().into_owned())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let config = match &args.config {
        Some(path) => ArtifactConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ArtifactConfig::default(),
    };
    let lifecycle = ArtifactLifecycle::new(config);

    match args.command {
        Command::Scan {
            root,
            since_secs,
            json,
        } => {
            let storage = LocalStorage::open(&root, execution_id(&root))
                .with_context(|| format!("opening execution root {}", root.display()))?;
            let ctx = lifecycle
                .context(Arc::new(storage))
                .with_started_at(scan_start(since_secs));
            let producer = Producer::new(ctx.execution_id().to_string(), "coa-artifacts");

            let report = lifecycle
                .pipeline()
                .on_execution_complete(Some(&ctx), &producer)
                .await;
            tracing::info!(
                registered = report.count(),
                skipped = report.skipped,
                failed = report.failed,
                "scan finished"
            );

            let refs: Vec<ArtifactReference> =
                report.registered.iter().map(ArtifactReference::from).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&refs)?);
            } else {
                println!("{}", render_references(&refs));
            }
        }
        Command::Register {
            root,
            file,
            name,
            artifact_type,
            description,
            derived_from,
        } => {
            let storage = LocalStorage::open(&root, execution_id(&root))
                .with_context(|| format!("opening execution root {}", root.display()))?;
            let ctx = lifecycle.context(Arc::new(storage));
            let producer = Producer::new(ctx.execution_id().to_string(), "coa-artifacts");

            let mut request = RegisterArtifactRequest::new(file, name, artifact_type, description);
            request.derived_from = derived_from;

            let result = lifecycle.register(&ctx, &producer, &request).await;
            let outcome = RegistrationOutcome::from(&result);
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if let Err(e) = result {
                anyhow::bail!("registration failed: {e}");
            }
        }
    }

    Ok(())
}
