//! pikup entry point.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pikup_oss::OssConnector;
use pikup_upload::{UploadEvent, UploadOutcome, UploadSession};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "pikup")]
#[command(about = "Upload files to the drive with content deduplication")]
#[command(version)]
struct Cli {
    /// Config file path (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file
    Upload {
        /// File to upload
        file: PathBuf,

        /// Destination folder id (default: drive root)
        #[arg(long)]
        parent_id: Option<String>,

        /// Name to store the file under (default: the file's base name)
        #[arg(long)]
        name: Option<String>,

        /// Access token (overrides the config file)
        #[arg(long, env = "PIKUP_ACCESS_TOKEN", hide_env_values = true)]
        access_token: Option<String>,
    },
    /// Print the GCID of a file
    Hash {
        /// File to hash
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Hash { file } => hash(&file).await,
        Commands::Upload {
            file,
            parent_id,
            name,
            access_token,
        } => {
            let config = CliConfig::load(cli.config.as_deref())?;
            upload(
                &config,
                &file,
                parent_id.as_deref(),
                name.as_deref(),
                access_token,
            )
            .await
        }
    }
}

async fn hash(file: &Path) -> Result<()> {
    let digest = tokio::task::spawn_blocking({
        let path = file.to_path_buf();
        move || pikup_transfer::gcid_hash_file(&path)
    })
    .await?
    .with_context(|| format!("hashing {}", file.display()))?;

    println!("{digest}  {}", file.display());
    Ok(())
}

async fn upload(
    config: &CliConfig,
    file: &Path,
    parent_id: Option<&str>,
    name: Option<&str>,
    token_override: Option<String>,
) -> Result<()> {
    let token = config.access_token(token_override).context(
        "no access token: set access_token in the config file or PIKUP_ACCESS_TOKEN",
    )?;
    let timeout = config.request_timeout();

    let drive = pikup_drive::Client::new(&token, config.device_id.as_deref(), timeout)?
        .with_base_url(config.api_base_url.as_str());
    let connector = OssConnector::new(timeout)?;

    let (events_tx, mut events_rx) = mpsc::channel(256);
    let session = UploadSession::new(Arc::new(drive), Arc::new(connector), config.upload_options())
        .with_events(events_tx);

    let cancel = session.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling upload (press Ctrl-C again to exit now)");
            cancel.cancel();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("second interrupt, exiting");
            std::process::exit(130);
        }
    });

    let reporter = tokio::spawn(async move {
        let mut last_percent = None;
        while let Some(event) = events_rx.recv().await {
            if let UploadEvent::Progress { progress, status } = event {
                let percent = (progress * 100.0).round() as u32;
                if last_percent != Some(percent) {
                    info!(percent, status = %status, "progress");
                    last_percent = Some(percent);
                }
            }
        }
    });

    info!(
        file = %file.display(),
        part_size = session.options().part_size,
        "starting upload"
    );
    let result = session.upload(file, parent_id, name).await;

    // Dropping the session closes the event channel and ends the reporter.
    drop(session);
    let _ = reporter.await;

    let outcome = result.with_context(|| format!("uploading {}", file.display()))?;
    let file_id = outcome.file_id().unwrap_or("-");
    match &outcome {
        UploadOutcome::AlreadyComplete(_) => {
            println!("deduplicated: content already stored, file id {file_id}");
        }
        UploadOutcome::Completed { parts, .. } => {
            println!("uploaded in {} part(s), file id {file_id}", parts.len());
        }
    }
    Ok(())
}
