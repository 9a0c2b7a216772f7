//! choromap-client CLI
//!
//! Drives the session core from the command line: submit map images and
//! follow the analysis live, resume a completed session from a shareable
//! link, or download a session's result table.

use anyhow::Result;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tracing::info;

use choromap_client::assets::{index_assets, pair_by_manifest, FileAsset};
use choromap_client::channel::ChannelMessage;
use choromap_client::client::{session_id_from_url, share_link, Backend, HttpBackend};
use choromap_client::config::Config;
use choromap_client::geo::build_datasets;
use choromap_client::models::progress::StepStatus;
use choromap_client::models::record::manifest_file_names;
use choromap_client::models::session::{follow_channel, Session, SessionPhase};
use choromap_client::rehydrate::rehydrate;

#[derive(Parser)]
#[command(name = "choromap-client", version, about)]
struct Cli {
    /// Backend base URL (overrides environment and config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit map images and follow the analysis to completion
    Submit {
        /// Image files to analyze (at most 10)
        images: Vec<PathBuf>,
    },
    /// Resume a completed session from a shareable link or identifier
    Resume {
        /// Session identifier, or a full entry URL carrying `session_id`
        session: String,
    },
    /// Download the result table for a session
    Download {
        session: String,
        /// Output path
        #[arg(short, long, default_value = "results.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    info!(
        "Starting choromap-client v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let cli = Cli::parse();
    let config = Config::load(cli.api_url.as_deref())?;
    let backend = HttpBackend::new(&config)?;

    match cli.command {
        Command::Submit { images } => submit(&config, &backend, &images).await,
        Command::Resume { session } => resume(&config, &backend, &session).await,
        Command::Download { session, output } => download(&backend, &session, &output).await,
    }
}

async fn submit(config: &Config, backend: &HttpBackend, images: &[PathBuf]) -> Result<()> {
    let mut files = Vec::with_capacity(images.len());
    for path in images {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push(FileAsset::new(name, std::fs::read(path)?));
    }

    let mut session = Session::new(config.policy());
    session.begin_submission(files)?;

    let session_id = match backend.submit(session.assets()).await {
        Ok(id) => id,
        Err(e) => {
            session.fail_submission();
            anyhow::bail!("{}", e);
        }
    };
    session.confirm_submission(&session_id);
    print_progress(&session);

    let stream = backend.progress_stream(&session_id).inspect(|message| {
        if let ChannelMessage::ProgressUpdate(steps) = message {
            println!();
            for step in steps {
                println!("  {} {}", status_glyph(step.status), step.label);
            }
        }
    });
    follow_channel(&mut session, &session_id, stream).await;

    report_outcome(config, &session)
}

async fn resume(config: &Config, backend: &HttpBackend, session_arg: &str) -> Result<()> {
    let session_id = session_id_from_url(session_arg).unwrap_or_else(|| session_arg.to_string());

    let mut session = Session::new(config.policy());
    if let Err(e) = rehydrate(backend, &mut session, &session_id).await {
        eprintln!("{}", choromap_client::FailureKind::Expired.user_message());
        anyhow::bail!("{}", e);
    }

    print_progress(&session);
    report_outcome(config, &session)
}

async fn download(backend: &HttpBackend, session_id: &str, output: &Path) -> Result<()> {
    let table_text = backend.fetch_result_table(session_id).await?;
    std::fs::write(output, table_text)?;
    println!("Saved result table to {}", output.display());
    Ok(())
}

fn report_outcome(config: &Config, session: &Session) -> Result<()> {
    match session.phase() {
        SessionPhase::Completed => {
            let records = session.result_table().unwrap_or(&[]);
            let datasets = build_datasets(records)?;
            let manifest = manifest_file_names(records);
            let index = index_assets(session.assets());
            let paired = pair_by_manifest(&manifest, &index);

            println!("\nAnalysis complete: {} map dataset(s)", datasets.len());
            for (i, dataset) in datasets.iter().enumerate() {
                let image = paired
                    .get(i)
                    .copied()
                    .flatten()
                    .map(|asset| asset.name.as_str())
                    .unwrap_or("no source image");
                match dataset.value_range {
                    Some(range) => println!(
                        "  {} [{} .. {}] ({})",
                        dataset.title, range.min, range.max, image
                    ),
                    None => println!("  {} [no plottable values] ({})", dataset.title, image),
                }
            }

            if let Some(summary) = session.summary() {
                println!("\nSummary:\n{}", summary);
            }
            if let Some(id) = session.id() {
                println!("\nShare link: {}", share_link(&config.share_base_url, id));
            }
            Ok(())
        }
        SessionPhase::Failed(kind) => {
            if let Some(summary) = session.summary() {
                eprintln!("{}", summary);
            }
            anyhow::bail!("{}", kind.user_message());
        }
        other => anyhow::bail!("session ended in unexpected phase {:?}", other),
    }
}

fn print_progress(session: &Session) {
    for step in session.progress().steps() {
        println!("  {} {}", status_glyph(step.status), step.label);
    }
}

fn status_glyph(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Completed => "✓",
        StepStatus::Processing => "…",
        StepStatus::Pending => "·",
        StepStatus::Failed => "✗",
    }
}
