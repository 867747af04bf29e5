//! rumble - terminal client for the Rumble API
//!
//! Uploads a track, follows its analysis and prints the boxing combos
//! timed to it.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rumble_cli::{
    client::{DEFAULT_RETRIES, DEFAULT_SERVER, DEFAULT_TIMEOUT_MS},
    render, RetryPolicy, RumbleClient,
};
use rumble_common::api::AnalysisStatus;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Delay between analysis polls
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Command-line arguments for rumble
#[derive(Parser, Debug)]
#[command(name = "rumble")]
#[command(about = "Upload songs and get boxing combos timed to the music")]
#[command(version)]
struct Cli {
    /// Rumble API base URL
    #[arg(long, env = "RUMBLE_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Per-request timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Retries for failed read requests
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    retries: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload an MP3 and start analysis
    Upload {
        file: PathBuf,

        /// Follow the analysis until it finishes
        #[arg(long)]
        watch: bool,
    },

    /// Follow a song's analysis and print its combos
    Watch { song_id: String },

    /// Print a song's combos
    Combos {
        song_id: String,

        /// Also list combo ids
        #[arg(long)]
        ids: bool,
    },

    /// Replace the given combos with fresh ones
    Regenerate {
        song_id: String,

        #[arg(required = true)]
        combo_ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rumble_cli=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let client = RumbleClient::new(
        &cli.server,
        Duration::from_millis(cli.timeout_ms),
        RetryPolicy::with_retries(cli.retries),
    )
    .context("Failed to create HTTP client")?;
    debug!(server = %cli.server, "Client ready");

    match cli.command {
        Command::Upload { file, watch } => {
            let accepted = client
                .upload_song(&file)
                .await
                .with_context(|| format!("Upload of {} failed", file.display()))?;
            println!("Uploaded {} as {}", file.display(), accepted.song_id);
            if watch {
                watch_song(&client, &accepted.song_id).await?;
            }
        }
        Command::Watch { song_id } => watch_song(&client, &song_id).await?,
        Command::Combos { song_id, ids } => {
            let combos = client.get_combos(&song_id).await?;
            print!("{}", render::render_combos(&combos));
            if ids {
                print!("{}", render::render_combo_ids(&combos));
            }
        }
        Command::Regenerate { song_id, combo_ids } => {
            let combos = client.regenerate_combos(&song_id, combo_ids).await?;
            print!("{}", render::render_combos(&combos));
        }
    }

    Ok(())
}

/// Poll until the analysis settles, then print the profile and combos
async fn watch_song(client: &RumbleClient, song_id: &str) -> Result<()> {
    let song = client.get_song(song_id).await?;
    println!("{}", render::render_song(&song));

    let mut last_line = String::new();
    let analysis = loop {
        let analysis = client.get_analysis(song_id).await?;
        let line = render::render_status(&analysis);
        if line != last_line {
            println!("{}", line);
            last_line = line;
        }
        if analysis.status.is_terminal() {
            break analysis;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    };

    if analysis.status == AnalysisStatus::Failed {
        anyhow::bail!("Analysis of {} failed", song_id);
    }

    if let Some(profile) = &analysis.energy_profile {
        print!("{}", render::render_energy_profile(profile));
    }

    let combos = client.get_combos(song_id).await?;
    print!("{}", render::render_combos(&combos));
    Ok(())
}
