//! The `run` command: scan both library roots and organize every folder.

use crate::core::pipeline::{FolderStatus, Pipeline, RunSummary};
use crate::core::state::StateStore;
use crate::models::config;
use crate::services::jellyfin::JellyfinClient;
use crate::services::tmdb::TmdbClient;
use crate::services::ytdlp::YtDlpClient;
use crate::utils::fs as fsutil;
use crate::Result;
use colored::Colorize;
use std::path::PathBuf;

pub struct RunArgs {
    pub movies: Option<PathBuf>,
    pub shows: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub force: bool,
    pub no_trailers: bool,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let mut config = config::load_config();
    if let Some(movies) = args.movies {
        config.movies_path = movies;
    }
    if let Some(shows) = args.shows {
        config.shows_path = shows;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    println!("{}", "[SCAN] Scanning media library...".bold().cyan());
    println!("  {} {}", "Movies:".bold(), config.movies_path.display());
    println!("  {} {}", "Shows:".bold(), config.shows_path.display());
    println!();

    fsutil::ensure_directory(&config.data_dir)?;
    let state = StateStore::load(config.state_file())?;

    let catalog = TmdbClient::new(config.tmdb.clone())?;
    let platform = YtDlpClient::new();
    let library = JellyfinClient::new(config.jellyfin.clone());

    let mut skip_trailers = args.no_trailers;
    if !skip_trailers && !platform.is_installed().await {
        tracing::warn!("yt-dlp not found in PATH, trailers disabled for this run");
        skip_trailers = true;
    }

    let mut pipeline = Pipeline::new(catalog, platform, library, state, args.force);
    if skip_trailers {
        pipeline = pipeline.skip_trailers();
    }

    let summary = pipeline
        .process_library_root(&config.movies_path, &config.shows_path)
        .await?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "[DONE] Run summary".bold().cyan());
    let processed = summary.processed.to_string();
    let failed = summary.failed.to_string();
    let failed = if summary.failed > 0 {
        failed.as_str().red()
    } else {
        failed.as_str().normal()
    };
    println!(
        "  {} {}  {} {}  {} {}",
        "Processed:".bold(),
        processed.as_str().green(),
        "Skipped:".bold(),
        summary.skipped,
        "Failed:".bold(),
        failed,
    );

    let failures: Vec<_> = summary
        .per_folder
        .iter()
        .filter(|o| o.status == FolderStatus::Failed)
        .collect();
    if !failures.is_empty() {
        println!();
        println!("{}", "[FAILED]".bold().red());
        for outcome in failures {
            println!("  {} - {}", outcome.folder, outcome.detail);
        }
    }
}
