//! Command line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Jellyfin Helper - keep a movie and show library tidy
#[derive(Parser, Debug)]
#[command(name = "jellyfin-helper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan both library roots and organize every folder
    Run {
        /// Movies library root
        #[arg(long, value_name = "DIR")]
        movies: Option<PathBuf>,

        /// Shows library root
        #[arg(long, value_name = "DIR")]
        shows: Option<PathBuf>,

        /// Directory holding the processing state
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,

        /// Reprocess folders already marked complete
        #[arg(short, long)]
        force: bool,

        /// Skip trailer search and download
        #[arg(long)]
        no_trailers: bool,
    },

    /// Inspect or reset the processing state
    State {
        /// Directory holding the processing state
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,

        #[command(subcommand)]
        action: StateAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum StateAction {
    /// List tracked items and their status
    Show,

    /// Delete all processing state
    Clear,
}
