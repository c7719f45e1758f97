//! Jellyfin Helper CLI
//!
//! A command-line tool that keeps a movie and show library tidy: catalog
//! tagging, canonical renames, NFO and artwork generation, trailers.

use clap::Parser;
use jellyfin_helper::cli::{
    args::{Cli, Commands, StateAction},
    commands::{run, state},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            movies,
            shows,
            data_dir,
            force,
            no_trailers,
        } => {
            run::run(run::RunArgs {
                movies,
                shows,
                data_dir,
                force,
                no_trailers,
            })
            .await?;
        }

        Commands::State { data_dir, action } => match action {
            StateAction::Show => state::show(data_dir)?,
            StateAction::Clear => state::clear(data_dir)?,
        },
    }

    Ok(())
}

/// Initialize the logging system.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("jellyfin_helper=debug")
    } else {
        EnvFilter::new("jellyfin_helper=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
