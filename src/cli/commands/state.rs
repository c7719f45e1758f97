//! The `state` command: inspect or reset the processing state.

use crate::core::state::StateStore;
use crate::models::config;
use crate::models::state::ProcessingStatus;
use crate::Result;
use colored::Colorize;
use std::path::PathBuf;

pub fn show(data_dir: Option<PathBuf>) -> Result<()> {
    let store = load_store(data_dir)?;

    let mut counts = [0usize; 4];
    println!("{}", "[STATE] Tracked items".bold().cyan());
    for (key, record) in store.records() {
        let index = match record.status {
            ProcessingStatus::Pending => 0,
            ProcessingStatus::Tagged => 1,
            ProcessingStatus::Complete => 2,
            ProcessingStatus::Failed => 3,
        };
        counts[index] += 1;

        let status = match record.status {
            ProcessingStatus::Pending => "pending".normal(),
            ProcessingStatus::Tagged => "tagged".yellow(),
            ProcessingStatus::Complete => "complete".green(),
            ProcessingStatus::Failed => "failed".red(),
        };
        let exclusion = if record.trailer_permanently_excluded {
            " [no trailer]".dimmed().to_string()
        } else {
            String::new()
        };
        println!(
            "  {status:10} {} ({key}){exclusion}",
            record.display_name
        );
    }

    println!();
    println!(
        "  {} pending, {} tagged, {} complete, {} failed, {} trailer-excluded",
        counts[0],
        counts[1],
        counts[2],
        counts[3],
        store.excluded_count()
    );
    Ok(())
}

pub fn clear(data_dir: Option<PathBuf>) -> Result<()> {
    let mut store = load_store(data_dir)?;
    store.clear()?;
    println!("{}", "[STATE] Processing state cleared".bold().yellow());
    Ok(())
}

fn load_store(data_dir: Option<PathBuf>) -> Result<StateStore> {
    let mut config = config::load_config();
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    StateStore::load(config.state_file())
}
