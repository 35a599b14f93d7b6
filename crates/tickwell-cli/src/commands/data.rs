use std::path::PathBuf;

use chrono::{Local, Utc};
use clap::Subcommand;
use tickwell_core::transfer::default_file_name;
use tickwell_core::{Clock, ExportBundle, ManualClock, SystemClock, TimerEngine, WhiteNoiseRegistry};
use tracing::info;

use super::{open_repo, CliResult};

#[derive(Subcommand)]
pub enum DataAction {
    /// Export timers and white noise tracks to a JSON file
    Export {
        /// Output path (defaults to timer_config_YYYY-MM-DD.json)
        #[arg(long, short)]
        out: Option<PathBuf>,
        /// Write to stdout instead of a file
        #[arg(long, conflicts_with = "out")]
        stdout: bool,
    },
    /// Replace stored timers and tracks with an exported file
    Import {
        /// Path to a previously exported file
        file: PathBuf,
    },
    /// Delete all stored timers and tracks
    Clear {
        /// Skip the safety check
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: DataAction) -> CliResult {
    let mut repo = open_repo()?;
    match action {
        DataAction::Export { out, stdout } => {
            let bundle = ExportBundle::new(repo.load_timers()?, repo.load_white_noises()?, Utc::now());
            let json = bundle.to_json()?;
            if stdout {
                println!("{json}");
                return Ok(());
            }
            let path = out.unwrap_or_else(|| PathBuf::from(default_file_name(Local::now().date_naive())));
            std::fs::write(&path, json)?;
            info!(path = %path.display(), "exported");
            println!(
                "exported {} timer(s) to {}",
                bundle.timers.len(),
                path.display()
            );
        }
        DataAction::Import { file } => {
            let content = std::fs::read_to_string(&file)?;
            let bundle = ExportBundle::from_json(&content)?;

            // Run the incoming data through the same replace path a live
            // session uses so duplicates and running flags are handled alike.
            let mut engine = TimerEngine::manual(ManualClock::new(SystemClock.now_ms()));
            engine.replace_all(bundle.timers.clone());
            let mut registry = WhiteNoiseRegistry::default();
            registry.replace_all(bundle.white_noises.clone());

            repo.save_timers(engine.timers())?;
            repo.save_white_noises(registry.tracks())?;

            let exported = bundle
                .exported_at()
                .map(|at| format!(" (exported {})", at.with_timezone(&Local).format("%Y-%m-%d %H:%M")))
                .unwrap_or_default();
            println!(
                "imported {} timer(s) and {} track(s){exported}",
                engine.timers().len(),
                registry.tracks().len()
            );
        }
        DataAction::Clear { yes } => {
            if !yes {
                return Err("refusing to delete all data without --yes".into());
            }
            repo.clear()?;
            println!("all stored data deleted");
        }
    }
    Ok(())
}
