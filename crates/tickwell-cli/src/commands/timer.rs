use clap::Subcommand;
use tickwell_core::timer::format_clock;
use tickwell_core::timer::input::PRESETS;
use tickwell_core::{Clock, ManualClock, SystemClock, TimerEngine};

use super::{open_repo, print_timers, resolve, short_id, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// List stored timers
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a timer by list number or id prefix
    Delete {
        /// List number, id, or id prefix
        id: String,
    },
    /// Delete every stored timer
    Clear,
}

pub fn run(action: TimerAction) -> CliResult {
    let mut repo = open_repo()?;
    // Stored timers are inert outside a session; a manual engine is enough
    // to apply edits with the same rules a live session uses.
    let mut engine = TimerEngine::manual(ManualClock::new(SystemClock.now_ms()));
    engine.replace_all(repo.load_timers()?);

    match action {
        TimerAction::List { json } => print_timers(engine.timers(), json)?,
        TimerAction::Delete { id } => {
            let timer = resolve(engine.timers(), &id)
                .ok_or_else(|| format!("no timer matches '{id}'"))?
                .clone();
            engine.delete(&timer.id);
            repo.save_timers(engine.timers())?;
            println!("deleted [{}] {}", short_id(&timer), timer.title);
        }
        TimerAction::Clear => {
            let count = engine.timers().len();
            engine.clear();
            repo.save_timers(engine.timers())?;
            println!("deleted {count} timer(s)");
        }
    }
    Ok(())
}

pub fn print_presets() -> CliResult {
    for (label, secs) in PRESETS {
        println!("{label:>4}  {}", format_clock(secs));
    }
    Ok(())
}
