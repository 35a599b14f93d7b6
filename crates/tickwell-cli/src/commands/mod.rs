pub mod config;
pub mod data;
pub mod noise;
pub mod run;
pub mod timer;

use tickwell_core::timer::format_clock;
use tickwell_core::{Database, StateRepository, Timer, TimerMode};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn open_repo() -> Result<StateRepository<Database>, Box<dyn std::error::Error>> {
    Ok(StateRepository::new(Database::open()?))
}

/// One line per timer: index, short id, state, remaining, title.
pub fn render_timer(index: usize, timer: &Timer) -> String {
    let state = if timer.is_completed() {
        "done"
    } else if timer.is_running {
        "running"
    } else {
        "paused"
    };
    let mode = match timer.mode {
        TimerMode::Countdown => "",
        TimerMode::Scheduled => " @",
    };
    let noise = timer
        .white_noise
        .as_deref()
        .map(|n| format!("  ♪ {n}"))
        .unwrap_or_default();
    format!(
        "{:>2}. [{}] {:<7} {:>8}/{}{}  {}{}",
        index + 1,
        short_id(timer),
        state,
        timer.format_remaining(),
        format_clock(timer.duration),
        mode,
        timer.title,
        noise,
    )
}

pub fn short_id(timer: &Timer) -> &str {
    let id = timer.id.as_str();
    id.get(..8).unwrap_or(id)
}

pub fn print_timers(timers: &[Timer], json: bool) -> CliResult {
    if json {
        println!("{}", serde_json::to_string_pretty(timers)?);
        return Ok(());
    }
    if timers.is_empty() {
        println!("no timers");
    }
    for (i, timer) in timers.iter().enumerate() {
        println!("{}", render_timer(i, timer));
    }
    Ok(())
}

/// Find a timer by 1-based list position, full id, or id prefix.
pub fn resolve<'a>(timers: &'a [Timer], key: &str) -> Option<&'a Timer> {
    if let Ok(n) = key.parse::<usize>() {
        if (1..=timers.len()).contains(&n) {
            return timers.get(n - 1);
        }
    }
    if let Some(t) = timers.iter().find(|t| t.id.as_str() == key) {
        return Some(t);
    }
    let mut matches = timers.iter().filter(|t| t.id.as_str().starts_with(key));
    match (matches.next(), matches.next()) {
        (Some(t), None) => Some(t),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickwell_core::{NewTimer, TimerId};

    fn timer(id: &str, title: &str) -> Timer {
        let mut t = Timer::new(NewTimer::countdown(title, 60), 0).unwrap();
        t.id = TimerId::from(id);
        t
    }

    #[test]
    fn resolve_by_index_id_and_prefix() {
        let timers = vec![timer("abc123", "A"), timer("abd456", "B")];
        assert_eq!(resolve(&timers, "2").unwrap().title, "B");
        assert_eq!(resolve(&timers, "abc123").unwrap().title, "A");
        assert_eq!(resolve(&timers, "abd").unwrap().title, "B");
        assert!(resolve(&timers, "ab").is_none());
        assert!(resolve(&timers, "9").is_none());
    }

    #[test]
    fn render_shows_state_and_remaining() {
        let mut t = timer("0123456789", "Tea");
        t.is_running = true;
        t.remaining_time = 42;
        let line = render_timer(0, &t);
        assert!(line.contains("[01234567]"));
        assert!(line.contains("running"));
        assert!(line.contains("00:42/01:00"));
        assert!(line.ends_with("Tea"));
    }
}
