//! Interactive session: timers tick in real time while commands are read
//! from stdin.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use clap::Args;
use tickwell_core::timer::format_clock;
use tickwell_core::timer::input::{parse_duration, parse_target};
use tickwell_core::{
    Completion, Config, Database, NewTimer, Playback, ReminderNotifier, ReminderSink, Session,
    SessionHandle, SilentPlayback, StateRepository, SystemClock, Timer, TitleFlash,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{render_timer, resolve, short_id, CliResult};

const WINDOW_TITLE: &str = "Tickwell";

const HELP: &str = "\
commands:
  add <title…> <duration> [--noise <id>]   countdown, e.g. `add Tea 5m`
  at <title…> <time>                       reminder at HH:MM or YYYY-MM-DDTHH:MM
  start|pause|delete <n|id>                by list number or id prefix
  list                                     show all timers
  noise [<id>]                             list tracks, or toggle one
  volume <id> <0..1>                       set a track's volume
  help | quit
  <enter>                                  dismiss the current reminder";

#[derive(Args)]
pub struct RunArgs {
    /// Do not ring the terminal bell on completion
    #[arg(long)]
    pub mute: bool,
}

/// Surfaces reminders on the terminal: bell, banner and window title.
struct TerminalSink {
    dismiss: Arc<Notify>,
}

fn set_window_title(title: &str) {
    let mut out = std::io::stdout();
    let _ = write!(out, "\x1b]0;{title}\x07");
    let _ = out.flush();
}

impl ReminderSink for TerminalSink {
    fn cue(&self, _completion: &Completion) {
        let mut out = std::io::stdout();
        let _ = write!(out, "\x07");
        let _ = out.flush();
    }

    fn show(&self, completion: &Completion) {
        println!(
            "\n⏰ \"{}\" finished ({}). Press enter to dismiss.",
            completion.title,
            format_clock(completion.duration)
        );
    }

    fn flash(&self, mut flash: TitleFlash) {
        let dismiss = self.dismiss.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let mut interval = tokio::time::interval(Duration::from_millis(flash.interval_ms()));
            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = dismiss.notified() => flash.dismiss(),
                }
                let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                match flash.frame(elapsed) {
                    Some(title) => set_window_title(title),
                    None => {
                        set_window_title(flash.original());
                        break;
                    }
                }
            }
        });
    }
}

pub fn run(args: RunArgs) -> CliResult {
    let config = Config::load()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(session(config, args))
}

async fn session(config: Config, args: RunArgs) -> CliResult {
    let repo = StateRepository::new(Database::open()?);
    let (mut session, handle) = Session::new(&config, repo, SystemClock, playback(&config)?)?;

    let dismiss = Arc::new(Notify::new());
    let notifications = &config.notifications;
    if notifications.enabled {
        let reminder = ReminderNotifier::new(
            TerminalSink {
                dismiss: dismiss.clone(),
            },
            WINDOW_TITLE,
        )
        .with_sound(notifications.sound && !args.mute)
        .with_flash_timing(notifications.flash_interval_ms, notifications.flash_duration_ms);
        session.subscribe(reminder);
    } else {
        let mut completions = session.completions();
        tokio::spawn(async move {
            while let Ok(done) = completions.recv().await {
                println!("\n\"{}\" finished.", done.title);
            }
        });
    }

    let task = session.spawn();
    set_window_title(WINDOW_TITLE);
    info!("session started");

    let timers = handle.timers().await?;
    if !timers.is_empty() {
        println!("{} stored timer(s), all paused:", timers.len());
        print_list(&timers);
    }
    println!("type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            dismiss.notify_waiters();
            continue;
        }
        match execute(&handle, line).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => println!("error: {e}"),
        }
    }

    handle.shutdown().await?;
    task.await?;
    set_window_title("");
    debug!("session finished");
    Ok(())
}

/// Speaker output unless disabled in the config or compiled out.
fn playback(config: &Config) -> Result<Box<dyn Playback>, Box<dyn std::error::Error>> {
    if !config.white_noise.sound {
        return Ok(Box::new(SilentPlayback));
    }
    speakers()
}

#[cfg(feature = "audio")]
fn speakers() -> Result<Box<dyn Playback>, Box<dyn std::error::Error>> {
    let dir = tickwell_core::storage::audio_dir()?;
    debug!(dir = %dir.display(), "white noise on speakers");
    Ok(Box::new(tickwell_core::RodioPlayback::new(dir)))
}

#[cfg(not(feature = "audio"))]
fn speakers() -> Result<Box<dyn Playback>, Box<dyn std::error::Error>> {
    debug!("built without audio, white noise is silent");
    Ok(Box::new(SilentPlayback))
}

enum Flow {
    Continue,
    Quit,
}

fn prompt() {
    let mut out = std::io::stdout();
    let _ = write!(out, "> ");
    let _ = out.flush();
}

async fn execute(handle: &SessionHandle, line: &str) -> Result<Flow, Box<dyn std::error::Error>> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&cmd, rest)) = words.split_first() else {
        return Ok(Flow::Continue);
    };

    match cmd {
        "add" => {
            let (mut request, noise) = parse_add(rest)?;
            if let Some(noise) = noise {
                request = request.with_white_noise(noise);
            }
            let timer = handle.create(request).await?;
            println!("started [{}] {} ({})", short_id(&timer), timer.title, timer.format_remaining());
        }
        "at" => {
            let (title, when) = split_last(rest).ok_or("usage: at <title…> <time>")?;
            let target = parse_target(when, &Local::now())?;
            let timer = handle.create(NewTimer::scheduled(title, target)).await?;
            println!("scheduled [{}] {} in {}", short_id(&timer), timer.title, timer.format_remaining());
        }
        "start" | "pause" | "delete" => {
            let key = rest.first().ok_or_else(|| format!("usage: {cmd} <n|id>"))?;
            let timers = handle.timers().await?;
            let timer = resolve(&timers, key).ok_or_else(|| format!("no timer matches '{key}'"))?;
            let id = timer.id.clone();
            let event = match cmd {
                "start" => handle.start(id).await?,
                "pause" => handle.pause(id).await?,
                _ => handle.delete(id).await?,
            };
            match event {
                Some(_) => println!("{cmd}: {}", timer.title),
                None => println!("{cmd}: nothing to do for {}", timer.title),
            }
        }
        "list" | "ls" => print_list(&handle.timers().await?),
        "noise" => match rest.first() {
            Some(id) => {
                handle.toggle_white_noise(*id).await?;
                print_tracks(handle).await?;
            }
            None => print_tracks(handle).await?,
        },
        "volume" => {
            let [id, level] = rest else {
                return Err("usage: volume <id> <0..1>".into());
            };
            let level: f32 = level.parse().map_err(|_| format!("not a number: {level}"))?;
            let stored = handle.set_volume(*id, level).await?;
            println!("{id} volume {stored:.2}");
        }
        "help" | "?" => println!("{HELP}"),
        "quit" | "exit" | "q" => return Ok(Flow::Quit),
        other => println!("unknown command '{other}', try `help`"),
    }
    Ok(Flow::Continue)
}

/// `<title…> <duration> [--noise <id>]`
fn parse_add(words: &[&str]) -> Result<(NewTimer, Option<String>), Box<dyn std::error::Error>> {
    let mut words = words.to_vec();
    let mut noise = None;
    if let Some(pos) = words.iter().position(|w| *w == "--noise") {
        let id = words
            .get(pos + 1)
            .ok_or("--noise needs a track id")?
            .to_string();
        words.drain(pos..=pos + 1);
        noise = Some(id);
    }
    let (title, duration) = split_last(&words).ok_or("usage: add <title…> <duration>")?;
    let seconds = parse_duration(duration)?;
    Ok((NewTimer::countdown(title, seconds), noise))
}

/// Everything but the last word as the title, the last word as the argument.
fn split_last<'a>(words: &[&'a str]) -> Option<(String, &'a str)> {
    let (last, title) = words.split_last()?;
    if title.is_empty() {
        return None;
    }
    Some((title.join(" "), *last))
}

fn print_list(timers: &[Timer]) {
    if timers.is_empty() {
        println!("no timers");
        return;
    }
    for (i, timer) in timers.iter().enumerate() {
        println!("{}", render_timer(i, timer));
    }
    let overall = timers.iter().map(Timer::progress).sum::<f64>() / timers.len() as f64;
    println!("overall {:.0}%", overall * 100.0);
}

async fn print_tracks(handle: &SessionHandle) -> CliResult {
    for status in handle.tracks().await? {
        let mark = if status.track.is_active { "▶" } else { " " };
        println!(
            "{mark} {:<8} {:<18} vol {:.2}",
            status.track.id, status.track.name, status.volume
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickwell_core::timer::TimerTarget;

    #[test]
    fn add_splits_title_duration_and_noise() {
        let (request, noise) = parse_add(&["Green", "tea", "3m", "--noise", "pink"]).unwrap();
        assert_eq!(request.title, "Green tea");
        assert!(matches!(request.target, TimerTarget::Countdown { seconds: 180 }));
        assert_eq!(noise.as_deref(), Some("pink"));
    }

    #[test]
    fn add_needs_title_and_duration() {
        assert!(parse_add(&["5m"]).is_err());
        assert!(parse_add(&["Tea", "soon"]).is_err());
        assert!(parse_add(&["Tea", "5m", "--noise"]).is_err());
    }

    #[test]
    fn sound_off_selects_silent_backend() {
        let mut config = Config::default();
        config.white_noise.sound = false;
        let mut backend = playback(&config).unwrap();
        let missing = tickwell_core::WhiteNoise::new("rain", "Rain", "/audio/rain.mp3");
        // Only a real output backend checks that the file exists.
        assert!(backend.play(&missing, 0.5).is_ok());
    }

    #[test]
    fn split_last_keeps_multiword_titles() {
        assert_eq!(
            split_last(&["Stand", "up", "14:30"]),
            Some(("Stand up".to_string(), "14:30"))
        );
        assert_eq!(split_last(&["14:30"]), None);
    }
}
