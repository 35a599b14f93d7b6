//! Completion notification.
//!
//! The engine hands each finished timer to every subscribed
//! [`CompletionNotifier`] exactly once and does not wait on the result.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::timer::{Timer, TimerId};

/// Snapshot of a timer at the moment it finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub timer_id: TimerId,
    pub title: String,
    /// Total run length in seconds.
    pub duration: u64,
}

impl From<&Timer> for Completion {
    fn from(timer: &Timer) -> Self {
        Self {
            timer_id: timer.id.clone(),
            title: timer.title.clone(),
            duration: timer.duration,
        }
    }
}

/// Receives completed timers. Implementations must not block.
pub trait CompletionNotifier: Send {
    fn notify(&self, completion: &Completion);
}

/// Forwards completions into a broadcast channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: broadcast::Sender<Completion>,
}

impl ChannelNotifier {
    pub fn new(tx: broadcast::Sender<Completion>) -> Self {
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Completion> {
        self.tx.subscribe()
    }
}

impl CompletionNotifier for ChannelNotifier {
    fn notify(&self, completion: &Completion) {
        // No receivers is fine; the completion is still recorded in the store.
        let _ = self.tx.send(completion.clone());
    }
}

/// Alternates the window title to draw attention to a finished timer.
///
/// Pure state: the caller samples [`TitleFlash::frame`] on its own schedule.
#[derive(Debug, Clone)]
pub struct TitleFlash {
    message: String,
    original: String,
    interval_ms: u64,
    duration_ms: u64,
    dismissed: bool,
}

impl TitleFlash {
    pub const DEFAULT_INTERVAL_MS: u64 = 1_000;
    pub const DEFAULT_DURATION_MS: u64 = 5_000;

    pub fn new(timer_title: &str, original: impl Into<String>) -> Self {
        Self {
            message: format!("⏰ {timer_title}"),
            original: original.into(),
            interval_ms: Self::DEFAULT_INTERVAL_MS,
            duration_ms: Self::DEFAULT_DURATION_MS,
            dismissed: false,
        }
    }

    pub fn with_timing(mut self, interval_ms: u64, duration_ms: u64) -> Self {
        self.interval_ms = interval_ms.max(1);
        self.duration_ms = duration_ms;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }

    pub fn is_finished(&self, elapsed_ms: u64) -> bool {
        self.dismissed || elapsed_ms >= self.duration_ms
    }

    /// Title to show `elapsed_ms` after the flash began, or `None` once the
    /// flash is over and the original title should be restored.
    pub fn frame(&self, elapsed_ms: u64) -> Option<&str> {
        if self.is_finished(elapsed_ms) {
            return None;
        }
        if (elapsed_ms / self.interval_ms) % 2 == 0 {
            Some(&self.message)
        } else {
            Some(&self.original)
        }
    }
}

/// Where a reminder is surfaced.
pub trait ReminderSink: Send {
    /// Audible cue.
    fn cue(&self, completion: &Completion);
    /// Acknowledgment prompt for the user.
    fn show(&self, completion: &Completion);
    /// Start the transient title indicator.
    fn flash(&self, flash: TitleFlash);
}

/// The full reminder bundle: cue sound, acknowledgment, title flash.
pub struct ReminderNotifier<S: ReminderSink> {
    sink: S,
    sound: bool,
    original_title: String,
    flash_interval_ms: u64,
    flash_duration_ms: u64,
}

impl<S: ReminderSink> ReminderNotifier<S> {
    pub fn new(sink: S, original_title: impl Into<String>) -> Self {
        Self {
            sink,
            sound: true,
            original_title: original_title.into(),
            flash_interval_ms: TitleFlash::DEFAULT_INTERVAL_MS,
            flash_duration_ms: TitleFlash::DEFAULT_DURATION_MS,
        }
    }

    pub fn with_sound(mut self, enabled: bool) -> Self {
        self.sound = enabled;
        self
    }

    pub fn with_flash_timing(mut self, interval_ms: u64, duration_ms: u64) -> Self {
        self.flash_interval_ms = interval_ms;
        self.flash_duration_ms = duration_ms;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: ReminderSink> CompletionNotifier for ReminderNotifier<S> {
    fn notify(&self, completion: &Completion) {
        if self.sound {
            self.sink.cue(completion);
        }
        self.sink.show(completion);
        let flash = TitleFlash::new(&completion.title, self.original_title.clone())
            .with_timing(self.flash_interval_ms, self.flash_duration_ms);
        self.sink.flash(flash);
    }
}
