//! Timer records as stored and persisted.
//!
//! Field names on the wire are camelCase (`remainingTime`, `isRunning`) so
//! files exported by earlier versions keep importing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Longest accepted title, in characters.
pub const MAX_TITLE_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(String);

impl TimerId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TimerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TimerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// Relative duration, decremented once per tick.
    Countdown,
    /// Absolute wall-clock target, recomputed every tick.
    Scheduled,
}

/// How long a new timer should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTarget {
    Countdown { seconds: u64 },
    /// Absolute target in epoch milliseconds.
    Scheduled { at_ms: u64 },
}

/// Request to create a timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimer {
    pub title: String,
    pub target: TimerTarget,
    pub white_noise: Option<String>,
}

impl NewTimer {
    pub fn countdown(title: impl Into<String>, seconds: u64) -> Self {
        Self {
            title: title.into(),
            target: TimerTarget::Countdown { seconds },
            white_noise: None,
        }
    }

    pub fn scheduled(title: impl Into<String>, at_ms: u64) -> Self {
        Self {
            title: title.into(),
            target: TimerTarget::Scheduled { at_ms },
            white_noise: None,
        }
    }

    pub fn with_white_noise(mut self, id: impl Into<String>) -> Self {
        self.white_noise = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: TimerId,
    pub title: String,
    /// Total run length in seconds.
    pub duration: u64,
    #[serde(alias = "remainingSeconds")]
    pub remaining_time: u64,
    pub is_running: bool,
    #[serde(default, alias = "whiteNoiseRef", skip_serializing_if = "Option::is_none")]
    pub white_noise: Option<String>,
    pub created_at: u64,
    #[serde(default = "default_mode")]
    pub mode: TimerMode,
    #[serde(default, alias = "scheduledTarget", skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<u64>,
}

fn default_mode() -> TimerMode {
    TimerMode::Countdown
}

impl Timer {
    /// Build a validated, not-yet-running timer.
    pub fn new(request: NewTimer, now_ms: u64) -> Result<Self, ValidationError> {
        let title = validate_title(&request.title)?;
        let (mode, duration, scheduled_time) = match request.target {
            TimerTarget::Countdown { seconds } => {
                if seconds == 0 {
                    return Err(ValidationError::NonPositiveDuration);
                }
                (TimerMode::Countdown, seconds, None)
            }
            TimerTarget::Scheduled { at_ms } => {
                if at_ms <= now_ms {
                    return Err(ValidationError::ScheduledInPast {
                        target_ms: at_ms,
                        now_ms,
                    });
                }
                // Sub-second targets would complete on the first tick with a zero duration.
                let seconds = (at_ms - now_ms) / 1000;
                if seconds == 0 {
                    return Err(ValidationError::NonPositiveDuration);
                }
                (TimerMode::Scheduled, seconds, Some(at_ms))
            }
        };

        Ok(Self {
            id: TimerId::generate(),
            title,
            duration,
            remaining_time: duration,
            is_running: false,
            white_noise: request.white_noise,
            created_at: now_ms,
            mode,
            scheduled_time,
        })
    }

    pub fn is_completed(&self) -> bool {
        self.remaining_time == 0
    }

    /// Remaining seconds for a scheduled timer at `now_ms`.
    ///
    /// Countdown timers have no absolute target and return `None`.
    pub fn remaining_at(&self, now_ms: u64) -> Option<u64> {
        match (self.mode, self.scheduled_time) {
            (TimerMode::Scheduled, Some(target)) => Some(target.saturating_sub(now_ms) / 1000),
            _ => None,
        }
    }

    /// 0.0 .. 1.0 elapsed fraction.
    pub fn progress(&self) -> f64 {
        if self.duration == 0 {
            return 1.0;
        }
        let remaining = self.remaining_time.min(self.duration);
        (self.duration - remaining) as f64 / self.duration as f64
    }

    /// `MM:SS`, or `H:MM:SS` once an hour or more remains.
    pub fn format_remaining(&self) -> String {
        format_clock(self.remaining_time)
    }

    /// Clamp fields loaded from outside the engine back into range.
    pub(crate) fn normalize(&mut self) {
        self.is_running = false;
        if self.remaining_time > self.duration {
            self.remaining_time = self.duration;
        }
    }
}

pub fn format_clock(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

fn validate_title(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let len = title.chars().count();
    if len > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong {
            len,
            max: MAX_TITLE_LEN,
        });
    }
    Ok(title.to_string())
}
