use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerId;

/// Every state change in the system produces an Event.
/// Front ends render from these; no-op commands produce none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        timer_id: TimerId,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        timer_id: TimerId,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        timer_id: TimerId,
        title: String,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerDeleted {
        timer_id: TimerId,
        at: DateTime<Utc>,
    },
    /// The whole collection was replaced (import, clear, startup load).
    TimersReplaced {
        count: usize,
        at: DateTime<Utc>,
    },
    WhiteNoiseStarted {
        track_id: String,
        at: DateTime<Utc>,
    },
    WhiteNoiseStopped {
        track_id: String,
        at: DateTime<Utc>,
    },
}
