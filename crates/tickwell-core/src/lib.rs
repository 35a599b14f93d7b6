//! # Tickwell Core Library
//!
//! This library provides the core logic for the Tickwell focus timer:
//! countdown and scheduled reminders, looping ambient tracks, and a one-shot
//! reminder when a timer finishes. Front ends (the `tickwell` CLI) are thin
//! layers over the same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: State machine that owns every timer and the tick driver
//!   of each running one. Countdown timers decrement per tick; scheduled timers
//!   recompute from the wall clock so missed ticks do not drift.
//! - **White Noise**: Registry of looping tracks, at most one playing, with
//!   generated noise built in and speaker output through rodio (`audio`
//!   feature).
//! - **Notify**: Completion contract plus the reminder bundle (cue, prompt,
//!   title flash).
//! - **Storage**: SQLite key-value persistence and TOML configuration.
//! - **Runtime**: A tokio session that serializes commands and ticks.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`WhiteNoiseRegistry`]: Mutually exclusive ambient playback
//! - [`Session`]: Live engine driven by real time
//! - [`ExportBundle`]: Import/export document

pub mod audio;
pub mod clock;
pub mod error;
pub mod events;
pub mod notify;
pub mod runtime;
pub mod storage;
pub mod timer;
pub mod transfer;

#[cfg(feature = "audio")]
pub use audio::RodioPlayback;
pub use audio::{Playback, SilentPlayback, TrackSource, WhiteNoise, WhiteNoiseRegistry};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, PlaybackError, StorageError, ValidationError};
pub use events::Event;
pub use notify::{Completion, CompletionNotifier, ReminderNotifier, ReminderSink, TitleFlash};
pub use runtime::{Session, SessionHandle, TrackStatus};
pub use storage::{Config, Database, KvStore, MemoryStore, StateRepository};
pub use timer::{NewTimer, Timer, TimerEngine, TimerId, TimerMode};
pub use transfer::ExportBundle;
