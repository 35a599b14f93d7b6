//! White noise registry.
//!
//! A fixed set of looping ambient tracks of which at most one plays at a
//! time. Playback itself goes through a [`Playback`] backend; the registry
//! only flips `is_active` after the backend has accepted the request.

#[cfg(feature = "audio")]
mod device;
mod noise;
mod source;

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CoreError, PlaybackError, ValidationError};
use crate::events::Event;

#[cfg(feature = "audio")]
pub use device::RodioPlayback;
pub use noise::{NoiseColor, NoiseSource, SAMPLE_RATE};
pub use source::{TrackSource, BUILTIN_PREFIX};

/// Volume for tracks that were never adjusted.
pub const DEFAULT_VOLUME: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteNoise {
    pub id: String,
    pub name: String,
    /// Audio asset locator: `builtin:<color>` or a path, see [`TrackSource`].
    #[serde(alias = "sourceRef")]
    pub file: String,
    #[serde(default)]
    pub is_active: bool,
}

impl WhiteNoise {
    pub fn new(id: &str, name: &str, file: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            file: file.to_string(),
            is_active: false,
        }
    }
}

/// The tracks shipped with the app. All are generated, so they play
/// without any audio files installed.
pub fn default_tracks() -> Vec<WhiteNoise> {
    vec![
        WhiteNoise::new("white", "White noise", "builtin:white"),
        WhiteNoise::new("pink", "Pink noise", "builtin:pink"),
        WhiteNoise::new("brown", "Brown noise", "builtin:brown"),
    ]
}

/// Audio output for looping tracks.
pub trait Playback: Send {
    /// Start looping `track`. May be refused by the platform.
    fn play(&mut self, track: &WhiteNoise, volume: f32) -> Result<(), PlaybackError>;
    /// Stop `id` and rewind it. Stopping a silent track is a no-op.
    fn stop(&mut self, id: &str);
    fn set_volume(&mut self, id: &str, volume: f32);
}

impl Playback for Box<dyn Playback> {
    fn play(&mut self, track: &WhiteNoise, volume: f32) -> Result<(), PlaybackError> {
        (**self).play(track, volume)
    }

    fn stop(&mut self, id: &str) {
        (**self).stop(id)
    }

    fn set_volume(&mut self, id: &str, volume: f32) {
        (**self).set_volume(id, volume)
    }
}

/// Backend that accepts every request and produces no sound.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayback;

impl Playback for SilentPlayback {
    fn play(&mut self, track: &WhiteNoise, volume: f32) -> Result<(), PlaybackError> {
        debug!(track = %track.id, volume, "silent playback started");
        Ok(())
    }

    fn stop(&mut self, id: &str) {
        debug!(track = %id, "silent playback stopped");
    }

    fn set_volume(&mut self, id: &str, volume: f32) {
        debug!(track = %id, volume, "silent playback volume");
    }
}

pub struct WhiteNoiseRegistry {
    tracks: Vec<WhiteNoise>,
    volumes: HashMap<String, f32>,
    default_volume: f32,
    playback: Box<dyn Playback>,
}

impl WhiteNoiseRegistry {
    /// Registry over `tracks`. Every track starts inactive; the backend has
    /// not been asked to play anything yet.
    pub fn new(tracks: Vec<WhiteNoise>, playback: impl Playback + 'static) -> Self {
        let mut registry = Self {
            tracks: Vec::new(),
            volumes: HashMap::new(),
            default_volume: DEFAULT_VOLUME,
            playback: Box::new(playback),
        };
        registry.replace_all(tracks);
        registry
    }

    pub fn with_default_volume(mut self, volume: f32) -> Self {
        self.default_volume = clamp_volume(volume);
        self
    }

    pub fn tracks(&self) -> &[WhiteNoise] {
        &self.tracks
    }

    pub fn get(&self, id: &str) -> Option<&WhiteNoise> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn active(&self) -> Option<&WhiteNoise> {
        self.tracks.iter().find(|t| t.is_active)
    }

    pub fn volume(&self, id: &str) -> f32 {
        self.volumes.get(id).copied().unwrap_or(self.default_volume)
    }

    /// Switch `id` on or off.
    ///
    /// Turning a track on stops every other track. If the backend refuses
    /// playback, no flag changes and the error is returned.
    ///
    /// # Errors
    /// [`ValidationError::UnknownTrack`] for an unknown id,
    /// [`PlaybackError`] if playback could not start.
    pub fn toggle(&mut self, id: &str) -> Result<Event, CoreError> {
        let idx = self
            .tracks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ValidationError::UnknownTrack(id.to_string()))?;

        if self.tracks[idx].is_active {
            self.playback.stop(id);
            self.tracks[idx].is_active = false;
            debug!(track = %id, "white noise stopped");
            return Ok(Event::WhiteNoiseStopped {
                track_id: id.to_string(),
                at: Utc::now(),
            });
        }

        let volume = self.volume(id);
        if let Err(e) = self.playback.play(&self.tracks[idx], volume) {
            warn!(track = %id, error = %e, "white noise playback refused");
            return Err(e.into());
        }

        for track in self.tracks.iter_mut().filter(|t| t.id != id) {
            self.playback.stop(&track.id);
            track.is_active = false;
        }
        self.tracks[idx].is_active = true;
        debug!(track = %id, volume, "white noise started");
        Ok(Event::WhiteNoiseStarted {
            track_id: id.to_string(),
            at: Utc::now(),
        })
    }

    /// Set a track's volume, clamped to `[0, 1]`. Returns the stored level.
    ///
    /// # Errors
    /// [`ValidationError::UnknownTrack`] for an unknown id.
    pub fn set_volume(&mut self, id: &str, level: f32) -> Result<f32, ValidationError> {
        if self.get(id).is_none() {
            return Err(ValidationError::UnknownTrack(id.to_string()));
        }
        let level = clamp_volume(level);
        self.volumes.insert(id.to_string(), level);
        self.playback.set_volume(id, level);
        Ok(level)
    }

    pub fn stop_all(&mut self) {
        for track in &mut self.tracks {
            self.playback.stop(&track.id);
            track.is_active = false;
        }
    }

    /// Install a new track list, stopping whatever was playing.
    /// Incoming tracks are always inactive.
    pub fn replace_all(&mut self, tracks: Vec<WhiteNoise>) {
        self.stop_all();
        self.tracks = tracks
            .into_iter()
            .map(|mut t| {
                t.is_active = false;
                t
            })
            .collect();
        self.volumes.retain(|id, _| self.tracks.iter().any(|t| &t.id == id));
    }
}

impl Default for WhiteNoiseRegistry {
    fn default() -> Self {
        Self::new(default_tracks(), SilentPlayback)
    }
}

fn clamp_volume(level: f32) -> f32 {
    if level.is_nan() {
        return 0.0;
    }
    level.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Backend that records calls and refuses tracks listed in `deny`.
    #[derive(Clone, Default)]
    struct Scripted {
        log: Arc<Mutex<Vec<String>>>,
        deny: Vec<String>,
    }

    impl Playback for Scripted {
        fn play(&mut self, track: &WhiteNoise, volume: f32) -> Result<(), PlaybackError> {
            if self.deny.contains(&track.id) {
                return Err(PlaybackError::Refused {
                    track: track.id.clone(),
                    reason: "autoplay blocked".into(),
                });
            }
            self.log.lock().unwrap().push(format!("play {} {volume}", track.id));
            Ok(())
        }
        fn stop(&mut self, id: &str) {
            self.log.lock().unwrap().push(format!("stop {id}"));
        }
        fn set_volume(&mut self, id: &str, volume: f32) {
            self.log.lock().unwrap().push(format!("volume {id} {volume}"));
        }
    }

    fn active_ids(reg: &WhiteNoiseRegistry) -> Vec<&str> {
        reg.tracks()
            .iter()
            .filter(|t| t.is_active)
            .map(|t| t.id.as_str())
            .collect()
    }

    #[test]
    fn toggling_b_after_a_leaves_only_b() {
        let mut reg = WhiteNoiseRegistry::default();
        reg.toggle("white").unwrap();
        assert_eq!(active_ids(&reg), vec!["white"]);
        reg.toggle("pink").unwrap();
        assert_eq!(active_ids(&reg), vec!["pink"]);
    }

    #[test]
    fn toggling_active_track_stops_it() {
        let mut reg = WhiteNoiseRegistry::default();
        reg.toggle("brown").unwrap();
        let event = reg.toggle("brown").unwrap();
        assert!(matches!(event, Event::WhiteNoiseStopped { .. }));
        assert!(reg.active().is_none());
    }

    #[test]
    fn refused_playback_changes_nothing() {
        let backend = Scripted {
            deny: vec!["pink".into()],
            ..Default::default()
        };
        let log = backend.log.clone();
        let mut reg = WhiteNoiseRegistry::new(default_tracks(), backend);
        reg.toggle("white").unwrap();

        let err = reg.toggle("pink").unwrap_err();
        assert!(matches!(err, CoreError::Playback(PlaybackError::Refused { .. })));
        assert_eq!(active_ids(&reg), vec!["white"]);
        assert!(!log.lock().unwrap().iter().any(|l| l == "stop white"));
    }

    #[test]
    fn unknown_track_is_rejected() {
        let mut reg = WhiteNoiseRegistry::default();
        assert!(matches!(
            reg.toggle("ocean"),
            Err(CoreError::Validation(ValidationError::UnknownTrack(_)))
        ));
        assert!(reg.set_volume("ocean", 0.3).is_err());
    }

    #[test]
    fn volume_is_clamped_and_independent() {
        let backend = Scripted::default();
        let log = backend.log.clone();
        let mut reg = WhiteNoiseRegistry::new(default_tracks(), backend);
        assert_eq!(reg.volume("white"), DEFAULT_VOLUME);
        assert_eq!(reg.set_volume("white", 1.7), Ok(1.0));
        assert_eq!(reg.set_volume("pink", -0.2), Ok(0.0));
        assert_eq!(reg.volume("brown"), DEFAULT_VOLUME);
        assert!(reg.active().is_none());

        reg.toggle("white").unwrap();
        assert!(log.lock().unwrap().contains(&"play white 1".to_string()));
    }

    #[test]
    fn default_tracks_resolve_without_files() {
        let empty = tempfile::tempdir().unwrap();
        for track in default_tracks() {
            assert!(
                matches!(TrackSource::resolve(&track.file, empty.path()), Ok(TrackSource::Noise(_))),
                "{} does not resolve",
                track.id
            );
        }
    }

    #[test]
    fn boxed_backend_delegates() {
        let backend = Scripted::default();
        let log = backend.log.clone();
        let boxed: Box<dyn Playback> = Box::new(backend);
        let mut reg = WhiteNoiseRegistry::new(default_tracks(), boxed);
        reg.toggle("pink").unwrap();
        reg.set_volume("pink", 0.25).unwrap();
        let log = log.lock().unwrap();
        assert!(log.contains(&"play pink 0.5".to_string()));
        assert!(log.contains(&"volume pink 0.25".to_string()));
    }

    #[test]
    fn replace_all_forces_inactive() {
        let mut reg = WhiteNoiseRegistry::default();
        let mut tracks = default_tracks();
        tracks[0].is_active = true;
        tracks[1].is_active = true;
        reg.replace_all(tracks);
        assert!(reg.active().is_none());
    }
}
