//! Resolving a track's `file` locator to something playable.

use std::path::{Path, PathBuf};

use crate::error::PlaybackError;

use super::noise::NoiseColor;

/// Locator prefix for generated tracks, e.g. `builtin:pink`.
pub const BUILTIN_PREFIX: &str = "builtin:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSource {
    Noise(NoiseColor),
    File(PathBuf),
}

impl TrackSource {
    /// Resolve `locator`. Relative paths are looked up in `audio_dir`;
    /// a leading `/` is treated as relative too so web-style paths from
    /// imported files (`/audio/rain.mp3`) land in the same directory.
    ///
    /// # Errors
    /// [`PlaybackError::SourceUnavailable`] for an unknown built-in or a
    /// file that does not exist.
    pub fn resolve(locator: &str, audio_dir: &Path) -> Result<Self, PlaybackError> {
        if let Some(color) = locator.strip_prefix(BUILTIN_PREFIX) {
            return color
                .parse()
                .map(Self::Noise)
                .map_err(|_| PlaybackError::SourceUnavailable(locator.to_string()));
        }

        let path = Path::new(locator);
        let path = if path.is_absolute() && path.exists() {
            path.to_path_buf()
        } else {
            let relative = locator.trim_start_matches('/');
            let relative = relative.strip_prefix("audio/").unwrap_or(relative);
            audio_dir.join(relative)
        };
        if !path.is_file() {
            return Err(PlaybackError::SourceUnavailable(path.display().to_string()));
        }
        Ok(Self::File(path))
    }
}
