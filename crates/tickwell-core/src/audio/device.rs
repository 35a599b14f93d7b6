//! Speaker output through rodio.
//!
//! `OutputStream` is not `Send`, so the stream and every sink live on a
//! dedicated thread. [`RodioPlayback`] only holds the command channel and
//! can move into the session task like any other backend.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};

use crate::error::PlaybackError;

use super::noise::NoiseSource;
use super::source::TrackSource;
use super::{Playback, WhiteNoise};

enum AudioCommand {
    Play {
        id: String,
        source: TrackSource,
        volume: f32,
        reply: mpsc::Sender<Result<(), PlaybackError>>,
    },
    Stop {
        id: String,
    },
    Volume {
        id: String,
        volume: f32,
    },
}

/// Loops tracks on the default output device, one sink per track.
pub struct RodioPlayback {
    tx: mpsc::Sender<AudioCommand>,
    audio_dir: PathBuf,
}

impl RodioPlayback {
    /// Start the audio thread. The output device is opened on the first
    /// `play`, so constructing a backend on a machine without speakers is
    /// harmless; playing on one is refused.
    pub fn new(audio_dir: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("tickwell-audio".into())
            .spawn(move || output_loop(rx));
        if let Err(e) = spawned {
            warn!(error = %e, "failed to start audio thread");
        }
        Self {
            tx,
            audio_dir: audio_dir.into(),
        }
    }
}

impl Playback for RodioPlayback {
    fn play(&mut self, track: &WhiteNoise, volume: f32) -> Result<(), PlaybackError> {
        let source = TrackSource::resolve(&track.file, &self.audio_dir)?;
        let refused = |reason: &str| PlaybackError::Refused {
            track: track.id.clone(),
            reason: reason.to_string(),
        };

        let (reply, result) = mpsc::channel();
        self.tx
            .send(AudioCommand::Play {
                id: track.id.clone(),
                source,
                volume,
                reply,
            })
            .map_err(|_| refused("audio thread is not running"))?;
        result
            .recv()
            .unwrap_or_else(|_| Err(refused("audio thread stopped")))
    }

    fn stop(&mut self, id: &str) {
        let _ = self.tx.send(AudioCommand::Stop { id: id.to_string() });
    }

    fn set_volume(&mut self, id: &str, volume: f32) {
        let _ = self.tx.send(AudioCommand::Volume {
            id: id.to_string(),
            volume,
        });
    }
}

fn output_loop(rx: mpsc::Receiver<AudioCommand>) {
    let mut output: Option<(OutputStream, OutputStreamHandle)> = None;
    let mut sinks: HashMap<String, Sink> = HashMap::new();

    while let Ok(command) = rx.recv() {
        match command {
            AudioCommand::Play {
                id,
                source,
                volume,
                reply,
            } => {
                let result = open_sink(&mut output, &id, source, volume).map(|sink| {
                    // Replacing a sink drops the old one, which silences it.
                    sinks.insert(id, sink);
                });
                let _ = reply.send(result);
            }
            AudioCommand::Stop { id } => {
                if let Some(sink) = sinks.remove(&id) {
                    sink.stop();
                    debug!(track = %id, "sink stopped");
                }
            }
            AudioCommand::Volume { id, volume } => {
                if let Some(sink) = sinks.get(&id) {
                    sink.set_volume(volume);
                }
            }
        }
    }
    debug!("audio thread exiting");
}

fn open_sink(
    output: &mut Option<(OutputStream, OutputStreamHandle)>,
    id: &str,
    source: TrackSource,
    volume: f32,
) -> Result<Sink, PlaybackError> {
    let refused = |reason: String| PlaybackError::Refused {
        track: id.to_string(),
        reason,
    };

    if output.is_none() {
        let opened = OutputStream::try_default().map_err(|e| refused(e.to_string()))?;
        debug!("audio output opened");
        *output = Some(opened);
    }
    let Some((_, handle)) = output.as_ref() else {
        return Err(refused("no audio output".into()));
    };

    let sink = Sink::try_new(handle).map_err(|e| refused(e.to_string()))?;
    sink.set_volume(volume);
    match source {
        TrackSource::Noise(color) => sink.append(NoiseSource::new(color)),
        TrackSource::File(path) => {
            let unavailable = || PlaybackError::SourceUnavailable(path.display().to_string());
            let file = File::open(&path).map_err(|_| unavailable())?;
            let decoded = Decoder::new(BufReader::new(file)).map_err(|e| {
                warn!(path = %path.display(), error = %e, "cannot decode audio file");
                unavailable()
            })?;
            sink.append(decoded.repeat_infinite());
        }
    }
    debug!(track = %id, volume, "sink playing");
    Ok(sink)
}
