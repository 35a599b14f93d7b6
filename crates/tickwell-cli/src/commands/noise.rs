use clap::Subcommand;
use tickwell_core::audio::default_tracks;
use tickwell_core::storage::audio_dir;
use tickwell_core::{Config, SilentPlayback, TrackSource, WhiteNoiseRegistry};

use super::{open_repo, CliResult};

#[derive(Subcommand)]
pub enum NoiseAction {
    /// List white noise tracks
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Restore the built-in track list
    Reset,
}

pub fn run(action: NoiseAction) -> CliResult {
    let mut repo = open_repo()?;
    match action {
        NoiseAction::List { json } => {
            let config = Config::load_or_default();
            let registry = WhiteNoiseRegistry::new(repo.load_white_noises()?, SilentPlayback)
                .with_default_volume(config.white_noise.default_volume);
            if json {
                println!("{}", serde_json::to_string_pretty(registry.tracks())?);
                return Ok(());
            }
            let dir = audio_dir()?;
            for track in registry.tracks() {
                let missing = match TrackSource::resolve(&track.file, &dir) {
                    Ok(_) => "",
                    Err(_) => "  (missing)",
                };
                println!(
                    "{:<8} {:<18} vol {:.2}  {}{missing}",
                    track.id,
                    track.name,
                    registry.volume(&track.id),
                    track.file
                );
            }
        }
        NoiseAction::Reset => {
            let tracks = default_tracks();
            repo.save_white_noises(&tracks)?;
            println!("restored {} track(s)", tracks.len());
        }
    }
    Ok(())
}
