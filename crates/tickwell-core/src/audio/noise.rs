//! Generated noise tracks.
//!
//! The built-in tracks need no audio files: each is an endless mono stream
//! of white noise, optionally filtered to pink or brown.

use std::fmt;
use std::str::FromStr;

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;

pub const SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseColor {
    /// Flat spectrum.
    White,
    /// -3 dB per octave; soft, like steady rain.
    Pink,
    /// -6 dB per octave; a low rumble, like surf.
    Brown,
}

impl FromStr for NoiseColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "white" => Ok(Self::White),
            "pink" => Ok(Self::Pink),
            "brown" => Ok(Self::Brown),
            other => Err(format!("unknown noise color '{other}'")),
        }
    }
}

impl fmt::Display for NoiseColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::White => "white",
            Self::Pink => "pink",
            Self::Brown => "brown",
        })
    }
}

/// Infinite sample stream in `[-1, 1]`.
pub struct NoiseSource {
    color: NoiseColor,
    rng: Mcg128Xsl64,
    // Pink filter poles (Paul Kellet's refined method).
    pink: [f32; 7],
    brown: f32,
}

impl NoiseSource {
    pub fn new(color: NoiseColor) -> Self {
        Self::with_rng(color, Mcg128Xsl64::from_entropy())
    }

    /// Reproducible stream for tests.
    pub fn seeded(color: NoiseColor, seed: u64) -> Self {
        Self::with_rng(color, Mcg128Xsl64::seed_from_u64(seed))
    }

    fn with_rng(color: NoiseColor, rng: Mcg128Xsl64) -> Self {
        Self {
            color,
            rng,
            pink: [0.0; 7],
            brown: 0.0,
        }
    }

    pub fn color(&self) -> NoiseColor {
        self.color
    }

    fn pink_sample(&mut self, white: f32) -> f32 {
        let b = &mut self.pink;
        b[0] = 0.99886 * b[0] + white * 0.055_517_9;
        b[1] = 0.99332 * b[1] + white * 0.075_075_9;
        b[2] = 0.96900 * b[2] + white * 0.153_852;
        b[3] = 0.86650 * b[3] + white * 0.310_485_6;
        b[4] = 0.55000 * b[4] + white * 0.532_952_2;
        b[5] = -0.7616 * b[5] - white * 0.016_898;
        let out = b[0] + b[1] + b[2] + b[3] + b[4] + b[5] + b[6] + white * 0.5362;
        b[6] = white * 0.115_926;
        out * 0.11
    }

    fn brown_sample(&mut self, white: f32) -> f32 {
        self.brown = (self.brown + 0.02 * white) / 1.02;
        self.brown * 3.5
    }
}

impl Iterator for NoiseSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let white: f32 = self.rng.gen_range(-1.0..=1.0);
        let sample = match self.color {
            NoiseColor::White => white * 0.5,
            NoiseColor::Pink => self.pink_sample(white),
            NoiseColor::Brown => self.brown_sample(white),
        };
        Some(sample.clamp(-1.0, 1.0))
    }
}

#[cfg(feature = "audio")]
impl rodio::Source for NoiseSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<std::time::Duration> {
        None
    }
}
