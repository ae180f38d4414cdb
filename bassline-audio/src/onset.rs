//! Onset detection over decoded audio.
//!
//! The scheduler core consumes onsets as plain timestamps; this module is
//! the boundary they come from. [`EnergyOnsets`] is a small windowed
//! energy-rise detector, adequate for lip-sync; anything smarter slots in
//! through the trait.

use bassline_core::Result;
use tracing::debug;

use crate::clip::AudioClip;

/// Produces onset timestamps, in seconds from content start, for a clip.
///
/// Implementations do not append the end-of-content sentinel; callers do.
pub trait OnsetDetector: Send + Sync {
    fn detect(&self, clip: &AudioClip) -> Result<Vec<f32>>;
}

/// Detector tuning.
#[derive(Debug, Clone)]
pub struct OnsetConfig {
    /// Analysis window, in frames.
    pub window_size: usize,
    /// Hop between analysis windows, in frames.
    pub hop_size: usize,
    /// Window energy must exceed the trailing average by this factor.
    pub threshold: f32,
    /// Energies below this are treated as silence and never trigger.
    pub floor: f32,
    /// Method label, recorded for diagnostics.
    pub method: String,
}

impl Default for OnsetConfig {
    fn default() -> Self {
        Self {
            window_size: 512,
            hop_size: 256,
            threshold: 1.8,
            floor: 1e-4,
            method: "energy".to_string(),
        }
    }
}

/// Windowed energy-rise onset detector.
///
/// Tracks an exponential trailing average of window energy; a window that
/// jumps past `threshold` times the average marks an onset, and the
/// detector re-arms once energy falls back to the average.
pub struct EnergyOnsets {
    cfg: OnsetConfig,
}

impl EnergyOnsets {
    pub fn new(cfg: OnsetConfig) -> Self {
        Self { cfg }
    }
}

impl Default for EnergyOnsets {
    fn default() -> Self {
        Self::new(OnsetConfig::default())
    }
}

impl OnsetDetector for EnergyOnsets {
    fn detect(&self, clip: &AudioClip) -> Result<Vec<f32>> {
        let ch = clip.channels.max(1) as usize;
        let hop = self.cfg.hop_size.max(1);
        let win = self.cfg.window_size.max(hop);

        let frames = clip.samples.len() / ch;
        if frames < win || clip.sample_rate == 0 {
            return Ok(Vec::new());
        }

        // Mono mixdown, normalized to [-1, 1].
        let sample = |i: usize| -> f32 {
            let base = i * ch;
            let mut acc = 0.0f32;
            for c in 0..ch {
                acc += clip.samples[base + c] as f32;
            }
            acc / (ch as f32 * i16::MAX as f32)
        };

        let mut onsets = Vec::new();
        let mut trailing = 0.0f32;
        let mut armed = true;
        let mut start = 0usize;
        while start + win <= frames {
            let mut energy = 0.0f32;
            for i in start..start + win {
                let s = sample(i);
                energy += s * s;
            }
            energy /= win as f32;

            if armed && energy > self.cfg.floor + self.cfg.threshold * trailing {
                onsets.push(start as f32 / clip.sample_rate as f32);
                armed = false;
            } else if energy <= trailing {
                armed = true;
            }
            trailing = 0.9 * trailing + 0.1 * energy;
            start += hop;
        }

        debug!(
            target: "onset",
            method = %self.cfg.method,
            onsets = onsets.len(),
            duration = clip.duration_secs(),
            "onset detection finished"
        );
        Ok(onsets)
    }
}
