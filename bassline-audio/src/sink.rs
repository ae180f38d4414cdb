//! Audio playback sinks.
//!
//! Playback is blocking on purpose: the speak pipeline parks it on a
//! blocking task and uses the pre-play hook to anchor gesture timelines to
//! the first delivered sample.

use bassline_core::Result;

use crate::clip::AudioClip;

/// Plays a decoded clip to some output, invoking `on_start` immediately
/// before the first sample is delivered.
pub trait AudioSink: Send + Sync {
    fn play(&self, clip: &AudioClip, on_start: Box<dyn FnOnce() + Send>) -> Result<()>;
}

/// Sink for machines without an output device: fires the hook, then
/// sleeps for the clip duration so timing-sensitive callers behave as
/// they would during real playback.
pub struct TimedSink;

impl AudioSink for TimedSink {
    fn play(&self, clip: &AudioClip, on_start: Box<dyn FnOnce() + Send>) -> Result<()> {
        on_start();
        std::thread::sleep(std::time::Duration::from_secs_f32(clip.duration_secs()));
        Ok(())
    }
}

#[cfg(feature = "playback")]
pub use cpal_sink::CpalSink;

#[cfg(feature = "playback")]
mod cpal_sink {
    use super::*;
    use bassline_core::BasslineError;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::sync::mpsc;
    use std::time::Duration;
    use tracing::{info, warn};

    /// Plays clips on the default cpal output device.
    pub struct CpalSink;

    impl AudioSink for CpalSink {
        fn play(&self, clip: &AudioClip, on_start: Box<dyn FnOnce() + Send>) -> Result<()> {
            let host = cpal::default_host();
            let device = host.default_output_device().ok_or_else(|| {
                BasslineError::PlaybackError("no output device available".into())
            })?;
            let device_name = device.name().unwrap_or_else(|_| "unknown".into());

            let config = cpal::StreamConfig {
                channels: clip.channels.max(1),
                sample_rate: cpal::SampleRate(clip.sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };

            let samples = clip.samples.clone();
            let mut cursor = 0usize;
            let (done_tx, done_rx) = mpsc::channel::<()>();
            let stream = device
                .build_output_stream(
                    &config,
                    move |out: &mut [i16], _| {
                        for slot in out.iter_mut() {
                            *slot = if cursor < samples.len() {
                                let s = samples[cursor];
                                cursor += 1;
                                s
                            } else {
                                0
                            };
                        }
                        if cursor >= samples.len() {
                            let _ = done_tx.send(());
                        }
                    },
                    |err| warn!(target: "playback", error = %err, "output stream error"),
                    None,
                )
                .map_err(|e| {
                    BasslineError::PlaybackError(format!("failed to build output stream: {e}"))
                })?;

            info!(
                target: "playback",
                device = %device_name,
                rate = clip.sample_rate,
                channels = clip.channels,
                "starting playback"
            );

            on_start();
            stream.play().map_err(|e| {
                BasslineError::PlaybackError(format!("failed to start output stream: {e}"))
            })?;

            // Wait for the callback to exhaust the clip; the stream stops
            // when dropped.
            let duration = Duration::from_secs_f32(clip.duration_secs());
            if done_rx.recv_timeout(duration + Duration::from_secs(2)).is_err() {
                warn!(target: "playback", "stream did not drain in time; stopping anyway");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn timed_sink_fires_hook_then_blocks_for_duration() {
        let clip = AudioClip {
            samples: vec![0; 2_205], // 100ms at 22.05kHz mono
            sample_rate: 22_050,
            channels: 1,
        };
        let fired = Arc::new(AtomicBool::new(false));
        let fired_in_hook = Arc::clone(&fired);

        let started = Instant::now();
        TimedSink
            .play(
                &clip,
                Box::new(move || {
                    fired_in_hook.store(true, Ordering::SeqCst);
                }),
            )
            .unwrap();

        assert!(fired.load(Ordering::SeqCst));
        assert!(started.elapsed() >= std::time::Duration::from_millis(100));
    }
}
