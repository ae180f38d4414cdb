//! The speak pipeline: voice resolution, synthesis, onset mapping, and
//! playback with the gesture timeline anchored to the first sample.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task;
use tracing::{debug, info};

use bassline_core::gesture::HeadParams;
use bassline_core::track::{self, AccentParams, TrackParams};
use bassline_core::{BasslineError, Result, Scheduler};

use crate::clip::AudioClip;
use crate::onset::OnsetDetector;
use crate::sink::AudioSink;
use crate::tts::TtsEngine;
use crate::voice;

/// Speak pipeline tuning.
#[derive(Debug, Clone)]
pub struct SpeakerConfig {
    /// Pause after playback before the next utterance may start.
    pub settle: Duration,
    /// Bound on the in-memory synthesis cache, in utterances.
    pub cache_capacity: usize,
    /// Head cue raised at the start of each utterance. Left un-released so
    /// the head stays up while the rig talks; shutdown releases it.
    pub head_cue: HeadParams,
    pub track: TrackParams,
    /// Decorative tail flaps over the utterance; `None` disables them.
    pub accents: Option<AccentParams>,
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(500),
            cache_capacity: 128,
            head_cue: HeadParams {
                release: false,
                ..HeadParams::default()
            },
            track: TrackParams::default(),
            accents: Some(AccentParams::default()),
        }
    }
}

type CacheEntry = (Arc<Vec<u8>>, Arc<Vec<f32>>);

// Bounded map of (text, voice) -> (audio bytes, onset timeline with
// sentinel); oldest entry evicted first.
struct TtsCache {
    entries: HashMap<(String, String), CacheEntry>,
    order: VecDeque<(String, String)>,
    capacity: usize,
}

impl TtsCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn get(&self, key: &(String, String)) -> Option<CacheEntry> {
        self.entries.get(key).cloned()
    }

    fn insert(&mut self, key: (String, String), entry: CacheEntry) {
        if self.entries.insert(key.clone(), entry).is_none() {
            self.order.push_back(key);
        }
        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

/// Drives one utterance at a time through synthesis, playback, and the
/// gesture timeline.
pub struct Speaker {
    sched: Arc<Scheduler>,
    tts: Arc<dyn TtsEngine>,
    detector: Arc<dyn OnsetDetector>,
    sink: Arc<dyn AudioSink>,
    cache: Mutex<TtsCache>,
    // One full utterance (audio + gesture timeline) in flight at a time.
    utterance: tokio::sync::Mutex<()>,
    cfg: SpeakerConfig,
}

impl Speaker {
    pub fn new(
        sched: Arc<Scheduler>,
        tts: Arc<dyn TtsEngine>,
        detector: Arc<dyn OnsetDetector>,
        sink: Arc<dyn AudioSink>,
        cfg: SpeakerConfig,
    ) -> Self {
        let cache = Mutex::new(TtsCache::new(cfg.cache_capacity));
        Self {
            sched,
            tts,
            detector,
            sink,
            cache,
            utterance: tokio::sync::Mutex::new(()),
            cfg,
        }
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.sched
    }

    /// Speaks `text` with the voice resolved from `voice_query`, falling
    /// back to English. See [`Speaker::speak_with_voice`].
    pub async fn speak(&self, text: &str, voice_query: &str) -> Result<()> {
        let voice = voice::lookup_or_english(voice_query);
        self.speak_with_voice(text, voice.name).await
    }

    /// Speaks `text` with an exact voice id, animating mouth and tail to
    /// the audio. Returns after playback has finished and the settle pause
    /// elapsed. Synthesis and decode failures propagate before any gesture
    /// is scheduled.
    pub async fn speak_with_voice(&self, text: &str, voice_id: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let _utterance = self.utterance.lock().await;
        info!(target: "speak", voice_id, text, "speaking");

        // Synthesize (or reuse) and derive the onset timeline first: a
        // failed utterance must produce no motion at all.
        let (audio, onsets) = self.fetch(text, voice_id).await?;
        let clip = Arc::new(AudioClip::from_wav(&audio)?);

        // Raise the head as a visible cue that an utterance is coming,
        // after dropping whatever a previous utterance left scheduled.
        self.sched.clear_pending();
        let cue_done = self.sched.move_head(&self.cfg.head_cue);

        // Let the head cue finish before sound starts.
        tokio::time::sleep_until(cue_done.into()).await;

        // Playback blocks on a separate thread; the pre-play hook anchors
        // the mouth track at the true start of audio.
        let sched = Arc::clone(&self.sched);
        let sink = Arc::clone(&self.sink);
        let clip_for_playback = Arc::clone(&clip);
        let track_params = self.cfg.track;
        let accent_params = self.cfg.accents;
        let duration = clip.duration_secs();

        let played = task::spawn_blocking(move || {
            let on_start = Box::new(move || {
                let t_base = Instant::now();
                let mut events = track::mouth_track(t_base, t_base, &onsets, &track_params);
                if let Some(p) = accent_params {
                    let end = t_base + Duration::from_secs_f32(duration);
                    events.extend(track::tail_accents(t_base, end, &p));
                }
                debug!(target: "speak", scheduled = events.len(), "gesture timeline anchored");
                sched.push_all(events);
            });
            sink.play(&clip_for_playback, on_start)
        })
        .await
        .map_err(|e| BasslineError::PlaybackError(format!("playback task failed: {e}")))?;
        played?;

        tokio::time::sleep(self.cfg.settle).await;
        Ok(())
    }

    // Returns cached audio + onsets for the utterance, or synthesizes,
    // detects, and caches them. The onset list ends with the
    // end-of-content sentinel.
    async fn fetch(&self, text: &str, voice_id: &str) -> Result<CacheEntry> {
        let key = (text.to_string(), voice_id.to_string());
        if let Some(hit) = self.cache.lock().get(&key) {
            debug!(target: "speak", "synthesis cache hit");
            return Ok(hit);
        }

        let audio = self.tts.synthesize(text, voice_id).await?;
        let clip = AudioClip::from_wav(&audio)?;
        let mut onsets = self.detector.detect(&clip)?;
        onsets.push(clip.duration_secs());

        let entry: CacheEntry = (Arc::new(audio), Arc::new(onsets));
        self.cache.lock().insert(key, entry.clone());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tag: u8) -> CacheEntry {
        (Arc::new(vec![tag]), Arc::new(vec![tag as f32]))
    }

    fn key(s: &str) -> (String, String) {
        (s.to_string(), "Joanna".to_string())
    }

    #[test]
    fn cache_evicts_oldest_entry() {
        let mut cache = TtsCache::new(2);
        cache.insert(key("a"), entry(1));
        cache.insert(key("b"), entry(2));
        cache.insert(key("c"), entry(3));

        assert!(cache.get(&key("a")).is_none());
        assert!(cache.get(&key("b")).is_some());
        assert!(cache.get(&key("c")).is_some());
    }

    #[test]
    fn cache_overwrite_does_not_duplicate_order() {
        let mut cache = TtsCache::new(2);
        cache.insert(key("a"), entry(1));
        cache.insert(key("a"), entry(2));
        cache.insert(key("b"), entry(3));
        cache.insert(key("c"), entry(4));

        // "a" was the oldest and is gone; the rest survive.
        assert!(cache.get(&key("a")).is_none());
        assert!(cache.get(&key("b")).is_some());
        assert!(cache.get(&key("c")).is_some());
    }
}
