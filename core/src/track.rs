//! Maps detected speech onsets to mouth gestures, plus decorative tail
//! accents over an utterance.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::event::ScheduledEvent;
use crate::gesture::{self, FlapParams, FULL_SPEED};

/// Tuning for onset-to-mouth mapping.
#[derive(Debug, Clone, Copy)]
pub struct TrackParams {
    /// Onsets closer than this to the previously accepted one are dropped;
    /// the mouth cannot physically reverse faster.
    pub min_gap: Duration,
    /// Uniform jitter bounds for how long the mouth stays open per flap.
    pub hold_min: Duration,
    pub hold_max: Duration,
    /// Stroke time for each flap.
    pub travel: Duration,
    pub speed: u8,
}

impl Default for TrackParams {
    fn default() -> Self {
        Self {
            min_gap: Duration::from_millis(100),
            hold_min: Duration::from_millis(50),
            hold_max: Duration::from_millis(100),
            travel: Duration::from_millis(100),
            speed: FULL_SPEED,
        }
    }
}

/// Expands relative onset timestamps into mouth flaps.
///
/// `onsets` is ordered, in seconds from content start, and ends with the
/// end-of-content sentinel appended by the caller. `t_base` anchors the
/// content start on the clock; `prev` seeds the previously-accepted
/// instant (normally the caller's current instant). Each retained onset
/// emits one flap anchored at the previously accepted instant, so the
/// mouth starts moving slightly ahead of the onset it answers. Inputs with
/// fewer than two entries carry no content and emit nothing.
pub fn mouth_track(
    t_base: Instant,
    prev: Instant,
    onsets: &[f32],
    p: &TrackParams,
) -> Vec<ScheduledEvent> {
    if onsets.len() < 2 {
        return Vec::new();
    }

    let mut rng = rand::thread_rng();
    let mut events = Vec::new();
    let mut prev_t = prev;
    for &onset in onsets {
        let t = t_base + Duration::from_secs_f32(onset.max(0.0));
        let gap = match t.checked_duration_since(prev_t) {
            Some(gap) => gap,
            None => continue,
        };
        if gap < p.min_gap {
            continue;
        }
        let hold = rng.gen_range(p.hold_min..=p.hold_max);
        let flap = FlapParams {
            speed: p.speed,
            travel: p.travel,
            hold,
            release: false,
        };
        let (flap_events, _) = gesture::mouth_flap(prev_t, &flap);
        events.extend(flap_events);
        prev_t = t;
    }
    events
}

/// Tuning for decorative tail flaps during an utterance.
#[derive(Debug, Clone, Copy)]
pub struct AccentParams {
    /// Upper bound on the random spacing added between accents.
    pub spread: Duration,
    /// Minimum quiet time between one accent ending and the next starting.
    pub min_gap: Duration,
    pub travel: Duration,
    pub hold_min: Duration,
    pub hold_max: Duration,
    pub speed: u8,
}

impl Default for AccentParams {
    fn default() -> Self {
        Self {
            spread: Duration::from_millis(1500),
            min_gap: Duration::from_millis(400),
            travel: Duration::from_millis(120),
            hold_min: Duration::from_millis(50),
            hold_max: Duration::from_millis(200),
            speed: FULL_SPEED,
        }
    }
}

/// Scatters tail flaps across `[start, end)`. Flaps never extend past
/// `end` and keep at least `min_gap` between one another.
pub fn tail_accents(start: Instant, end: Instant, p: &AccentParams) -> Vec<ScheduledEvent> {
    if end <= start {
        return Vec::new();
    }

    let mut rng = rand::thread_rng();
    let mut events = Vec::new();
    let mut t = start + rng.gen_range(Duration::ZERO..=p.spread);
    while t < end {
        let hold = rng.gen_range(p.hold_min..=p.hold_max);
        let flap = FlapParams {
            speed: p.speed,
            travel: p.travel,
            hold,
            release: false,
        };
        let (flap_events, flap_end) = gesture::tail_flap(t, &flap);
        if flap_end > end {
            break;
        }
        events.extend(flap_events);
        t = flap_end + p.min_gap + rng.gen_range(Duration::ZERO..=p.spread);
    }
    events
}
