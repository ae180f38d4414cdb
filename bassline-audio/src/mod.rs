// Audio-side collaborators for the animatronic rig

pub mod clip;
pub mod onset;
pub mod sink;
pub mod speak;
pub mod tts;
pub mod voice;

pub use clip::AudioClip;
pub use onset::{EnergyOnsets, OnsetConfig, OnsetDetector};
pub use sink::{AudioSink, TimedSink};
pub use speak::{Speaker, SpeakerConfig};
pub use tts::{HttpTts, HttpTtsConfig, TtsEngine};
pub use voice::{lookup, lookup_or_english, Voice};

#[cfg(feature = "playback")]
pub use sink::CpalSink;
