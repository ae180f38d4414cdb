use bassline_audio::HttpTtsConfig;
use bassline_core::scheduler::SchedulerConfig;

/// High-level configuration for the animatronic demo:
/// defaults plus environment overrides.
#[derive(Clone, Debug)]
pub struct DemoConfig {
    pub tts: HttpTtsConfig,
    pub sched: SchedulerConfig,
    /// Voice query used when a line carries no `[voice]` prefix.
    pub default_voice: String,
    /// Run each motor through its exercise sequence on startup.
    pub exercise_on_start: bool,
}

impl DemoConfig {
    pub fn load() -> Self {
        Self {
            tts: HttpTtsConfig::default(),
            sched: SchedulerConfig::default(),
            default_voice: std::env::var("BASS_VOICE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "en".to_string()),
            exercise_on_start: std::env::var("BASS_EXERCISE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}
