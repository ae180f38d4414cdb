mod config;
use config::DemoConfig;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use bassline_audio::{EnergyOnsets, HttpTts, Speaker, SpeakerConfig};
use bassline_core::gesture::ExerciseParams;
use bassline_core::{LogDriver, Motor, MotorBus, Scheduler};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging / tracing
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,bassline_core=info,animatronic=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        target = "animatronic",
        "Starting animatronic demo: stdin -> TTS -> onsets -> motor gestures"
    );

    let cfg = DemoConfig::load();

    // Motor core: driver -> bus -> scheduler loop. LogDriver stands in for
    // the controller board on machines without the hardware.
    let bus = MotorBus::new(Box::new(LogDriver));
    let sched = Arc::new(Scheduler::with_config(bus, cfg.sched.clone())?);

    if cfg.exercise_on_start {
        for motor in Motor::ALL {
            let end = sched.exercise(motor, &ExerciseParams::default());
            sched.wait_until(end);
        }
    }

    #[cfg(feature = "playback")]
    let sink: Arc<dyn bassline_audio::AudioSink> = Arc::new(bassline_audio::CpalSink);
    #[cfg(not(feature = "playback"))]
    let sink: Arc<dyn bassline_audio::AudioSink> = Arc::new(bassline_audio::TimedSink);

    let speaker = Speaker::new(
        Arc::clone(&sched),
        Arc::new(HttpTts::new(cfg.tts.clone())),
        Arc::new(EnergyOnsets::default()),
        sink,
        SpeakerConfig::default(),
    );

    info!(
        target = "animatronic",
        voice = %cfg.default_voice,
        "ready; type text to speak, '[voice] text' to pick a voice, 'quit' to exit"
    );

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let msg = line.trim();
        if msg.is_empty() {
            continue;
        }
        if matches!(msg.to_lowercase().as_str(), "quit" | "exit") {
            break;
        }

        let (query, text) = split_voice_prefix(msg);
        let query = query.unwrap_or(&cfg.default_voice);
        if let Err(e) = speaker.speak(text, query).await {
            error!(target = "animatronic", error = %e, "utterance failed");
        }
    }

    info!(target = "animatronic", "shutting down");
    sched.stop();
    Ok(())
}

/// Splits a leading `[voice]` tag off a message, e.g. `"[en, male] hi"`.
fn split_voice_prefix(msg: &str) -> (Option<&str>, &str) {
    if let Some(rest) = msg.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return (Some(rest[..end].trim()), rest[end + 1..].trim());
        }
    }
    (None, msg)
}

#[cfg(test)]
mod tests {
    use super::split_voice_prefix;

    #[test]
    fn splits_voice_tag() {
        assert_eq!(
            split_voice_prefix("[en, male] hello"),
            (Some("en, male"), "hello")
        );
        assert_eq!(split_voice_prefix("no tag here"), (None, "no tag here"));
        assert_eq!(split_voice_prefix("[brian]"), (Some("brian"), ""));
    }
}
