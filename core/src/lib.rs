// Bassline Core Library
// Motor event scheduling runtime for animatronic speech puppetry

pub mod event;
pub mod gesture;
pub mod motor;
pub mod scheduler;
pub mod track;

// Export core types
pub use event::{EventQueue, MotorEvent, ScheduledEvent};
pub use motor::{Direction, LogDriver, Motor, MotorBus, MotorDriver};
pub use scheduler::{Scheduler, SchedulerConfig};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BasslineError {
    #[error("Motor bus error: {0}")]
    MotorError(String),

    #[error("Scheduler error: {0}")]
    SchedulerError(String),

    #[error("Speech synthesis error: {0}")]
    TtsError(String),

    #[error("Audio decode error: {0}")]
    DecodeError(String),

    #[error("Onset detection error: {0}")]
    OnsetError(String),

    #[error("Playback error: {0}")]
    PlaybackError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
pub type Result<T> = std::result::Result<T, BasslineError>;
