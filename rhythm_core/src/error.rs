//! Error types for rhythm_core.
//!
//! Everything here is rejected at construction time; nothing invalid ever
//! enters the frame loop.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("tempo must be positive, got {bpm} BPM")]
    TempoOutOfRange { bpm: f64 },

    #[error("rhythm patterns take exactly 8 steps, got {got}")]
    PatternLength { got: usize },

    #[error("particle speed must be positive, got {speed}")]
    SpeedOutOfRange { speed: f32 },

    #[error("ring radius and band thickness must be positive")]
    DegenerateRing,
}
