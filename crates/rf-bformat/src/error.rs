//! Error types for decoder configuration

use thiserror::Error;

/// Decoder configuration error types
///
/// Only produced while validating a profile upstream of construction;
/// the decoder itself treats bad input as a broken precondition.
#[derive(Error, Debug)]
pub enum BFormatError {
    /// Profile declares no speakers
    #[error("Decoder profile has no speakers")]
    NoSpeakers,

    /// More speakers than output slots
    #[error("Too many speakers: {got} (max {max})")]
    TooManySpeakers { got: usize, max: usize },

    /// Output slot outside the enabled mask capacity
    #[error("Speaker {speaker}: output channel {channel} out of range (max {max})")]
    InvalidOutputChannel {
        speaker: usize,
        channel: usize,
        max: usize,
    },

    /// Band count other than 1 or 2
    #[error("Invalid frequency band count: {0}")]
    InvalidFrequencyBands(u32),

    /// Empty mask or bits beyond the supported order
    #[error("Invalid ambisonic channel mask: {0:#06x}")]
    InvalidChannelMask(u32),

    /// Coefficient row too short for the channel mask
    #[error("Speaker {speaker}: expected {expected} coefficients, got {got}")]
    CoefficientCountMismatch {
        speaker: usize,
        expected: usize,
        got: usize,
    },

    /// Unusable crossover frequency
    #[error("Invalid crossover frequency: {0} Hz")]
    InvalidCrossover(f32),

    /// Profile could not be deserialized
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for decoder configuration
pub type BFormatResult<T> = Result<T, BFormatError>;
