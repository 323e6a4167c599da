use thiserror::Error;

/// Construction-time failures. The realtime query path never produces these;
/// bad runtime input is clamped or wrapped instead.
#[derive(Debug, Error)]
pub enum WaveformError {
    #[error("sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f64),

    #[error("table frequency must be positive and finite, got {0}")]
    InvalidFrequency(f64),

    #[error("notes per table must be at least 1")]
    InvalidNotesPerTable,

    #[error("table size must be at least 2 samples, got {0}")]
    InvalidTableSize(usize),

    #[error("channel count must be at least 1")]
    InvalidChannelCount,

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WaveformError>;

/// Rejects zero, negative, NaN and infinite sample rates.
pub fn check_sample_rate(sample_rate: f64) -> Result<()> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(WaveformError::InvalidSampleRate(sample_rate))
    }
}

pub fn check_frequency(frequency: f64) -> Result<()> {
    if frequency.is_finite() && frequency > 0.0 {
        Ok(())
    } else {
        Err(WaveformError::InvalidFrequency(frequency))
    }
}
