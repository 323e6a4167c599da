//! Engine configuration, loadable from JSON.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WaveformError, check_sample_rate};
use crate::shape::Waveform;

/// Samples per lookup table when nothing else is configured.
pub const DEFAULT_TABLE_SIZE: usize = 2048;
/// Sine needs no band limiting, so one bucket spans the whole note range.
pub const DEFAULT_SINE_NOTES_PER_TABLE: u32 = 128;
/// Bucket width for the sawtooth and triangle banks.
pub const DEFAULT_HARMONIC_NOTES_PER_TABLE: u32 = 6;
pub const DEFAULT_BUFFER_FRAMES: usize = 512;

/// Parameters for building a table bank set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableBankConfig {
    pub sample_rate: f64,
    pub table_size: usize,
    pub sine_notes_per_table: u32,
    pub harmonic_notes_per_table: u32,
}

impl Default for TableBankConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            table_size: DEFAULT_TABLE_SIZE,
            sine_notes_per_table: DEFAULT_SINE_NOTES_PER_TABLE,
            harmonic_notes_per_table: DEFAULT_HARMONIC_NOTES_PER_TABLE,
        }
    }
}

impl TableBankConfig {
    /// Default layout at the given sample rate.
    pub fn for_sample_rate(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_sample_rate(self.sample_rate)?;
        if self.table_size < 2 {
            return Err(WaveformError::InvalidTableSize(self.table_size));
        }
        if self.sine_notes_per_table == 0 || self.harmonic_notes_per_table == 0 {
            return Err(WaveformError::InvalidNotesPerTable);
        }
        Ok(())
    }
}

/// Everything the engine needs to start rendering a single oscillator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tables: TableBankConfig,
    pub channels: usize,
    /// Expected frames per callback; sets the render-load budget.
    pub buffer_frames: usize,
    pub waveform: Waveform,
    /// MIDI note, fractional values allowed
    pub note: f32,
    pub pulse_width: f32,
    pub amplitude: f32,
    /// Fixed seed for the noise generator; `None` draws a fresh one per engine.
    pub noise_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tables: TableBankConfig::default(),
            channels: 2,
            buffer_frames: DEFAULT_BUFFER_FRAMES,
            waveform: Waveform::Sine,
            note: 69.0,
            pulse_width: 0.5,
            amplitude: 0.5,
            noise_seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.tables.validate()?;
        if self.channels == 0 {
            return Err(WaveformError::InvalidChannelCount);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tables.table_size, DEFAULT_TABLE_SIZE);
        assert_eq!(config.tables.sine_notes_per_table, 128);
        assert_eq!(config.tables.harmonic_notes_per_table, 6);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "tables": { "sample_rate": 48000.0 }, "waveform": "square", "note": 60.0 }"#,
        )
        .unwrap();
        assert_eq!(config.tables.sample_rate, 48000.0);
        assert_eq!(config.tables.table_size, DEFAULT_TABLE_SIZE);
        assert_eq!(config.waveform, Waveform::Square);
        assert_eq!(config.note, 60.0);
        assert_eq!(config.channels, 2);
        assert_eq!(config.noise_seed, None);
    }

    #[test]
    fn test_noise_seed_from_json() {
        let config = EngineConfig::from_json_str(r#"{ "waveform": "noise", "noise_seed": 1234 }"#).unwrap();
        assert_eq!(config.waveform, Waveform::Noise);
        assert_eq!(config.noise_seed, Some(1234));
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = EngineConfig::default();
        config.waveform = Waveform::Pulse;
        config.pulse_width = 0.25;
        let json = config.to_json_string().unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = EngineConfig::from_json_str(r#"{ "tables": { "sample_rate": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, WaveformError::InvalidSampleRate(_)));

        let err = EngineConfig::from_json_str(r#"{ "tables": { "table_size": 1 } }"#).unwrap_err();
        assert!(matches!(err, WaveformError::InvalidTableSize(1)));

        let err = EngineConfig::from_json_str(r#"{ "tables": { "harmonic_notes_per_table": 0 } }"#)
            .unwrap_err();
        assert!(matches!(err, WaveformError::InvalidNotesPerTable));

        let err = EngineConfig::from_json_str(r#"{ "channels": 0 }"#).unwrap_err();
        assert!(matches!(err, WaveformError::InvalidChannelCount));
    }

    #[test]
    fn test_malformed_json() {
        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, WaveformError::Config(_)));
    }
}
