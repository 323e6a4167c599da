//! Shared types for the bandwave engine: errors, configuration, pitch and
//! phase helpers, and the waveform shape selector.

pub mod config;
pub mod error;
pub mod pitch;
pub mod shape;

pub use config::{EngineConfig, TableBankConfig};
pub use error::{Result, WaveformError};
pub use shape::Waveform;
