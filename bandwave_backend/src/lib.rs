//! Band-limited oscillator engine.
//!
//! Tables are built off the audio thread by [`TableBankSet`]; everything
//! under `rt_processing` that takes `&self` on a built set or oscillator is
//! safe to call from a realtime callback.

pub mod engine;
pub mod rt_processing;

pub use bandwave_core::{EngineConfig, Result, TableBankConfig, Waveform, WaveformError};
pub use engine::WaveEngine;
pub use rt_processing::waveform::{
    BandLimitedOscillator, GaussianNoise, LookupTable, LookupTableBank, TableBankSet, TableCache,
};
