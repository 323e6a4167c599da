use std::collections::HashMap;
use std::sync::Arc;

use bandwave_core::config::TableBankConfig;
use bandwave_core::pitch::wrap_phase_once;
use bandwave_core::{Result, Waveform};
use parking_lot::Mutex;
use tracing::info;

use super::bank::LookupTableBank;
use super::functions::{self, MAX_PULSE_WIDTH, MIN_PULSE_WIDTH};

/// Every band-limited bank an oscillator needs, built for one sample rate.
///
/// Square and pulse are not stored: they are composed from the two
/// sawtooth banks at query time. All `process_*` methods are realtime safe
/// (no allocation, no locking) and may be called from any number of threads.
#[derive(Debug)]
pub struct TableBankSet {
    sample_rate: f64,
    sine: LookupTableBank,
    saw_up: LookupTableBank,
    saw_down: LookupTableBank,
    triangle: LookupTableBank,
}

impl TableBankSet {
    /// Default layout: one sine table, 6-note buckets for the harmonic shapes.
    pub fn new(sample_rate: f64) -> Result<Self> {
        Self::with_config(&TableBankConfig::for_sample_rate(sample_rate))
    }

    pub fn with_config(config: &TableBankConfig) -> Result<Self> {
        config.validate()?;
        let sr = config.sample_rate;
        let size = config.table_size;
        let harmonic = config.harmonic_notes_per_table;

        let set = Self {
            sample_rate: sr,
            sine: LookupTableBank::new(functions::sine, sr, config.sine_notes_per_table, size)?,
            saw_up: LookupTableBank::new(functions::saw_up, sr, harmonic, size)?,
            saw_down: LookupTableBank::new(functions::saw_down, sr, harmonic, size)?,
            triangle: LookupTableBank::new(functions::triangle, sr, harmonic, size)?,
        };
        info!(
            sample_rate = sr,
            table_size = size,
            harmonic_tables = set.saw_up.len(),
            "built table bank set"
        );
        Ok(set)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    #[inline]
    pub fn process_sine(&self, phase: f32) -> f32 {
        self.sine.table(0).sample_at(phase)
    }

    #[inline]
    pub fn process_triangle(&self, note: f32, phase: f32) -> f32 {
        self.triangle.sample(note, phase)
    }

    #[inline]
    pub fn process_saw_up(&self, note: f32, phase: f32) -> f32 {
        self.saw_up.sample(note, phase)
    }

    #[inline]
    pub fn process_saw_down(&self, note: f32, phase: f32) -> f32 {
        self.saw_down.sample(note, phase)
    }

    /// Square built from a falling and a rising saw a quarter period either
    /// side of `phase`.
    #[inline]
    pub fn process_square(&self, note: f32, phase: f32) -> f32 {
        self.saw_pair(note, phase, 0.25)
    }

    /// Variable duty pulse from the sawtooth pair. `pulse_width` is clamped to
    /// `[0.05, 0.95]`; 0.5 matches `process_square`.
    #[inline]
    pub fn process_pulse(&self, note: f32, phase: f32, pulse_width: f32) -> f32 {
        let pw = pulse_width.clamp(MIN_PULSE_WIDTH as f32, MAX_PULSE_WIDTH as f32);
        self.saw_pair(note, phase, 0.5 * pw)
    }

    #[inline]
    fn saw_pair(&self, note: f32, phase: f32, offset: f32) -> f32 {
        let phase_up = wrap_phase_once(phase + offset);
        let phase_down = wrap_phase_once(phase - offset);

        let index = self.saw_down.table_index_for_note(note);
        self.saw_down.table(index).sample_at(phase_down) + self.saw_up.table(index).sample_at(phase_up)
    }

    /// Dispatch on `shape`. Noise is not table based and renders as silence
    /// here; oscillators own a noise source for it.
    #[inline]
    pub fn process(&self, shape: Waveform, note: f32, phase: f32, pulse_width: f32) -> f32 {
        match shape {
            Waveform::Sine => self.process_sine(phase),
            Waveform::Triangle => self.process_triangle(note, phase),
            Waveform::SawUp => self.process_saw_up(note, phase),
            Waveform::SawDown => self.process_saw_down(note, phase),
            Waveform::Square => self.process_square(note, phase),
            Waveform::Pulse => self.process_pulse(note, phase, pulse_width),
            Waveform::Noise => 0.0,
        }
    }

    pub fn sine_bank(&self) -> &LookupTableBank {
        &self.sine
    }

    pub fn saw_up_bank(&self) -> &LookupTableBank {
        &self.saw_up
    }

    pub fn saw_down_bank(&self) -> &LookupTableBank {
        &self.saw_down
    }

    pub fn triangle_bank(&self) -> &LookupTableBank {
        &self.triangle
    }
}

/// Shares built table sets between engines running at the same sample rate.
///
/// Not realtime safe: lookups lock and misses build a full set. Call it from
/// setup or sample-rate-change paths only.
#[derive(Debug, Default)]
pub struct TableCache {
    sets: Mutex<HashMap<CacheKey, Arc<TableBankSet>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    sample_rate_bits: u64,
    table_size: usize,
    sine_notes_per_table: u32,
    harmonic_notes_per_table: u32,
}

impl From<&TableBankConfig> for CacheKey {
    fn from(config: &TableBankConfig) -> Self {
        Self {
            sample_rate_bits: config.sample_rate.to_bits(),
            table_size: config.table_size,
            sine_notes_per_table: config.sine_notes_per_table,
            harmonic_notes_per_table: config.harmonic_notes_per_table,
        }
    }
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached set for `config`, building it on first use.
    pub fn get_or_build(&self, config: &TableBankConfig) -> Result<Arc<TableBankSet>> {
        let key = CacheKey::from(config);
        let mut sets = self.sets.lock();
        if let Some(set) = sets.get(&key) {
            return Ok(Arc::clone(set));
        }
        let set = Arc::new(TableBankSet::with_config(config)?);
        sets.insert(key, Arc::clone(&set));
        Ok(set)
    }

    /// Drops cached sets nobody else holds any more.
    pub fn purge_unused(&self) {
        self.sets.lock().retain(|_, set| Arc::strong_count(set) > 1);
    }

    pub fn len(&self) -> usize {
        self.sets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.lock().is_empty()
    }
}
