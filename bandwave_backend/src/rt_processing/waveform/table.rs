use bandwave_core::Result;
use bandwave_core::error::{WaveformError, check_frequency, check_sample_rate};
use bandwave_core::pitch::normalize_phase;

/// One period of a waveform sampled at a single representative frequency.
///
/// The table stores `size + 1` samples: `size` evenly spaced phases in
/// [0, 1) followed by a guard copy of the first sample, so interpolation
/// across the wrap needs no branch. Immutable once built.
#[derive(Debug, Clone)]
pub struct LookupTable {
    samples: Box<[f32]>,
    size: usize,
    frequency: f64,
}

impl LookupTable {
    /// Samples `function(phase, frequency, sample_rate)` at `table_size`
    /// phases. Not realtime safe: allocates and evaluates the full series.
    pub fn new<F>(function: F, sample_rate: f64, frequency: f64, table_size: usize) -> Result<Self>
    where
        F: Fn(f64, f64, f64) -> f64,
    {
        check_sample_rate(sample_rate)?;
        check_frequency(frequency)?;
        if table_size < 2 {
            return Err(WaveformError::InvalidTableSize(table_size));
        }

        let mut samples: Vec<f32> = (0..table_size)
            .map(|i| {
                let phase = i as f64 / table_size as f64;
                function(phase, frequency, sample_rate) as f32
            })
            .collect();
        samples.push(samples[0]);

        Ok(Self {
            samples: samples.into_boxed_slice(),
            size: table_size,
            frequency,
        })
    }

    /// Linearly interpolated lookup. Any finite phase is accepted and wrapped
    /// into [0, 1).
    #[inline]
    pub fn sample_at(&self, phase: f32) -> f32 {
        let scaled = normalize_phase(phase) * self.size as f32;
        let index = (scaled as usize).min(self.size - 1);
        let frac = scaled - index as f32;

        let sample1 = self.samples[index];
        let sample2 = self.samples[index + 1];
        sample1 + frac * (sample2 - sample1)
    }

    /// Frequency in Hz the harmonic content was limited for.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Number of distinct samples in one period (the guard is not counted).
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Stored samples including the trailing guard.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}
