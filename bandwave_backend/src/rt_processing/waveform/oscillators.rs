use std::sync::Arc;

use bandwave_core::Waveform;
use bandwave_core::pitch::{midi_note_to_hz_f32, normalize_phase, phase_increment};
use crossbeam::atomic::AtomicCell;

use super::noise::GaussianNoise;
use super::tables::TableBankSet;
use crate::rt_processing::voice_renderer::AudioSource;

/// Single band-limited oscillator reading from a shared table bank set.
///
/// The note selects both the pitch and the table bucket, so changing it
/// mid-stream never aliases. Phase lives in an `AtomicCell` so a control
/// thread can observe it while the audio thread renders.
pub struct BandLimitedOscillator {
    tables: Arc<TableBankSet>,
    waveform: Waveform,
    note: f32,
    phase_inc: f32,
    pulse_width: f32,
    amplitude: f32,
    phase: AtomicCell<f32>,
    noise: GaussianNoise,
    active: bool,
}

impl BandLimitedOscillator {
    pub fn new(tables: Arc<TableBankSet>, waveform: Waveform) -> Self {
        let note = 69.0;
        let phase_inc = Self::increment_for(&tables, note);
        Self {
            tables,
            waveform,
            note,
            phase_inc,
            pulse_width: 0.5,
            amplitude: 0.5, // Safe default volume
            phase: AtomicCell::new(0.0),
            noise: GaussianNoise::from_entropy(),
            active: true,
        }
    }

    fn increment_for(tables: &TableBankSet, note: f32) -> f32 {
        phase_increment(midi_note_to_hz_f32(note), tables.sample_rate() as f32)
    }

    pub fn with_note(mut self, note: f32) -> Self {
        self.set_note(note);
        self
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.set_amplitude(amplitude);
        self
    }

    pub fn with_pulse_width(mut self, pulse_width: f32) -> Self {
        self.pulse_width = pulse_width;
        self
    }

    /// Set starting phase (0.0 to 1.0)
    pub fn with_phase(self, phase: f32) -> Self {
        self.phase.store(normalize_phase(phase));
        self
    }

    pub fn with_noise(mut self, noise: GaussianNoise) -> Self {
        self.noise = noise;
        self
    }

    /// Renders one sample and advances the phase.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let current_phase = self.phase.load();
        let sample = self.render_at(current_phase);
        self.phase.store(normalize_phase(current_phase + self.phase_inc));
        sample
    }

    #[inline]
    fn render_at(&mut self, phase: f32) -> f32 {
        let raw = match self.waveform {
            Waveform::Noise => self.noise.sample(),
            shape => self.tables.process(shape, self.note, phase, self.pulse_width),
        };
        raw * self.amplitude
    }

    /// Non-finite notes are ignored; anything else is accepted and the table
    /// lookup clamps it to the covered range.
    pub fn set_note(&mut self, note: f32) {
        if note.is_finite() {
            self.note = note;
            self.phase_inc = Self::increment_for(&self.tables, note);
        }
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Clamped to [0.05, 0.95] at lookup time.
    pub fn set_pulse_width(&mut self, pulse_width: f32) {
        self.pulse_width = pulse_width;
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude.clamp(0.0, 1.0);
    }

    pub fn set_phase(&self, phase: f32) {
        self.phase.store(normalize_phase(phase));
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn note(&self) -> f32 {
        self.note
    }

    pub fn frequency(&self) -> f32 {
        midi_note_to_hz_f32(self.note)
    }

    pub fn pulse_width(&self) -> f32 {
        self.pulse_width
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn current_phase(&self) -> f32 {
        self.phase.load()
    }

    pub fn tables(&self) -> &Arc<TableBankSet> {
        &self.tables
    }

    pub fn noise(&self) -> &GaussianNoise {
        &self.noise
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }
}

impl AudioSource for BandLimitedOscillator {
    /// Phase advances at the table set's sample rate, the rate its harmonics
    /// were limited for; `_sample_rate` is informational.
    fn fill_buffer(&mut self, output: &mut [f32], _sample_rate: f32, channels: usize, frame_count: usize) {
        if !self.active {
            output.fill(0.0);
            return;
        }

        let mut current_phase = self.phase.load();

        for frame_idx in 0..frame_count {
            let sample = self.render_at(current_phase);

            let start = frame_idx * channels;
            let end = start + channels;
            for out in &mut output[start..end] {
                *out = sample;
            }

            current_phase = normalize_phase(current_phase + self.phase_inc);
        }

        self.phase.store(current_phase);
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn reset(&mut self) {
        self.phase.store(0.0);
        self.noise.reset();
        self.active = true;
    }
}
