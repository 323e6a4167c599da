//! Owning engine for one band-limited oscillator.
//!
//! The engine is the only place tables are rebuilt. A sample-rate change
//! builds the new set first, installs an oscillator holding it through the
//! callback slot, and only then releases the old set, so the audio thread
//! never reads a set that is being replaced.
//!
//! Every method takes `&self`: share the engine behind an `Arc`, render from
//! the audio thread with `process` and drive it from control threads. Control
//! state sits behind a mutex the audio thread never touches.

use std::sync::Arc;

use bandwave_core::{EngineConfig, Result, Waveform};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::rt_processing::callback::{CallbackSlot, RenderOutcome};
use crate::rt_processing::performance::{RenderMonitor, RenderSnapshot};
use crate::rt_processing::voice_renderer::SourceRenderer;
use crate::rt_processing::waveform::{BandLimitedOscillator, GaussianNoise, TableBankSet, TableCache};

type OscillatorRenderer = SourceRenderer<BandLimitedOscillator>;

const MONITOR_EMA_ALPHA: f64 = 0.1;

struct ControlState {
    config: EngineConfig,
    tables: Arc<TableBankSet>,
}

pub struct WaveEngine {
    state: Mutex<ControlState>,
    cache: Arc<TableCache>,
    slot: CallbackSlot,
    monitor: RenderMonitor,
}

impl WaveEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_cache(config, Arc::new(TableCache::new()))
    }

    /// Shares `cache` with other engines so equal configurations build once.
    pub fn with_cache(config: EngineConfig, cache: Arc<TableCache>) -> Result<Self> {
        config.validate()?;
        let tables = cache.get_or_build(&config.tables)?;
        let oscillator =
            Self::build_oscillator(&config, Arc::clone(&tables), 0.0).with_noise(Self::noise_for(&config));
        let sample_rate = config.tables.sample_rate as f32;

        info!(sample_rate, channels = config.channels, waveform = ?config.waveform, "engine ready");

        Ok(Self {
            slot: CallbackSlot::new(
                Box::new(SourceRenderer::new(oscillator)),
                sample_rate,
                config.channels,
            ),
            monitor: RenderMonitor::new(config.buffer_frames, sample_rate, MONITOR_EMA_ALPHA),
            state: Mutex::new(ControlState { config, tables }),
            cache,
        })
    }

    fn build_oscillator(config: &EngineConfig, tables: Arc<TableBankSet>, phase: f32) -> BandLimitedOscillator {
        BandLimitedOscillator::new(tables, config.waveform)
            .with_note(config.note)
            .with_pulse_width(config.pulse_width)
            .with_amplitude(config.amplitude)
            .with_phase(phase)
    }

    fn noise_for(config: &EngineConfig) -> GaussianNoise {
        config
            .noise_seed
            .map_or_else(GaussianNoise::from_entropy, GaussianNoise::with_seed)
    }

    /// Realtime entry: fills an interleaved buffer. Returns `false` if the
    /// buffer was silenced instead of rendered.
    pub fn process(&self, output: &mut [f32]) -> bool {
        let _timer = self.monitor.scoped_callback();
        match self.slot.process_realtime(output) {
            RenderOutcome::Rendered(frames) => {
                self.monitor.add_frames(frames as u64);
                true
            }
            RenderOutcome::Busy => {
                self.monitor.record_silent_fallback();
                false
            }
            RenderOutcome::Empty => false,
        }
    }

    /// Rebuilds every table for `sample_rate` and swaps the oscillator over,
    /// keeping its phase, noise stream and parameters. Leaves the engine
    /// untouched on error. Safe to call while another thread is in `process`.
    pub fn set_sample_rate(&self, sample_rate: f64) -> Result<()> {
        let mut state = self.state.lock();
        let mut tables_config = state.config.tables.clone();
        tables_config.sample_rate = sample_rate;
        tables_config.validate()?;

        let tables = self.cache.get_or_build(&tables_config)?;
        let mut config = state.config.clone();
        config.tables = tables_config;

        let previous = self.slot.with_processor_mut(|processor| {
            let carried = processor
                .as_any_mut()
                .downcast_mut::<OscillatorRenderer>()
                .map(|renderer| {
                    let oscillator = renderer.source();
                    (oscillator.current_phase(), oscillator.noise().clone())
                });
            let (phase, noise) = carried.unwrap_or_else(|| (0.0, Self::noise_for(&config)));
            let oscillator = Self::build_oscillator(&config, Arc::clone(&tables), phase).with_noise(noise);
            std::mem::replace(processor, Box::new(SourceRenderer::new(oscillator)))
        });
        self.slot.set_runtime_config(sample_rate as f32, config.channels);
        self.monitor.set_stream_format(config.buffer_frames, sample_rate as f32);

        let old_rate = state.tables.sample_rate();
        state.tables = tables;
        state.config = config;
        drop(state);
        drop(previous);
        self.cache.purge_unused();

        info!(old_rate, sample_rate, "sample rate changed, tables rebuilt");
        Ok(())
    }

    /// Runs `f` on the live oscillator. Spins for the slot lock, so keep it
    /// off the audio thread.
    fn with_oscillator<R>(&self, f: impl FnOnce(&mut BandLimitedOscillator) -> R) -> Option<R> {
        let result = self.slot.with_processor_mut(|processor| {
            processor
                .as_any_mut()
                .downcast_mut::<OscillatorRenderer>()
                .map(|renderer| f(renderer.source_mut()))
        });
        if result.is_none() {
            warn!("installed processor is not an oscillator renderer");
        }
        result
    }

    /// Applies `update` to the stored config and `apply` to the live
    /// oscillator under one control lock.
    fn update(&self, update: impl FnOnce(&mut EngineConfig), apply: impl FnOnce(&mut BandLimitedOscillator)) {
        let mut state = self.state.lock();
        update(&mut state.config);
        self.with_oscillator(apply);
    }

    pub fn set_note(&self, note: f32) {
        if !note.is_finite() {
            return;
        }
        self.update(|config| config.note = note, |osc| osc.set_note(note));
    }

    pub fn set_waveform(&self, waveform: Waveform) {
        self.update(|config| config.waveform = waveform, |osc| osc.set_waveform(waveform));
    }

    pub fn set_pulse_width(&self, pulse_width: f32) {
        self.update(|config| config.pulse_width = pulse_width, |osc| osc.set_pulse_width(pulse_width));
    }

    pub fn set_amplitude(&self, amplitude: f32) {
        let amplitude = amplitude.clamp(0.0, 1.0);
        self.update(|config| config.amplitude = amplitude, |osc| osc.set_amplitude(amplitude));
    }

    pub fn current_phase(&self) -> Option<f32> {
        self.with_oscillator(|osc| osc.current_phase())
    }

    /// Table set currently rendered from.
    pub fn tables(&self) -> Arc<TableBankSet> {
        Arc::clone(&self.state.lock().tables)
    }

    pub fn config(&self) -> EngineConfig {
        self.state.lock().config.clone()
    }

    pub fn sample_rate(&self) -> f64 {
        self.state.lock().tables.sample_rate()
    }

    pub fn slot(&self) -> &CallbackSlot {
        &self.slot
    }

    pub fn render_stats(&self) -> RenderSnapshot {
        self.monitor.snapshot()
    }
}
