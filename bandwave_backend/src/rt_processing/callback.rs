//! Hot-swappable realtime callback slot.
//!
//! The audio thread only ever calls `process_realtime`, which takes the
//! processor with `try_lock` and falls back to silence when a control thread
//! holds it. Control threads replace the processor wholesale (for example
//! with one that carries tables for a new sample rate) or edit it in place.
//! The replaced processor is handed back to the caller, so whatever it owns
//! is dropped on the control thread and never inside the callback.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam::atomic::AtomicCell;
use spin::Mutex;

/// Trait every realtime processor must implement.
///
/// `process` must not block, lock or allocate.
pub trait AudioCallback: Send + 'static {
    /// Fill the interleaved `output` buffer (at least `frames * channels` long).
    fn process(&mut self, output: &mut [f32], sample_rate: f32, channels: usize, frames: usize);

    /// Concrete access for control threads that need to tweak parameters.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// What `process_realtime` did with a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The processor rendered this many frames.
    Rendered(usize),
    /// A control thread held the processor; the buffer was silenced.
    Busy,
    /// The buffer was shorter than one frame; it was silenced.
    Empty,
}

impl RenderOutcome {
    pub fn is_rendered(self) -> bool {
        matches!(self, RenderOutcome::Rendered(_))
    }
}

/// Shared between the audio thread and control threads. Every method takes
/// `&self`; the stream format lives in atomics.
pub struct CallbackSlot {
    processor: Arc<Mutex<Box<dyn AudioCallback>>>,

    /// Frames rendered so far, readable from any thread.
    sample_clock: Arc<AtomicU64>,

    sample_rate: AtomicCell<f32>,
    channels: AtomicUsize,
}

impl CallbackSlot {
    pub fn new(initial_processor: Box<dyn AudioCallback>, sample_rate: f32, channels: usize) -> Self {
        Self {
            processor: Arc::new(Mutex::new(initial_processor)),
            sample_clock: Arc::new(AtomicU64::new(0)),
            sample_rate: AtomicCell::new(sample_rate),
            channels: AtomicUsize::new(channels.max(1)),
        }
    }

    /// Installs `new_processor` and returns the one it replaced. Spins while
    /// the audio thread is inside a callback; that window is one buffer long.
    pub fn swap_processor(&self, new_processor: Box<dyn AudioCallback>) -> Box<dyn AudioCallback> {
        let mut guard = self.processor.lock();
        std::mem::replace(&mut *guard, new_processor)
    }

    /// Runs `f` on the installed processor, spinning for the lock.
    pub fn with_processor_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Box<dyn AudioCallback>) -> R,
    {
        let mut guard = self.processor.lock();
        f(&mut guard)
    }

    /// Realtime entry point. Anything but `Rendered` means the buffer was
    /// filled with silence.
    ///
    /// Performs no heap allocation.
    pub fn process_realtime(&self, output: &mut [f32]) -> RenderOutcome {
        let channels = self.channels.load(Ordering::Acquire);
        let frames = match output.len() / channels {
            0 => {
                output.fill(0.0);
                return RenderOutcome::Empty;
            }
            n => n,
        };

        self.sample_clock.fetch_add(frames as u64, Ordering::Relaxed);

        if let Some(mut guard) = self.processor.try_lock() {
            guard.process(output, self.sample_rate.load(), channels, frames);
            RenderOutcome::Rendered(frames)
        } else {
            output.fill(0.0);
            RenderOutcome::Busy
        }
    }

    /// Playback position in seconds.
    pub fn playback_time(&self) -> f64 {
        let frames = self.sample_clock.load(Ordering::Relaxed);
        frames as f64 / f64::from(self.sample_rate.load())
    }

    pub fn frame_count(&self) -> u64 {
        self.sample_clock.load(Ordering::Relaxed)
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate.load()
    }

    pub fn channels(&self) -> usize {
        self.channels.load(Ordering::Acquire)
    }

    /// Update sample rate and channels. Safe while the audio thread renders;
    /// the next callback picks up the new format.
    pub fn set_runtime_config(&self, sample_rate: f32, channels: usize) {
        self.sample_rate.store(sample_rate);
        self.channels.store(channels.max(1), Ordering::Release);
    }

    pub fn silent(sample_rate: f32, channels: usize) -> Self {
        Self::new(Box::new(SilentProcessor), sample_rate, channels)
    }
}

struct SilentProcessor;

impl AudioCallback for SilentProcessor {
    fn process(&mut self, output: &mut [f32], _sample_rate: f32, _channels: usize, _frames: usize) {
        output.fill(0.0);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
