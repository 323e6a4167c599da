use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam::atomic::AtomicCell;
use quanta::{Clock, Instant as QuantaInstant};

/// Render statistics read off the audio thread.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSnapshot {
    pub callback_count: u64,
    pub frames_rendered: u64,
    /// Callbacks that fell back to silence because the processor was busy.
    /// Buffers too short to hold a frame are not counted.
    pub silent_fallbacks: u64,
    pub min_callback_nanos: Option<u64>,
    pub max_callback_nanos: Option<u64>,
    pub ema_callback_nanos: f64,
    /// Time budget of one buffer at the monitored sample rate.
    pub budget_nanos: f64,
    /// EMA callback time as a percentage of the budget.
    pub load_percent: f64,
}

/// Atomics-only callback timing for the render path.
///
/// `scoped_callback`, `add_frames` and `record_silent_fallback` are realtime
/// safe. `snapshot` and `reset` belong on a control thread.
pub struct RenderMonitor {
    clock: Clock,
    buffer_frames: AtomicUsize,
    sample_rate: AtomicCell<f32>,
    ema_alpha: f64,

    callback_count: AtomicU64,
    frames_rendered: AtomicU64,
    silent_fallbacks: AtomicU64,
    min_callback_nanos: AtomicU64,
    max_callback_nanos: AtomicU64,
    /// f64 bits
    ema_callback_bits: AtomicU64,
}

impl RenderMonitor {
    /// `ema_alpha` is clamped into (0, 1]; around 0.05..0.2 tracks load well.
    pub fn new(buffer_frames: usize, sample_rate: f32, ema_alpha: f64) -> Self {
        Self {
            clock: Clock::new(),
            buffer_frames: AtomicUsize::new(buffer_frames),
            sample_rate: AtomicCell::new(sample_rate),
            ema_alpha: ema_alpha.clamp(f64::EPSILON, 1.0),
            callback_count: AtomicU64::new(0),
            frames_rendered: AtomicU64::new(0),
            silent_fallbacks: AtomicU64::new(0),
            min_callback_nanos: AtomicU64::new(u64::MAX),
            max_callback_nanos: AtomicU64::new(0),
            ema_callback_bits: AtomicU64::new(0),
        }
    }

    /// Re-targets the budget after a buffer size or sample-rate change.
    pub fn set_stream_format(&self, buffer_frames: usize, sample_rate: f32) {
        self.buffer_frames.store(buffer_frames, Ordering::Relaxed);
        self.sample_rate.store(sample_rate);
    }

    #[inline(always)]
    pub fn add_frames(&self, n: u64) {
        self.frames_rendered.fetch_add(n, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn record_silent_fallback(&self) {
        self.silent_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_callback_duration_nanos(&self, nanos: u64) {
        self.min_callback_nanos.fetch_min(nanos, Ordering::Relaxed);
        self.max_callback_nanos.fetch_max(nanos, Ordering::Relaxed);

        // EMA_new = alpha * x + (1 - alpha) * EMA_old
        let alpha = self.ema_alpha;
        let mut old_bits = self.ema_callback_bits.load(Ordering::Relaxed);
        loop {
            let old = f64::from_bits(old_bits);
            let new = alpha * nanos as f64 + (1.0 - alpha) * old;
            match self.ema_callback_bits.compare_exchange_weak(
                old_bits,
                new.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(found) => old_bits = found,
            }
        }
    }

    pub fn record_callback_duration(&self, d: Duration) {
        self.record_callback_duration_nanos(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX));
    }

    /// Counts a callback now and records its duration when the guard drops.
    #[inline(always)]
    pub fn scoped_callback(&self) -> CallbackTimer<'_> {
        self.callback_count.fetch_add(1, Ordering::Relaxed);
        CallbackTimer {
            monitor: self,
            start: self.clock.now(),
        }
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        let min_raw = self.min_callback_nanos.load(Ordering::Relaxed);
        let max_raw = self.max_callback_nanos.load(Ordering::Relaxed);
        let ema = f64::from_bits(self.ema_callback_bits.load(Ordering::Relaxed));
        let sample_rate = self.sample_rate.load();
        let buffer_frames = self.buffer_frames.load(Ordering::Relaxed);
        let budget_nanos = if sample_rate > 0.0 {
            buffer_frames as f64 / f64::from(sample_rate) * 1_000_000_000.0
        } else {
            0.0
        };
        let load_percent = if budget_nanos > 0.0 { ema / budget_nanos * 100.0 } else { 0.0 };

        RenderSnapshot {
            callback_count: self.callback_count.load(Ordering::Relaxed),
            frames_rendered: self.frames_rendered.load(Ordering::Relaxed),
            silent_fallbacks: self.silent_fallbacks.load(Ordering::Relaxed),
            min_callback_nanos: (min_raw != u64::MAX).then_some(min_raw),
            max_callback_nanos: (min_raw != u64::MAX).then_some(max_raw),
            ema_callback_nanos: ema,
            budget_nanos,
            load_percent,
        }
    }

    pub fn reset(&self) {
        self.callback_count.store(0, Ordering::Relaxed);
        self.frames_rendered.store(0, Ordering::Relaxed);
        self.silent_fallbacks.store(0, Ordering::Relaxed);
        self.min_callback_nanos.store(u64::MAX, Ordering::Relaxed);
        self.max_callback_nanos.store(0, Ordering::Relaxed);
        self.ema_callback_bits.store(0, Ordering::Relaxed);
    }
}

/// Records elapsed callback time on drop. Atomics only.
pub struct CallbackTimer<'a> {
    monitor: &'a RenderMonitor,
    start: QuantaInstant,
}

impl Drop for CallbackTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.monitor.clock.now().saturating_duration_since(self.start);
        self.monitor.record_callback_duration(elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let monitor = RenderMonitor::new(256, 48000.0, 0.1);
        let snap = monitor.snapshot();
        assert_eq!(snap.callback_count, 0);
        assert_eq!(snap.min_callback_nanos, None);
        assert_eq!(snap.max_callback_nanos, None);
        assert_eq!(snap.load_percent, 0.0);
    }

    #[test]
    fn test_min_max_and_load() {
        let monitor = RenderMonitor::new(480, 48000.0, 1.0);
        monitor.record_callback_duration_nanos(2_000_000);
        monitor.record_callback_duration_nanos(5_000_000);
        let snap = monitor.snapshot();
        assert_eq!(snap.min_callback_nanos, Some(2_000_000));
        assert_eq!(snap.max_callback_nanos, Some(5_000_000));
        assert!((snap.budget_nanos - 10_000_000.0).abs() < 1.0);
        // alpha 1.0 keeps only the latest duration
        assert!((snap.load_percent - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_scoped_callback_counts_and_times() {
        let monitor = RenderMonitor::new(64, 44100.0, 0.2);
        {
            let _timer = monitor.scoped_callback();
            monitor.add_frames(64);
        }
        monitor.record_silent_fallback();
        let snap = monitor.snapshot();
        assert_eq!(snap.callback_count, 1);
        assert_eq!(snap.frames_rendered, 64);
        assert_eq!(snap.silent_fallbacks, 1);
        assert!(snap.min_callback_nanos.is_some());
        assert!(snap.max_callback_nanos.is_some());
    }

    #[test]
    fn test_stream_format_moves_budget() {
        let monitor = RenderMonitor::new(480, 48000.0, 1.0);
        monitor.set_stream_format(960, 96000.0);
        assert!((monitor.snapshot().budget_nanos - 10_000_000.0).abs() < 1.0);
        monitor.set_stream_format(441, 44100.0);
        assert!((monitor.snapshot().budget_nanos - 10_000_000.0).abs() < 1.0);
        monitor.set_stream_format(256, 0.0);
        assert_eq!(monitor.snapshot().budget_nanos, 0.0);
    }

    #[test]
    fn test_reset() {
        let monitor = RenderMonitor::new(64, 44100.0, 0.2);
        drop(monitor.scoped_callback());
        monitor.reset();
        assert_eq!(monitor.snapshot(), RenderMonitor::new(64, 44100.0, 0.2).snapshot());
    }
}
