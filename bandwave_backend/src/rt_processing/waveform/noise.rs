use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::rt_processing::voice_renderer::AudioSource;

pub const NOISE_MEAN: f32 = 0.0;
pub const NOISE_STD_DEV: f32 = 0.1;

const DEFAULT_SEED: u64 = 0x5EED_u64;

/// Gaussian white noise with mean 0 and standard deviation 0.1 by default.
///
/// Each instance owns its generator, so every oscillator or thread that needs
/// noise holds its own `GaussianNoise` and nothing is shared between
/// realtime contexts. Not band limited.
#[derive(Debug, Clone)]
pub struct GaussianNoise {
    rng: SmallRng,
    seed: u64,
    std_dev: f32,
    active: bool,
}

impl Default for GaussianNoise {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianNoise {
    /// Deterministic generator with a fixed default seed.
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            seed,
            std_dev: NOISE_STD_DEV,
            active: true,
        }
    }

    /// Random seed drawn from the thread-local generator. The seed is kept,
    /// so `reset` replays this instance's own sequence.
    pub fn from_entropy() -> Self {
        Self::with_seed(rand::random())
    }

    pub fn with_std_dev(mut self, std_dev: f32) -> Self {
        self.std_dev = std_dev.max(0.0);
        self
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn std_dev(&self) -> f32 {
        self.std_dev
    }

    /// Draws one sample. Realtime safe: no allocation, no locking.
    #[inline]
    pub fn sample(&mut self) -> f32 {
        let z: f32 = self.rng.sample(StandardNormal);
        NOISE_MEAN + z * self.std_dev
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }
}

impl AudioSource for GaussianNoise {
    fn fill_buffer(&mut self, output: &mut [f32], _sample_rate: f32, channels: usize, frame_count: usize) {
        if !self.active {
            output.fill(0.0);
            return;
        }

        for frame_idx in 0..frame_count {
            let sample = self.sample();

            let start = frame_idx * channels;
            let end = start + channels;
            for out in &mut output[start..end] {
                *out = sample;
            }
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn reset(&mut self) {
        self.rng = SmallRng::seed_from_u64(self.seed);
        self.active = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution_moments() {
        let mut noise = GaussianNoise::with_seed(7);
        let n = 50_000;
        let samples: Vec<f32> = (0..n).map(|_| noise.sample()).collect();
        let mean = samples.iter().sum::<f32>() / n as f32;
        let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / n as f32;

        assert!(mean.abs() < 0.005, "mean {mean}");
        assert!((variance.sqrt() - NOISE_STD_DEV).abs() < 0.005, "std dev {}", variance.sqrt());
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = GaussianNoise::with_seed(42);
        let mut b = GaussianNoise::with_seed(42);
        for _ in 0..100 {
            assert_eq!(a.sample(), b.sample());
        }
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let mut noise = GaussianNoise::new();
        let first: Vec<f32> = (0..8).map(|_| noise.sample()).collect();
        noise.reset();
        let again: Vec<f32> = (0..8).map(|_| noise.sample()).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn test_reset_replays_own_seed() {
        let mut noise = GaussianNoise::with_seed(42);
        let first: Vec<f32> = (0..4).map(|_| noise.sample()).collect();
        noise.reset();
        let again: Vec<f32> = (0..4).map(|_| noise.sample()).collect();
        assert_eq!(first, again);

        let mut default_stream = GaussianNoise::new();
        let other: Vec<f32> = (0..4).map(|_| default_stream.sample()).collect();
        assert_ne!(first, other);
    }

    #[test]
    fn test_set_seed_becomes_reset_point() {
        let mut noise = GaussianNoise::new();
        noise.set_seed(11);
        let first = noise.sample();
        noise.sample();
        noise.reset();
        assert_eq!(noise.seed(), 11);
        assert_eq!(noise.sample(), first);
    }

    #[test]
    fn test_entropy_instances_differ() {
        let mut a = GaussianNoise::from_entropy();
        let mut b = GaussianNoise::from_entropy();
        assert_ne!(a.seed(), b.seed());
        let a_samples: Vec<f32> = (0..8).map(|_| a.sample()).collect();
        let b_samples: Vec<f32> = (0..8).map(|_| b.sample()).collect();
        assert_ne!(a_samples, b_samples);

        let replay = a.seed();
        a.reset();
        assert_eq!(a.seed(), replay);
        assert_eq!((0..8).map(|_| a.sample()).collect::<Vec<_>>(), a_samples);
    }

    #[test]
    fn test_custom_std_dev() {
        let mut silent = GaussianNoise::with_seed(1).with_std_dev(0.0);
        assert_eq!(silent.sample(), 0.0);
        assert_eq!(GaussianNoise::new().with_std_dev(-1.0).std_dev(), 0.0);
    }

    #[test]
    fn test_fill_buffer_duplicates_channels() {
        let mut noise = GaussianNoise::with_seed(3);
        let mut buffer = vec![0.0f32; 16];
        noise.fill_buffer(&mut buffer, 44100.0, 2, 8);
        for frame in buffer.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert!(buffer.iter().any(|&s| s != 0.0));

        noise.stop();
        noise.fill_buffer(&mut buffer, 44100.0, 2, 8);
        assert!(buffer.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_independent_instances_per_thread() {
        let handles: Vec<_> = (0..4)
            .map(|seed| {
                std::thread::spawn(move || {
                    let mut noise = GaussianNoise::with_seed(seed);
                    (0..1000).map(|_| noise.sample()).sum::<f32>()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_finite());
        }
    }
}
