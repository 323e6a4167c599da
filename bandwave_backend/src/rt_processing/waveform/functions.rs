//! Band-limited waveform functions.
//!
//! Each function evaluates one period of a waveform by summing its Fourier
//! series, stopping at the last harmonic that still lies below Nyquist for
//! the given fundamental. They are pure and are only called while tables are
//! being built; the realtime path reads the resulting tables instead.

use std::f64::consts::{PI, TAU};

/// Signature shared by every table-buildable waveform:
/// `(phase, frequency_hz, sample_rate_hz) -> amplitude`.
pub type WaveformFn = fn(f64, f64, f64) -> f64;

/// Largest harmonic number `k` with `frequency * k < sample_rate / 2`.
///
/// Returns 0 when `frequency` is not a positive finite number or already sits
/// at or above Nyquist, in which case every series below sums to silence.
pub fn highest_harmonic(frequency: f64, sample_rate: f64) -> u32 {
    let nyquist = sample_rate / 2.0;
    if !(frequency.is_finite() && frequency > 0.0) || !(nyquist > 0.0) {
        return 0;
    }
    let estimate = (nyquist / frequency).ceil() - 1.0;
    let mut k = estimate.clamp(0.0, f64::from(u32::MAX - 1)) as u32;
    // settle float rounding against the exact loop condition
    while k < u32::MAX - 1 && frequency * f64::from(k + 1) < nyquist {
        k += 1;
    }
    while k > 0 && frequency * f64::from(k) >= nyquist {
        k -= 1;
    }
    k
}

/// `+1` for even harmonics, `-1` for odd ones.
#[inline]
fn odd_even(k: u32) -> f64 {
    if k % 2 == 0 { 1.0 } else { -1.0 }
}

pub fn sine(phase: f64, _frequency: f64, _sample_rate: f64) -> f64 {
    (phase * TAU).sin()
}

pub fn triangle(phase: f64, frequency: f64, sample_rate: f64) -> f64 {
    let x = phase * TAU;
    let sum: f64 = (1..=highest_harmonic(frequency, sample_rate))
        .step_by(2)
        .map(|k| {
            let sign = if ((k - 1) / 2) % 2 == 0 { 1.0 } else { -1.0 };
            let k = f64::from(k);
            sign / (k * k) * (k * x).sin()
        })
        .sum();
    8.0 / (PI * PI) * sum
}

fn saw_series(phase: f64, frequency: f64, sample_rate: f64) -> f64 {
    let x = phase * TAU;
    (1..=highest_harmonic(frequency, sample_rate))
        .map(|k| odd_even(k) * (f64::from(k) * x).sin() / f64::from(k))
        .sum()
}

/// Rising sawtooth: crosses zero upward at phase 0, jumps at phase 0.5.
pub fn saw_up(phase: f64, frequency: f64, sample_rate: f64) -> f64 {
    -2.0 / PI * saw_series(phase, frequency, sample_rate)
}

pub fn saw_down(phase: f64, frequency: f64, sample_rate: f64) -> f64 {
    2.0 / PI * saw_series(phase, frequency, sample_rate)
}

/// Odd-harmonic square: high on (0, 0.5), low on (0.5, 1).
pub fn square_wave(phase: f64, frequency: f64, sample_rate: f64) -> f64 {
    let x = phase * TAU;
    let sum: f64 = (1..=highest_harmonic(frequency, sample_rate))
        .step_by(2)
        .map(|k| (f64::from(k) * x).sin() / f64::from(k))
        .sum();
    4.0 / PI * sum
}

pub const MIN_PULSE_WIDTH: f64 = 0.05;
pub const MAX_PULSE_WIDTH: f64 = 0.95;

/// Variable duty pulse. Exactly 0.5 takes the square series; any other width
/// is clamped to `[0.05, 0.95]` and built from two offset sawtooths.
pub fn pulse(phase: f64, pulse_width: f64, frequency: f64, sample_rate: f64) -> f64 {
    if pulse_width == 0.5 {
        return square_wave(phase, frequency, sample_rate);
    }
    let pw = pulse_width.clamp(MIN_PULSE_WIDTH, MAX_PULSE_WIDTH);
    saw_up(phase + 0.5 * pw, frequency, sample_rate)
        - saw_up(phase - 0.5 * pw, frequency, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 44100.0;

    #[test]
    fn test_highest_harmonic_respects_nyquist() {
        for &freq in &[20.0, 110.0, 261.63, 440.0, 1000.0, 4186.0, 11025.0, 15000.0] {
            let k = highest_harmonic(freq, SR);
            assert!(freq * f64::from(k) < SR / 2.0, "freq {freq}: k={k} reaches Nyquist");
            assert!(freq * f64::from(k + 1) >= SR / 2.0, "freq {freq}: k={k} stops early");
        }
    }

    #[test]
    fn test_highest_harmonic_exact_divisor() {
        // 22050 / 1000 == 22.05, and 2205 * 10 == 22050 lands exactly on Nyquist
        assert_eq!(highest_harmonic(1000.0, SR), 22);
        assert_eq!(highest_harmonic(2205.0, SR), 9);
        assert_eq!(highest_harmonic(22050.0, SR), 0);
    }

    #[test]
    fn test_highest_harmonic_invalid_inputs() {
        assert_eq!(highest_harmonic(0.0, SR), 0);
        assert_eq!(highest_harmonic(-10.0, SR), 0);
        assert_eq!(highest_harmonic(f64::NAN, SR), 0);
        assert_eq!(highest_harmonic(440.0, 0.0), 0);
    }

    #[test]
    fn test_sine_quarter_points() {
        assert!(sine(0.0, 0.0, SR).abs() < 1e-12);
        assert!((sine(0.25, 0.0, SR) - 1.0).abs() < 1e-12);
        assert!((sine(0.75, 0.0, SR) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_triangle_shape() {
        let f = 100.0;
        assert!(triangle(0.0, f, SR).abs() < 1e-9);
        assert!((triangle(0.25, f, SR) - 1.0).abs() < 0.01);
        assert!((triangle(0.75, f, SR) + 1.0).abs() < 0.01);
        assert!((triangle(0.125, f, SR) - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_saw_up_ramps_through_zero() {
        let f = 100.0;
        assert!(saw_up(0.0, f, SR).abs() < 1e-9);
        assert!((saw_up(0.25, f, SR) - 0.5).abs() < 0.01);
        assert!((saw_up(0.75, f, SR) + 0.5).abs() < 0.01);
        assert!(saw_up(0.1, f, SR) < saw_up(0.2, f, SR));
    }

    #[test]
    fn test_saw_down_mirrors_saw_up() {
        for &f in &[55.0, 440.0, 3000.0] {
            for i in 0..64 {
                let phase = i as f64 / 64.0;
                assert!((saw_down(phase, f, SR) + saw_up(phase, f, SR)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_square_wave_levels() {
        let f = 100.0;
        assert!((square_wave(0.25, f, SR) - 1.0).abs() < 0.02);
        assert!((square_wave(0.75, f, SR) + 1.0).abs() < 0.02);
    }

    #[test]
    fn test_pulse_half_width_is_square() {
        for i in 0..32 {
            let phase = i as f64 / 32.0;
            assert_eq!(pulse(phase, 0.5, 220.0, SR), square_wave(phase, 220.0, SR));
        }
    }

    #[test]
    fn test_pulse_width_is_clamped() {
        let f = 220.0;
        assert_eq!(pulse(0.3, 0.0, f, SR), pulse(0.3, MIN_PULSE_WIDTH, f, SR));
        assert_eq!(pulse(0.3, 1.0, f, SR), pulse(0.3, MAX_PULSE_WIDTH, f, SR));
    }

    #[test]
    fn test_pulse_duty_cycle() {
        // high for roughly `pw` of the period, around phase 0.5
        let f = 50.0;
        let pw = 0.25;
        let steps = 400;
        let high = (0..steps)
            .filter(|&i| pulse(i as f64 / steps as f64, pw, f, SR) > 0.0)
            .count();
        let ratio = high as f64 / steps as f64;
        assert!((ratio - (1.0 - pw)).abs() < 0.03 || (ratio - pw).abs() < 0.03, "ratio {ratio}");
    }

    #[test]
    fn test_high_fundamental_drops_harmonics() {
        // above sr/6 only the fundamental (k = 1, 2) survives for the saw
        let f = 8000.0;
        assert_eq!(highest_harmonic(f, SR), 2);
        let expected = -2.0 / PI * (-(0.3 * TAU).sin() + (2.0 * 0.3 * TAU).sin() / 2.0);
        assert!((saw_up(0.3, f, SR) - expected).abs() < 1e-12);
    }
}
