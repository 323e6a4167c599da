//! Pitch and phase helpers shared by table construction and the oscillators.

/// MIDI note of the tuning reference (A4).
pub const REFERENCE_NOTE: f64 = 69.0;
/// Frequency of the tuning reference in Hz.
pub const REFERENCE_HZ: f64 = 440.0;
/// Highest MIDI note the table banks cover.
pub const MAX_NOTE: f64 = 127.0;

/// 12-TET conversion from a (possibly fractional) MIDI note to Hz.
#[inline]
pub fn midi_note_to_hz(note: f64) -> f64 {
    REFERENCE_HZ * 2.0_f64.powf((note - REFERENCE_NOTE) / 12.0)
}

/// Single precision variant for the realtime path.
#[inline]
pub fn midi_note_to_hz_f32(note: f32) -> f32 {
    440.0 * 2.0_f32.powf((note - 69.0) / 12.0)
}

/// Normalize phase to [0.0, 1.0) range to prevent accumulation errors
#[inline]
pub fn normalize_phase(phase: f32) -> f32 {
    let wrapped = phase - phase.floor();
    // tiny negative inputs round up to exactly 1.0
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// Wraps a phase that is at most one period outside [0.0, 1.0) by adding or
/// subtracting 1.0 exactly once.
#[inline]
pub fn wrap_phase_once(phase: f32) -> f32 {
    if phase >= 1.0 {
        phase - 1.0
    } else if phase < 0.0 {
        phase + 1.0
    } else {
        phase
    }
}

/// Phase increment calculation helper
#[inline]
pub fn phase_increment(frequency: f32, sample_rate: f32) -> f32 {
    frequency / sample_rate
}
