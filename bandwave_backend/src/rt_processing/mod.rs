pub mod callback;
pub mod performance;
pub mod voice_renderer;
pub mod waveform;
