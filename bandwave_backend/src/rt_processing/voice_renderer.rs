use crate::rt_processing::callback::AudioCallback;

/// Trait for waveform generators that produce audio samples
pub trait AudioSource: Send + Sync {
    /// Fill the output buffer with audio samples (interleaved if multi-channel)
    fn fill_buffer(&mut self, output: &mut [f32], sample_rate: f32, channels: usize, frame_count: usize);

    /// Check if this audio source is still active/playing
    fn is_active(&self) -> bool;

    /// Reset the audio source to its initial state
    fn reset(&mut self);
}

/// Adapts a single `AudioSource` to the realtime callback interface.
pub struct SourceRenderer<S: AudioSource> {
    source: S,
}

impl<S: AudioSource> SourceRenderer<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: AudioSource + 'static> AudioCallback for SourceRenderer<S> {
    fn process(&mut self, output: &mut [f32], sample_rate: f32, channels: usize, frames: usize) {
        if !self.source.is_active() {
            output.fill(0.0);
            return;
        }
        let used = frames * channels;
        self.source.fill_buffer(&mut output[..used], sample_rate, channels, frames);
        // trailing samples that do not form a whole frame
        output[used..].fill(0.0);
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Source that always renders silence.
pub struct SilenceSource;

impl AudioSource for SilenceSource {
    fn fill_buffer(&mut self, output: &mut [f32], _sample_rate: f32, _channels: usize, _frame_count: usize) {
        output.fill(0.0);
    }

    fn is_active(&self) -> bool {
        true
    }

    fn reset(&mut self) {}
}
