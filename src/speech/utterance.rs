//! Utterance segmentation
//!
//! Energy-based detection of a single spoken phrase in the capture
//! stream: speech starts when energy rises above the threshold and the
//! utterance is complete after a trailing stretch of silence.

/// Minimum audio energy threshold to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech to accept an utterance (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Silence duration to consider end of utterance (in samples)
const SILENCE_SAMPLES: usize = 8000; // 0.5 seconds

/// State of the utterance detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentState {
    /// Waiting for speech to start
    Idle,
    /// Speech detected, accumulating the phrase
    Capturing,
}

/// Segments one utterance out of a stream of audio chunks
pub struct UtteranceDetector {
    state: SegmentState,
    speech_buffer: Vec<f32>,
    speech_counter: usize,
    silence_counter: usize,
}

impl UtteranceDetector {
    /// Create a detector in the idle state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SegmentState::Idle,
            speech_buffer: Vec::new(),
            speech_counter: 0,
            silence_counter: 0,
        }
    }

    /// Feed captured samples; returns true when the utterance is complete
    pub fn process(&mut self, samples: &[f32]) -> bool {
        let energy = calculate_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            SegmentState::Idle => {
                if is_speech {
                    self.state = SegmentState::Capturing;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.speech_counter = samples.len();
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech detected, capturing");
                }
            }
            SegmentState::Capturing => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.speech_counter += samples.len();
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                tracing::trace!(
                    buffer_len = self.speech_buffer.len(),
                    silence = self.silence_counter,
                    is_speech,
                    energy,
                    "capturing state"
                );

                if self.silence_counter > SILENCE_SAMPLES
                    && self.speech_counter > MIN_SPEECH_SAMPLES
                {
                    tracing::debug!(samples = self.speech_buffer.len(), "utterance complete");
                    return true;
                }

                // Too much silence without enough speech: likely a noise blip
                if self.silence_counter > SILENCE_SAMPLES * 2 {
                    tracing::trace!("noise blip, resetting");
                    self.reset();
                }
            }
        }

        false
    }

    /// Whether speech has started (the listen timeout no longer applies)
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.state == SegmentState::Capturing
    }

    /// Number of samples accumulated so far
    #[must_use]
    pub fn buffered_samples(&self) -> usize {
        self.speech_buffer.len()
    }

    /// Take the accumulated utterance, clearing the buffer
    pub fn take_speech_buffer(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.speech_buffer)
    }

    /// Reset to the idle state
    pub fn reset(&mut self) {
        self.state = SegmentState::Idle;
        self.speech_buffer.clear();
        self.speech_counter = 0;
        self.silence_counter = 0;
    }
}

impl Default for UtteranceDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
