//! Voice interface
//!
//! Capability is decided at construction time: [`CloudVoice`] captures
//! from the microphone and talks to the cloud STT/TTS APIs, while
//! [`MutedVoice`] is the explicit no-op used when audio hardware or API
//! keys are unavailable. Both block the calling thread; cancellation is
//! checked at every poll so shutdown latency stays bounded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
use super::playback::AudioPlayback;
use super::stt::SpeechToText;
use super::tts::TextToSpeech;
use super::utterance::UtteranceDetector;
use crate::Result;

/// How often the listen loop drains the capture buffer
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Utterances shorter than this are discarded as noise
const MIN_UTTERANCE_SAMPLES: usize = SAMPLE_RATE as usize / 2;

/// Blocking speech input/output for the dialogue loop
pub trait VoiceInterface {
    /// Listen for one utterance
    ///
    /// Waits up to `timeout` for speech to start and caps the utterance
    /// at `phrase_limit`. Returns `Ok(None)` on timeout, unrecognized
    /// audio, or when `stop` is raised mid-listen.
    ///
    /// # Errors
    ///
    /// Returns error only for device failures; transcription failures
    /// degrade to `Ok(None)`
    fn listen(
        &mut self,
        timeout: Duration,
        phrase_limit: Duration,
        stop: &AtomicBool,
    ) -> Result<Option<String>>;

    /// Speak text, blocking until audio playback completes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    fn speak(&mut self, text: &str) -> Result<()>;
}

/// Microphone + cloud STT/TTS voice implementation
pub struct CloudVoice {
    capture: AudioCapture,
    playback: AudioPlayback,
    stt: SpeechToText,
    tts: TextToSpeech,
}

impl CloudVoice {
    /// Create a cloud voice from already-constructed parts
    ///
    /// # Errors
    ///
    /// Returns error if the audio devices cannot be opened
    pub fn new(stt: SpeechToText, tts: TextToSpeech) -> Result<Self> {
        Ok(Self {
            capture: AudioCapture::new()?,
            playback: AudioPlayback::new()?,
            stt,
            tts,
        })
    }
}

impl VoiceInterface for CloudVoice {
    fn listen(
        &mut self,
        timeout: Duration,
        phrase_limit: Duration,
        stop: &AtomicBool,
    ) -> Result<Option<String>> {
        self.capture.start()?;
        self.capture.clear_buffer();

        let mut detector = UtteranceDetector::new();
        let listen_started = Instant::now();
        let mut phrase_started: Option<Instant> = None;

        let utterance = loop {
            if stop.load(Ordering::Relaxed) {
                self.capture.stop();
                return Ok(None);
            }

            std::thread::sleep(POLL_INTERVAL);
            let samples = self.capture.take_buffer();
            let complete = detector.process(&samples);

            if detector.is_capturing() && phrase_started.is_none() {
                phrase_started = Some(Instant::now());
            }

            let phrase_expired = phrase_started.is_some_and(|t| t.elapsed() >= phrase_limit);
            if complete || phrase_expired {
                break detector.take_speech_buffer();
            }

            if !detector.is_capturing() && listen_started.elapsed() >= timeout {
                self.capture.stop();
                tracing::debug!("listen timeout, no speech");
                return Ok(None);
            }
        };

        self.capture.stop();

        if utterance.len() < MIN_UTTERANCE_SAMPLES {
            return Ok(None);
        }

        let wav = samples_to_wav(&utterance, SAMPLE_RATE)?;
        match self.stt.transcribe(wav) {
            Ok(text) if text.trim().is_empty() => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                // Unrecognized audio is not an error the user should see
                tracing::warn!(error = %e, "transcription failed, dropping utterance");
                Ok(None)
            }
        }
    }

    fn speak(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        let audio = self.tts.synthesize(text)?;
        self.playback.play_mp3(&audio)
    }
}

/// No-op voice for headless or keyless setups
pub struct MutedVoice;

impl VoiceInterface for MutedVoice {
    fn listen(
        &mut self,
        timeout: Duration,
        _phrase_limit: Duration,
        stop: &AtomicBool,
    ) -> Result<Option<String>> {
        // Pace the dialogue loop as a real listen would, staying responsive to stop
        let started = Instant::now();
        while started.elapsed() < timeout {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        Ok(None)
    }

    fn speak(&mut self, text: &str) -> Result<()> {
        tracing::debug!(text, "muted voice, skipping speech");
        Ok(())
    }
}
