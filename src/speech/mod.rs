//! Speech processing: capture, utterance segmentation, STT, TTS, playback

mod capture;
mod playback;
mod stt;
mod tts;
mod utterance;
mod voice;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use playback::AudioPlayback;
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
pub use utterance::UtteranceDetector;
pub use voice::{CloudVoice, MutedVoice, VoiceInterface};
