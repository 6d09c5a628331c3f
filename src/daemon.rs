//! Daemon - the assistant's composition root
//!
//! Starts the vision and dialogue subsystems on their own threads, runs
//! the HUD on the main thread, and tears everything down in order when
//! the window closes. A subsystem that fails to start degrades the
//! experience instead of aborting the process: no detector means a bare
//! camera feed, no camera means no feed, no audio or keys means a muted
//! voice.

use std::sync::Arc;
use std::sync::mpsc;

use crate::config::{Config, VoiceConfig};
use crate::dialogue::{CommandRouter, DialogueWorker};
use crate::hud::{self, Theme};
use crate::llm::{Brain, LanguageModel};
use crate::speech::{CloudVoice, MutedVoice, SpeechToText, TextToSpeech, VoiceInterface};
use crate::vision::{
    Camera, Detection, DetectionEngine, Detector, Frame, FrameSource, VisionState, VisionWorker,
};
use crate::{Error, Result};

/// Detection engine used when the real model failed to load
struct NoDetections;

impl DetectionEngine for NoDetections {
    fn infer(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        Ok(Vec::new())
    }
}

/// Brain used when no LLM key is configured; the router turns the
/// failure into its spoken apology
struct OfflineBrain;

impl Brain for OfflineBrain {
    fn complete(&self, _user_text: &str, _context_labels: &[String]) -> Result<String> {
        Err(Error::Llm("no Gemini API key configured".to_string()))
    }
}

/// The Vigil daemon - owns subsystem lifecycles
pub struct Daemon {
    config: Config,
}

impl Daemon {
    /// Create a new daemon instance
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run until the HUD window closes
    ///
    /// # Errors
    ///
    /// Returns error if the HUD cannot be created; subsystem failures
    /// degrade instead
    pub fn run(self) -> Result<()> {
        let vision_state = Arc::new(VisionState::new());

        let vision_worker = self.start_vision(&vision_state);

        let (events_tx, events_rx) = mpsc::channel();

        let dialogue_worker = if self.config.voice.enabled {
            match self.start_dialogue(&vision_state, events_tx) {
                Ok(worker) => Some(worker),
                Err(e) => {
                    tracing::error!(error = %e, "dialogue failed to start");
                    None
                }
            }
        } else {
            tracing::info!("voice disabled - running vision-only HUD");
            None
        };

        tracing::info!("vigil running");
        let result = hud::run(
            Arc::clone(&vision_state),
            events_rx,
            Theme::from_config(&self.config.theme),
        );

        if let Some(worker) = dialogue_worker {
            worker.stop();
        }
        if let Some(worker) = vision_worker {
            worker.stop();
        }

        tracing::info!("vigil stopped");
        result
    }

    /// Start the vision loop, degrading on detector or camera failure
    fn start_vision(&self, state: &Arc<VisionState>) -> Option<VisionWorker> {
        let camera_config = self.config.camera.clone();
        let camera_factory = move || -> Option<Box<dyn FrameSource>> {
            match Camera::open(camera_config.index, camera_config.width, camera_config.height) {
                Ok(camera) => Some(Box::new(camera)),
                Err(e) => {
                    tracing::error!(error = %e, "camera unavailable - running without video");
                    None
                }
            }
        };

        let interval = self.config.camera.interval;
        let worker = match Detector::load(&self.config.detector) {
            Ok(detector) => {
                VisionWorker::start(camera_factory, detector, Arc::clone(state), interval)
            }
            Err(e) => {
                tracing::error!(error = %e, "detector failed to load - running without detections");
                VisionWorker::start(camera_factory, NoDetections, Arc::clone(state), interval)
            }
        };

        match worker {
            Ok(worker) => Some(worker),
            Err(e) => {
                tracing::error!(error = %e, "vision loop failed to start");
                None
            }
        }
    }

    /// Start the dialogue loop with capability decided at construction
    fn start_dialogue(
        &self,
        state: &Arc<VisionState>,
        events: mpsc::Sender<crate::dialogue::DialogueEvent>,
    ) -> Result<DialogueWorker> {
        let brain: Box<dyn Brain + Send> = match &self.config.api_keys.gemini {
            Some(key) => match LanguageModel::new(
                key.clone(),
                self.config.llm.model.clone(),
                self.config.llm.system_prompt.clone(),
            ) {
                Ok(model) => Box::new(model),
                Err(e) => {
                    tracing::warn!(error = %e, "language model unavailable");
                    Box::new(OfflineBrain)
                }
            },
            None => {
                tracing::warn!("no Gemini API key - open-ended questions will be apologized away");
                Box::new(OfflineBrain)
            }
        };

        let router = CommandRouter::new(brain);

        let openai_key = self.config.api_keys.openai.clone();
        let voice_config = self.config.voice.clone();
        let factory = move || -> Box<dyn VoiceInterface> {
            match build_cloud_voice(openai_key.as_deref(), &voice_config) {
                Ok(voice) => Box::new(voice),
                Err(e) => {
                    tracing::warn!(error = %e, "voice hardware or keys unavailable - muted");
                    Box::new(MutedVoice)
                }
            }
        };

        DialogueWorker::start(
            factory,
            router,
            Arc::clone(state),
            events,
            self.config.voice.clone(),
        )
    }
}

/// Build the microphone + cloud STT/TTS voice
///
/// # Errors
///
/// Returns error if the key is missing or audio devices cannot open
fn build_cloud_voice(openai_key: Option<&str>, voice: &VoiceConfig) -> Result<CloudVoice> {
    let key = openai_key
        .ok_or_else(|| Error::Config("no OpenAI API key for voice".to_string()))?
        .to_string();

    let stt = SpeechToText::new(key.clone(), voice.stt_model.clone())?;
    let tts = TextToSpeech::new(
        key,
        voice.tts_model.clone(),
        voice.tts_voice.clone(),
        voice.tts_speed,
    )?;

    CloudVoice::new(stt, tts)
}
