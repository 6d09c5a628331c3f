//! Dialogue loop
//!
//! Background thread driving the interaction cycle:
//! `Idle → Listening → Processing → Speaking → Idle`. Playback is a
//! blocking call on this thread, so the assistant cannot listen while
//! speaking. Capture and synthesis failures are contained per iteration;
//! only the stop flag ends the loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

use super::events::{DialogueEvent, DialogueStatus, Speaker};
use super::router::{CommandRouter, RouterAction};
use crate::config::VoiceConfig;
use crate::speech::VoiceInterface;
use crate::vision::VisionState;

/// Handle to the running dialogue loop
pub struct DialogueWorker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DialogueWorker {
    /// Start the dialogue loop on a dedicated thread
    ///
    /// The voice interface is built inside the thread (audio streams are
    /// not `Send`); the factory decides the capability level.
    ///
    /// # Errors
    ///
    /// Returns error if the thread cannot be spawned
    pub fn start<F>(
        voice_factory: F,
        mut router: CommandRouter,
        vision: Arc<VisionState>,
        events: Sender<DialogueEvent>,
        config: VoiceConfig,
    ) -> crate::Result<Self>
    where
        F: FnOnce() -> Box<dyn VoiceInterface>,
        F: Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = std::thread::Builder::new()
            .name("dialogue".to_string())
            .spawn(move || {
                let mut voice = voice_factory();
                tracing::info!("dialogue loop started");

                let _ = events.send(DialogueEvent::message(Speaker::System, "Voice systems online."));

                // Optional one-time greeting before the first listen cycle
                if let Some(greeting) = &config.greeting {
                    let _ = events.send(DialogueEvent::message(Speaker::Assistant, greeting));
                    let _ = events.send(DialogueEvent::Status(DialogueStatus::Speaking));
                    if let Err(e) = voice.speak(greeting) {
                        tracing::warn!(error = %e, "greeting playback failed");
                    }
                    let _ = events.send(DialogueEvent::Status(DialogueStatus::Idle));
                }

                while !stop_flag.load(Ordering::Relaxed) {
                    let _ = events.send(DialogueEvent::Status(DialogueStatus::Listening));

                    let heard = match voice.listen(
                        config.listen_timeout,
                        config.phrase_limit,
                        &stop_flag,
                    ) {
                        Ok(heard) => heard,
                        Err(e) => {
                            tracing::warn!(error = %e, "listen failed, skipping cycle");
                            None
                        }
                    };

                    let Some(text) = heard else {
                        // Timeout or unrecognized audio: back to idle, no router call
                        let _ = events.send(DialogueEvent::Status(DialogueStatus::Idle));
                        continue;
                    };

                    let _ = events.send(DialogueEvent::message(Speaker::User, &text));
                    let _ = events.send(DialogueEvent::Status(DialogueStatus::Processing));

                    let detections = vision.detections();
                    if let Some(response) = router.route(&text, &detections) {
                        let _ =
                            events.send(DialogueEvent::message(Speaker::Assistant, &response.text));
                        let _ = events.send(DialogueEvent::Status(DialogueStatus::Speaking));

                        if let Err(e) = voice.speak(&response.text) {
                            tracing::warn!(error = %e, "speech playback failed, skipping");
                        }

                        if response.action == RouterAction::Shutdown {
                            let _ = events.send(DialogueEvent::ShutdownRequested);
                        }
                    }

                    let _ = events.send(DialogueEvent::Status(DialogueStatus::Idle));
                }

                let _ = events.send(DialogueEvent::Status(DialogueStatus::Idle));
                tracing::info!("dialogue loop stopped");
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Signal the loop to stop and wait for it to observe the flag
    ///
    /// Shutdown can be delayed by an in-flight listen poll or playback.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("dialogue thread panicked");
            }
        }
    }
}

impl Drop for DialogueWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
