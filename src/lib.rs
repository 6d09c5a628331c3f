//! Vigil - Desktop voice and vision HUD assistant
//!
//! This library provides the core functionality for the Vigil HUD:
//! - Vision processing (camera capture, object detection, shared snapshots)
//! - Voice interaction (speech capture, STT, command routing, TTS)
//! - LLM fallback for open-ended questions
//! - A heads-up display rendering video overlays and the transcript
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │ VisionWorker │────▶│   VisionState    │◀────│    HUD (egui)    │
//! │ camera+model │     │ (frame, detects) │     │  overlay + chat  │
//! └──────────────┘     └──────────────────┘     └──────────────────┘
//!                               ▲                        ▲
//!                               │ labels                 │ events
//!                      ┌────────┴──────────┐             │
//!                      │  DialogueWorker   │─────────────┘
//!                      │ listen→route→speak│
//!                      └───────────────────┘
//! ```
//!
//! The vision and dialogue workers run on dedicated threads; the HUD runs
//! on the main thread. The only cross-thread mutable resource is the
//! vision snapshot, guarded by a single mutex with copy-on-read semantics.

pub mod config;
pub mod daemon;
pub mod dialogue;
pub mod error;
pub mod hud;
pub mod llm;
pub mod speech;
pub mod vision;

pub use config::Config;
pub use daemon::Daemon;
pub use dialogue::{CommandRouter, DialogueEvent, DialogueStatus, DialogueWorker, Speaker};
pub use error::{Error, Result};
pub use llm::{Brain, LanguageModel};
pub use speech::{CloudVoice, MutedVoice, VoiceInterface};
pub use vision::{
    BoundingBox, Camera, Detection, DetectionEngine, Detector, Frame, FrameSource, VisionState,
    VisionWorker,
};
