//! Dialogue events
//!
//! The dialogue loop owns its state exclusively and publishes discrete
//! events to the presentation layer instead of sharing it via locks.

use chrono::{DateTime, Local};

/// Where the dialogue loop currently is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueStatus {
    /// Between cycles
    Idle,
    /// Waiting for the user to speak
    Listening,
    /// Routing a recognized utterance
    Processing,
    /// Playing back the response
    Speaking,
}

impl DialogueStatus {
    /// Display label for the HUD status indicator
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Listening => "LISTENING",
            Self::Processing => "PROCESSING",
            Self::Speaking => "SPEAKING",
        }
    }
}

/// Who produced a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
    System,
}

impl Speaker {
    /// Display label for the transcript log
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Vigil",
            Self::System => "System",
        }
    }
}

/// One event published by the dialogue loop
#[derive(Debug, Clone)]
pub enum DialogueEvent {
    /// Status indicator transition
    Status(DialogueStatus),

    /// New transcript line
    Message {
        sender: Speaker,
        text: String,
        timestamp: DateTime<Local>,
    },

    /// The user asked to shut down; the daemon decides what to do
    ShutdownRequested,
}

impl DialogueEvent {
    /// Build a timestamped transcript message
    #[must_use]
    pub fn message(sender: Speaker, text: impl Into<String>) -> Self {
        Self::Message {
            sender,
            text: text.into(),
            timestamp: Local::now(),
        }
    }
}
