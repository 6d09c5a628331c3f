//! Command routing
//!
//! Classifies recognized text against a small set of literal rules and
//! falls through to the language model with the current detection labels
//! as context. Rules are evaluated strictly in priority order so inputs
//! matching several keywords resolve deterministically.

use chrono::Local;

use crate::llm::Brain;
use crate::vision::Detection;

/// Spoken when the language model call fails or returns nothing
const APOLOGY: &str = "I am having trouble reaching my language model right now.";

/// Spoken for a scene query when nothing is detected
const NO_OBJECTS: &str = "I am looking, but I do not see any specific objects right now.";

/// What the caller should do with a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterAction {
    /// Speak the response and continue
    Reply,
    /// Speak the response; the caller may terminate
    Shutdown,
}

/// A routed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterResponse {
    pub text: String,
    pub action: RouterAction,
}

impl RouterResponse {
    fn reply(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: RouterAction::Reply,
        }
    }
}

/// Rule-based-then-fallback text classifier
pub struct CommandRouter {
    user_name: String,
    brain: Box<dyn Brain + Send>,
}

impl CommandRouter {
    /// Create a router with the default user name
    pub fn new(brain: Box<dyn Brain + Send>) -> Self {
        Self {
            user_name: "Sir".to_string(),
            brain,
        }
    }

    /// Name the router currently addresses the user by
    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Route recognized text to a response
    ///
    /// Matching is case-insensitive substring matching, evaluated in
    /// fixed priority order. Returns `None` for empty input.
    pub fn route(&mut self, input: &str, detections: &[Detection]) -> Option<RouterResponse> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        tracing::info!(command = %trimmed, "routing command");
        let lowered = trimmed.to_lowercase();

        // 1. Name assignment (original casing preserved from the input)
        if let Some(pos) = lowered.find("my name is") {
            let end = pos + "my name is".len();
            // Lowercasing can change byte offsets for some scripts; fall
            // back to the lowered text when they no longer line up
            let rest = if trimmed.len() == lowered.len() && trimmed.is_char_boundary(end) {
                &trimmed[end..]
            } else {
                &lowered[end..]
            };
            let name = rest
                .split([',', '.', '!', '?'])
                .next()
                .unwrap_or_default()
                .trim();
            if !name.is_empty() {
                self.user_name = name.to_string();
            }
            return Some(RouterResponse::reply(format!(
                "Understood. I will address you as {}.",
                self.user_name
            )));
        }

        // 2. Identity
        if lowered.contains("who am i") {
            return Some(RouterResponse::reply(format!(
                "You are {}, the authorized operator of this system.",
                self.user_name
            )));
        }
        if lowered.contains("who are you") {
            return Some(RouterResponse::reply(
                "I am Vigil, your voice and vision assistant.",
            ));
        }

        // 3. Time and date
        if lowered.contains("time") {
            return Some(RouterResponse::reply(format!(
                "The time is {}.",
                Local::now().format("%H:%M")
            )));
        }
        if lowered.contains("date") {
            return Some(RouterResponse::reply(format!(
                "Today is {}.",
                Local::now().format("%A, %B %d")
            )));
        }

        // 4. Shutdown (acknowledged here, decided by the caller)
        if lowered.contains("terminate")
            || lowered.contains("exit")
            || lowered.contains("shut down")
        {
            return Some(RouterResponse {
                text: "Shutting down systems.".to_string(),
                action: RouterAction::Shutdown,
            });
        }

        let labels = unique_labels(detections);

        // 5. Explicit scene query answered from vision data directly
        if lowered.contains("what is this") || lowered.contains("what do you see") {
            if labels.is_empty() {
                return Some(RouterResponse::reply(NO_OBJECTS));
            }
            return Some(RouterResponse::reply(format!(
                "I see {}.",
                labels.join(", ")
            )));
        }

        // 6. Everything else goes to the language model
        match self.brain.complete(trimmed, &labels) {
            Ok(text) if !text.trim().is_empty() => Some(RouterResponse::reply(text)),
            Ok(_) => Some(RouterResponse::reply(APOLOGY)),
            Err(e) => {
                tracing::warn!(error = %e, "LLM fallback failed");
                Some(RouterResponse::reply(APOLOGY))
            }
        }
    }
}

/// Unique detection labels in first-seen order
fn unique_labels(detections: &[Detection]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for detection in detections {
        if !labels.iter().any(|l| l == &detection.label) {
            labels.push(detection.label.clone());
        }
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::BoundingBox;

    struct NoBrain;

    impl Brain for NoBrain {
        fn complete(&self, _user_text: &str, _labels: &[String]) -> crate::Result<String> {
            Err(crate::Error::Llm("offline".to_string()))
        }
    }

    fn detection(label: &str) -> Detection {
        Detection {
            label: label.to_string(),
            confidence: 0.9,
            bounds: BoundingBox {
                x: 10,
                y: 10,
                width: 50,
                height: 50,
            },
        }
    }

    #[test]
    fn test_unique_labels_keep_first_seen_order() {
        let detections = vec![
            detection("person"),
            detection("cup"),
            detection("person"),
        ];
        assert_eq!(unique_labels(&detections), vec!["person", "cup"]);
    }

    #[test]
    fn test_empty_input_is_not_routed() {
        let mut router = CommandRouter::new(Box::new(NoBrain));
        assert!(router.route("   ", &[]).is_none());
    }
}
