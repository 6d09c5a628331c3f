//! Language model fallback
//!
//! Open-ended questions the command router can't answer are forwarded to
//! the Gemini `generateContent` API with the current detection labels as
//! contextual data. Failures never cross this boundary as errors the
//! user sees; the router converts them to a spoken apology.

use crate::{Error, Result};

/// Completes free-form user text into a response
///
/// The production implementation is [`LanguageModel`]; tests drive the
/// router with scripted brains.
pub trait Brain {
    /// Complete the user's text, with current detection labels as context
    ///
    /// # Errors
    ///
    /// Returns error if the completion call fails
    fn complete(&self, user_text: &str, context_labels: &[String]) -> Result<String>;
}

/// Request body for the Gemini `generateContent` endpoint
#[derive(serde::Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(serde::Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(serde::Serialize)]
struct Part {
    text: String,
}

/// Response body for the Gemini `generateContent` endpoint
#[derive(serde::Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(serde::Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(serde::Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Gemini-backed language model client
#[derive(Debug)]
pub struct LanguageModel {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    system_prompt: String,
}

impl LanguageModel {
    /// Create a new language model client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, model: String, system_prompt: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Gemini API key required".to_string()));
        }

        Ok(Self {
            client: reqwest::blocking::Client::new(),
            api_key,
            model,
            system_prompt,
        })
    }

    /// Assemble the full prompt: persona, camera context, then the user line
    fn build_prompt(&self, user_text: &str, context_labels: &[String]) -> String {
        let mut prompt = format!("{}\n\n", self.system_prompt);

        if !context_labels.is_empty() {
            prompt.push_str(&format!(
                "[SYSTEM DATA: Camera detects: {}]\n",
                context_labels.join(", ")
            ));
        }

        prompt.push_str(&format!("User: {user_text}"));
        prompt
    }
}

impl Brain for LanguageModel {
    fn complete(&self, user_text: &str, context_labels: &[String]) -> Result<String> {
        let prompt = self.build_prompt(user_text, context_labels);

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .map_err(|e| {
                tracing::error!(error = %e, "LLM request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::error!(status = %status, body = %body, "LLM API error");
            return Err(Error::Llm(format!("Gemini API error {status}: {body}")));
        }

        let result: GenerateResponse = response.json().map_err(|e| {
            tracing::error!(error = %e, "failed to parse LLM response");
            e
        })?;

        let text = result
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().replace('\n', " "))
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::Llm("empty completion".to_string()));
        }

        tracing::debug!(response = %text, "completion received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_context_labels() {
        let model = LanguageModel::new(
            "key".to_string(),
            "gemini-2.5-pro".to_string(),
            "You are Vigil.".to_string(),
        )
        .unwrap();

        let prompt = model.build_prompt("what is that", &["person".to_string(), "cup".to_string()]);
        assert!(prompt.starts_with("You are Vigil."));
        assert!(prompt.contains("Camera detects: person, cup"));
        assert!(prompt.ends_with("User: what is that"));
    }

    #[test]
    fn test_prompt_omits_empty_context() {
        let model = LanguageModel::new(
            "key".to_string(),
            "gemini-2.5-pro".to_string(),
            "You are Vigil.".to_string(),
        )
        .unwrap();

        let prompt = model.build_prompt("hello", &[]);
        assert!(!prompt.contains("SYSTEM DATA"));
    }

    #[test]
    fn test_missing_key_rejected() {
        let err = LanguageModel::new(
            String::new(),
            "gemini-2.5-pro".to_string(),
            String::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
