//! TOML configuration file loading
//!
//! Supports `~/.config/vigil/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct VigilConfigFile {
    /// Camera configuration
    #[serde(default)]
    pub camera: CameraFileConfig,

    /// Object detector configuration
    #[serde(default)]
    pub detector: DetectorFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// LLM configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// HUD appearance
    #[serde(default)]
    pub theme: ThemeFileConfig,
}

/// Camera configuration
#[derive(Debug, Default, Deserialize)]
pub struct CameraFileConfig {
    /// Device index (0 is usually the default webcam)
    pub index: Option<u32>,

    /// Requested frame width
    pub width: Option<u32>,

    /// Requested frame height
    pub height: Option<u32>,

    /// Vision loop interval in milliseconds
    pub interval_ms: Option<u64>,
}

/// Object detector configuration
#[derive(Debug, Default, Deserialize)]
pub struct DetectorFileConfig {
    /// Path to the ONNX model file
    pub model_path: Option<String>,

    /// Path to the class-names file (one label per line)
    pub classes_path: Option<String>,

    /// Minimum confidence to keep a detection
    pub confidence_threshold: Option<f32>,

    /// IoU threshold for non-maximum suppression
    pub overlap_threshold: Option<f32>,

    /// Square input size the model expects
    pub input_size: Option<u32>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable voice input/output
    pub enabled: Option<bool>,

    /// Seconds to wait for speech to start before giving up
    pub listen_timeout_secs: Option<f32>,

    /// Maximum seconds of a single utterance
    pub phrase_limit_secs: Option<f32>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    pub tts_speed: Option<f32>,

    /// Greeting spoken once at startup; omit for a silent start
    pub greeting: Option<String>,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gemini-2.5-pro")
    pub model: Option<String>,

    /// System persona prepended to every request
    pub system_prompt: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub gemini: Option<String>,
}

/// HUD appearance configuration (hex color strings, e.g. "#00ffcc")
#[derive(Debug, Default, Deserialize)]
pub struct ThemeFileConfig {
    pub accent: Option<String>,
    pub background: Option<String>,
    pub text: Option<String>,
    pub error: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `VigilConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> VigilConfigFile {
    let Some(path) = config_file_path() else {
        return VigilConfigFile::default();
    };

    if !path.exists() {
        return VigilConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                VigilConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            VigilConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/vigil/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("vigil").join("config.toml"))
}
