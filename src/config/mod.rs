//! Configuration management for the Vigil HUD

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

/// Default system persona sent to the language model
const DEFAULT_SYSTEM_PROMPT: &str = "You are Vigil, a desktop assistant with a live camera feed. \
     Your responses should be concise, professional, and slightly witty. \
     Do not give long lectures; keep answers short for voice output.";

/// Vigil configuration, loaded once at startup and shared by reference
#[derive(Debug, Clone)]
pub struct Config {
    /// Camera configuration
    pub camera: CameraConfig,

    /// Object detector configuration
    pub detector: DetectorConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// LLM configuration
    pub llm: LlmConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// HUD color theme
    pub theme: ThemeConfig,
}

/// Camera configuration
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Device index (0 is usually the default webcam)
    pub index: u32,

    /// Requested frame width
    pub width: u32,

    /// Requested frame height
    pub height: u32,

    /// Vision loop interval
    pub interval: Duration,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
            interval: Duration::from_millis(33),
        }
    }
}

/// Object detector configuration
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Path to the ONNX model file
    pub model_path: PathBuf,

    /// Path to the class-names file (one label per line)
    pub classes_path: PathBuf,

    /// Minimum confidence to keep a detection
    pub confidence_threshold: f32,

    /// IoU threshold for non-maximum suppression
    pub overlap_threshold: f32,

    /// Square input size the model expects
    pub input_size: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        let models_dir = directories::BaseDirs::new().map_or_else(
            || PathBuf::from("models"),
            |d| d.data_dir().join("vigil").join("models"),
        );
        Self {
            model_path: models_dir.join("yolov8n.onnx"),
            classes_path: models_dir.join("coco.names"),
            confidence_threshold: 0.5,
            overlap_threshold: 0.4,
            input_size: 416,
        }
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable voice input/output
    pub enabled: bool,

    /// How long to wait for speech to start before giving up
    pub listen_timeout: Duration,

    /// Maximum length of a single utterance
    pub phrase_limit: Duration,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,

    /// Greeting spoken once at startup; `None` for a silent start
    pub greeting: Option<String>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_timeout: Duration::from_secs(3),
            phrase_limit: Duration::from_secs(5),
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
            greeting: None,
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// System persona prepended to every request
    pub system_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-pro".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (for Whisper STT and TTS)
    pub openai: Option<String>,

    /// Google Gemini API key (for the LLM fallback)
    pub gemini: Option<String>,
}

/// HUD color theme (hex strings, parsed by the HUD layer)
#[derive(Debug, Clone)]
pub struct ThemeConfig {
    pub accent: String,
    pub background: String,
    pub text: String,
    pub error: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            accent: "#00ffcc".to_string(),
            background: "#0d0d0d".to_string(),
            text: "#ffffff".to_string(),
            error: "#ff3333".to_string(),
        }
    }
}

impl Config {
    /// Load configuration with `env > toml > default` precedence
    #[must_use]
    pub fn load() -> Self {
        Self::load_with_options(false)
    }

    /// Load configuration with an explicit voice disable option
    #[must_use]
    pub fn load_with_options(disable_voice: bool) -> Self {
        let fc = file::load_config_file();

        let camera_defaults = CameraConfig::default();
        let camera = CameraConfig {
            index: env_parse("VIGIL_CAMERA_INDEX")
                .or(fc.camera.index)
                .unwrap_or(camera_defaults.index),
            width: env_parse("VIGIL_FRAME_WIDTH")
                .or(fc.camera.width)
                .unwrap_or(camera_defaults.width),
            height: env_parse("VIGIL_FRAME_HEIGHT")
                .or(fc.camera.height)
                .unwrap_or(camera_defaults.height),
            interval: env_parse("VIGIL_VISION_INTERVAL_MS")
                .or(fc.camera.interval_ms)
                .map_or(camera_defaults.interval, Duration::from_millis),
        };

        let detector_defaults = DetectorConfig::default();
        let detector = DetectorConfig {
            model_path: std::env::var("VIGIL_MODEL_PATH")
                .ok()
                .or(fc.detector.model_path)
                .map_or(detector_defaults.model_path, PathBuf::from),
            classes_path: std::env::var("VIGIL_CLASSES_PATH")
                .ok()
                .or(fc.detector.classes_path)
                .map_or(detector_defaults.classes_path, PathBuf::from),
            confidence_threshold: env_parse("VIGIL_CONFIDENCE_THRESHOLD")
                .or(fc.detector.confidence_threshold)
                .unwrap_or(detector_defaults.confidence_threshold),
            overlap_threshold: env_parse("VIGIL_OVERLAP_THRESHOLD")
                .or(fc.detector.overlap_threshold)
                .unwrap_or(detector_defaults.overlap_threshold),
            input_size: env_parse("VIGIL_INPUT_SIZE")
                .or(fc.detector.input_size)
                .unwrap_or(detector_defaults.input_size),
        };

        let voice_defaults = VoiceConfig::default();
        let voice_enabled = if disable_voice {
            false
        } else {
            fc.voice.enabled.unwrap_or(true)
        };
        let voice = VoiceConfig {
            enabled: voice_enabled,
            listen_timeout: env_parse("VIGIL_LISTEN_TIMEOUT_SECS")
                .or(fc.voice.listen_timeout_secs)
                .and_then(seconds)
                .unwrap_or(voice_defaults.listen_timeout),
            phrase_limit: env_parse("VIGIL_PHRASE_LIMIT_SECS")
                .or(fc.voice.phrase_limit_secs)
                .and_then(seconds)
                .unwrap_or(voice_defaults.phrase_limit),
            stt_model: std::env::var("VIGIL_STT_MODEL")
                .ok()
                .or(fc.voice.stt_model)
                .unwrap_or(voice_defaults.stt_model),
            tts_model: std::env::var("VIGIL_TTS_MODEL")
                .ok()
                .or(fc.voice.tts_model)
                .unwrap_or(voice_defaults.tts_model),
            tts_voice: std::env::var("VIGIL_TTS_VOICE")
                .ok()
                .or(fc.voice.tts_voice)
                .unwrap_or(voice_defaults.tts_voice),
            tts_speed: env_parse("VIGIL_TTS_SPEED")
                .or(fc.voice.tts_speed)
                .unwrap_or(voice_defaults.tts_speed),
            greeting: std::env::var("VIGIL_GREETING").ok().or(fc.voice.greeting),
        };

        if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
        }

        let llm_defaults = LlmConfig::default();
        let llm = LlmConfig {
            model: std::env::var("VIGIL_LLM_MODEL")
                .ok()
                .or(fc.llm.model)
                .unwrap_or(llm_defaults.model),
            system_prompt: std::env::var("VIGIL_SYSTEM_PROMPT")
                .ok()
                .or(fc.llm.system_prompt)
                .unwrap_or(llm_defaults.system_prompt),
        };

        let api_keys = ApiKeys {
            openai: std::env::var("OPENAI_API_KEY").ok().or(fc.api_keys.openai),
            gemini: std::env::var("GEMINI_API_KEY").ok().or(fc.api_keys.gemini),
        };

        let theme_defaults = ThemeConfig::default();
        let theme = ThemeConfig {
            accent: fc.theme.accent.unwrap_or(theme_defaults.accent),
            background: fc.theme.background.unwrap_or(theme_defaults.background),
            text: fc.theme.text.unwrap_or(theme_defaults.text),
            error: fc.theme.error.unwrap_or(theme_defaults.error),
        };

        Self {
            camera,
            detector,
            voice,
            llm,
            api_keys,
            theme,
        }
    }
}

/// Parse an env var into any `FromStr` type, `None` when unset or invalid
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Convert a configured seconds value, rejecting garbage
fn seconds(value: f32) -> Option<Duration> {
    (value.is_finite() && value >= 0.0).then(|| Duration::from_secs_f32(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let camera = CameraConfig::default();
        assert_eq!(camera.index, 0);
        assert_eq!(camera.width, 640);
        assert_eq!(camera.height, 480);

        let detector = DetectorConfig::default();
        assert!((detector.confidence_threshold - 0.5).abs() < f32::EPSILON);
        assert!((detector.overlap_threshold - 0.4).abs() < f32::EPSILON);
        assert_eq!(detector.input_size, 416);

        let voice = VoiceConfig::default();
        assert_eq!(voice.listen_timeout, Duration::from_secs(3));
        assert_eq!(voice.phrase_limit, Duration::from_secs(5));
        assert!(voice.greeting.is_none());
    }

    #[test]
    fn test_file_overlay_parses_partial_toml() {
        let parsed: file::VigilConfigFile = toml::from_str(
            r#"
            [camera]
            index = 2

            [voice]
            greeting = "All systems online."
            "#,
        )
        .unwrap();

        assert_eq!(parsed.camera.index, Some(2));
        assert_eq!(parsed.camera.width, None);
        assert_eq!(
            parsed.voice.greeting.as_deref(),
            Some("All systems online.")
        );
        assert!(parsed.detector.model_path.is_none());
    }
}
