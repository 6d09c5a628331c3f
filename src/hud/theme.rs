//! HUD color theme

use egui::Color32;

use crate::config::ThemeConfig;

/// Resolved HUD colors
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub accent: Color32,
    pub background: Color32,
    pub text: Color32,
    pub error: Color32,
}

impl Theme {
    /// Resolve a theme from config, falling back per-field on bad hex
    #[must_use]
    pub fn from_config(config: &ThemeConfig) -> Self {
        Self {
            accent: parse_hex(&config.accent).unwrap_or(Color32::from_rgb(0x00, 0xff, 0xcc)),
            background: parse_hex(&config.background).unwrap_or(Color32::from_rgb(0x0d, 0x0d, 0x0d)),
            text: parse_hex(&config.text).unwrap_or(Color32::WHITE),
            error: parse_hex(&config.error).unwrap_or(Color32::from_rgb(0xff, 0x33, 0x33)),
        }
    }
}

/// Parse a `#rrggbb` hex string
fn parse_hex(value: &str) -> Option<Color32> {
    let hex = value.trim().strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color32::from_rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#00ffcc"), Some(Color32::from_rgb(0, 255, 204)));
        assert_eq!(parse_hex("#FFFFFF"), Some(Color32::WHITE));
        assert_eq!(parse_hex("00ffcc"), None);
        assert_eq!(parse_hex("#xyzxyz"), None);
        assert_eq!(parse_hex("#fff"), None);
    }

    #[test]
    fn test_bad_config_falls_back() {
        let theme = Theme::from_config(&ThemeConfig {
            accent: "not-a-color".to_string(),
            ..ThemeConfig::default()
        });
        assert_eq!(theme.accent, Color32::from_rgb(0x00, 0xff, 0xcc));
        assert_eq!(theme.text, Color32::WHITE);
    }
}
