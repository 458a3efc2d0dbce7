use anyhow::{Context, Result, anyhow};
use std::path::Path;

pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_TRANSLATE_URL: &str = "https://api.mymemory.translated.net/get";
pub const DEFAULT_LANGUAGE: &str = "zh_tw";
pub const DEFAULT_SOURCE_LANG: &str = "zh-TW";
pub const DEFAULT_TARGET_LANG: &str = "en";

pub const API_KEY_VAR: &str = "OPENWEATHERMAP_API_KEY";
pub const TRANSLATION_VAR: &str = "WEATHER_TRANSLATION";
pub const LANGUAGE_VAR: &str = "WEATHER_LANG";
pub const SOURCE_LANG_VAR: &str = "WEATHER_SOURCE_LANG";
pub const TARGET_LANG_VAR: &str = "WEATHER_TARGET_LANG";
pub const WEATHER_URL_VAR: &str = "OPENWEATHERMAP_URL";
pub const TRANSLATE_URL_VAR: &str = "TRANSLATE_URL";

/// Process-wide settings, resolved once at startup and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// OpenWeather API key. `None` when unset or blank.
    pub api_key: Option<String>,

    /// Run the name resolver before querying the weather provider.
    pub translation_enabled: bool,

    /// Response language asked from the weather provider, e.g. "zh_tw".
    pub language: Option<String>,

    /// Fixed language pair used by the name resolver.
    pub source_lang: String,
    pub target_lang: String,

    pub weather_url: String,
    pub translate_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            translation_enabled: true,
            language: Some(DEFAULT_LANGUAGE.to_string()),
            source_lang: DEFAULT_SOURCE_LANG.to_string(),
            target_lang: DEFAULT_TARGET_LANG.to_string(),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            translate_url: DEFAULT_TRANSLATE_URL.to_string(),
        }
    }
}

impl Config {
    /// Build from the current process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let translation_enabled = match lookup(TRANSLATION_VAR) {
            Some(raw) => parse_bool(&raw)
                .with_context(|| format!("Invalid value for {TRANSLATION_VAR}"))?,
            None => defaults.translation_enabled,
        };

        // An explicitly empty language disables the `lang` parameter.
        let language = match lookup(LANGUAGE_VAR) {
            Some(raw) => non_blank(raw),
            None => defaults.language,
        };

        Ok(Self {
            api_key: lookup(API_KEY_VAR).and_then(non_blank),
            translation_enabled,
            language,
            source_lang: lookup(SOURCE_LANG_VAR)
                .and_then(non_blank)
                .unwrap_or(defaults.source_lang),
            target_lang: lookup(TARGET_LANG_VAR)
                .and_then(non_blank)
                .unwrap_or(defaults.target_lang),
            weather_url: lookup(WEATHER_URL_VAR)
                .and_then(non_blank)
                .unwrap_or(defaults.weather_url),
            translate_url: lookup(TRANSLATE_URL_VAR)
                .and_then(non_blank)
                .unwrap_or(defaults.translate_url),
        })
    }

    /// Load `KEY=value` pairs from an env file into the process environment.
    ///
    /// Variables already present in the environment are left untouched.
    pub fn load_env_file(path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(anyhow!("Env file not found: {}", path.display()));
        }

        dotenv::from_path(path)
            .with_context(|| format!("Failed to load env file: {}", path.display()))?;

        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = non_blank(api_key.into());
        self
    }

    pub fn with_translation(mut self, enabled: bool) -> Self {
        self.translation_enabled = enabled;
        self
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("expected true/false, got '{other}'")),
    }
}
