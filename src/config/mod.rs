//! Configuration loading
//!
//! `config.toml` is split into a `[sign]` section (tokenizing, clip
//! resolution and playback policy) and a `[simplifier]` section (which
//! text-simplification backend to call). Every field has a default, so a
//! missing file or a partial file both load.

pub mod schema;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use schema::duration_str;

/// Environment variable overriding `sign.base_path`.
pub const ENV_ASSETS_BASE: &str = "VAANI_ASSETS_BASE";
/// Environment variable overriding `simplifier.provider`.
pub const ENV_SIMPLIFIER: &str = "VAANI_SIMPLIFIER";
/// Environment variable overriding `simplifier.language`.
pub const ENV_LANGUAGE: &str = "VAANI_LANGUAGE";
/// Environment variable overriding `simplifier.endpoint`.
pub const ENV_BACKEND_URL: &str = "VAANI_BACKEND_URL";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("sign.extension must not be empty")]
    EmptyExtension,

    #[error("sign.clip_duration must be greater than zero")]
    ZeroClipDuration,

    #[error("simplifier.temperature must be within 0.0..=2.0, got {0}")]
    TemperatureOutOfRange(f64),

    #[error("simplifier.max_output_tokens must be greater than zero")]
    ZeroOutputTokens,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sign: SignConfig,
    pub simplifier: SimplifierConfig,
}

/// What happens when a new caption arrives while clips are still playing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SupersedePolicy {
    /// Drop whatever is playing and start the newest caption at once.
    #[default]
    Preempt,
    /// Let the current playlist finish, then play the new one.
    Enqueue,
}

/// How the clip base path relates to the page hosting the player.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssetLayout {
    /// Root-relative: `/assets/Hello.mp4`.
    Root,
    /// Page-relative: `assets/Hello.mp4`.
    #[default]
    RelativeToPage,
}

/// Which characters the tokenizer strips before splitting words.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PunctuationMode {
    /// The fixed set `.,/#!$%^&*;:{}=-_`~()`.
    #[default]
    Legacy,
    /// Every character that is neither a word character nor whitespace.
    NonWord,
}

/// How the headless device finds out whether a clip exists.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStrategy {
    /// HEAD request (or stat) before starting playback.
    #[default]
    Precheck,
    /// Just try to open the resource; failure means missing.
    AttemptLoad,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignConfig {
    pub base_path: String,
    pub layout: AssetLayout,
    /// Page the player is embedded in.  When set, clip locators are
    /// resolved against it and probed over HTTP.  Without it, locators are
    /// filesystem paths unless `base_path` is itself a URL.
    pub page_url: Option<String>,
    pub extension: String,
    pub mute_playback: bool,
    pub supersede_policy: SupersedePolicy,
    pub punctuation: PunctuationMode,
    pub probe: ProbeStrategy,
    #[serde(with = "duration_str")]
    pub clip_duration: Duration,
    /// Per-request timeout when probing or fetching clips over HTTP.
    #[serde(with = "duration_str")]
    pub probe_timeout: Duration,
    pub allow_audible_autoplay: bool,
}

impl Default for SignConfig {
    fn default() -> Self {
        Self {
            base_path: "assets".to_string(),
            layout: AssetLayout::RelativeToPage,
            page_url: None,
            extension: "mp4".to_string(),
            mute_playback: true,
            supersede_policy: SupersedePolicy::Preempt,
            punctuation: PunctuationMode::Legacy,
            probe: ProbeStrategy::Precheck,
            clip_duration: Duration::from_millis(1500),
            probe_timeout: Duration::from_secs(10),
            allow_audible_autoplay: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimplifierConfig {
    /// `"backend"`, `"gemini"` or `"identity"`.
    pub provider: String,
    /// Base URL of the simplification backend (`backend` provider).
    pub endpoint: String,
    /// Target language passed along with every request.
    pub language: String,
    /// Model name (`gemini` provider).
    pub model: String,
    /// API base URL (`gemini` provider).
    pub api_base: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
    #[serde(with = "duration_str")]
    pub timeout: Duration,
}

impl Default for SimplifierConfig {
    fn default() -> Self {
        Self {
            provider: "backend".to_string(),
            endpoint: "http://localhost:8000".to_string(),
            language: "English".to_string(),
            model: "gemini-3-flash".to_string(),
            api_base: "https://generativelanguage.googleapis.com".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            temperature: 0.2,
            max_output_tokens: 1024,
            timeout: Duration::from_secs(15),
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults only when the file is missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Apply `VAANI_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = non_empty_env(ENV_ASSETS_BASE) {
            self.sign.base_path = v;
        }
        if let Some(v) = non_empty_env(ENV_SIMPLIFIER) {
            self.simplifier.provider = v;
        }
        if let Some(v) = non_empty_env(ENV_LANGUAGE) {
            self.simplifier.language = v;
        }
        if let Some(v) = non_empty_env(ENV_BACKEND_URL) {
            self.simplifier.endpoint = v;
        }
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.sign.extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::EmptyExtension);
        }
        if self.sign.clip_duration.is_zero() {
            return Err(ConfigError::ZeroClipDuration);
        }
        if !(0.0..=2.0).contains(&self.simplifier.temperature) {
            return Err(ConfigError::TemperatureOutOfRange(
                self.simplifier.temperature,
            ));
        }
        if self.simplifier.max_output_tokens == 0 {
            return Err(ConfigError::ZeroOutputTokens);
        }
        Ok(())
    }

    /// `~/.config/vaani/config.toml` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "vaani")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Render as TOML (used by `vaani config`).
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config")
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: only called with ENV_LOCK held.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn clear_env() {
        for key in [ENV_ASSETS_BASE, ENV_SIMPLIFIER, ENV_LANGUAGE, ENV_BACKEND_URL] {
            unsafe { std::env::remove_var(key) }
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.sign.base_path, "assets");
        assert_eq!(config.sign.extension, "mp4");
        assert!(config.sign.mute_playback);
        assert_eq!(config.sign.supersede_policy, SupersedePolicy::Preempt);
        assert_eq!(config.sign.layout, AssetLayout::RelativeToPage);
        assert_eq!(config.sign.clip_duration, Duration::from_millis(1500));
        assert_eq!(config.simplifier.provider, "backend");
        assert_eq!(config.simplifier.language, "English");
        assert_eq!(config.simplifier.max_output_tokens, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [sign]
            base_path = "/static/signs"
            layout = "root"
            supersede_policy = "enqueue"
            clip_duration = "2s"
            "#,
        )
        .unwrap();
        assert_eq!(config.sign.base_path, "/static/signs");
        assert_eq!(config.sign.layout, AssetLayout::Root);
        assert_eq!(config.sign.supersede_policy, SupersedePolicy::Enqueue);
        assert_eq!(config.sign.clip_duration, Duration::from_secs(2));
        assert_eq!(config.sign.extension, "mp4");
        assert_eq!(config.simplifier, SimplifierConfig::default());
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = Config::from_toml("[sign]\nsupersede_policy = \"shuffle\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn validation_errors() {
        let mut config = Config::default();
        config.sign.extension = ".".to_string();
        assert_eq!(config.validate(), Err(ConfigError::EmptyExtension));

        let mut config = Config::default();
        config.simplifier.temperature = 3.5;
        assert_eq!(
            config.validate(),
            Err(ConfigError::TemperatureOutOfRange(3.5))
        );

        let mut config = Config::default();
        config.simplifier.max_output_tokens = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroOutputTokens));
    }

    #[test]
    fn zero_clip_duration_fails_to_parse() {
        assert!(Config::from_toml("[sign]\nclip_duration = \"0ms\"\n").is_err());
    }

    #[test]
    fn oversized_duration_is_an_error() {
        let err = Config::from_toml("[sign]\nclip_duration = \"6000000000000h\"\n").unwrap_err();
        assert!(format!("{err:#}").contains("Duration too large"));
    }

    #[test]
    fn probe_timeout_defaults_and_parses() {
        assert_eq!(Config::default().sign.probe_timeout, Duration::from_secs(10));
        let config = Config::from_toml("[sign]\nprobe_timeout = \"3s\"\n").unwrap();
        assert_eq!(config.sign.probe_timeout, Duration::from_secs(3));
    }

    #[test]
    fn load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_or_default_invalid_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sign\nbroken").unwrap();
        assert!(Config::load_or_default(file.path()).is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[simplifier]\nprovider = \"identity\"\nlanguage = \"Hindi\"\ntimeout = \"5s\""
        )
        .unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.simplifier.provider, "identity");
        assert_eq!(config.simplifier.language, "Hindi");
        assert_eq!(config.simplifier.timeout, Duration::from_secs(5));
    }

    #[test]
    fn env_overrides_apply() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        set_env(ENV_ASSETS_BASE, "/srv/clips");
        set_env(ENV_SIMPLIFIER, "identity");
        set_env(ENV_LANGUAGE, "Hindi");
        set_env(ENV_BACKEND_URL, "");

        let config = Config::default().with_env_overrides();
        assert_eq!(config.sign.base_path, "/srv/clips");
        assert_eq!(config.simplifier.provider, "identity");
        assert_eq!(config.simplifier.language, "Hindi");
        // Empty values are ignored.
        assert_eq!(config.simplifier.endpoint, "http://localhost:8000");
        clear_env();
    }

    #[test]
    fn toml_round_trip_is_stable() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("clip_duration = \"1500ms\""));
        assert_eq!(Config::from_toml(&rendered).unwrap(), config);
    }
}
