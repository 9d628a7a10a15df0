//! Configuration management for chatplug
//!
//! Handles loading and merging configuration from multiple sources:
//! 1. Compiled defaults
//! 2. System config (/etc/chatplug/config.toml)
//! 3. User config (~/.chatplug/config.toml)
//! 4. CLI-specified config file
//! 5. Environment variables

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Environment variable holding a comma-separated plugin list
pub const PLUGINS_ENV: &str = "CHATPLUG_PLUGINS";

/// Environment variable forcing every function spec to be exposed
pub const EXPOSE_ALL_ENV: &str = "CHATPLUG_EXPOSE_ALL_FUNCTIONS";

/// Environment variable overriding `ddg_images.safesearch`
pub const SAFESEARCH_ENV: &str = "DUCKDUCKGO_SAFESEARCH";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub plugins: PluginConfig,
    pub http: HttpConfig,
    pub speech: SpeechConfig,
    pub google: GoogleConfig,
    pub iplocation: IpLocationConfig,
    pub webshot: WebshotConfig,
    pub gtts: GttsConfig,
    pub ddg_images: DdgImagesConfig,
    pub website_content: WebsiteContentConfig,
}

/// Plugin activation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Capability identifiers to activate, in registration order
    pub enabled: Vec<String>,
    /// When function specs are offered to the model
    pub exposure: ExposureConfig,
}

/// Exposure policy configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureConfig {
    /// Policy: always or keywords. Unset means always
    pub mode: Option<ExposureMode>,
    /// Trigger words for the keywords policy
    pub keywords: Vec<String>,
    /// Expose everything regardless of the policy. Unset means false
    pub force_all: Option<bool>,
}

impl ExposureConfig {
    pub fn policy_mode(&self) -> ExposureMode {
        self.mode.unwrap_or_default()
    }

    pub fn forces_all(&self) -> bool {
        self.force_all.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExposureMode {
    #[default]
    Always,
    Keywords,
}

/// Outbound HTTP settings shared by network plugins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout: u64,
    /// User-Agent header
    pub user_agent: String,
}

/// Host speech synthesis (OpenAI speech API)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub endpoint: String,
    /// Environment variable containing API key
    pub api_key_env: String,
    pub model: String,
    pub voice: String,
    /// Audio format: opus, mp3, aac, flac, wav
    pub format: String,
}

/// Google Custom Search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub endpoint: String,
    pub api_key_env: String,
    pub cse_id_env: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpLocationConfig {
    pub endpoint: String,
}

/// Website screenshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebshotConfig {
    pub endpoint: String,
    /// Screenshot width in pixels
    pub width: u32,
    /// Maximum age of a cached screenshot, in hours
    pub max_age: u32,
    /// Download timeout in seconds
    pub timeout: u64,
}

/// Google Translate text-to-speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GttsConfig {
    pub endpoint: String,
    pub default_lang: String,
}

/// DuckDuckGo image search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DdgImagesConfig {
    pub endpoint: String,
    /// Safe search level: on, moderate, off
    pub safesearch: String,
    /// Region used when the call does not name one
    pub default_region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebsiteContentConfig {
    /// Maximum characters of page text returned
    pub max_chars: usize,
}

// Default implementations

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: format!("chatplug/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/audio/speech".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            format: "opus".to_string(),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.googleapis.com/customsearch/v1".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            cse_id_env: "GOOGLE_CSE_ID".to_string(),
        }
    }
}

impl Default for IpLocationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.ip.fm/".to_string(),
        }
    }
}

impl Default for WebshotConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://image.thum.io/get".to_string(),
            width: 720,
            max_age: 12,
            timeout: 30,
        }
    }
}

impl Default for GttsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://translate.google.com/translate_tts".to_string(),
            default_lang: "en".to_string(),
        }
    }
}

impl Default for DdgImagesConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://duckduckgo.com".to_string(),
            safesearch: "moderate".to_string(),
            default_region: "wt-wt".to_string(),
        }
    }
}

impl Default for WebsiteContentConfig {
    fn default() -> Self {
        Self { max_chars: 8000 }
    }
}

const SPEECH_FORMATS: [&str; 5] = ["opus", "mp3", "aac", "flac", "wav"];
const SAFESEARCH_LEVELS: [&str; 3] = ["on", "moderate", "off"];

impl Config {
    /// Load configuration from all sources
    pub fn load(cli_config: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // Load system config
        let system_config = Path::new("/etc/chatplug/config.toml");
        if system_config.exists() {
            debug!("Loading system config from {:?}", system_config);
            config.merge_from_file(system_config)?;
        }

        // Load user config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".chatplug/config.toml");
            if user_config.exists() {
                debug!("Loading user config from {:?}", user_config);
                config.merge_from_file(&user_config)?;
            }
        }

        // Load CLI-specified config
        if let Some(path) = cli_config {
            debug!("Loading CLI config from {:?}", path);
            config.merge_from_file(path)?;
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Merge configuration from a file
    fn merge_from_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;

        let file_config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;

        self.merge(file_config);
        Ok(())
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        // Plugin list - replaced wholesale, order matters
        if !other.plugins.enabled.is_empty() {
            self.plugins.enabled = other.plugins.enabled;
        }

        // Exposure - explicit values win, including explicit defaults
        if other.plugins.exposure.mode.is_some() {
            self.plugins.exposure.mode = other.plugins.exposure.mode;
        }
        if !other.plugins.exposure.keywords.is_empty() {
            self.plugins.exposure.keywords = other.plugins.exposure.keywords;
        }
        if other.plugins.exposure.force_all.is_some() {
            self.plugins.exposure.force_all = other.plugins.exposure.force_all;
        }

        // HTTP config
        let http = HttpConfig::default();
        if other.http.timeout != http.timeout {
            self.http.timeout = other.http.timeout;
        }
        if other.http.user_agent != http.user_agent {
            self.http.user_agent = other.http.user_agent;
        }

        // Speech config
        let speech = SpeechConfig::default();
        if other.speech.endpoint != speech.endpoint {
            self.speech.endpoint = other.speech.endpoint;
        }
        if other.speech.api_key_env != speech.api_key_env {
            self.speech.api_key_env = other.speech.api_key_env;
        }
        if other.speech.model != speech.model {
            self.speech.model = other.speech.model;
        }
        if other.speech.voice != speech.voice {
            self.speech.voice = other.speech.voice;
        }
        if other.speech.format != speech.format {
            self.speech.format = other.speech.format;
        }

        // Google config
        let google = GoogleConfig::default();
        if other.google.endpoint != google.endpoint {
            self.google.endpoint = other.google.endpoint;
        }
        if other.google.api_key_env != google.api_key_env {
            self.google.api_key_env = other.google.api_key_env;
        }
        if other.google.cse_id_env != google.cse_id_env {
            self.google.cse_id_env = other.google.cse_id_env;
        }

        if other.iplocation.endpoint != IpLocationConfig::default().endpoint {
            self.iplocation.endpoint = other.iplocation.endpoint;
        }

        // Webshot config
        let webshot = WebshotConfig::default();
        if other.webshot.endpoint != webshot.endpoint {
            self.webshot.endpoint = other.webshot.endpoint;
        }
        if other.webshot.width != webshot.width {
            self.webshot.width = other.webshot.width;
        }
        if other.webshot.max_age != webshot.max_age {
            self.webshot.max_age = other.webshot.max_age;
        }
        if other.webshot.timeout != webshot.timeout {
            self.webshot.timeout = other.webshot.timeout;
        }

        // gTTS config
        let gtts = GttsConfig::default();
        if other.gtts.endpoint != gtts.endpoint {
            self.gtts.endpoint = other.gtts.endpoint;
        }
        if other.gtts.default_lang != gtts.default_lang {
            self.gtts.default_lang = other.gtts.default_lang;
        }

        // DuckDuckGo config
        let ddg = DdgImagesConfig::default();
        if other.ddg_images.endpoint != ddg.endpoint {
            self.ddg_images.endpoint = other.ddg_images.endpoint;
        }
        if other.ddg_images.safesearch != ddg.safesearch {
            self.ddg_images.safesearch = other.ddg_images.safesearch;
        }
        if other.ddg_images.default_region != ddg.default_region {
            self.ddg_images.default_region = other.ddg_images.default_region;
        }

        if other.website_content.max_chars != WebsiteContentConfig::default().max_chars {
            self.website_content.max_chars = other.website_content.max_chars;
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(list) = lookup(PLUGINS_ENV) {
            let enabled: Vec<String> = list
                .split(',')
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect();
            if !enabled.is_empty() {
                self.plugins.enabled = enabled;
            }
        }
        if let Some(flag) = lookup(EXPOSE_ALL_ENV) {
            if is_truthy(&flag) {
                self.plugins.exposure.force_all = Some(true);
            }
        }
        if let Some(level) = lookup(SAFESEARCH_ENV) {
            let level = level.trim().to_ascii_lowercase();
            if !level.is_empty() {
                self.ddg_images.safesearch = level;
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.timeout == 0 {
            return Err(ConfigError::Invalid(
                "http.timeout must be greater than zero".to_string(),
            ));
        }
        if self.webshot.timeout == 0 {
            return Err(ConfigError::Invalid(
                "webshot.timeout must be greater than zero".to_string(),
            ));
        }
        if !SPEECH_FORMATS.contains(&self.speech.format.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "speech.format must be one of: {:?}",
                SPEECH_FORMATS
            )));
        }
        if !SAFESEARCH_LEVELS.contains(&self.ddg_images.safesearch.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "ddg_images.safesearch must be one of: {:?}",
                SAFESEARCH_LEVELS
            )));
        }
        if let Some(blank) = self.plugins.enabled.iter().position(|id| id.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "plugins.enabled[{}] is empty",
                blank
            )));
        }
        Ok(())
    }
}

/// Read a secret from the environment variable named in configuration
pub fn env_secret(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.plugins.enabled.is_empty());
        assert_eq!(config.plugins.exposure.policy_mode(), ExposureMode::Always);
        assert!(!config.plugins.exposure.forces_all());
        assert_eq!(config.http.timeout, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
            [plugins]
            enabled = ["webshot", "reaction", "iplocation"]

            [plugins.exposure]
            mode = "keywords"
            keywords = ["search", "show"]

            [webshot]
            width = 1280
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.plugins.enabled,
            vec!["webshot", "reaction", "iplocation"]
        );
        assert_eq!(config.plugins.exposure.mode, Some(ExposureMode::Keywords));
        assert_eq!(config.plugins.exposure.force_all, None);
        assert_eq!(config.webshot.width, 1280);
        assert_eq!(config.webshot.max_age, 12);
    }

    #[test]
    fn test_invalid_speech_format() {
        let mut config = Config::default();
        config.speech.format = "midi".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.http.timeout = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (PLUGINS_ENV, " reaction , iplocation,,"),
            (EXPOSE_ALL_ENV, "true"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.plugins.enabled, vec!["reaction", "iplocation"]);
        assert!(config.plugins.exposure.forces_all());
    }

    #[test]
    fn test_env_override_falsy_flag() {
        let mut config = Config::default();
        config.apply_overrides(|name| (name == EXPOSE_ALL_ENV).then(|| "0".to_string()));
        assert!(!config.plugins.exposure.forces_all());
    }

    #[test]
    fn test_env_safesearch_override() {
        let mut config = Config::default();
        config.apply_overrides(|name| (name == SAFESEARCH_ENV).then(|| " Off ".to_string()));
        assert_eq!(config.ddg_images.safesearch, "off");
        assert!(config.validate().is_ok());

        config.ddg_images.safesearch = "strict".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [plugins]
            enabled = ["auto_tts"]

            [speech]
            voice = "nova"
            "#,
        )
        .unwrap();

        let mut config = Config::default();
        config.plugins.enabled = vec!["reaction".to_string()];
        config.merge_from_file(&path).unwrap();

        assert_eq!(config.plugins.enabled, vec!["auto_tts"]);
        assert_eq!(config.speech.voice, "nova");
        assert_eq!(config.speech.model, "tts-1");
        assert_eq!(config.google, GoogleConfig::default());
    }

    #[test]
    fn test_later_file_keeps_earlier_fields() {
        let temp_dir = TempDir::new().unwrap();
        let system = temp_dir.path().join("system.toml");
        let user = temp_dir.path().join("user.toml");
        std::fs::write(
            &system,
            r#"
            [plugins.exposure]
            mode = "keywords"
            keywords = ["image"]
            force_all = true

            [speech]
            model = "tts-1-hd"

            [webshot]
            width = 1280
            "#,
        )
        .unwrap();
        std::fs::write(
            &user,
            r#"
            [plugins.exposure]
            mode = "always"
            force_all = false

            [speech]
            voice = "nova"

            [webshot]
            max_age = 1
            "#,
        )
        .unwrap();

        let mut config = Config::default();
        config.merge_from_file(&system).unwrap();
        config.merge_from_file(&user).unwrap();

        assert_eq!(config.speech.model, "tts-1-hd");
        assert_eq!(config.speech.voice, "nova");
        assert_eq!(config.webshot.width, 1280);
        assert_eq!(config.webshot.max_age, 1);
        assert_eq!(config.plugins.exposure.mode, Some(ExposureMode::Always));
        assert_eq!(config.plugins.exposure.keywords, vec!["image"]);
        assert!(!config.plugins.exposure.forces_all());
    }

    #[test]
    fn test_merge_from_bad_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[plugins\nenabled = 3").unwrap();

        let mut config = Config::default();
        assert!(matches!(
            config.merge_from_file(&path),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            config.merge_from_file(&temp_dir.path().join("missing.toml")),
            Err(ConfigError::Read(_))
        ));
    }
}
