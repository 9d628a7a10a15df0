//! Error types for chatplug

use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Faults raised inside a capability while it handles a call.
///
/// These never leave the dispatch boundary as errors: they are rendered
/// into a [`CallResult::Error`](crate::plugins::CallResult::Error) first.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("{0}")]
    Decode(String),

    #[error("Missing required parameter: {0}")]
    MissingArgument(String),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Plugin not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Speech synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
}

impl PluginError {
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for PluginError {
    fn from(e: reqwest::Error) -> Self {
        PluginError::Network(e.to_string())
    }
}

/// Speech synthesis errors reported by host services
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("speech synthesis unavailable: {0}")]
    Unavailable(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}
