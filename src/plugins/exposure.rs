//! Policies deciding whether function specs are offered to the model

use crate::config::{ExposureConfig, ExposureMode};

/// Pure predicate over the selector (usually the current user message)
pub trait ExposurePolicy: Send + Sync {
    fn admits(&self, selector: Option<&str>) -> bool;
}

/// Expose every spec for every selector
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysExpose;

impl ExposurePolicy for AlwaysExpose {
    fn admits(&self, _selector: Option<&str>) -> bool {
        true
    }
}

/// Expose specs only when the selector mentions one of the keywords
#[derive(Debug, Clone)]
pub struct KeywordExposure {
    keywords: Vec<String>,
}

impl KeywordExposure {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }
}

impl ExposurePolicy for KeywordExposure {
    fn admits(&self, selector: Option<&str>) -> bool {
        let Some(selector) = selector else {
            return true;
        };
        if self.keywords.is_empty() {
            return true;
        }
        let selector = selector.to_lowercase();
        self.keywords.iter().any(|k| selector.contains(k.as_str()))
    }
}

/// Build the policy described by configuration
pub fn policy_from_config(config: &ExposureConfig) -> Box<dyn ExposurePolicy> {
    match config.policy_mode() {
        ExposureMode::Always => Box::new(AlwaysExpose),
        ExposureMode::Keywords => Box::new(KeywordExposure::new(&config.keywords)),
    }
}
