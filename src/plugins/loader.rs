//! Capability catalog
//!
//! Maps configuration identifiers to capability constructors. Built-in
//! capabilities form a closed set; hosts may inject additional constructors.

use super::builtin::{
    AutoTextToSpeech, DdgImageSearch, GoogleWebSearch, GttsTextToSpeech, IpLocation, Reaction,
    Webshot, WebsiteContent,
};
use super::capability::Capability;
use crate::config::Config;
use std::fmt;
use std::sync::Arc;

/// Builds a capability from configuration
pub type Constructor = Arc<dyn Fn(&Config) -> Box<dyn Capability> + Send + Sync>;

/// Capabilities compiled into this build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    Reaction,
    AutoTts,
    GttsTextToSpeech,
    IpLocation,
    Webshot,
    WebsiteContent,
    GoogleWebSearch,
    DdgImageSearch,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 8] = [
        CapabilityKind::Reaction,
        CapabilityKind::AutoTts,
        CapabilityKind::GttsTextToSpeech,
        CapabilityKind::IpLocation,
        CapabilityKind::Webshot,
        CapabilityKind::WebsiteContent,
        CapabilityKind::GoogleWebSearch,
        CapabilityKind::DdgImageSearch,
    ];

    /// Configuration identifier
    pub fn id(&self) -> &'static str {
        match self {
            CapabilityKind::Reaction => "reaction",
            CapabilityKind::AutoTts => "auto_tts",
            CapabilityKind::GttsTextToSpeech => "gtts_text_to_speech",
            CapabilityKind::IpLocation => "iplocation",
            CapabilityKind::Webshot => "webshot",
            CapabilityKind::WebsiteContent => "website_content",
            CapabilityKind::GoogleWebSearch => "google_web_search",
            CapabilityKind::DdgImageSearch => "ddg_image_search",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    /// Instantiate the capability
    pub fn build(&self, config: &Config) -> Box<dyn Capability> {
        match self {
            CapabilityKind::Reaction => Box::new(Reaction),
            CapabilityKind::AutoTts => Box::new(AutoTextToSpeech),
            CapabilityKind::GttsTextToSpeech => Box::new(GttsTextToSpeech::new(config)),
            CapabilityKind::IpLocation => Box::new(IpLocation::new(config)),
            CapabilityKind::Webshot => Box::new(Webshot::new(config)),
            CapabilityKind::WebsiteContent => Box::new(WebsiteContent::new(config)),
            CapabilityKind::GoogleWebSearch => Box::new(GoogleWebSearch::new(config)),
            CapabilityKind::DdgImageSearch => Box::new(DdgImageSearch::new(config)),
        }
    }
}

/// Constant identifier -> constructor mapping
#[derive(Clone, Default)]
pub struct Catalog {
    entries: Vec<(String, Constructor)>,
}

impl Catalog {
    /// Catalog without any entries
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog of every capability compiled into this build
    pub fn builtin() -> Self {
        CapabilityKind::ALL
            .into_iter()
            .fold(Self::empty(), |catalog, kind| {
                catalog.with(kind.id(), move |config| kind.build(config))
            })
    }

    /// Add or replace the constructor for `id`
    pub fn with<F>(mut self, id: &str, constructor: F) -> Self
    where
        F: Fn(&Config) -> Box<dyn Capability> + Send + Sync + 'static,
    {
        let constructor: Constructor = Arc::new(constructor);
        match self.entries.iter_mut().find(|(existing, _)| existing == id) {
            Some(entry) => entry.1 = constructor,
            None => self.entries.push((id.to_string(), constructor)),
        }
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|(id, _)| id.as_str()).collect()
    }

    /// Build the capability registered under `id`, if any
    pub fn construct(&self, id: &str, config: &Config) -> Option<Box<dyn Capability>> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, constructor)| constructor(config))
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog").field("ids", &self.ids()).finish()
    }
}
