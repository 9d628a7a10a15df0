//! Plugin system for chatplug
//!
//! Capabilities declare functions to a conversational model; the registry
//! aggregates their specs and dispatches calls back to the owner.

mod builtin;
mod capability;
mod exposure;
mod loader;
mod protocol;
mod registry;
mod schema;

pub use builtin::{
    AutoTextToSpeech, DdgImageSearch, GoogleWebSearch, GttsTextToSpeech, IpLocation, Reaction,
    Webshot, WebsiteContent,
};
pub use capability::{Capability, HostServices, NoHostServices, SpeechMetadata};
pub use exposure::{policy_from_config, AlwaysExpose, ExposurePolicy, KeywordExposure};
pub use loader::{CapabilityKind, Catalog, Constructor};
pub use protocol::{
    Arguments, CallResult, DirectKind, DirectPayload, DirectResult, FunctionSpec,
    DIRECT_RESULT_KEY, ERROR_KEY,
};
pub use registry::PluginRegistry;
pub use schema::validate_arguments;
