//! Capability contract implemented by every plugin

use super::protocol::{Arguments, CallResult, FunctionSpec};
use crate::error::SynthesisError;
use async_trait::async_trait;

/// Details about synthesized speech
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechMetadata {
    /// Number of characters that were synthesized
    pub characters: usize,
    /// Audio container, e.g. "opus" or "mp3"
    pub format: String,
}

/// Services the host runtime lends to capabilities
#[async_trait]
pub trait HostServices: Send + Sync {
    /// Turn text into speech using host-held credentials
    async fn generate_speech(
        &self,
        text: &str,
    ) -> Result<(Vec<u8>, SpeechMetadata), SynthesisError>;
}

/// Host services for hosts that lend nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHostServices;

#[async_trait]
impl HostServices for NoHostServices {
    async fn generate_speech(
        &self,
        _text: &str,
    ) -> Result<(Vec<u8>, SpeechMetadata), SynthesisError> {
        Err(SynthesisError::Unavailable(
            "host does not provide speech synthesis".to_string(),
        ))
    }
}

/// A unit of callable functionality exposed to the agent.
///
/// `execute` reports every failure as [`CallResult::Error`]; it is only ever
/// called with names taken from `specs()`, with arguments that already
/// passed schema validation.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Attribution name, constant and non-empty
    fn source_name(&self) -> &str;

    /// Functions this capability declares
    fn specs(&self) -> Vec<FunctionSpec>;

    /// Run one of the declared functions
    async fn execute(
        &self,
        function_name: &str,
        host: &dyn HostServices,
        args: Arguments,
    ) -> CallResult;

    /// Whether this capability declares `function_name`
    fn owns(&self, function_name: &str) -> bool {
        self.specs().iter().any(|spec| spec.name == function_name)
    }
}
