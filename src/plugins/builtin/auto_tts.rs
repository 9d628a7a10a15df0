//! Speech through the host's own synthesis service

use crate::error::PluginError;
use crate::plugins::capability::{Capability, HostServices};
use crate::plugins::protocol::{
    Arguments, CallResult, DirectKind, DirectPayload, FunctionSpec,
};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Convert text to speech using the host's speech service
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoTextToSpeech;

impl AutoTextToSpeech {
    async fn speak(
        &self,
        host: &dyn HostServices,
        args: &Arguments,
    ) -> Result<CallResult, PluginError> {
        let text = args.require_str("text")?;
        let (audio, metadata) = host.generate_speech(text).await?;
        debug!(
            "Synthesized {} characters into {} bytes of {}",
            metadata.characters,
            audio.len(),
            metadata.format
        );
        Ok(CallResult::direct(DirectKind::Voice, DirectPayload::Binary(audio)))
    }
}

#[async_trait]
impl Capability for AutoTextToSpeech {
    fn source_name(&self) -> &str {
        "TTS"
    }

    fn specs(&self) -> Vec<FunctionSpec> {
        vec![FunctionSpec::new(
            "translate_text_to_speech",
            "Translate text to speech using OpenAI API",
            json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "The text to translate to speech",
                    },
                },
                "required": ["text"],
            }),
        )]
    }

    async fn execute(
        &self,
        function_name: &str,
        host: &dyn HostServices,
        args: Arguments,
    ) -> CallResult {
        match function_name {
            "translate_text_to_speech" => CallResult::from_outcome(self.speak(host, &args).await),
            other => PluginError::UnknownFunction(other.to_string()).into(),
        }
    }
}
