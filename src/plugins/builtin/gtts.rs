//! Google Translate text-to-speech

use super::{ensure_success, http_client};
use crate::config::{Config, GttsConfig, HttpConfig};
use crate::error::PluginError;
use crate::plugins::capability::{Capability, HostServices};
use crate::plugins::protocol::{
    Arguments, CallResult, DirectKind, DirectPayload, FunctionSpec,
};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Longest text the endpoint accepts per request
const MAX_CHUNK_CHARS: usize = 100;

/// Convert text to speech using Google Translate's speech endpoint
#[derive(Debug, Clone)]
pub struct GttsTextToSpeech {
    settings: GttsConfig,
    http: HttpConfig,
}

impl GttsTextToSpeech {
    pub fn new(config: &Config) -> Self {
        Self {
            settings: config.gtts.clone(),
            http: config.http.clone(),
        }
    }

    async fn speak(&self, args: &Arguments) -> Result<CallResult, PluginError> {
        let text = args.require_str("text")?;
        let lang = args
            .get_str("lang")
            .unwrap_or(self.settings.default_lang.as_str());
        if !lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(PluginError::invalid("lang", format!("'{}' is not a language code", lang)));
        }

        let client = http_client(&self.http, self.http.timeout)?;
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        let total = chunks.len().to_string();
        let mut audio = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            let idx = idx.to_string();
            let response = client
                .get(&self.settings.endpoint)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", lang),
                    ("q", chunk.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                ])
                .send()
                .await?;
            let bytes = ensure_success(response).await?.bytes().await?;
            audio.extend_from_slice(&bytes);
        }

        debug!("gTTS produced {} bytes in {} chunks", audio.len(), total);
        Ok(CallResult::direct(DirectKind::Voice, DirectPayload::Binary(audio)))
    }
}

#[async_trait]
impl Capability for GttsTextToSpeech {
    fn source_name(&self) -> &str {
        "gTTS"
    }

    fn specs(&self) -> Vec<FunctionSpec> {
        vec![FunctionSpec::new(
            "google_translate_text_to_speech",
            "Translate text to speech using Google Translate's Text to Speech API",
            json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "The text to translate to speech",
                    },
                    "lang": {
                        "type": "string",
                        "description": "The language of the text to translate to speech. \
                                        Infer this from the language of the text.",
                    },
                },
                "required": ["text", "lang"],
            }),
        )]
    }

    async fn execute(
        &self,
        function_name: &str,
        _host: &dyn HostServices,
        args: Arguments,
    ) -> CallResult {
        match function_name {
            "google_translate_text_to_speech" => CallResult::from_outcome(self.speak(&args).await),
            other => PluginError::UnknownFunction(other.to_string()).into(),
        }
    }
}

/// Split text on whitespace into pieces of at most `max_chars` characters.
///
/// Single words longer than the limit are cut mid-word.
fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: String = word.to_string();

        while word.chars().count() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let head: String = word.chars().take(max_chars).collect();
            word = word.chars().skip(max_chars).collect();
            chunks.push(head);
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
