//! Host speech synthesis through an OpenAI-compatible speech endpoint

use crate::config::{env_secret, Config, HttpConfig, SpeechConfig};
use crate::error::SynthesisError;
use crate::logging::truncate_preview;
use crate::plugins::{HostServices, SpeechMetadata};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Host services backed by the configured speech API
pub struct OpenAiSpeech {
    config: SpeechConfig,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiSpeech {
    /// The API key is read from the environment once, here
    pub fn new(config: &Config) -> Result<Self, SynthesisError> {
        let api_key = env_secret(&config.speech.api_key_env);
        Self::with_api_key(&config.speech, &config.http, api_key)
    }

    pub fn with_api_key(
        speech: &SpeechConfig,
        http: &HttpConfig,
        api_key: Option<String>,
    ) -> Result<Self, SynthesisError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(http.timeout))
            .user_agent(&http.user_agent)
            .build()
            .map_err(|e| SynthesisError::Network(e.to_string()))?;

        Ok(Self {
            config: speech.clone(),
            api_key,
            client,
        })
    }

    /// Send HTTP request to the speech API
    async fn send_request(&self, api_key: &str, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let request_body = serde_json::json!({
            "model": self.config.model,
            "voice": self.config.voice,
            "input": text,
            "response_format": self.config.format,
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| SynthesisError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                message: truncate_preview(error_text.trim()),
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Network(e.to_string()))?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl HostServices for OpenAiSpeech {
    async fn generate_speech(
        &self,
        text: &str,
    ) -> Result<(Vec<u8>, SpeechMetadata), SynthesisError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            SynthesisError::Unavailable(format!("{} is not set", self.config.api_key_env))
        })?;

        let audio = self.send_request(api_key, text).await?;
        debug!(
            "Synthesized {} characters into {} bytes of {}",
            text.chars().count(),
            audio.len(),
            self.config.format
        );

        Ok((
            audio,
            SpeechMetadata {
                characters: text.chars().count(),
                format: self.config.format.clone(),
            },
        ))
    }
}
