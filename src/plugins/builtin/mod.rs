//! Built-in capabilities
//!
//! Thin adapters over third-party APIs. Every adapter builds its HTTP client
//! inside `execute` and drops it before returning.

mod auto_tts;
mod ddg_images;
mod google_search;
mod gtts;
mod iplocation;
mod reaction;
mod webshot;
mod website_content;

pub use auto_tts::AutoTextToSpeech;
pub use ddg_images::DdgImageSearch;
pub use google_search::GoogleWebSearch;
pub use gtts::GttsTextToSpeech;
pub use iplocation::IpLocation;
pub use reaction::Reaction;
pub use webshot::Webshot;
pub use website_content::WebsiteContent;

use crate::config::HttpConfig;
use crate::error::PluginError;
use std::time::Duration;

/// Build a short-lived HTTP client
fn http_client(http: &HttpConfig, timeout_secs: u64) -> Result<reqwest::Client, PluginError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(http.user_agent.clone())
        .build()
        .map_err(|e| PluginError::Network(format!("failed to create HTTP client: {}", e)))
}

/// Turn a non-success response into an API error
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, PluginError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(PluginError::Api {
        status: status.as_u16(),
        message: crate::logging::truncate_preview(message.trim()),
    })
}

/// Parse a user-supplied URL or bare domain into an http(s) URL
fn parse_web_url(raw: &str) -> Result<url::Url, PluginError> {
    let raw = raw.trim();
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let parsed = url::Url::parse(&candidate)
        .map_err(|e| PluginError::invalid("url", format!("malformed URL '{}': {}", raw, e)))?;

    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
        "http" | "https" => Err(PluginError::invalid("url", format!("URL '{}' has no host", raw))),
        other => Err(PluginError::invalid(
            "url",
            format!("unsupported scheme '{}'", other),
        )),
    }
}
