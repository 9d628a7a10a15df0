//! Image and GIF search through DuckDuckGo

use super::{ensure_success, http_client};
use crate::config::{Config, DdgImagesConfig, HttpConfig};
use crate::error::PluginError;
use crate::plugins::capability::{Capability, HostServices};
use crate::plugins::protocol::{
    Arguments, CallResult, DirectKind, DirectPayload, FunctionSpec,
};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Search token embedded in the HTML results page
static VQD: Lazy<Regex> = Lazy::new(|| Regex::new(r#"vqd=["']?([\d-]+)["']?"#).unwrap());

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    results: Vec<ImageHit>,
}

#[derive(Debug, Deserialize)]
struct ImageHit {
    image: String,
}

/// Search images or GIFs for a query
#[derive(Debug, Clone)]
pub struct DdgImageSearch {
    settings: DdgImagesConfig,
    http: HttpConfig,
}

impl DdgImageSearch {
    pub fn new(config: &Config) -> Self {
        Self {
            settings: config.ddg_images.clone(),
            http: config.http.clone(),
        }
    }

    /// Value of the `p` query parameter
    fn safesearch_param(&self) -> &'static str {
        match self.settings.safesearch.as_str() {
            "off" => "-1",
            _ => "1",
        }
    }

    async fn search(&self, args: &Arguments) -> Result<CallResult, PluginError> {
        let query = args.require_str("query")?;
        let kind = match args.get_str("type").unwrap_or("photo") {
            "photo" => DirectKind::Photo,
            "gif" => DirectKind::Gif,
            other => {
                return Err(PluginError::invalid(
                    "type",
                    format!("'{}' is not one of photo, gif", other),
                ))
            }
        };
        let count = args.get_i64("count").unwrap_or(1);
        if count < 1 {
            return Err(PluginError::invalid("count", "must be at least 1"));
        }
        let region = args
            .get_str("region")
            .unwrap_or(self.settings.default_region.as_str());

        let client = http_client(&self.http, self.http.timeout)?;
        let base = self.settings.endpoint.trim_end_matches('/');

        let response = client.get(base).query(&[("q", query)]).send().await?;
        let page = ensure_success(response).await?.text().await?;
        let vqd = VQD
            .captures(&page)
            .map(|c| c[1].to_string())
            .ok_or_else(|| PluginError::Network("no search token in response".to_string()))?;

        let filter = format!(",,,type:{},,", kind);
        let response = client
            .get(format!("{}/i.js", base))
            .header("Referer", format!("{}/", base))
            .query(&[
                ("l", region),
                ("o", "json"),
                ("q", query),
                ("vqd", vqd.as_str()),
                ("f", filter.as_str()),
                ("p", self.safesearch_param()),
            ])
            .send()
            .await?;
        let body: ImageResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| PluginError::Network(format!("unexpected response: {}", e)))?;

        let mut images: Vec<String> = body
            .results
            .into_iter()
            .map(|hit| hit.image)
            .take(count as usize)
            .collect();
        debug!("DuckDuckGo returned {} {} results", images.len(), kind);

        if images.is_empty() {
            return Ok(CallResult::structured(json!({ "result": "No results found" })));
        }

        // Avoid always answering with the same image
        images.shuffle(&mut rand::rng());

        Ok(match kind {
            DirectKind::Gif => {
                CallResult::direct(DirectKind::Gif, DirectPayload::Text(images.swap_remove(0)))
            }
            _ => CallResult::direct(
                DirectKind::Album,
                DirectPayload::Sequence(images.into_iter().map(DirectPayload::Text).collect()),
            ),
        })
    }
}

#[async_trait]
impl Capability for DdgImageSearch {
    fn source_name(&self) -> &str {
        "DuckDuckGo Images"
    }

    fn specs(&self) -> Vec<FunctionSpec> {
        vec![FunctionSpec::new(
            "search_images",
            "Search image or GIFs for a given query",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "The query to search for"},
                    "type": {
                        "type": "string",
                        "enum": ["photo", "gif"],
                        "description": "The type of image to search for. \
                                        Default to `photo` if not specified",
                    },
                    "count": {
                        "type": "integer",
                        "description": "The number of images to return. \
                                        Default to 1 if not specified",
                    },
                    "region": {
                        "type": "string",
                        "description": "Region code such as us-en. \
                                        Default to wt-wt if not specified",
                    },
                },
                "required": ["query"],
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
            "search_images" => CallResult::from_outcome(self.search(&args).await),
            other => PluginError::UnknownFunction(other.to_string()).into(),
        }
    }
}
