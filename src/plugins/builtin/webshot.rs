//! Website screenshots through thum.io

use super::{ensure_success, http_client, parse_web_url};
use crate::config::{Config, HttpConfig, WebshotConfig};
use crate::error::PluginError;
use crate::plugins::capability::{Capability, HostServices};
use crate::plugins::protocol::{
    Arguments, CallResult, DirectKind, DirectPayload, FunctionSpec,
};
use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

/// Screenshot a website
#[derive(Debug, Clone)]
pub struct Webshot {
    settings: WebshotConfig,
    http: HttpConfig,
}

impl Webshot {
    pub fn new(config: &Config) -> Self {
        Self {
            settings: config.webshot.clone(),
            http: config.http.clone(),
        }
    }

    /// Screenshot service URL for a target site
    fn image_url(&self, target: &url::Url) -> String {
        format!(
            "{}/maxAge/{}/width/{}/{}",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.max_age,
            self.settings.width,
            target
        )
    }

    async fn screenshot(&self, args: &Arguments) -> Result<CallResult, PluginError> {
        let target = parse_web_url(args.require_str("url")?)?;
        let client = http_client(&self.http, self.settings.timeout)?;

        let response = client.get(self.image_url(&target)).send().await?;
        let image = ensure_success(response).await?.bytes().await?;
        if image.is_empty() {
            return Err(PluginError::Network("empty screenshot".to_string()));
        }

        Ok(CallResult::direct(
            DirectKind::Photo,
            DirectPayload::Binary(image.to_vec()),
        ))
    }
}

#[async_trait]
impl Capability for Webshot {
    fn source_name(&self) -> &str {
        "WebShot"
    }

    fn specs(&self) -> Vec<FunctionSpec> {
        vec![FunctionSpec::new(
            "screenshot_website",
            "Show screenshot/image of a website from a given url or domain name.",
            json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Website url or domain name. Correctly formatted url \
                                        is required. Example: https://www.google.com",
                    }
                },
                "required": ["url"],
            }),
        )]
    }

    async fn execute(
        &self,
        function_name: &str,
        _host: &dyn HostServices,
        args: Arguments,
    ) -> CallResult {
        if function_name != "screenshot_website" {
            return PluginError::UnknownFunction(function_name.to_string()).into();
        }

        match self.screenshot(&args).await {
            Ok(result) => result,
            Err(e @ (PluginError::InvalidArgument { .. } | PluginError::MissingArgument(_))) => {
                CallResult::error(e.to_string())
            }
            Err(e) => {
                warn!("Screenshot failed: {}", e);
                CallResult::error(format!("Unable to screenshot website: {}", e))
            }
        }
    }
}
