//! IP address geolocation through the IP.FM API

use super::{ensure_success, http_client};
use crate::config::{Config, HttpConfig};
use crate::error::PluginError;
use crate::plugins::capability::{Capability, HostServices};
use crate::plugins::protocol::{Arguments, CallResult, FunctionSpec};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::net::IpAddr;

#[derive(Debug, Default, Deserialize)]
struct IpFmResponse {
    #[serde(default)]
    data: IpFmData,
}

#[derive(Debug, Default, Deserialize)]
struct IpFmData {
    country: Option<String>,
    subdivisions: Option<String>,
    city: Option<String>,
    asn: Option<serde_json::Value>,
    as_name: Option<String>,
    as_domain: Option<String>,
}

/// Geolocation and network owner of an IP address
#[derive(Debug, Clone)]
pub struct IpLocation {
    endpoint: String,
    http: HttpConfig,
}

impl IpLocation {
    pub fn new(config: &Config) -> Self {
        Self {
            endpoint: config.iplocation.endpoint.clone(),
            http: config.http.clone(),
        }
    }

    async fn locate(&self, args: &Arguments) -> Result<CallResult, PluginError> {
        let raw = args.require_str("ip")?;
        let ip: IpAddr = raw
            .trim()
            .parse()
            .map_err(|_| PluginError::invalid("ip", format!("'{}' is not an IP address", raw)))?;

        let client = http_client(&self.http, self.http.timeout)?;
        let response = client
            .get(&self.endpoint)
            .query(&[("ip", ip.to_string())])
            .send()
            .await?;
        let body: IpFmResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| PluginError::Network(format!("unexpected response: {}", e)))?;

        let data = body.data;
        let location = [&data.country, &data.subdivisions, &data.city]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        let location = if location.is_empty() {
            "None".to_string()
        } else {
            location
        };
        let or_none = |v: Option<String>| {
            v.filter(|s| !s.is_empty())
                .unwrap_or_else(|| "None".to_string())
        };

        Ok(CallResult::structured(json!({
            "Location": location,
            "ASN": data.asn.unwrap_or_else(|| json!("None")),
            "AS Name": or_none(data.as_name),
            "AS Domain": or_none(data.as_domain),
        })))
    }
}

#[async_trait]
impl Capability for IpLocation {
    fn source_name(&self) -> &str {
        "IP.FM"
    }

    fn specs(&self) -> Vec<FunctionSpec> {
        vec![FunctionSpec::new(
            "iplocation",
            "Get information for an IP address using the IP.FM API.",
            json!({
                "type": "object",
                "properties": {"ip": {"type": "string", "description": "IP Address"}},
                "required": ["ip"],
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
            "iplocation" => CallResult::from_outcome(self.locate(&args).await),
            other => PluginError::UnknownFunction(other.to_string()).into(),
        }
    }
}
