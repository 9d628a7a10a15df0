//! Web search through the Google Custom Search JSON API

use super::{ensure_success, http_client};
use crate::config::{env_secret, Config, HttpConfig};
use crate::error::PluginError;
use crate::plugins::capability::{Capability, HostServices};
use crate::plugins::protocol::{Arguments, CallResult, FunctionSpec};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize, Serialize)]
struct SearchItem {
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
}

/// Search the web for a given query
#[derive(Debug, Clone)]
pub struct GoogleWebSearch {
    endpoint: String,
    api_key: Option<String>,
    cse_id: Option<String>,
    api_key_env: String,
    cse_id_env: String,
    http: HttpConfig,
}

impl GoogleWebSearch {
    /// Credentials are read from the environment once, here
    pub fn new(config: &Config) -> Self {
        let google = &config.google;
        Self {
            endpoint: google.endpoint.clone(),
            api_key: env_secret(&google.api_key_env),
            cse_id: env_secret(&google.cse_id_env),
            api_key_env: google.api_key_env.clone(),
            cse_id_env: google.cse_id_env.clone(),
            http: config.http.clone(),
        }
    }

    pub fn with_credentials(mut self, api_key: &str, cse_id: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self.cse_id = Some(cse_id.to_string());
        self
    }

    async fn search(&self, args: &Arguments) -> Result<CallResult, PluginError> {
        let query = args.require_str("query")?;
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            PluginError::NotConfigured(format!("{} is not set", self.api_key_env))
        })?;
        let cse_id = self.cse_id.as_deref().ok_or_else(|| {
            PluginError::NotConfigured(format!("{} is not set", self.cse_id_env))
        })?;

        let client = http_client(&self.http, self.http.timeout)?;
        let response = client
            .get(&self.endpoint)
            .query(&[("key", api_key), ("cx", cse_id), ("q", query)])
            .send()
            .await?;
        let body: SearchResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| PluginError::Network(format!("unexpected response: {}", e)))?;

        if body.items.is_empty() {
            return Ok(CallResult::structured(json!({
                "result": "No good Google Search Result was found",
            })));
        }

        Ok(CallResult::structured(json!({ "result": body.items })))
    }
}

#[async_trait]
impl Capability for GoogleWebSearch {
    fn source_name(&self) -> &str {
        "Google"
    }

    fn specs(&self) -> Vec<FunctionSpec> {
        vec![FunctionSpec::new(
            "web_search",
            "Execute a web search for the given query and return a list of results",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "the user query"},
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
            "web_search" => CallResult::from_outcome(self.search(&args).await),
            other => PluginError::UnknownFunction(other.to_string()).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::capability::NoHostServices;
    use mockito::Matcher;

    fn plugin_for(endpoint: String) -> GoogleWebSearch {
        let mut config = Config::default();
        config.google.endpoint = endpoint;
        config.google.api_key_env = "CHATPLUG_TEST_UNSET_GOOGLE_KEY".to_string();
        config.google.cse_id_env = "CHATPLUG_TEST_UNSET_GOOGLE_CSE".to_string();
        config.http.timeout = 5;
        GoogleWebSearch::new(&config)
    }

    #[tokio::test]
    async fn test_search_results() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/customsearch/v1")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("key".into(), "k".into()),
                Matcher::UrlEncoded("cx".into(), "c".into()),
                Matcher::UrlEncoded("q".into(), "rust async".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"items": [{"title": "Async Book", "link": "https://rust-lang.github.io/async-book/",
                    "snippet": "Asynchronous Programming in Rust", "kind": "customsearch#result"}]}"#,
            )
            .create_async()
            .await;

        let plugin = plugin_for(format!("{}/customsearch/v1", server.url()))
            .with_credentials("k", "c");
        let args = Arguments::parse(r#"{"query": "rust async"}"#).unwrap();
        let result = plugin.execute("web_search", &NoHostServices, args).await;

        mock.assert_async().await;
        assert_eq!(
            result.to_json(),
            json!({"result": [{
                "snippet": "Asynchronous Programming in Rust",
                "title": "Async Book",
                "link": "https://rust-lang.github.io/async-book/",
            }]})
        );
    }

    #[tokio::test]
    async fn test_no_results() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Any)
            .with_body(r#"{"kind": "customsearch#search"}"#)
            .create_async()
            .await;

        let plugin = plugin_for(server.url()).with_credentials("k", "c");
        let args = Arguments::parse(r#"{"query": "zzzz"}"#).unwrap();
        let result = plugin.execute("web_search", &NoHostServices, args).await;

        assert_eq!(
            result.to_json(),
            json!({"result": "No good Google Search Result was found"})
        );
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let plugin = plugin_for("http://127.0.0.1:9".to_string());
        let args = Arguments::parse(r#"{"query": "rust"}"#).unwrap();
        let result = plugin.execute("web_search", &NoHostServices, args).await;

        let message = result.error_message().unwrap();
        assert!(message.contains("CHATPLUG_TEST_UNSET_GOOGLE_KEY"));
    }
}
