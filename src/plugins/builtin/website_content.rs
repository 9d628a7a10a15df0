//! Main text of a web page

use super::{ensure_success, http_client, parse_web_url};
use crate::config::{Config, HttpConfig};
use crate::error::PluginError;
use crate::plugins::capability::{Capability, HostServices};
use crate::plugins::protocol::{Arguments, CallResult, FunctionSpec};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

static TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

/// Elements whose content is never page text
static NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<!--.*?-->|<script\b.*?</script>|<style\b.*?</style>|<noscript\b.*?</noscript>|<svg\b.*?</svg>|<head\b.*?</head>|<nav\b.*?</nav>|<footer\b.*?</footer>",
    )
    .unwrap()
});

/// Preferred content containers, most specific first
static CONTAINERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?is)<article\b[^>]*>(.*)</article>").unwrap(),
        Regex::new(r"(?is)<main\b[^>]*>(.*)</main>").unwrap(),
        Regex::new(r"(?is)<body\b[^>]*>(.*)</body>").unwrap(),
    ]
});

static BLOCK_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(br|/p|/div|/h[1-6]|/li|/tr)\b[^>]*>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\r\f\v]+").unwrap());
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\n\s*").unwrap());

/// Fetch a URL and extract its title and main body text
#[derive(Debug, Clone)]
pub struct WebsiteContent {
    max_chars: usize,
    http: HttpConfig,
}

impl WebsiteContent {
    pub fn new(config: &Config) -> Self {
        Self {
            max_chars: config.website_content.max_chars,
            http: config.http.clone(),
        }
    }

    async fn fetch(&self, args: &Arguments) -> Result<CallResult, PluginError> {
        let url = parse_web_url(args.require_str("url")?)?;
        let client = http_client(&self.http, self.http.timeout)?;

        let response = client.get(url.as_str()).send().await?;
        let html = ensure_success(response).await?.text().await?;
        let page = extract_page(&html, self.max_chars);

        Ok(CallResult::structured(json!({
            "title": page.title,
            "summary": page.text,
            "truncated": page.truncated,
        })))
    }
}

#[async_trait]
impl Capability for WebsiteContent {
    fn source_name(&self) -> &str {
        "Website Content"
    }

    fn specs(&self) -> Vec<FunctionSpec> {
        vec![FunctionSpec::new(
            "website_content",
            "Get and clean up the main body text and title for an URL",
            json!({
                "type": "object",
                "properties": {"url": {"type": "string", "description": "URL address"}},
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
        match function_name {
            "website_content" => CallResult::from_outcome(self.fetch(&args).await),
            other => PluginError::UnknownFunction(other.to_string()).into(),
        }
    }
}

#[derive(Debug, PartialEq)]
struct Page {
    title: String,
    text: String,
    truncated: bool,
}

fn extract_page(html: &str, max_chars: usize) -> Page {
    let title = TITLE
        .captures(html)
        .map(|c| normalize(&decode_entities(&TAG.replace_all(&c[1], ""))))
        .unwrap_or_default();

    let cleaned = NOISE.replace_all(html, " ");
    let body = CONTAINERS
        .iter()
        .find_map(|re| re.captures(&cleaned).map(|c| c[1].to_string()))
        .unwrap_or_else(|| cleaned.to_string());

    let body = BLOCK_BREAK.replace_all(&body, "\n");
    let body = TAG.replace_all(&body, " ");
    let text = normalize(&decode_entities(&body));

    let truncated = text.chars().count() > max_chars;
    let text = if truncated {
        text.chars().take(max_chars).collect()
    } else {
        text
    };

    Page {
        title,
        text,
        truncated,
    }
}

fn normalize(text: &str) -> String {
    let text = SPACES.replace_all(text, " ");
    BLANK_LINES.replace_all(&text, "\n").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
