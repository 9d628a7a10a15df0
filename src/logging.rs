//! Logging setup and log-safe previews
//!
//! Call arguments and upstream error bodies end up in log lines and error
//! messages; they go through [`redact_secrets`] and [`truncate_preview`] first.

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest preview kept in logs and error messages, in characters
const MAX_PREVIEW: usize = 500;

/// Secret patterns for redaction
static SECRET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // key=value and "key": "value" forms
        Regex::new(
            r#"(?i)(api[_-]?key|token|secret|password|passwd|pwd)("?\s*[=:]\s*)['"]?([^'"\s,}]+)['"]?"#,
        )
        .unwrap(),
        Regex::new(r"(?i)bearer\s+[a-zA-Z0-9._-]+").unwrap(),
        Regex::new(r"AKIA[A-Z0-9]{16}").unwrap(),
        Regex::new(r"-----BEGIN\s+(?:RSA\s+)?PRIVATE\s+KEY-----").unwrap(),
        // Google API keys
        Regex::new(r"AIza[0-9A-Za-z_-]{35}").unwrap(),
        Regex::new(r"sk-[A-Za-z0-9_-]{16,}").unwrap(),
    ]
});

/// Initialize the logging/tracing subsystem.
///
/// `debug` forces debug level; otherwise `RUST_LOG` applies, defaulting to
/// `warn`. `json` switches to one JSON object per line.
pub fn init_logging(debug: bool, json: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

/// Redact secrets from text
pub fn redact_secrets(text: &str) -> String {
    let mut result = text.to_string();

    for pattern in SECRET_PATTERNS.iter() {
        result = pattern.replace_all(&result, "[REDACTED]").to_string();
    }

    result
}

/// Truncate text for preview
pub fn truncate_preview(text: &str) -> String {
    match text.char_indices().nth(MAX_PREVIEW) {
        Some((cut, _)) => format!("{}...[truncated]", &text[..cut]),
        None => text.to_string(),
    }
}
