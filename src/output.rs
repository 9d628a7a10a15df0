//! Turning call results into terminal output

use crate::plugins::{CallResult, DirectPayload, DirectResult};
use std::fs;
use std::io;
use std::path::Path;

/// What the command line prints for a call result
#[derive(Debug, PartialEq)]
pub enum Rendered {
    /// Printed to stdout
    Stdout(String),
    /// Printed to stderr, exit status 1
    Failure(String),
}

/// Render a call result, writing binary direct payloads to `out` if given
pub fn render(result: &CallResult, out: Option<&Path>) -> io::Result<Rendered> {
    match result {
        CallResult::Structured(_) => Ok(Rendered::Stdout(
            serde_json::to_string_pretty(&result.to_json()).map_err(io::Error::other)?,
        )),
        CallResult::Direct(direct) => render_direct(direct, out).map(Rendered::Stdout),
        CallResult::Error(message) => Ok(Rendered::Failure(message.clone())),
    }
}

fn render_direct(direct: &DirectResult, out: Option<&Path>) -> io::Result<String> {
    match (&direct.payload, out) {
        (DirectPayload::Text(text), _) => Ok(format!("{}: {}", direct.kind, text)),
        (DirectPayload::Sequence(items), _) => Ok(format!(
            "{}: {} items, {} bytes",
            direct.kind,
            items.len(),
            direct.payload.byte_len()
        )),
        (DirectPayload::Binary(bytes), Some(path)) => {
            fs::write(path, bytes)?;
            Ok(format!(
                "{}: {} bytes written to {}",
                direct.kind,
                bytes.len(),
                path.display()
            ))
        }
        (DirectPayload::Binary(bytes), None) => Ok(format!(
            "{}: {} bytes (use --out to save)",
            direct.kind,
            bytes.len()
        )),
    }
}
