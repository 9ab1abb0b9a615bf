use serde_json::Value;
use std::io::{self, Read};
use tracing::debug;

/// Attempt to read JSON from stdin if data is being piped.
/// Returns None if stdin is a TTY (interactive) or empty.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    debug!(bytes = trimmed.len(), "read JSON input from stdin");
    let value: Value = serde_json::from_str(trimmed)?;
    Ok(Some(value))
}

/// `--input` file first, then piped stdin.
pub fn read_input(path: Option<&str>) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(Some(super::file::read_json_value(p)?)),
        None => read_stdin(),
    }
}
