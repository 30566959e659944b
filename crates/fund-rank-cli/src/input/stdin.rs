use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// A document piped on stdin. `None` for an interactive terminal or blank input.
pub fn read_stdin_document<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    if buffer.trim().is_empty() {
        return Ok(None);
    }

    let doc = serde_json::from_str(buffer.trim())
        .map_err(|e| format!("Failed to parse document on stdin: {}", e))?;
    Ok(Some(doc))
}
