pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// A typed document from `--input <file>`, else from piped stdin.
pub fn read_document<T: DeserializeOwned>(
    path: &Option<String>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Some(file::read_json(path)?)),
        None => stdin::read_stdin_document(),
    }
}
