//! Strict-mode validation: detect document keys the config never consumes.
//!
//! Uses `serde_ignored` while deserializing the merged tree into `C`. The
//! tree starts from `C`'s own serialization, so every ignored path came from
//! the document.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ConfError;

/// Deserialize `tree` into `C`, reporting ignored keys as
/// [`ConfError::UnknownKeys`] when `strict` is set.
pub fn deserialize_checked<C: DeserializeOwned>(
    tree: Value,
    origin: &str,
    strict: bool,
) -> Result<C, ConfError> {
    let mut unknown_keys: Vec<String> = Vec::new();

    let parsed: C = serde_ignored::deserialize(tree, |ignored_path| {
        unknown_keys.push(ignored_path.to_string());
    })
    .map_err(|e| ConfError::Document {
        origin: origin.to_string(),
        reason: e.to_string(),
    })?;

    if strict && !unknown_keys.is_empty() {
        unknown_keys.sort();
        return Err(ConfError::UnknownKeys {
            origin: origin.to_string(),
            keys: unknown_keys,
        });
    }
    Ok(parsed)
}
