use serde::Serialize;

use crate::error::Result;

/// Render a value as two-space indented JSON.
pub fn pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
