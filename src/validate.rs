//! Input validation
//!
//! Runs before any file is touched. Store names must be plain identifiers;
//! keys must fit on a single record line without ambiguity.

use crate::error::{FlatError, Result};
use crate::record::SEPARATOR;
use crate::value::Value;

/// Maximum key length, in characters
pub const MAX_KEY_LENGTH: usize = 1024;

/// Check a store name against `^[A-Za-z0-9_-]+$`
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FlatError::InvalidName {
            name: name.to_string(),
            reason: "name must not be empty".to_string(),
        });
    }

    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(FlatError::InvalidName {
            name: name.to_string(),
            reason: format!("invalid character {:?}", c),
        });
    }

    Ok(())
}

/// Check a key: 1..=MAX_KEY_LENGTH characters, no separator, no line breaks
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(FlatError::invalid_key(key, "key must not be empty"));
    }

    let len = key.chars().count();
    if len > MAX_KEY_LENGTH {
        return Err(FlatError::InvalidKey {
            // Keep the message readable for oversized keys
            key: key.chars().take(32).collect::<String>() + "...",
            reason: format!("maximum key length is {} characters, got {}", MAX_KEY_LENGTH, len),
        });
    }

    if key.contains(SEPARATOR) {
        return Err(FlatError::invalid_key(
            key,
            format!("key may not contain {:?}", SEPARATOR),
        ));
    }

    if key.contains(['\n', '\r']) {
        return Err(FlatError::invalid_key(key, "key may not contain line breaks"));
    }

    Ok(())
}

/// Check a value recursively; non-finite floats cannot round-trip
pub fn validate_value(value: &Value) -> Result<()> {
    match value {
        Value::Str(_) | Value::Int(_) => Ok(()),
        Value::Float(f) if f.is_finite() => Ok(()),
        Value::Float(f) => Err(FlatError::InvalidValue(format!(
            "non-finite float {} cannot be stored",
            f
        ))),
        Value::List(items) => items.iter().try_for_each(validate_value),
        Value::Map(map) => map.values().try_for_each(validate_value),
    }
}
