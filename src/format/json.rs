//! JSON formatter
//!
//! JSON escapes control characters inside string literals, so no separate
//! line-preservation pass is needed. Maps encode as objects and lists as
//! arrays, so both container kinds are supported.

use crate::error::{FlatError, Result};
use crate::value::Value;

use super::Formatter;

const NAME: &str = "json";

/// Plain-text strategy backed by `serde_json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn encode(&self, value: &Value) -> Result<String> {
        serde_json::to_string(value).map_err(|e| FlatError::encoding(NAME, e.to_string()))
    }

    fn decode(&self, data: &str) -> Result<Value> {
        serde_json::from_str(data).map_err(|e| FlatError::encoding(NAME, e.to_string()))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
