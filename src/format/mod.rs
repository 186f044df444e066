//! Formatter Module
//!
//! Turns a [`Value`] into a line-safe string and back.
//!
//! ## Strategies
//! - [`SerializeFormatter`] (default): length-prefixed, self-describing text.
//!   Line breaks inside strings are escaped before serializing and restored
//!   after parsing.
//! - [`JsonFormatter`]: plain JSON, which already escapes line breaks inside
//!   string literals.
//!
//! Both guarantee `decode(encode(v)) == v` for every value accepted by
//! [`validate_value`](crate::validate::validate_value), and neither ever
//! emits a raw `\n` or `\r`.

mod json;
mod serialize;

use std::fmt::Debug;

use crate::error::Result;
use crate::value::Value;

pub use json::JsonFormatter;
pub use serialize::SerializeFormatter;

/// Pluggable encode/decode strategy
pub trait Formatter: Debug + Send + Sync {
    /// Encode a value to a single-line string
    fn encode(&self, value: &Value) -> Result<String>;

    /// Decode a string produced by `encode`
    fn decode(&self, data: &str) -> Result<Value>;

    /// Short name used in error messages
    fn name(&self) -> &'static str;
}
