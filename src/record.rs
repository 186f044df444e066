//! Record codec
//!
//! A record is one line: `key=encoded_value`. Keys never contain the
//! separator, but encoded values may, so a line is split at the first
//! separator only.

/// Field separator between key and encoded value
pub const SEPARATOR: char = '=';

/// Split a line into (key, encoded value) at the first separator.
///
/// Returns `None` for a malformed line with no separator.
pub fn split(line: &str) -> Option<(&str, &str)> {
    line.split_once(SEPARATOR)
}

/// Key portion of a line, if it has one
pub fn key_of(line: &str) -> Option<&str> {
    split(line).map(|(key, _)| key)
}

/// Serialize a record to a newline-terminated line
pub fn join(key: &str, encoded: &str) -> String {
    let mut line = String::with_capacity(key.len() + encoded.len() + 2);
    line.push_str(key);
    line.push(SEPARATOR);
    line.push_str(encoded);
    line.push('\n');
    line
}
