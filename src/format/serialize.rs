//! Length-prefixed serialization
//!
//! ## Grammar
//! ```text
//! value  := string | int | float | list | map
//! string := "s:" <byte len> ":\"" <bytes> "\";"
//! int    := "i:" <decimal> ";"
//! float  := "d:" <float> ";"
//! list   := "a:" <count> ":{" value* "}"
//! map    := "m:" <count> ":{" (string value)* "}"
//! ```
//!
//! String lengths are byte counts, so string content is taken verbatim and
//! may contain any character. Line breaks are escaped before serializing
//! (`\` → `\\`, LF → `\n`, CR → `\r`) and restored after parsing, on every
//! string node including map keys.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::{FlatError, Result};
use crate::value::Value;

use super::Formatter;

const NAME: &str = "serialize";

/// Default formatter: self-describing, length-prefixed text
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializeFormatter;

impl Formatter for SerializeFormatter {
    fn encode(&self, value: &Value) -> Result<String> {
        let escaped = preserve_lines(value, Direction::Escape)?;
        let mut out = String::new();
        write_value(&escaped, &mut out);
        Ok(out)
    }

    fn decode(&self, data: &str) -> Result<Value> {
        let mut parser = Parser { input: data, pos: 0 };
        let value = parser.value()?;
        if parser.pos != data.len() {
            return Err(parser.error("trailing data after value"));
        }
        preserve_lines(&value, Direction::Unescape)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

// =============================================================================
// Line preservation
// =============================================================================

#[derive(Clone, Copy)]
enum Direction {
    Escape,
    Unescape,
}

fn preserve_lines(value: &Value, dir: Direction) -> Result<Value> {
    Ok(match value {
        Value::Str(s) => Value::Str(transform(s, dir)?),
        Value::Int(_) | Value::Float(_) => value.clone(),
        Value::List(items) => Value::List(
            items
                .iter()
                .map(|v| preserve_lines(v, dir))
                .collect::<Result<_>>()?,
        ),
        Value::Map(map) => Value::Map(
            map.iter()
                .map(|(k, v)| Ok((transform(k, dir)?, preserve_lines(v, dir)?)))
                .collect::<Result<BTreeMap<_, _>>>()?,
        ),
    })
}

fn transform(s: &str, dir: Direction) -> Result<String> {
    match dir {
        Direction::Escape => Ok(escape(s)),
        Direction::Unescape => unescape(s),
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(s: &str) -> Result<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                return Err(FlatError::encoding(
                    NAME,
                    format!("unknown escape sequence \\{}", other),
                ))
            }
            None => return Err(FlatError::encoding(NAME, "dangling escape at end of string")),
        }
    }
    Ok(out)
}

// =============================================================================
// Writer
// =============================================================================

fn write_value(value: &Value, out: &mut String) {
    // Writing into a String cannot fail
    match value {
        Value::Str(s) => write_str(s, out),
        Value::Int(n) => {
            let _ = write!(out, "i:{};", n);
        }
        Value::Float(f) => {
            // Debug keeps a fractional part or exponent and round-trips exactly
            let _ = write!(out, "d:{:?};", f);
        }
        Value::List(items) => {
            let _ = write!(out, "a:{}:{{", items.len());
            for item in items {
                write_value(item, out);
            }
            out.push('}');
        }
        Value::Map(map) => {
            let _ = write!(out, "m:{}:{{", map.len());
            for (k, v) in map {
                write_str(k, out);
                write_value(v, out);
            }
            out.push('}');
        }
    }
}

fn write_str(s: &str, out: &mut String) {
    let _ = write!(out, "s:{}:\"{}\";", s.len(), s);
}

// =============================================================================
// Parser
// =============================================================================

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn value(&mut self) -> Result<Value> {
        let tag = self.next_byte()?;
        self.expect(b':')?;
        match tag {
            b's' => self.string_body().map(Value::Str),
            b'i' => {
                let digits = self.until(b';')?;
                digits
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|e| self.error(&format!("bad integer {:?}: {}", digits, e)))
            }
            b'd' => {
                let digits = self.until(b';')?;
                digits
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|e| self.error(&format!("bad float {:?}: {}", digits, e)))
            }
            b'a' => {
                let count = self.count()?;
                let mut items = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    items.push(self.value()?);
                }
                self.expect(b'}')?;
                Ok(Value::List(items))
            }
            b'm' => {
                let count = self.count()?;
                let mut map = BTreeMap::new();
                for _ in 0..count {
                    if self.next_byte()? != b's' {
                        return Err(self.error("map key must be a string"));
                    }
                    self.expect(b':')?;
                    let key = self.string_body()?;
                    let value = self.value()?;
                    map.insert(key, value);
                }
                self.expect(b'}')?;
                Ok(Value::Map(map))
            }
            other => Err(self.error(&format!("unknown type tag {:?}", other as char))),
        }
    }

    /// `<len>:"<bytes>";` after the `s:` prefix
    fn string_body(&mut self) -> Result<String> {
        let len_text = self.until(b':')?;
        let len: usize = len_text
            .parse()
            .map_err(|_| self.error(&format!("bad string length {:?}", len_text)))?;
        self.expect(b'"')?;

        let end = self
            .pos
            .checked_add(len)
            .ok_or_else(|| self.error("string length overflow"))?;
        let input = self.input;
        let content = input
            .get(self.pos..end)
            .ok_or_else(|| self.error("string length out of bounds"))?;
        self.pos = end;

        self.expect(b'"')?;
        self.expect(b';')?;
        Ok(content.to_string())
    }

    /// `<count>:{` after a container tag
    fn count(&mut self) -> Result<usize> {
        let text = self.until(b':')?;
        let count = text
            .parse()
            .map_err(|_| self.error(&format!("bad element count {:?}", text)))?;
        self.expect(b'{')?;
        Ok(count)
    }

    /// Text up to (not including) `delim`; consumes the delimiter
    fn until(&mut self, delim: u8) -> Result<&'a str> {
        let input = self.input;
        let offset = input.as_bytes()[self.pos..]
            .iter()
            .position(|&b| b == delim)
            .ok_or_else(|| self.error(&format!("expected {:?}", delim as char)))?;
        let text = &input[self.pos..self.pos + offset];
        self.pos += offset + 1;
        Ok(text)
    }

    fn next_byte(&mut self) -> Result<u8> {
        let byte = *self
            .input
            .as_bytes()
            .get(self.pos)
            .ok_or_else(|| self.error("unexpected end of input"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        let found = self.next_byte()?;
        if found != expected {
            return Err(self.error(&format!(
                "expected {:?}, found {:?}",
                expected as char, found as char
            )));
        }
        Ok(())
    }

    fn error(&self, message: &str) -> FlatError {
        FlatError::encoding(NAME, format!("{} at offset {}", message, self.pos))
    }
}
