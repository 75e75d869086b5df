//! Relaxed parser for the object literals embedded in the portal's
//! configuration scripts.
//!
//! The grid setup on an indicator page is plain JavaScript, not JSON:
//! keys are unquoted, strings use single quotes, trailing commas are
//! everywhere. A strict JSON parser rejects all of that, so this module
//! implements a small hand-written grammar producing a tagged [`Value`]
//! tree.

use thiserror::Error;

/// A parsed literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<Value>),
    /// Pairs in source order; the page relies on the declaration order of
    /// filters and their values.
    Object(Vec<(String, Value)>),
}

impl Value {
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Object pairs in source order; empty for non-objects.
    pub fn entries(&self) -> &[(String, Value)] {
        match self {
            Value::Object(pairs) => pairs,
            _ => &[],
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Integer view; numeric strings like `"3"` also qualify because the
    /// page quotes ids inconsistently.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// Parse failure with the byte offset it happened at.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at byte {offset}")]
pub struct LiteralError {
    pub message: String,
    pub offset: usize,
}

/// Parse the first balanced `{…}` in `src`, ignoring anything before or
/// after it.
///
/// The fragments cut out of the page script carry prefixes like
/// `filters:` and tails like `});`, so the caller never has to trim them
/// precisely.
pub fn parse_object(src: &str) -> Result<Value, LiteralError> {
    let start = src.find('{').ok_or_else(|| LiteralError {
        message: "no object literal found".into(),
        offset: 0,
    })?;
    let mut parser = Parser {
        src: src.as_bytes(),
        pos: start,
    };
    parser.parse_value()
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

fn is_ident(c: u8) -> bool {
    // >= 0x80 lets bare non-ASCII words through as strings
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$' || c >= 0x80
}

impl Parser<'_> {
    fn err(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            message: message.into(),
            offset: self.pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        loop {
            while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
                self.pos += 1;
            }
            if self.src[self.pos..].starts_with(b"//") {
                while !matches!(self.peek(), None | Some(b'\n')) {
                    self.pos += 1;
                }
            } else if self.src[self.pos..].starts_with(b"/*") {
                self.pos += 2;
                while self.pos < self.src.len() && !self.src[self.pos..].starts_with(b"*/") {
                    self.pos += 1;
                }
                self.pos = (self.pos + 2).min(self.src.len());
            } else {
                return;
            }
        }
    }

    fn expect(&mut self, c: u8) -> Result<(), LiteralError> {
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.err(format!("expected `{}`", c as char)))
        }
    }

    fn parse_value(&mut self) -> Result<Value, LiteralError> {
        self.skip_ws();
        match self.peek() {
            Some(b'{') => self.parse_object_body(),
            Some(b'[') => self.parse_array(),
            Some(b'"') | Some(b'\'') => Ok(Value::Str(self.parse_string()?)),
            Some(c) if c == b'-' || c == b'+' || c == b'.' || c.is_ascii_digit() => {
                self.parse_number()
            }
            Some(c) if is_ident(c) => Ok(self.parse_word()),
            Some(c) => Err(self.err(format!("unexpected `{}`", c as char))),
            None => Err(self.err("unexpected end of input")),
        }
    }

    fn parse_object_body(&mut self) -> Result<Value, LiteralError> {
        self.expect(b'{')?;
        let mut pairs = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                // stray and trailing separators are fine
                Some(b',') => {
                    self.pos += 1;
                }
                None => return Err(self.err("unterminated object")),
                _ => {
                    let key = self.parse_key()?;
                    self.skip_ws();
                    self.expect(b':')?;
                    let value = self.parse_value()?;
                    pairs.push((key, value));
                }
            }
        }
        Ok(Value::Object(pairs))
    }

    fn parse_key(&mut self) -> Result<String, LiteralError> {
        match self.peek() {
            Some(b'"') | Some(b'\'') => self.parse_string(),
            Some(c) if is_ident(c) => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if is_ident(c)) {
                    self.pos += 1;
                }
                Ok(String::from_utf8_lossy(&self.src[start..self.pos]).into_owned())
            }
            _ => Err(self.err("expected object key")),
        }
    }

    fn parse_array(&mut self) -> Result<Value, LiteralError> {
        self.expect(b'[')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                Some(b',') => {
                    self.pos += 1;
                }
                None => return Err(self.err("unterminated array")),
                _ => items.push(self.parse_value()?),
            }
        }
        Ok(Value::Array(items))
    }

    fn parse_string(&mut self) -> Result<String, LiteralError> {
        let quote = self.bump().ok_or_else(|| self.err("expected string"))?;
        let mut bytes: Vec<u8> = Vec::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.err("unterminated string"));
            };
            if c == quote {
                break;
            }
            if c != b'\\' {
                bytes.push(c);
                continue;
            }
            let Some(esc) = self.bump() else {
                return Err(self.err("unterminated escape"));
            };
            match esc {
                b'n' => bytes.push(b'\n'),
                b't' => bytes.push(b'\t'),
                b'r' => bytes.push(b'\r'),
                b'u' => {
                    let ch = self.parse_unicode_escape()?;
                    let mut buf = [0u8; 4];
                    bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                }
                other => bytes.push(other),
            }
        }
        String::from_utf8(bytes).map_err(|_| self.err("string is not valid utf-8"))
    }

    fn parse_unicode_escape(&mut self) -> Result<char, LiteralError> {
        let first = self.hex4()?;
        if (0xD800..0xDC00).contains(&first) {
            // high surrogate, must pair with a following \uXXXX
            if self.src[self.pos..].starts_with(b"\\u") {
                self.pos += 2;
                let second = self.hex4()?;
                if (0xDC00..0xE000).contains(&second) {
                    let combined = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
                    return char::from_u32(combined)
                        .ok_or_else(|| self.err("invalid unicode escape"));
                }
            }
            return Err(self.err("lone surrogate in unicode escape"));
        }
        char::from_u32(first).ok_or_else(|| self.err("invalid unicode escape"))
    }

    fn hex4(&mut self) -> Result<u32, LiteralError> {
        let end = self.pos + 4;
        let digits = self
            .src
            .get(self.pos..end)
            .ok_or_else(|| self.err("truncated unicode escape"))?;
        let digits = std::str::from_utf8(digits).map_err(|_| self.err("invalid unicode escape"))?;
        let code = u32::from_str_radix(digits, 16).map_err(|_| self.err("invalid unicode escape"))?;
        self.pos = end;
        Ok(code)
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'-') | Some(b'+')) {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == b'.' || c == b'e' || c == b'E')
        {
            self.pos += 1;
            if matches!(self.src.get(self.pos - 1), Some(b'e') | Some(b'E'))
                && matches!(self.peek(), Some(b'-') | Some(b'+'))
            {
                self.pos += 1;
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("");
        text.parse::<f64>()
            .map(Value::Number)
            .map_err(|_| LiteralError {
                message: format!("invalid number `{text}`"),
                offset: start,
            })
    }

    fn parse_word(&mut self) -> Value {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_ident(c)) {
            self.pos += 1;
        }
        let word = String::from_utf8_lossy(&self.src[start..self.pos]);
        match word.as_ref() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "null" | "undefined" => Value::Null,
            _ => Value::Str(word.into_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquoted_keys_and_single_quotes() {
        let v = parse_object("{title: 'Регион', order: 3, checked: true}").unwrap();
        assert_eq!(v.get("title").and_then(Value::as_str), Some("Регион"));
        assert_eq!(v.get("order").and_then(Value::as_i64), Some(3));
        assert_eq!(v.get("checked").and_then(Value::as_bool), Some(true));
    }

    #[test]
    fn trailing_commas_and_nesting() {
        let v = parse_object("{a: [1, 2, 3,], b: {c: false,},}").unwrap();
        let a = v.get("a").and_then(Value::as_array).unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(a[2].as_i64(), Some(3));
        assert_eq!(
            v.get("b").and_then(|b| b.get("c")).and_then(Value::as_bool),
            Some(false)
        );
    }

    #[test]
    fn prefix_and_tail_are_ignored() {
        let v = parse_object("filters: {0: {x: 1}},").unwrap();
        assert!(v.get("0").is_some());
        let v = parse_object("{left_columns: [3], groups: []\n});\ngrid.init();").unwrap();
        assert_eq!(v.get("left_columns").and_then(Value::as_array).unwrap().len(), 1);
    }

    #[test]
    fn comments_are_skipped() {
        let v = parse_object("{// line\n a: 1, /* block */ b: 2}").unwrap();
        assert_eq!(v.get("a").and_then(Value::as_i64), Some(1));
        assert_eq!(v.get("b").and_then(Value::as_i64), Some(2));
    }

    #[test]
    fn numbers_and_specials() {
        let v = parse_object("{a: -1.5, b: 2e3, c: null, d: undefined, e: bare}").unwrap();
        assert_eq!(v.get("a").and_then(Value::as_f64), Some(-1.5));
        assert_eq!(v.get("b").and_then(Value::as_f64), Some(2000.0));
        assert_eq!(v.get("c"), Some(&Value::Null));
        assert_eq!(v.get("d"), Some(&Value::Null));
        assert_eq!(v.get("e").and_then(Value::as_str), Some("bare"));
    }

    #[test]
    fn object_preserves_declaration_order() {
        let v = parse_object("{30611: 1, 0: 2, 3: 3}").unwrap();
        let keys: Vec<&str> = v.entries().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["30611", "0", "3"]);
    }

    #[test]
    fn escapes() {
        let v = parse_object(r#"{a: 'it\'s', b: "Ж"}"#).unwrap();
        assert_eq!(v.get("a").and_then(Value::as_str), Some("it's"));
        assert_eq!(v.get("b").and_then(Value::as_str), Some("Ж"));
    }

    #[test]
    fn malformed_input_reports_offset() {
        let err = parse_object("{a: }").unwrap_err();
        assert!(err.offset > 0);
        assert!(parse_object("no braces here").is_err());
        assert!(parse_object("{a: 1").is_err());
    }
}
