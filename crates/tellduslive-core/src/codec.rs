//! TellStick Net packet codec.
//!
//! TellStick Net gateways speak a small length-prefixed text format over UDP:
//!
//! | Value | Encoding | Example |
//! |-------|----------|---------|
//! | string | `<HEXLEN>:<bytes>` | `5:hello` |
//! | integer | `i<hex>s` | `i2as` (42), `i-2as` (-42) |
//! | dictionary | `h<key><value>...s`, keys sorted | `h3:fooi1ss` |
//!
//! A packet is a command string optionally followed by one dictionary of
//! arguments. Lists are not supported.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::CodecError;

const TAG_INTEGER: u8 = b'i';
const TAG_DICT: u8 = b'h';
const TAG_LIST: u8 = b'l';
const TAG_END: u8 = b's';
const TAG_SEP: u8 = b':';

/// A value in a TellStick Net packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Str(String),
    /// Dictionary. `BTreeMap` keeps the keys in the sorted wire order.
    Dict(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Append the wire encoding of this value to `out`.
    pub fn encode_into(&self, out: &mut String) {
        match self {
            Value::Int(i) if *i < 0 => {
                out.push_str(&format!("i-{:x}s", i.unsigned_abs()));
            }
            Value::Int(i) => out.push_str(&format!("i{:x}s", i)),
            Value::Str(s) => {
                out.push_str(&format!("{:X}:", s.len()));
                out.push_str(s);
            }
            Value::Dict(d) => {
                out.push(TAG_DICT as char);
                for (key, value) in d {
                    Value::Str(key.clone()).encode_into(out);
                    value.encode_into(out);
                }
                out.push(TAG_END as char);
            }
        }
    }

    /// The wire encoding of this value.
    ///
    /// ```
    /// use tellduslive_core::codec::Value;
    ///
    /// assert_eq!(Value::from("hellothere").encode(), "A:hellothere");
    /// assert_eq!(Value::Int(-42).encode(), "i-2as");
    /// ```
    pub fn encode(&self) -> String {
        let mut out = String::new();
        self.encode_into(&mut out);
        out
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(d: BTreeMap<String, Value>) -> Self {
        Value::Dict(d)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "{}", s),
            Value::Dict(d) => {
                write!(f, "{{")?;
                for (n, (k, v)) in d.iter().enumerate() {
                    if n > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// A decoded packet: a command and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub command: String,
    pub args: BTreeMap<String, Value>,
}

impl Packet {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        encode_packet(&self.command, &self.args)
    }
}

/// Encode a command and its arguments.
///
/// The argument dictionary is omitted when empty.
///
/// ```
/// use std::collections::BTreeMap;
/// use tellduslive_core::codec::{encode_packet, Value};
///
/// let mut args = BTreeMap::new();
/// args.insert("foo".to_string(), Value::from("x"));
/// assert_eq!(encode_packet("hello", &args), b"5:helloh3:foo1:xs");
/// assert_eq!(encode_packet("reglistener", &BTreeMap::new()), b"B:reglistener");
/// ```
pub fn encode_packet(command: &str, args: &BTreeMap<String, Value>) -> Vec<u8> {
    let mut out = Value::from(command).encode();
    if !args.is_empty() {
        Value::Dict(args.clone()).encode_into(&mut out);
    }
    out.into_bytes()
}

/// Decode a packet consisting of a command string followed by exactly one
/// dictionary.
pub fn decode_packet(bytes: &[u8]) -> Result<Packet, CodecError> {
    let mut decoder = Decoder::new(bytes);
    let command = decoder.string()?;
    let args = decoder.dict()?;
    if decoder.remaining() > 0 {
        return Err(CodecError::TrailingBytes(decoder.remaining()));
    }
    Ok(Packet { command, args })
}

/// Decode a single value, returning it and the number of bytes consumed.
pub fn decode_value(bytes: &[u8]) -> Result<(Value, usize), CodecError> {
    let mut decoder = Decoder::new(bytes);
    let value = decoder.any()?;
    Ok((value, decoder.pos))
}

struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn peek(&self) -> Result<u8, CodecError> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or(CodecError::UnexpectedEnd)
    }

    fn expect(&mut self, tag: u8) -> Result<(), CodecError> {
        let b = self.peek()?;
        if b != tag {
            return Err(CodecError::UnexpectedByte(b as char, self.pos));
        }
        self.pos += 1;
        Ok(())
    }

    /// Bytes up to (not including) `tag`, consuming the tag.
    fn until(&mut self, tag: u8) -> Result<&'a [u8], CodecError> {
        let rest = &self.buf[self.pos..];
        let end = rest
            .iter()
            .position(|b| *b == tag)
            .ok_or(CodecError::UnexpectedEnd)?;
        self.pos += end + 1;
        Ok(&rest[..end])
    }

    fn any(&mut self) -> Result<Value, CodecError> {
        match self.peek()? {
            TAG_INTEGER => self.int().map(Value::Int),
            TAG_DICT => self.dict().map(Value::Dict),
            TAG_LIST => Err(CodecError::UnexpectedByte(TAG_LIST as char, self.pos)),
            _ => self.string().map(Value::Str),
        }
    }

    fn string(&mut self) -> Result<String, CodecError> {
        let start = self.pos;
        let first = self.peek()?;
        if !first.is_ascii_hexdigit() {
            return Err(CodecError::UnexpectedByte(first as char, start));
        }
        let len = self.until(TAG_SEP)?;
        let len = std::str::from_utf8(len).map_err(|_| CodecError::InvalidUtf8)?;
        let len = usize::from_str_radix(len, 16)
            .map_err(|_| CodecError::InvalidNumber(len.to_string()))?;
        if len > self.remaining() {
            return Err(CodecError::UnexpectedEnd);
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }

    fn int(&mut self) -> Result<i64, CodecError> {
        self.expect(TAG_INTEGER)?;
        let digits = self.until(TAG_END)?;
        let digits = std::str::from_utf8(digits).map_err(|_| CodecError::InvalidUtf8)?;
        // "-0..." is never valid, leading zeros otherwise are tolerated.
        if digits.is_empty() || digits.starts_with("-0") {
            return Err(CodecError::InvalidNumber(digits.to_string()));
        }
        i64::from_str_radix(digits, 16).map_err(|_| CodecError::InvalidNumber(digits.to_string()))
    }

    fn dict(&mut self) -> Result<BTreeMap<String, Value>, CodecError> {
        self.expect(TAG_DICT)?;
        let mut dict = BTreeMap::new();
        while self.peek()? != TAG_END {
            if matches!(self.peek()?, TAG_INTEGER | TAG_DICT | TAG_LIST) {
                return Err(CodecError::NonStringKey);
            }
            let key = self.string()?;
            let value = self.any()?;
            dict.insert(key, value);
        }
        self.pos += 1;
        Ok(dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(s: &str) -> Result<Value, CodecError> {
        decode_value(s.as_bytes()).map(|(v, _)| v)
    }

    // ==========================================================================
    // Encoding
    // ==========================================================================

    #[test]
    fn test_encode_strings() {
        assert_eq!(Value::from("hello").encode(), "5:hello");
        assert_eq!(Value::from("hellothere").encode(), "A:hellothere");
        assert_eq!(Value::from("").encode(), "0:");
    }

    #[test]
    fn test_encode_integers() {
        assert_eq!(Value::Int(42).encode(), "i2as");
        assert_eq!(Value::Int(-42).encode(), "i-2as");
        assert_eq!(Value::Int(0).encode(), "i0s");
    }

    #[test]
    fn test_encode_dict_sorts_keys() {
        let mut d = BTreeMap::new();
        d.insert("foo".to_string(), Value::from("bar"));
        d.insert("baz".to_string(), Value::Int(42));
        assert_eq!(Value::Dict(d).encode(), "h3:bazi2as3:foo3:bars");
        assert_eq!(Value::Dict(BTreeMap::new()).encode(), "hs");
    }

    #[test]
    fn test_encode_nested_packet() {
        let mut data = BTreeMap::new();
        data.insert("number".to_string(), Value::Int(7));
        let packet = Packet::new("hello").with_arg("data", Value::Dict(data));
        assert_eq!(packet.encode(), b"5:helloh4:datah6:numberi7sss");
    }

    // ==========================================================================
    // Decoding
    // ==========================================================================

    #[test]
    fn test_decode_string() {
        assert_eq!(decode("5:hello"), Ok(Value::from("hello")));
        assert_eq!(decode("5:hell"), Err(CodecError::UnexpectedEnd));
        assert!(decode("hello").is_err());
    }

    #[test]
    fn test_decode_integers() {
        assert_eq!(decode("i4711s"), Ok(Value::Int(18193)));
        assert_eq!(decode("i0s"), Ok(Value::Int(0)));
        assert_eq!(decode("i-3s"), Ok(Value::Int(-3)));
        assert_eq!(decode("i03s"), Ok(Value::Int(3)));
        assert_eq!(decode("i0000000000s"), Ok(Value::Int(0)));
    }

    #[test]
    fn test_decode_negative_zero_rejected() {
        assert!(matches!(decode("i-0s"), Err(CodecError::InvalidNumber(_))));
        assert!(matches!(decode("is"), Err(CodecError::InvalidNumber(_))));
    }

    #[test]
    fn test_decode_dict() {
        let value = decode("h3:foo3:bars").unwrap();
        assert_eq!(value.as_dict().unwrap()["foo"], Value::from("bar"));
    }

    #[test]
    fn test_decode_lists_unsupported() {
        assert!(matches!(decode("li1ss"), Err(CodecError::UnexpectedByte('l', 0))));
    }

    #[test]
    fn test_decode_packet() {
        let raw = b"7:RawDatah5:class6:sensor8:protocolA:fineoffset4:datai488029FF9Ass";
        let packet = decode_packet(raw).unwrap();
        assert_eq!(packet.command, "RawData");
        assert_eq!(packet.args["class"].as_str(), Some("sensor"));
        assert_eq!(packet.args["protocol"].as_str(), Some("fineoffset"));
        assert_eq!(packet.args["data"].as_int(), Some(0x488029FF9A));
    }

    #[test]
    fn test_decode_packet_trailing_bytes() {
        let result = decode_packet(b"4:pinghsxx");
        assert_eq!(result, Err(CodecError::TrailingBytes(2)));
    }

    #[test]
    fn test_decode_packet_requires_dict() {
        assert!(decode_packet(b"4:ping").is_err());
        assert!(decode_packet(b"4:pingi1s").is_err());
    }

    #[test]
    fn test_decode_packet_roundtrip() {
        let packet = Packet::new("send")
            .with_arg("protocol", "arctech")
            .with_arg("house", 12345i64)
            .with_arg("unit", 3i64);
        assert_eq!(decode_packet(&packet.encode()), Ok(packet));
    }
}
