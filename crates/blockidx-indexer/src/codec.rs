//! Index key codec
//!
//! Every index entry is a single key with an empty value:
//!
//! ```text
//! field ++ 00 01 | tag | value | height (8 bytes) | sequence (8 bytes)
//! ```
//!
//! Variable-length segments (the field and text values) escape each `0x00`
//! byte as `00 FF` and end with the terminator `00 01`. The terminator sorts
//! below any escaped byte and any content byte, so a segment that is a
//! prefix of another sorts first, exactly as raw byte order would.
//!
//! Integers (numeric values and the height) are written big-endian with the
//! sign bit flipped, which makes their byte order match numeric order.

use std::borrow::Cow;

use blockidx_core::ValueKind;
use thiserror::Error;

/// Flip the sign bit so that negative values sort before positive ones
const SIGN_FLIP: u64 = 1 << 63;

const ESCAPE: u8 = 0x00;
const ESCAPED_NUL: u8 = 0xFF;
const TERMINATOR: u8 = 0x01;

/// Width of the height and sequence suffix every key ends with
pub const SUFFIX_LEN: usize = 16;

/// Errors decoding a stored key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("Key truncated")]
    Truncated,

    #[error("Unterminated key segment")]
    UnterminatedSegment,

    #[error("Invalid escape byte 0x{0:02x}")]
    InvalidEscape(u8),

    #[error("Unknown type tag 0x{0:02x}")]
    UnknownTypeTag(u8),

    #[error("{0} trailing bytes after key")]
    TrailingBytes(usize),

    #[error("Key segment is not valid UTF-8")]
    InvalidUtf8,
}

/// Type tag stored between the field and the value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeTag {
    Numeric = 0x01,
    Text = 0x02,
}

impl TypeTag {
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Result<Self, KeyError> {
        match byte {
            0x01 => Ok(Self::Numeric),
            0x02 => Ok(Self::Text),
            other => Err(KeyError::UnknownTypeTag(other)),
        }
    }
}

/// A classified value as it appears in a key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Numeric(i64),
    Text(String),
}

impl KeyValue {
    /// Classify a raw attribute value or operand
    pub fn classify(raw: &str) -> Self {
        match ValueKind::classify(raw) {
            ValueKind::Numeric(n) => Self::Numeric(n),
            ValueKind::Text => Self::Text(raw.to_string()),
        }
    }

    pub fn tag(&self) -> TypeTag {
        match self {
            Self::Numeric(_) => TypeTag::Numeric,
            Self::Text(_) => TypeTag::Text,
        }
    }

    /// Textual form used for substring matching
    ///
    /// Numeric values are rendered in canonical decimal form.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Numeric(n) => Cow::Owned(n.to_string()),
            Self::Text(s) => Cow::Borrowed(s),
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.tag().as_byte());
        match self {
            Self::Numeric(n) => out.extend_from_slice(&encode_i64_ordered(*n)),
            Self::Text(s) => encode_segment(out, s.as_bytes()),
        }
    }
}

/// One decoded index entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexKey {
    /// Composite field name
    pub field: String,
    pub value: KeyValue,
    pub height: i64,
    /// Per-block sequence; 0 is the height entry itself
    pub sequence: u64,
}

impl IndexKey {
    pub fn new(field: impl Into<String>, value: KeyValue, height: i64, sequence: u64) -> Self {
        Self {
            field: field.into(),
            value,
            height,
            sequence,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = value_prefix(&self.field, &self.value);
        out.extend_from_slice(&encode_i64_ordered(self.height));
        out.extend_from_slice(&self.sequence.to_be_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, KeyError> {
        let mut reader = Reader::new(bytes);

        let field = into_string(reader.segment()?)?;
        let value = match TypeTag::from_byte(reader.byte()?)? {
            TypeTag::Numeric => KeyValue::Numeric(decode_i64_ordered(reader.fixed()?)),
            TypeTag::Text => KeyValue::Text(into_string(reader.segment()?)?),
        };
        let height = decode_i64_ordered(reader.fixed()?);
        let sequence = u64::from_be_bytes(reader.fixed()?);

        match reader.remaining() {
            0 => Ok(Self {
                field,
                value,
                height,
                sequence,
            }),
            n => Err(KeyError::TrailingBytes(n)),
        }
    }
}

/// Prefix shared by every entry of `field`, across both type tags
pub fn field_prefix(field: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(field.len() + 2);
    encode_segment(&mut out, field.as_bytes());
    out
}

/// Prefix shared by every entry of `field` with type tag `tag`
pub fn tag_prefix(field: &str, tag: TypeTag) -> Vec<u8> {
    let mut out = field_prefix(field);
    out.push(tag.as_byte());
    out
}

/// Prefix shared by every entry of `field` holding exactly `value`
pub fn value_prefix(field: &str, value: &KeyValue) -> Vec<u8> {
    let mut out = field_prefix(field);
    value.encode_into(&mut out);
    out
}

/// Key greater than or equal to every entry under `prefix` that has the
/// height and sequence suffix directly after it
///
/// Used as an inclusive upper bound for "all heights of this value".
pub fn with_max_suffix(prefix: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + SUFFIX_LEN);
    out.extend_from_slice(prefix);
    out.extend_from_slice(&[u8::MAX; SUFFIX_LEN]);
    out
}

/// Order-preserving big-endian encoding of a signed integer
pub fn encode_i64_ordered(value: i64) -> [u8; 8] {
    ((value as u64) ^ SIGN_FLIP).to_be_bytes()
}

pub fn decode_i64_ordered(bytes: [u8; 8]) -> i64 {
    (u64::from_be_bytes(bytes) ^ SIGN_FLIP) as i64
}

fn encode_segment(out: &mut Vec<u8>, bytes: &[u8]) {
    for &b in bytes {
        if b == ESCAPE {
            out.extend_from_slice(&[ESCAPE, ESCAPED_NUL]);
        } else {
            out.push(b);
        }
    }
    out.extend_from_slice(&[ESCAPE, TERMINATOR]);
}

fn into_string(bytes: Vec<u8>) -> Result<String, KeyError> {
    String::from_utf8(bytes).map_err(|_| KeyError::InvalidUtf8)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn byte(&mut self) -> Result<u8, KeyError> {
        let b = *self.bytes.get(self.pos).ok_or(KeyError::Truncated)?;
        self.pos += 1;
        Ok(b)
    }

    fn fixed(&mut self) -> Result<[u8; 8], KeyError> {
        let end = self.pos + 8;
        let slice = self.bytes.get(self.pos..end).ok_or(KeyError::Truncated)?;
        let mut out = [0u8; 8];
        out.copy_from_slice(slice);
        self.pos = end;
        Ok(out)
    }

    fn segment(&mut self) -> Result<Vec<u8>, KeyError> {
        let mut out = Vec::new();
        loop {
            let b = *self
                .bytes
                .get(self.pos)
                .ok_or(KeyError::UnterminatedSegment)?;
            if b != ESCAPE {
                out.push(b);
                self.pos += 1;
                continue;
            }

            let next = *self
                .bytes
                .get(self.pos + 1)
                .ok_or(KeyError::UnterminatedSegment)?;
            self.pos += 2;
            match next {
                ESCAPED_NUL => out.push(ESCAPE),
                TERMINATOR => return Ok(out),
                other => return Err(KeyError::InvalidEscape(other)),
            }
        }
    }
}
