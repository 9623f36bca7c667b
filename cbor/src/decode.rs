use super::bignum;
use super::decode_seq::Items;
use super::float16;
use super::seq::{pairs, take};
use super::value::{Integer, Map, Record, Value};
use num_bigint::BigInt;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, trace};
use url::Url;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Not enough data for encoded value")]
    NotEnoughData,

    #[error("Unimplemented or reserved header byte {0:#04x}")]
    Unimplemented(u8),

    #[error("Unsupported simple value {0}")]
    UnsupportedSimpleValue(u8),

    #[error("Break outside an indefinite-length item")]
    UnexpectedBreak,

    #[error("Indefinite-length map has a key with no value")]
    PartialMap,

    #[error("Chunked string contains an invalid chunk")]
    InvalidChunk,

    #[error("Invalid UTF-8 in text string: {0}")]
    InvalidUtf8(#[from] core::str::Utf8Error),

    #[error("Declared length {0} exceeds the input size")]
    LengthOutOfRange(u64),

    #[error("Maximum recursion depth reached")]
    MaxRecursion,

    #[error("Tag {tag} requires a {expected}, found {found}")]
    IncorrectType {
        tag: u64,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{feature} (tag {tag}) is not supported")]
    NotSupported { tag: u64, feature: &'static str },

    #[error("Invalid date/time: {0}")]
    InvalidDate(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Record field name must be a text string, found {0}")]
    InvalidRecordKey(&'static str),
}

/// A single decoded header: a complete item, or the break marker that ends an
/// indefinite-length container.
pub(crate) enum Item {
    Value(Value),
    Break,
}

/// A cursor over a buffer of zero or more encoded items.
///
/// Iterating a `Decoder` yields each top-level item in turn (an RFC 8742 CBOR sequence) and
/// stops after the first error.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    data: &'a [u8],
    offset: usize,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    pub const DEFAULT_MAX_DEPTH: usize = 128;

    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit the nesting of arrays, maps, tags and embedded items.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_exhausted(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Decode the item at the cursor. On failure the cursor is left where it was.
    pub fn decode_value(&mut self) -> Result<Value, Error> {
        let start = self.offset;
        self.parse_value(0).inspect_err(|_| self.offset = start)
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    fn read_u8(&mut self) -> Result<u8, Error> {
        let b = self.peek().ok_or(Error::NotEnoughData)?;
        self.offset += 1;
        Ok(b)
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], Error> {
        if len > self.remaining() {
            return Err(Error::NotEnoughData);
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        self.read_slice(N)?
            .try_into()
            .map_err(|_| Error::NotEnoughData)
    }

    fn read_uint_minor(&mut self, header: u8) -> Result<u64, Error> {
        match header & 0x1F {
            minor @ 0..=23 => Ok(minor as u64),
            24 => self.read_u8().map(u64::from),
            25 => self.read_array().map(u16::from_be_bytes).map(u64::from),
            26 => self.read_array().map(u32::from_be_bytes).map(u64::from),
            27 => self.read_array().map(u64::from_be_bytes),
            _ => Err(Error::Unimplemented(header)),
        }
    }

    fn read_length(&mut self, header: u8) -> Result<usize, Error> {
        let len = self.read_uint_minor(header)?;
        // A length the whole input could never hold is out of range, not truncated
        match usize::try_from(len) {
            Ok(n) if n <= self.data.len() => Ok(n),
            _ => Err(Error::LengthOutOfRange(len)),
        }
    }

    fn nested(&self, depth: usize) -> Result<usize, Error> {
        if depth >= self.max_depth {
            debug!("Nesting exceeds {} levels at offset {}", self.max_depth, self.offset);
            Err(Error::MaxRecursion)
        } else {
            Ok(depth + 1)
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, Error> {
        match self.parse_item(depth)? {
            Item::Value(value) => Ok(value),
            Item::Break => Err(Error::UnexpectedBreak),
        }
    }

    pub(crate) fn parse_item(&mut self, depth: usize) -> Result<Item, Error> {
        let header = self.read_u8()?;
        let value = match header {
            0x00..=0x1b => Value::Integer(Integer::from_unsigned(self.read_uint_minor(header)?)),
            0x20..=0x3b => Value::Integer(Integer::from_negative(self.read_uint_minor(header)?)),
            0x40..=0x5b => {
                let len = self.read_length(header)?;
                Value::Bytes(self.read_slice(len)?.to_vec())
            }
            0x5f => {
                let mut bytes = Vec::new();
                let depth = self.nested(depth)?;
                for chunk in Items::chunks(self, 2, depth) {
                    match chunk? {
                        Value::Bytes(b) => bytes.extend_from_slice(&b),
                        _ => return Err(Error::InvalidChunk),
                    }
                }
                Value::Bytes(bytes)
            }
            0x60..=0x7b => {
                let len = self.read_length(header)?;
                Value::Text(core::str::from_utf8(self.read_slice(len)?)?.to_string())
            }
            0x7f => {
                let mut text = String::new();
                let depth = self.nested(depth)?;
                for chunk in Items::chunks(self, 3, depth) {
                    match chunk? {
                        Value::Text(s) => text.push_str(&s),
                        _ => return Err(Error::InvalidChunk),
                    }
                }
                Value::Text(text)
            }
            0x80..=0x9b => {
                let count = self.read_length(header)?;
                Value::Array(self.parse_array(Some(count), depth)?)
            }
            0x9f => Value::Array(self.parse_array(None, depth)?),
            0xa0..=0xbb => {
                let count = self.read_length(header)?;
                Value::Map(self.parse_map(Some(count), depth)?)
            }
            0xbf => Value::Map(self.parse_map(None, depth)?),
            0xc0..=0xdb => {
                let tag = self.read_uint_minor(header)?;
                let depth = self.nested(depth)?;
                let item = self.parse_value(depth)?;
                self.apply_tag(tag, item, depth)?
            }
            0xe0..=0xf3 => return Err(Error::UnsupportedSimpleValue(header & 0x1F)),
            0xf4 => Value::Bool(false),
            0xf5 => Value::Bool(true),
            0xf6 => Value::Null,
            0xf7 => Value::Undefined,
            0xf8 => return Err(Error::UnsupportedSimpleValue(self.read_u8()?)),
            0xf9 => Value::Float(float16::decode_half_bytes(self.read_array()?)),
            0xfa => Value::Float(f32::from_be_bytes(self.read_array()?).into()),
            0xfb => Value::Float(f64::from_be_bytes(self.read_array()?)),
            0xff => return Ok(Item::Break),
            _ => return Err(Error::Unimplemented(header)),
        };
        Ok(Item::Value(value))
    }

    fn parse_array(&mut self, count: Option<usize>, depth: usize) -> Result<Vec<Value>, Error> {
        let depth = self.nested(depth)?;
        // Every item occupies at least one byte
        let limit = match count {
            Some(count) if count > self.remaining() => return Err(Error::NotEnoughData),
            Some(count) => count,
            None => usize::MAX,
        };

        let mut items = Vec::with_capacity(count.unwrap_or(0));
        for item in take(limit, Items::new(self, depth)) {
            items.push(item?);
        }

        match count {
            Some(count) if items.len() < count => Err(Error::UnexpectedBreak),
            _ => Ok(items),
        }
    }

    fn parse_map(&mut self, count: Option<usize>, depth: usize) -> Result<Map, Error> {
        let depth = self.nested(depth)?;
        let limit = match count {
            Some(count) => count
                .checked_mul(2)
                .filter(|n| *n <= self.remaining())
                .ok_or(Error::NotEnoughData)?,
            None => usize::MAX,
        };

        let mut map = Map::with_capacity(count.unwrap_or(0));
        let mut entries = pairs(take(limit, Items::new(self, depth)));
        for (key, value) in entries.by_ref() {
            map.push(key?, value?);
        }
        match entries.into_dangling() {
            Some(Err(e)) => return Err(e),
            Some(Ok(_)) => return Err(Error::PartialMap),
            None => {}
        }

        match count {
            Some(count) if map.len() < count => Err(Error::UnexpectedBreak),
            _ => Ok(map),
        }
    }

    fn apply_tag(&self, tag: u64, item: Value, depth: usize) -> Result<Value, Error> {
        match (tag, item) {
            (0, Value::Text(s)) => OffsetDateTime::parse(&s, &Rfc3339)
                .map(Value::Date)
                .map_err(|e| Error::InvalidDate(e.to_string())),
            (1, Value::Integer(n)) => {
                let secs = n
                    .as_i64()
                    .ok_or_else(|| Error::InvalidDate(format!("epoch {n} is out of range")))?;
                OffsetDateTime::from_unix_timestamp(secs)
                    .map(Value::Date)
                    .map_err(|e| Error::InvalidDate(e.to_string()))
            }
            (1, Value::Float(secs)) => epoch_from_float(secs).map(Value::Date),
            (2, Value::Bytes(b)) => Ok(Value::from(BigInt::from(bignum::bytes_to_unsigned(&b)))),
            (3, Value::Bytes(b)) => Ok(Value::from(
                -BigInt::from(bignum::bytes_to_unsigned(&b)) - 1,
            )),
            (4, _) => Err(not_supported(tag, "Decimal fraction")),
            (5, _) => Err(not_supported(tag, "Bigfloat")),
            (24, Value::Bytes(b)) => Decoder::new(&b)
                .with_max_depth(self.max_depth.saturating_sub(depth))
                .decode_value(),
            (32, Value::Text(s)) => Ok(Value::Url(Url::parse(&s)?)),
            (275, Value::Map(m)) => Record::try_from(m).map(Value::Record),
            (0 | 1 | 2 | 3 | 24 | 32 | 275, item) => Err(Error::IncorrectType {
                tag,
                expected: expected_item(tag),
                found: item.type_name(),
            }),
            (tag, item) => {
                trace!("Keeping unrecognised tag {tag} over {}", item.type_name());
                Ok(Value::Tagged(tag, Box::new(item)))
            }
        }
    }
}

impl Iterator for Decoder<'_> {
    type Item = Result<Value, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_exhausted() {
            return None;
        }
        let r = self.decode_value();
        if r.is_err() {
            self.offset = self.data.len();
        }
        Some(r)
    }
}

impl core::iter::FusedIterator for Decoder<'_> {}

fn not_supported(tag: u64, feature: &'static str) -> Error {
    debug!("Rejecting tag {tag}: {feature} is not supported");
    Error::NotSupported { tag, feature }
}

fn expected_item(tag: u64) -> &'static str {
    match tag {
        0 | 32 => "text string",
        1 => "number",
        275 => "map",
        _ => "byte string",
    }
}

fn epoch_from_float(secs: f64) -> Result<OffsetDateTime, Error> {
    if !secs.is_finite() {
        return Err(Error::InvalidDate(format!("epoch {secs} is not finite")));
    }
    OffsetDateTime::from_unix_timestamp_nanos((secs * 1e9).round() as i128)
        .map_err(|e| Error::InvalidDate(e.to_string()))
}

/// Decode the first item in `data`. Trailing bytes are ignored.
pub fn decode(data: &[u8]) -> Result<Value, Error> {
    Decoder::new(data).decode_value()
}
