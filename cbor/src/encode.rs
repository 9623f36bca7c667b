use super::bignum;
use super::value::{Integer, Map, Record, Value, format_date};
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::trace;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Cannot encode a negative value as an unsigned bignum")]
    NegativeBignum,

    #[error("Length {0} exceeds the widest encodable length field")]
    LengthOutOfRange(usize),

    #[error("Date cannot be encoded: {0}")]
    InvalidDate(String),
}

pub trait ToCbor {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error>;
}

/// Accumulates encoded items into a single buffer.
///
/// Lengths and counts are always definite, and floats are written as single precision when
/// that is lossless, otherwise double precision.
pub struct Encoder {
    data: Vec<u8>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }

    pub fn offset(&self) -> usize {
        self.data.len()
    }

    fn emit_uint_minor(&mut self, major: u8, val: u64) {
        if val < 24 {
            self.data.push((major << 5) | (val as u8))
        } else if val <= u8::MAX as u64 {
            self.data.push((major << 5) | 24u8);
            self.data.push(val as u8)
        } else if val <= u16::MAX as u64 {
            self.data.push((major << 5) | 25u8);
            self.data.extend((val as u16).to_be_bytes())
        } else if val <= u32::MAX as u64 {
            self.data.push((major << 5) | 26u8);
            self.data.extend((val as u32).to_be_bytes())
        } else {
            self.data.push((major << 5) | 27u8);
            self.data.extend(val.to_be_bytes())
        }
    }

    /// String lengths and container counts stop at the 32-bit tier.
    fn emit_length(&mut self, major: u8, len: usize) -> Result<(), Error> {
        let len = u32::try_from(len).map_err(|_| Error::LengthOutOfRange(len))?;
        self.emit_uint_minor(major, len.into());
        Ok(())
    }

    pub fn emit_tag(&mut self, tag: u64) {
        self.emit_uint_minor(6, tag)
    }

    /// Append one item. On failure nothing is appended.
    pub fn emit<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: ToCbor + ?Sized,
    {
        let start = self.data.len();
        value
            .to_cbor(self)
            .inspect_err(|_| self.data.truncate(start))
    }

    pub fn emit_tagged<T>(&mut self, tag: u64, value: &T) -> Result<(), Error>
    where
        T: ToCbor + ?Sized,
    {
        let start = self.data.len();
        self.emit_tag(tag);
        value
            .to_cbor(self)
            .inspect_err(|_| self.data.truncate(start))
    }

    fn emit_integer(&mut self, n: &Integer) -> Result<(), Error> {
        match n {
            Integer::Small(n) if *n >= 0 => self.emit_uint_minor(0, *n as u64),
            Integer::Small(n) => self.emit_uint_minor(1, (-1 - *n) as u64),
            Integer::Big(n) => return self.emit_bigint(n),
        }
        Ok(())
    }

    fn emit_bigint(&mut self, n: &BigInt) -> Result<(), Error> {
        let (major, tag, magnitude) = if n.is_negative() {
            (1, 3, -n - 1)
        } else {
            (0, 2, n.clone())
        };
        match magnitude.to_u64() {
            Some(v) => self.emit_uint_minor(major, v),
            None => {
                trace!("Integer {n} exceeds 64 bits, encoding as tag {tag}");
                self.emit_tag(tag);
                self.emit_bytes(&bignum::unsigned_to_bytes(&magnitude)?)?;
            }
        }
        Ok(())
    }

    fn emit_float(&mut self, value: f64) {
        let single = value as f32;
        // NaN never compares equal, so it always takes the double-precision path
        if f64::from(single) == value {
            self.data.push((7 << 5) | 26);
            self.data.extend(single.to_be_bytes())
        } else {
            self.data.push((7 << 5) | 27);
            self.data.extend(value.to_be_bytes())
        }
    }

    fn emit_bytes(&mut self, b: &[u8]) -> Result<(), Error> {
        self.emit_length(2, b.len())?;
        self.data.extend_from_slice(b);
        Ok(())
    }

    fn emit_text(&mut self, s: &str) -> Result<(), Error> {
        self.emit_length(3, s.len())?;
        self.data.extend_from_slice(s.as_bytes());
        Ok(())
    }

    fn emit_array(&mut self, items: &[Value]) -> Result<(), Error> {
        self.emit_length(4, items.len())?;
        items.iter().try_for_each(|item| item.to_cbor(self))
    }

    fn emit_map(&mut self, map: &Map) -> Result<(), Error> {
        self.emit_length(5, map.len())?;
        map.iter().try_for_each(|(key, value)| {
            key.to_cbor(self)?;
            value.to_cbor(self)
        })
    }

    fn emit_record(&mut self, record: &Record) -> Result<(), Error> {
        self.emit_tag(275);
        self.emit_length(5, record.len())?;
        record.iter().try_for_each(|(name, value)| {
            self.emit_text(name)?;
            value.to_cbor(self)
        })
    }

    fn emit_date(&mut self, date: &OffsetDateTime) -> Result<(), Error> {
        let text = format_date(date).map_err(Error::InvalidDate)?;
        self.emit_tag(0);
        self.emit_text(&text)
    }

    fn emit_url(&mut self, url: &Url) -> Result<(), Error> {
        self.emit_tag(32);
        self.emit_text(url.as_str())
    }
}

impl ToCbor for Value {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        match self {
            Value::Integer(n) => encoder.emit_integer(n),
            Value::Float(f) => {
                encoder.emit_float(*f);
                Ok(())
            }
            Value::Bool(b) => b.to_cbor(encoder),
            Value::Null => {
                encoder.data.push((7 << 5) | 22);
                Ok(())
            }
            Value::Undefined => {
                encoder.data.push((7 << 5) | 23);
                Ok(())
            }
            Value::Bytes(b) => encoder.emit_bytes(b),
            Value::Text(s) => encoder.emit_text(s),
            Value::Array(a) => encoder.emit_array(a),
            Value::Map(m) => encoder.emit_map(m),
            Value::Tagged(tag, item) => {
                encoder.emit_tag(*tag);
                item.to_cbor(encoder)
            }
            Value::Date(d) => encoder.emit_date(d),
            Value::Url(u) => encoder.emit_url(u),
            Value::Record(r) => encoder.emit_record(r),
        }
    }
}

impl ToCbor for Integer {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.emit_integer(self)
    }
}

impl ToCbor for BigInt {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.emit_bigint(self)
    }
}

impl ToCbor for Map {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.emit_map(self)
    }
}

impl ToCbor for Record {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.emit_record(self)
    }
}

impl ToCbor for [Value] {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.emit_array(self)
    }
}

impl ToCbor for Vec<Value> {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.emit_array(self)
    }
}

macro_rules! impl_uint_to_cbor {
    ($($ty:ty),*) => {
        $(
            impl ToCbor for $ty {
                fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
                    encoder.emit_uint_minor(0, *self as u64);
                    Ok(())
                }
            }
        )*
    };
}

impl_uint_to_cbor!(u8, u16, u32, u64, usize);

macro_rules! impl_int_to_cbor {
    ($($ty:ty),*) => {
        $(
            impl ToCbor for $ty {
                fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
                    encoder.emit_integer(&Integer::Small(*self as i64))
                }
            }
        )*
    };
}

impl_int_to_cbor!(i8, i16, i32, i64, isize);

impl ToCbor for f64 {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.emit_float(*self);
        Ok(())
    }
}

impl ToCbor for f32 {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.emit_float((*self).into());
        Ok(())
    }
}

impl ToCbor for bool {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.data.push((7 << 5) | if *self { 21 } else { 20 });
        Ok(())
    }
}

impl ToCbor for str {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.emit_text(self)
    }
}

impl ToCbor for String {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.emit_text(self)
    }
}

impl ToCbor for [u8] {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.emit_bytes(self)
    }
}

impl ToCbor for Vec<u8> {
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        encoder.emit_bytes(self)
    }
}

impl<T> ToCbor for Option<T>
where
    T: ToCbor,
{
    fn to_cbor(&self, encoder: &mut Encoder) -> Result<(), Error> {
        match self {
            Some(value) => value.to_cbor(encoder),
            None => {
                encoder.data.push((7 << 5) | 23);
                Ok(())
            }
        }
    }
}

pub fn emit<T>(value: &T) -> Result<Vec<u8>, Error>
where
    T: ToCbor + ?Sized,
{
    let mut e = Encoder::new();
    e.emit(value)?;
    Ok(e.build())
}

pub fn emit_tagged<T>(tag: u64, value: &T) -> Result<Vec<u8>, Error>
where
    T: ToCbor + ?Sized,
{
    let mut e = Encoder::new();
    e.emit_tagged(tag, value)?;
    Ok(e.build())
}

/// Encode a single value into a fresh buffer.
pub fn encode(value: &Value) -> Result<Vec<u8>, Error> {
    emit(value)
}

#[cfg(test)]
mod test {
    #[test]
    fn test_slice_encode() {
        use super::*;
        use hex_literal::hex;

        let items = [Value::from(1), Value::from(2), Value::from(3)];
        assert_eq!(emit(&items[..]).unwrap(), hex!("83010203"));
    }
}
