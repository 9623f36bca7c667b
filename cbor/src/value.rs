/*!
The owned value model shared by the decoder and the encoder.

[`Value`] is a closed union: the decoder only ever produces its variants and the encoder accepts
exactly those variants, so there is no "unsupported type" path at runtime. Built-in tags decode
to the sugar variants [`Value::Date`] (tags 0 and 1), [`Value::Url`] (tag 32) and
[`Value::Record`] (tag 275); every other tag is kept as [`Value::Tagged`].

`Display` renders RFC 8949 diagnostic notation.
*/

use super::decode;
use core::fmt::{self, Write};
use hashbrown::HashMap;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use url::Url;

/// A CBOR integer.
///
/// Values that fit an `i64` are always held as [`Integer::Small`]; the constructors normalise,
/// so `Big` only carries magnitudes an `i64` cannot represent. Equality compares numeric
/// value, whichever variant holds it.
#[derive(Debug, Clone)]
pub enum Integer {
    Small(i64),
    Big(BigInt),
}

impl Integer {
    /// An unsigned integer as carried by major type 0.
    pub fn from_unsigned(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => Self::Small(n),
            Err(_) => Self::Big(BigInt::from(n)),
        }
    }

    /// The value `-1 - n`, as carried by major type 1.
    pub fn from_negative(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => Self::Small(-1 - n),
            Err(_) => Self::Big(-BigInt::from(n) - 1),
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Self::Small(n) => *n < 0,
            Self::Big(n) => n.is_negative(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Small(n) => Some(*n),
            Self::Big(n) => n.to_i64(),
        }
    }

    pub fn to_bigint(&self) -> BigInt {
        match self {
            Self::Small(n) => BigInt::from(*n),
            Self::Big(n) => n.clone(),
        }
    }
}

impl From<BigInt> for Integer {
    fn from(n: BigInt) -> Self {
        match n.to_i64() {
            Some(n) => Self::Small(n),
            None => Self::Big(n),
        }
    }
}

macro_rules! impl_integer_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Integer {
                fn from(n: $ty) -> Self {
                    Self::Small(n as i64)
                }
            }

            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Self::Integer(Integer::from(n))
                }
            }
        )*
    };
}

impl_integer_from!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Integer {
    fn from(n: u64) -> Self {
        Self::from_unsigned(n)
    }
}

impl PartialEq for Integer {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Small(a), Self::Small(b)) => a == b,
            (Self::Big(a), Self::Big(b)) => a == b,
            (a, b) => a.to_bigint() == b.to_bigint(),
        }
    }
}

impl Eq for Integer {}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Small(n) => write!(f, "{n}"),
            Self::Big(n) => write!(f, "{n}"),
        }
    }
}

/// A decoded or to-be-encoded CBOR data item.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(Integer),
    Float(f64),
    Bool(bool),
    Null,
    Undefined,
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Value>),
    Map(Map),
    /// A tag without built-in interpretation, with its decoded item.
    Tagged(u64, Box<Value>),
    Date(OffsetDateTime),
    Url(Url),
    Record(Record),
}

impl Value {
    pub fn tagged(tag: u64, item: impl Into<Value>) -> Self {
        Self::Tagged(tag, Box::new(item.into()))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Bytes(_) => "byte string",
            Self::Text(_) => "text string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Tagged(..) => "tagged value",
            Self::Date(_) => "date",
            Self::Url(_) => "URL",
            Self::Record(_) => "record",
        }
    }

    pub fn as_integer(&self) -> Option<&Integer> {
        match self {
            Self::Integer(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(Integer::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }
}

impl From<Integer> for Value {
    fn from(n: Integer) -> Self {
        Self::Integer(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Integer(Integer::from_unsigned(n))
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Self::Integer(Integer::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Self::Float(f.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Self::Array(a)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Self::Map(m)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Self::Record(r)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(d: OffsetDateTime) -> Self {
        Self::Date(d)
    }
}

impl From<Url> for Value {
    fn from(u: Url) -> Self {
        Self::Url(u)
    }
}

/// An insertion-ordered CBOR map.
///
/// Keys may repeat: the decoder keeps every pair in wire order, and `push` appends without
/// checking. `get` and `insert` act on the first pair with an equal key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Map(Vec<(Value, Value)>);

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, key: impl Into<Value>, value: impl Into<Value>) {
        self.0.push((key.into(), value.into()))
    }

    /// Replace the value of the first pair with an equal key, or append a new pair.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => Some(core::mem::replace(v, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, (Value, Value)> {
        self.0.iter()
    }
}

impl From<Vec<(Value, Value)>> for Map {
    fn from(pairs: Vec<(Value, Value)>) -> Self {
        Self(pairs)
    }
}

impl FromIterator<(Value, Value)> for Map {
    fn from_iter<T: IntoIterator<Item = (Value, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Map {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Map {
    type Item = &'a (Value, Value);
    type IntoIter = core::slice::Iter<'a, (Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A flat, text-keyed field mapping, carried on the wire as a map under tag 275.
///
/// Field names are unique; inserting an existing name replaces its value in place. Fields keep
/// their first insertion order, and lookups go through a name index.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.index.get(&name) {
            Some(&idx) => Some(core::mem::replace(&mut self.fields[idx].1, value)),
            None => {
                self.index.insert(name.clone(), self.fields.len());
                self.fields.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index.get(name).map(|&idx| &self.fields[idx].1)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, (String, Value)> {
        self.fields.iter()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut record = Record::with_capacity(iter.size_hint().0);
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a (String, Value);
    type IntoIter = core::slice::Iter<'a, (String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl From<Record> for Map {
    fn from(record: Record) -> Self {
        record
            .fields
            .into_iter()
            .map(|(name, value)| (Value::Text(name), value))
            .collect()
    }
}

impl TryFrom<Map> for Record {
    type Error = decode::Error;

    fn try_from(map: Map) -> Result<Self, Self::Error> {
        let mut record = Record::with_capacity(map.len());
        for (key, value) in map {
            match key {
                Value::Text(name) => {
                    record.insert(name, value);
                }
                key => return Err(decode::Error::InvalidRecordKey(key.type_name())),
            }
        }
        Ok(record)
    }
}

/// The RFC 3339 form of a date, normalised to UTC.
pub fn format_date(date: &OffsetDateTime) -> Result<String, String> {
    OffsetDateTime::from_unix_timestamp_nanos(date.unix_timestamp_nanos())
        .map_err(|e| e.to_string())?
        .format(&Rfc3339)
        .map_err(|e| e.to_string())
}

fn write_text(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        f.write_str("NaN")
    } else if v.is_infinite() {
        f.write_str(if v > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        // Exponent forms always carry a fraction and a signed exponent, as in `1.0e+300`
        let s = format!("{v:?}");
        match s.split_once('e') {
            Some((mantissa, exponent)) => {
                f.write_str(mantissa)?;
                if !mantissa.contains('.') {
                    f.write_str(".0")?;
                }
                if exponent.starts_with('-') {
                    write!(f, "e{exponent}")
                } else {
                    write!(f, "e+{exponent}")
                }
            }
            None => f.write_str(&s),
        }
    }
}

fn write_seq<'a, I>(f: &mut fmt::Formatter<'_>, open: char, close: char, items: I) -> fmt::Result
where
    I: IntoIterator<Item = (Option<&'a dyn fmt::Display>, &'a Value)>,
{
    f.write_char(open)?;
    for (idx, (key, value)) in items.into_iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        if let Some(key) = key {
            write!(f, "{key}: ")?;
        }
        write!(f, "{value}")?;
    }
    f.write_char(close)
}

struct Quoted<'a>(&'a str);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_text(f, self.0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(v) => write_float(f, *v),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
            Self::Undefined => f.write_str("undefined"),
            Self::Bytes(b) => {
                f.write_str("h'")?;
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                f.write_char('\'')
            }
            Self::Text(s) => write_text(f, s),
            Self::Array(a) => write_seq(f, '[', ']', a.iter().map(|v| (None, v))),
            Self::Map(m) => write_seq(
                f,
                '{',
                '}',
                m.iter().map(|(k, v)| (Some(k as &dyn fmt::Display), v)),
            ),
            Self::Tagged(tag, item) => write!(f, "{tag}({item})"),
            Self::Date(d) => match format_date(d) {
                Ok(s) => write!(f, "0({})", Quoted(&s)),
                Err(_) => write!(f, "1({})", d.unix_timestamp()),
            },
            Self::Url(u) => write!(f, "32({})", Quoted(u.as_str())),
            Self::Record(r) => {
                let names: Vec<Quoted> = r.iter().map(|(n, _)| Quoted(n)).collect();
                f.write_str("275(")?;
                write_seq(
                    f,
                    '{',
                    '}',
                    names
                        .iter()
                        .zip(r.iter())
                        .map(|(n, (_, v))| (Some(n as &dyn fmt::Display), v)),
                )?;
                f.write_char(')')
            }
        }
    }
}
