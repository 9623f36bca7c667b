/*!
Lossy conversion between CBOR values and JSON, following RFC 8949 §6.1 and §6.2
*/

use base64::prelude::*;
use cbor_value::{Integer, Map, Record, Value, bignum, value::format_date};
use num_traits::{Signed, ToPrimitive};
use serde_json::{Number, Value as Json};

/// Convert a decoded item to JSON.
///
/// Byte strings become unpadded base64url strings, and integers outside 64 bits become the
/// base64url of their bignum magnitude, prefixed with `~` when negative. Tags other than the
/// built-in date and URL forms are dropped. Non-finite floats, `undefined` and `null` all map to
/// JSON `null`. Map keys that are not text strings are rendered in diagnostic notation.
pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Integer(n) => integer_to_json(n),
        Value::Float(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::Bool(b) => Json::Bool(*b),
        Value::Null | Value::Undefined => Json::Null,
        Value::Bytes(b) => Json::String(BASE64_URL_SAFE_NO_PAD.encode(b)),
        Value::Text(s) => Json::String(s.clone()),
        Value::Array(a) => Json::Array(a.iter().map(to_json).collect()),
        Value::Map(m) => Json::Object(
            m.iter()
                .map(|(k, v)| {
                    let key = match k {
                        Value::Text(s) => s.clone(),
                        k => k.to_string(),
                    };
                    (key, to_json(v))
                })
                .collect(),
        ),
        Value::Tagged(_, item) => to_json(item),
        Value::Date(d) => format_date(d).map_or(Json::Null, Json::String),
        Value::Url(u) => Json::String(u.to_string()),
        Value::Record(r) => Json::Object(
            r.iter()
                .map(|(name, v)| (name.clone(), to_json(v)))
                .collect(),
        ),
    }
}

fn integer_to_json(n: &Integer) -> Json {
    match n {
        Integer::Small(n) => Json::Number((*n).into()),
        Integer::Big(n) => {
            if let Some(u) = n.to_u64() {
                return Json::Number(u.into());
            }
            let (prefix, magnitude) = if n.is_negative() {
                ("~", -n - 1)
            } else {
                ("", n.clone())
            };
            bignum::unsigned_to_bytes(&magnitude).map_or(Json::Null, |b| {
                Json::String(format!("{prefix}{}", BASE64_URL_SAFE_NO_PAD.encode(b)))
            })
        }
    }
}

/// Convert JSON to a value. Objects become maps with text keys, or records when `records` is set.
pub fn from_json(json: Json, records: bool) -> anyhow::Result<Value> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                anyhow::bail!("Invalid JSON number: {n}")
            }
        }
        Json::String(s) => Value::Text(s),
        Json::Array(a) => Value::Array(
            a.into_iter()
                .map(|item| from_json(item, records))
                .collect::<anyhow::Result<_>>()?,
        ),
        Json::Object(o) if records => Value::Record(
            o.into_iter()
                .map(|(k, v)| Ok((k, from_json(v, records)?)))
                .collect::<anyhow::Result<Record>>()?,
        ),
        Json::Object(o) => Value::Map(
            o.into_iter()
                .map(|(k, v)| Ok((Value::Text(k), from_json(v, records)?)))
                .collect::<anyhow::Result<Map>>()?,
        ),
    })
}
