/*!
An RFC 8949 CBOR codec over an owned [`Value`] model.

[`decode()`] parses one top-level item from a byte slice; [`Decoder`] iterates a buffer holding a
sequence of items. [`encode()`] turns a [`Value`] into a contiguous byte buffer, always using
definite lengths.

```
use cbor_value::{Value, decode, encode};

let value = decode(&[0x83, 0x01, 0x02, 0x03]).unwrap();
assert_eq!(value, Value::from(vec![Value::from(1), Value::from(2), Value::from(3)]));
assert_eq!(encode(&value).unwrap(), [0x83, 0x01, 0x02, 0x03]);
```
*/

pub mod bignum;
pub mod decode;
pub mod encode;
pub mod float16;
pub mod seq;
pub mod value;

mod decode_seq;

pub use decode::{Decoder, decode};
pub use encode::{Encoder, ToCbor, encode};
pub use value::{Integer, Map, Record, Value};

#[cfg(test)]
mod decode_tests;
