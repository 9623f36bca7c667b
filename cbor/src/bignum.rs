/*!
Byte codec for the magnitudes carried by the bignum tags (2 and 3).

Magnitudes are big-endian and minimal: zero is the empty byte string, and no other value
carries a leading zero byte.
*/

use super::encode::Error;
use num_bigint::{BigInt, BigUint};
use num_traits::Zero;

/// Accumulate big-endian base-256 digits into an unsigned integer.
///
/// Leading zero bytes are accepted; an empty slice is zero.
pub fn bytes_to_unsigned(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// The minimal big-endian byte form of a non-negative integer.
pub fn unsigned_to_bytes(n: &BigInt) -> Result<Vec<u8>, Error> {
    let magnitude = n.to_biguint().ok_or(Error::NegativeBignum)?;
    Ok(magnitude_to_bytes(&magnitude))
}

pub(crate) fn magnitude_to_bytes(n: &BigUint) -> Vec<u8> {
    if n.is_zero() {
        Vec::new()
    } else {
        n.to_bytes_be()
    }
}
