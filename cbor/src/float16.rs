/*!
Half-precision (IEEE 754 binary16) bridge.

The decoder reads `0xf9` items through [`decode_half`]. The encoder never emits half precision;
[`encode_half`] exists so the two directions can be checked against each other.
*/

const SIGN_MASK: u16 = 0x8000;
const EXPONENT_MASK: u16 = 0x7C00;
const MANTISSA_MASK: u16 = 0x03FF;
const QUIET_NAN: u16 = 0x7E00;

/// 2^-24, the value of the least significant mantissa bit of a subnormal half.
const SUBNORMAL_SCALE: f64 = 1.0 / 16_777_216.0;

/// Reconstruct the `f64` value of a binary16 bit pattern.
pub fn decode_half(bits: u16) -> f64 {
    let exponent = (bits & EXPONENT_MASK) >> 10;
    let mantissa = f64::from(bits & MANTISSA_MASK);

    let magnitude = match exponent {
        0 => mantissa * SUBNORMAL_SCALE,
        0x1F if mantissa == 0.0 => f64::INFINITY,
        0x1F => f64::NAN,
        exponent => (mantissa + 1024.0) * 2f64.powi(i32::from(exponent) - 25),
    };

    if bits & SIGN_MASK != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// [`decode_half`] over the two big-endian bytes of an `0xf9` item.
pub fn decode_half_bytes(bytes: [u8; 2]) -> f64 {
    decode_half(u16::from_be_bytes(bytes))
}

/// Narrow an `f64` to the nearest binary16 bit pattern.
///
/// The value is first rounded to single precision, then to half precision with
/// round-to-nearest-even. Magnitudes beyond the half range become infinity, magnitudes below
/// the smallest subnormal become signed zero, and NaNs keep their sign and upper payload bits.
pub fn encode_half(value: f64) -> u16 {
    narrow_single((value as f32).to_bits())
}

fn narrow_single(bits: u32) -> u16 {
    let sign = ((bits >> 16) as u16) & SIGN_MASK;
    let exponent = ((bits >> 23) & 0xFF) as i32;
    let mantissa = bits & 0x007F_FFFF;

    if exponent == 0xFF {
        return if mantissa == 0 {
            sign | EXPONENT_MASK
        } else {
            sign | QUIET_NAN | (mantissa >> 13) as u16
        };
    }

    let half_exponent = exponent - 127 + 15;
    if half_exponent >= 0x1F {
        return sign | EXPONENT_MASK;
    }

    if half_exponent <= 0 {
        let shift = (14 - half_exponent) as u32;
        if shift > 24 {
            return sign;
        }
        // Subnormal result: the implicit leading bit becomes explicit
        let mantissa = mantissa | 0x0080_0000;
        let rounded = round_nearest_even(mantissa >> shift, mantissa, 1 << (shift - 1));
        return sign | rounded as u16;
    }

    let truncated = ((half_exponent as u32) << 10) | (mantissa >> 13);
    // A carry out of the mantissa bumps the exponent, up to and including infinity
    sign | round_nearest_even(truncated, mantissa, 0x1000) as u16
}

fn round_nearest_even(truncated: u32, source: u32, round_bit: u32) -> u32 {
    // Mask covers every discarded bit below the round bit, plus the kept lsb
    if source & round_bit != 0 && source & (3 * round_bit - 1) != 0 {
        truncated + 1
    } else {
        truncated
    }
}
