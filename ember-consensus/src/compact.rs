//! Compact ("nBits") encoding of 256-bit targets.
//!
//! A compact target packs a byte length into the top byte and a 24-bit
//! mantissa into the rest: `value = mantissa * 256^(exponent - 3)`. Bit 23 of
//! the mantissa is a sign bit, so canonical encodings keep the mantissa below
//! `0x80_0000`.
//!
//! Decoding never fails. It reports `negative` and `overflow` flags and every
//! caller has to look at them before trusting the value.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use crate::U256;

const SIGN_BIT: u32 = 0x0080_0000;
const MANTISSA_MASK: u32 = 0x007f_ffff;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompactTarget(u32);

/// Result of [`CompactTarget::decode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedTarget {
    /// Magnitude of the encoded number. Zero when `overflow` is set.
    pub value: U256,
    pub negative: bool,
    pub overflow: bool,
}

impl DecodedTarget {
    /// The decoded value, if it is neither negative nor overflowing.
    pub fn valid(&self) -> Option<U256> {
        if self.negative || self.overflow {
            None
        } else {
            Some(self.value)
        }
    }
}

impl CompactTarget {
    pub const fn from_consensus(bits: u32) -> Self {
        CompactTarget(bits)
    }

    pub const fn to_consensus(self) -> u32 {
        self.0
    }

    pub const fn exponent(self) -> u32 {
        self.0 >> 24
    }

    pub fn decode(self) -> DecodedTarget {
        let exponent = self.exponent();
        let mut word = self.0 & MANTISSA_MASK;

        if exponent <= 3 {
            word >>= 8 * (3 - exponent);
        }

        let negative = word != 0 && (self.0 & SIGN_BIT) != 0;
        let overflow = word != 0
            && (exponent > 34
                || (word > 0xff && exponent > 33)
                || (word > 0xffff && exponent > 32));

        let value = if overflow || word == 0 {
            U256::zero()
        } else if exponent <= 3 {
            U256::from(word)
        } else {
            U256::from(word) << (8 * (exponent - 3))
        };

        DecodedTarget {
            value,
            negative,
            overflow,
        }
    }

    /// Encode `value` in canonical minimal form.
    ///
    /// Bits below the 24-bit mantissa window are dropped, so the result never
    /// decodes to more than `value`.
    pub fn encode(value: U256) -> Self {
        let mut size = (value.bits() as u32 + 7) / 8;
        let mut compact = if size <= 3 {
            (value.low_u64() << (8 * (3 - size))) as u32
        } else {
            (value >> (8 * (size - 3))).low_u32()
        };

        if compact & SIGN_BIT != 0 {
            compact >>= 8;
            size += 1;
        }

        CompactTarget(compact | (size << 24))
    }
}

impl From<u32> for CompactTarget {
    fn from(bits: u32) -> Self {
        CompactTarget(bits)
    }
}

impl From<CompactTarget> for u32 {
    fn from(bits: CompactTarget) -> Self {
        bits.0
    }
}

impl fmt::Display for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl fmt::LowerHex for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl FromStr for CompactTarget {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        u32::from_str_radix(digits, 16).map(CompactTarget)
    }
}

impl serde::Serialize for CompactTarget {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for CompactTarget {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|e| {
            serde::de::Error::custom(format!("Failed to parse compact target '{}': {}", s, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn decode(bits: u32) -> DecodedTarget {
        CompactTarget::from_consensus(bits).decode()
    }

    fn encode(value: U256) -> u32 {
        CompactTarget::encode(value).to_consensus()
    }

    #[test]
    fn test_decode_zero_mantissas() {
        for bits in [
            0x0000_0000u32,
            0x0012_3456,
            0x0100_3456,
            0x0200_0056,
            0x0300_0000,
            0x0400_0000,
            0x0092_3456,
            0x0180_3456,
            0x0280_0056,
            0x0380_0000,
            0x0480_0000,
        ] {
            let decoded = decode(bits);
            assert_eq!(decoded.value, U256::zero(), "bits {:08x}", bits);
            assert!(!decoded.negative, "bits {:08x}", bits);
            assert!(!decoded.overflow, "bits {:08x}", bits);
            assert_eq!(encode(decoded.value), 0);
        }
    }

    #[test]
    fn test_decode_small_exponents() {
        let decoded = decode(0x0112_3456);
        assert_eq!(decoded.value, U256::from(0x12u64));
        assert_eq!(encode(decoded.value), 0x0112_0000);

        let decoded = decode(0x0212_3456);
        assert_eq!(decoded.value, U256::from(0x1234u64));
        assert_eq!(encode(decoded.value), 0x0212_3400);

        let decoded = decode(0x0312_3456);
        assert_eq!(decoded.value, U256::from(0x12_3456u64));
        assert_eq!(encode(decoded.value), 0x0312_3456);
    }

    #[test]
    fn test_encode_moves_sign_bit_into_exponent() {
        assert_eq!(encode(U256::from(0x80u64)), 0x0200_8000);
        assert_eq!(encode(U256::from(0x9234_0000u64)), 0x0500_9234);
        assert_eq!(decode(0x0500_9234).value, U256::from(0x9234_0000u64));
    }

    #[test]
    fn test_decode_negative_flag() {
        let decoded = decode(0x01fe_dcba);
        assert_eq!(decoded.value, U256::from(0x7eu64));
        assert!(decoded.negative);
        assert_eq!(decoded.valid(), None);

        let decoded = decode(0x0492_3456);
        assert_eq!(decoded.value, U256::from(0x1234_5600u64));
        assert!(decoded.negative);
        assert!(!decoded.overflow);
    }

    #[test]
    fn test_decode_full_width_and_overflow() {
        let decoded = decode(0x2012_3456);
        assert_eq!(decoded.value, U256::from(0x12_3456u64) << 232u32);
        assert!(!decoded.overflow);
        assert_eq!(encode(decoded.value), 0x2012_3456);

        // Largest exponents that still fit, depending on mantissa width.
        assert!(!decode(0x2200_00ff).overflow);
        assert!(decode(0x2200_0100).overflow);
        assert!(!decode(0x2100_ffff).overflow);
        assert!(decode(0x2101_0000).overflow);
        assert!(decode(0x2300_0001).overflow);

        let decoded = decode(0xff12_3456);
        assert!(decoded.overflow);
        assert_eq!(decoded.value, U256::zero());
        assert_eq!(decoded.valid(), None);
    }

    #[test]
    fn test_encode_truncates_toward_zero() {
        let value = U256::from(0x12_3456_78u64);
        let bits = encode(value);
        assert_eq!(bits, 0x0412_3456);
        assert!(decode(bits).value < value);
        assert_eq!(decode(bits).value, U256::from(0x12_3456_00u64));
    }

    #[test]
    fn test_canonical_values_roundtrip() {
        let mut rng = rand::thread_rng();
        for _ in 0..256 {
            let mantissa: u32 = rng.gen_range(0x8000..0x80_0000);
            let shift_bytes: u32 = rng.gen_range(0..30);
            let value = U256::from(mantissa) << (8 * shift_bytes);

            let bits = CompactTarget::encode(value);
            let decoded = bits.decode();
            assert_eq!(decoded.value, value, "bits {}", bits);
            assert!(!decoded.negative);
            assert!(!decoded.overflow);
        }
    }

    #[test]
    fn test_hex_text_form() {
        let bits: CompactTarget = "0x1e0ffff0".parse().unwrap();
        assert_eq!(bits.to_consensus(), 0x1e0f_fff0);
        assert_eq!(bits.to_string(), "0x1e0ffff0");
        assert_eq!("1d00ffff".parse::<CompactTarget>().unwrap().to_consensus(), 0x1d00_ffff);
        assert!("not hex".parse::<CompactTarget>().is_err());
    }
}
