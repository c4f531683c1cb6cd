//! Hex quantity decoding (`"0x1c9c380"` → `30000000`).

use serde::{Deserialize, Deserializer};

use crate::error::HexError;

/// Parse a hex-encoded quantity (with or without `0x`) to `u64`.
pub fn parse_hex_u64(s: &str) -> Result<u64, HexError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.is_empty() {
        return Err(HexError::Empty);
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(HexError::Invalid(s.to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|_| HexError::Overflow(s.to_string()))
}

/// Serde adapter for hex quantity fields.
pub fn deserialize_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_hex_u64(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_u64_basic() {
        assert_eq!(parse_hex_u64("0x0"), Ok(0));
        assert_eq!(parse_hex_u64("0x10"), Ok(16));
        assert_eq!(parse_hex_u64("0x1c9c380"), Ok(30_000_000));
        assert_eq!(parse_hex_u64("ff"), Ok(255));
        assert_eq!(parse_hex_u64("0XFF"), Ok(255));
    }

    #[test]
    fn parse_hex_u64_rejects_garbage() {
        assert_eq!(parse_hex_u64("0x"), Err(HexError::Empty));
        assert_eq!(parse_hex_u64(""), Err(HexError::Empty));
        assert!(matches!(parse_hex_u64("0xzz"), Err(HexError::Invalid(_))));
        assert!(matches!(parse_hex_u64("-0x1"), Err(HexError::Invalid(_))));
    }

    #[test]
    fn parse_hex_u64_overflow() {
        assert_eq!(parse_hex_u64("0xffffffffffffffff"), Ok(u64::MAX));
        assert!(matches!(
            parse_hex_u64("0x10000000000000000"),
            Err(HexError::Overflow(_))
        ));
    }
}
