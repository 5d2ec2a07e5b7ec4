//! Operand parsing.
//!
//! Tokens arrive already split; these helpers only validate and convert
//! single operands.

use crate::error::CoreError;
use pcf7931_protocol::PASSWORD_LEN;

/// Parses a password given as exactly 14 hex digits.
pub fn parse_password(input: &str) -> Result<[u8; PASSWORD_LEN], CoreError> {
    let invalid = || CoreError::InvalidPassword {
        input: input.to_string(),
        expected: PASSWORD_LEN * 2,
    };

    if input.len() != PASSWORD_LEN * 2 {
        return Err(invalid());
    }
    let mut out = [0u8; PASSWORD_LEN];
    hex::decode_to_slice(input, &mut out).map_err(|_| invalid())?;
    Ok(out)
}

/// Parses one byte of hex data, with or without a `0x` prefix.
pub fn parse_hex_byte(input: &str) -> Result<u8, CoreError> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CoreError::InvalidHexByte {
            input: input.to_string(),
        });
    }
    u8::from_str_radix(digits, 16).map_err(|_| CoreError::InvalidHexByte {
        input: input.to_string(),
    })
}

/// Parses an unsigned decimal operand.
pub fn parse_unsigned(field: &'static str, input: &str) -> Result<u64, CoreError> {
    input.parse::<u64>().map_err(|_| CoreError::InvalidDecimal {
        field,
        input: input.to_string(),
    })
}

/// Parses a signed decimal operand.
pub fn parse_signed(field: &'static str, input: &str) -> Result<i64, CoreError> {
    input.parse::<i64>().map_err(|_| CoreError::InvalidDecimal {
        field,
        input: input.to_string(),
    })
}

/// Parses an optional signed decimal operand, defaulting to zero when absent.
pub fn parse_optional_signed(field: &'static str, input: Option<&str>) -> Result<i64, CoreError> {
    input.map_or(Ok(0), |s| parse_signed(field, s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_password() {
        assert_eq!(
            parse_password("11223344556677").unwrap(),
            [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77]
        );
        assert_eq!(parse_password("ffFFffFFffFFff").unwrap(), [0xFF; 7]);
    }

    #[test]
    fn test_parse_password_rejects_bad_input() {
        for input in ["", "1122", "112233445566778", "1122334455667788", "11223344zz6677"] {
            assert!(
                matches!(
                    parse_password(input),
                    Err(CoreError::InvalidPassword { expected: 14, .. })
                ),
                "accepted {input:?}"
            );
        }
    }

    #[test]
    fn test_parse_hex_byte() {
        assert_eq!(parse_hex_byte("FF").unwrap(), 0xFF);
        assert_eq!(parse_hex_byte("0x1a").unwrap(), 0x1A);
        assert_eq!(parse_hex_byte("7").unwrap(), 0x07);
        assert!(parse_hex_byte("100").is_err());
        assert!(parse_hex_byte("0x").is_err());
        assert!(parse_hex_byte("G1").is_err());
        assert!(parse_hex_byte("+F").is_err());
        assert!(parse_hex_byte("0x+F").is_err());
    }

    #[test]
    fn test_parse_decimals() {
        assert_eq!(parse_unsigned("block", "7").unwrap(), 7);
        assert!(matches!(
            parse_unsigned("block", "-1"),
            Err(CoreError::InvalidDecimal { field: "block", .. })
        ));
        assert_eq!(parse_signed("offset width", "-10").unwrap(), -10);
        assert_eq!(parse_signed("offset width", "+30").unwrap(), 30);
        assert!(parse_signed("delay", "20k").is_err());
    }

    #[test]
    fn test_parse_optional_signed() {
        assert_eq!(parse_optional_signed("delay", None).unwrap(), 0);
        assert_eq!(parse_optional_signed("delay", Some("20000")).unwrap(), 20000);
        assert!(parse_optional_signed("delay", Some("x")).is_err());
    }
}
