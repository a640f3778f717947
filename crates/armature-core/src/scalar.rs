//! Typed scalar values and attribute coercion.
//!
//! Attribute values and text content in a container document are plain
//! strings. [`Scalar::phpize`] turns such a string into a typed value:
//!
//! - `"null"` (any case) becomes [`Scalar::Null`]
//! - `"true"` / `"false"` (any case) become [`Scalar::Bool`]
//! - decimal, octal (`0` prefix), binary (`0b` prefix) and hexadecimal
//!   (`0x` prefix) integers become [`Scalar::Int`]
//! - decimal and exponent floats become [`Scalar::Float`]
//! - anything else is kept verbatim as [`Scalar::String`], whitespace included
//!
//! # Example
//!
//! ```
//! # use armature_core::scalar::Scalar;
//! assert_eq!(Scalar::phpize("true"), Scalar::Bool(true));
//! assert_eq!(Scalar::phpize("42"), Scalar::Int(42));
//! assert_eq!(Scalar::phpize("0x1A"), Scalar::Int(26));
//! assert_eq!(Scalar::phpize(" padded "), Scalar::String(" padded ".to_string()));
//! ```

use std::fmt;

use serde::Deserialize;

/// A typed scalar value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Coerce raw document text into a typed scalar.
    pub fn phpize(raw: &str) -> Self {
        let lowercase = raw.to_ascii_lowercase();

        if lowercase == "null" {
            return Self::Null;
        }
        if is_digits(raw) {
            return integer_literal(raw, raw, false);
        }
        if let Some(digits) = raw.strip_prefix('-')
            && is_digits(digits)
        {
            return integer_literal(raw, digits, true);
        }
        if lowercase == "true" {
            return Self::Bool(true);
        }
        if lowercase == "false" {
            return Self::Bool(false);
        }
        if let Some(bits) = raw.strip_prefix("0b")
            && !bits.is_empty()
            && bits.bytes().all(|b| b == b'0' || b == b'1')
        {
            return radix_literal(bits, 2);
        }
        if is_numeric(raw) {
            return raw
                .trim()
                .parse::<f64>()
                .map(Self::Float)
                .unwrap_or_else(|_| Self::String(raw.to_string()));
        }
        if let Some(hex) = lowercase.strip_prefix("0x")
            && !hex.is_empty()
            && hex.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return radix_literal(hex, 16);
        }
        if let Some(value) = separated_float(raw) {
            return Self::Float(value);
        }

        Self::String(raw.to_string())
    }

    /// Truthiness of the value when used as a flag.
    ///
    /// Empty strings, `"0"`, zero numbers, `false` and null are false.
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => *value,
            Self::Int(value) => *value != 0,
            Self::Float(value) => *value != 0.0,
            Self::String(value) => !value.is_empty() && value != "0",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Decimal or octal integer; `digits` is `raw` without its sign.
///
/// Values that overflow `i64` keep their textual form.
fn integer_literal(raw: &str, digits: &str, negative: bool) -> Scalar {
    if digits.len() > 1 && digits.starts_with('0') {
        let octal = &digits[1..];
        if octal.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            return match i64::from_str_radix(octal, 8) {
                Ok(value) if negative => Scalar::Int(-value),
                Ok(value) => Scalar::Int(value),
                Err(_) => Scalar::String(raw.to_string()),
            };
        }
        return Scalar::String(raw.to_string());
    }

    match raw.parse::<i64>() {
        Ok(value) => Scalar::Int(value),
        Err(_) => Scalar::String(raw.to_string()),
    }
}

fn radix_literal(digits: &str, radix: u32) -> Scalar {
    match i64::from_str_radix(digits, radix) {
        Ok(value) => Scalar::Int(value),
        // Too wide for an integer, keep the magnitude.
        Err(_) => Scalar::Float(
            digits
                .chars()
                .filter_map(|c| c.to_digit(radix))
                .fold(0.0, |acc, digit| acc * f64::from(radix) + f64::from(digit)),
        ),
    }
}

/// Numeric string grammar: optional surrounding whitespace, optional sign,
/// a mantissa with at least one digit and an optional exponent.
fn is_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    let bytes = trimmed.as_bytes();
    let mut pos = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        pos += 1;
    }

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let mut mantissa_digits = pos - int_start;

    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        let frac_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        mantissa_digits += pos - frac_start;
    }

    if mantissa_digits == 0 {
        return false;
    }

    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+') | Some(b'-')) {
            pos += 1;
        }
        let exp_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == exp_start {
            return false;
        }
    }

    pos == bytes.len()
}

/// Digits grouped with underscores, e.g. `1_000.5`.
///
/// Only the prefix before the first underscore is numeric, which is what
/// casting such a string to a float yields.
fn separated_float(value: &str) -> Option<f64> {
    let unsigned = value
        .strip_prefix('-')
        .or_else(|| value.strip_prefix('+'))
        .unwrap_or(value);
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let integer_ok = integer.bytes().next().is_some_and(|b| b.is_ascii_digit())
        && integer.bytes().all(|b| b.is_ascii_digit() || b == b'_');
    let fraction_ok = fraction.is_none_or(|fraction| {
        !fraction.is_empty() && fraction.bytes().all(|b| b.is_ascii_digit() || b == b'_')
    });
    if !integer_ok || !fraction_ok {
        return None;
    }

    let numeric_prefix: String = value.chars().take_while(|c| *c != '_').collect();
    numeric_prefix.trim_end_matches('.').parse().ok()
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn float(raw: &str) -> f64 {
        match Scalar::phpize(raw) {
            Scalar::Float(value) => value,
            other => panic!("Expected float for {raw:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_phpize_keywords() {
        assert_eq!(Scalar::phpize("null"), Scalar::Null);
        assert_eq!(Scalar::phpize("NULL"), Scalar::Null);
        assert_eq!(Scalar::phpize("true"), Scalar::Bool(true));
        assert_eq!(Scalar::phpize("False"), Scalar::Bool(false));
    }

    #[test]
    fn test_phpize_integers() {
        assert_eq!(Scalar::phpize("0"), Scalar::Int(0));
        assert_eq!(Scalar::phpize("123"), Scalar::Int(123));
        assert_eq!(Scalar::phpize("-123"), Scalar::Int(-123));
        assert_eq!(Scalar::phpize("0123"), Scalar::Int(83));
        assert_eq!(Scalar::phpize("-012"), Scalar::Int(-10));
        assert_eq!(Scalar::phpize("0b0110"), Scalar::Int(6));
        assert_eq!(Scalar::phpize("0xFF"), Scalar::Int(255));
    }

    #[test]
    fn test_phpize_integer_overflow_keeps_text() {
        assert_eq!(
            Scalar::phpize("99999999999999999999"),
            Scalar::String("99999999999999999999".to_string())
        );
    }

    #[test]
    fn test_phpize_floats() {
        assert!(approx_eq!(f64, float("1.5"), 1.5));
        assert!(approx_eq!(f64, float("-1.5"), -1.5));
        assert!(approx_eq!(f64, float(".5"), 0.5));
        assert!(approx_eq!(f64, float("1e3"), 1000.0));
        assert!(approx_eq!(f64, float("+5"), 5.0));
        assert!(approx_eq!(f64, float("1_000.5"), 1.0));
    }

    #[test]
    fn test_phpize_strings() {
        assert_eq!(Scalar::phpize("foo"), Scalar::String("foo".to_string()));
        assert_eq!(Scalar::phpize(""), Scalar::String(String::new()));
        assert_eq!(Scalar::phpize(" foo "), Scalar::String(" foo ".to_string()));
        assert_eq!(Scalar::phpize("0b"), Scalar::String("0b".to_string()));
        assert_eq!(Scalar::phpize("0x"), Scalar::String("0x".to_string()));
        assert_eq!(Scalar::phpize("1.2.3"), Scalar::String("1.2.3".to_string()));
        assert_eq!(Scalar::phpize("089"), Scalar::String("089".to_string()));
    }

    #[test]
    fn test_as_bool() {
        assert!(!Scalar::Null.as_bool());
        assert!(!Scalar::String("0".to_string()).as_bool());
        assert!(!Scalar::String(String::new()).as_bool());
        assert!(Scalar::String("yes".to_string()).as_bool());
        assert!(Scalar::Int(2).as_bool());
        assert!(!Scalar::Float(0.0).as_bool());
    }

    #[test]
    fn test_display() {
        assert_eq!(Scalar::Null.to_string(), "null");
        assert_eq!(Scalar::Bool(true).to_string(), "true");
        assert_eq!(Scalar::Int(-4).to_string(), "-4");
        assert_eq!(Scalar::from("abc").to_string(), "abc");
    }

    proptest! {
        #[test]
        fn prop_decimal_integers_round_trip(value in 1i64..i64::MAX) {
            prop_assert_eq!(Scalar::phpize(&value.to_string()), Scalar::Int(value));
            prop_assert_eq!(Scalar::phpize(&(-value).to_string()), Scalar::Int(-value));
        }

        #[test]
        fn prop_letter_words_stay_strings(word in "[g-z]{1,12}") {
            prop_assume!(!["null", "true", "false"].contains(&word.to_ascii_lowercase().as_str()));
            prop_assert_eq!(Scalar::phpize(&word), Scalar::String(word.clone()));
        }
    }
}
