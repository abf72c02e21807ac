use rust_decimal::{Decimal, RoundingStrategy};

use flatbed_api::converter::FieldConverter;
use flatbed_api::error::ConversionError;
use flatbed_api::option::{ConversionOptions, DECIMAL_PLACES, MAX_DECIMAL_PLACES};
use flatbed_api::value::Value;

use super::{is_decimal_literal, parse_digits, type_mismatch, without_negative_zero};

/// Fraction digits written when `decimal-places` is not configured.
pub const LEGACY_FRACTION_DIGITS: u32 = 2;

/// Significant digits a `Decimal` mantissa always holds.
const MAX_PRECISION: usize = 28;

/// Fixed-point decimal, exact in both directions.
///
/// Same two modes as the floating-point converters:
/// - implied: text is a bare integer, the point is shifted `decimal-places`
///   digits left on decode; encode shifts right and rounds to a whole
///   number, ties toward zero.
/// - literal: text is a decimal number (scientific notation accepted).
///   Values needing more than 28 significant digits, or a scale above 28,
///   are out of range rather than rounded.
///   Encode writes exactly `decimal-places` fraction digits when the option
///   is set; without it, at most two with trailing zeros dropped (the
///   `0.##` output existing files were written with). Ties round toward zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalConverter;

impl FieldConverter for DecimalConverter {
    fn type_name(&self) -> &'static str {
        "decimal"
    }

    fn decode(&self, text: &str, options: &ConversionOptions) -> Result<Value, ConversionError> {
        let implied = options.decimal_implied()?;
        let places = options.decimal_places()?;

        if text.is_empty() {
            return Ok(Value::Decimal(Decimal::ZERO));
        }

        let value = if implied {
            let units = parse_digits(text, self.type_name())?;
            Decimal::try_from_i128_with_scale(units, places)
                .map_err(|_| ConversionError::out_of_range(text, self.type_name()))?
        } else {
            if !is_decimal_literal(text) {
                return Err(ConversionError::malformed(text, self.type_name()));
            }
            parse_literal(text).ok_or_else(|| ConversionError::out_of_range(text, self.type_name()))?
        };
        Ok(Value::Decimal(value))
    }

    fn encode(&self, value: &Value, options: &ConversionOptions) -> Result<String, ConversionError> {
        let value = match value {
            Value::Decimal(d) => *d,
            Value::Int(v) => Decimal::from(*v),
            Value::Long(v) => Decimal::from(*v),
            Value::Null => return Ok(String::new()),
            other => return Err(type_mismatch(self.type_name(), other)),
        };

        let rendered = if options.decimal_implied()? {
            let places = options.decimal_places()?;
            let scaled = value
                .checked_mul(pow10(places)?)
                .ok_or_else(|| ConversionError::out_of_range(value.to_string(), self.type_name()))?;
            scaled
                .round_dp_with_strategy(0, RoundingStrategy::MidpointTowardZero)
                .to_string()
        } else {
            match options.configured_decimal_places()? {
                Some(places) => {
                    let mut rounded =
                        value.round_dp_with_strategy(places, RoundingStrategy::MidpointTowardZero);
                    rounded.rescale(places);
                    rounded.to_string()
                }
                None => value
                    .round_dp_with_strategy(LEGACY_FRACTION_DIGITS, RoundingStrategy::MidpointTowardZero)
                    .normalize()
                    .to_string(),
            }
        };
        Ok(without_negative_zero(rendered))
    }
}

/// Exact value of a literal that already passed the grammar check, or `None`
/// when it does not fit a `Decimal` without rounding.
fn parse_literal(text: &str) -> Option<Decimal> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((m, e)) => (m, e.parse::<i64>().ok()?),
        None => (unsigned, 0),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let mut digits = format!("{whole}{fraction}");
    let mut scale = i64::try_from(fraction.len()).ok()?.checked_sub(exponent)?;
    let max_scale = i64::from(MAX_DECIMAL_PLACES);

    if digits.bytes().all(|b| b == b'0') {
        let scale = u32::try_from(scale.clamp(0, max_scale)).ok()?;
        return Some(Decimal::new(0, scale));
    }

    // Fraction zeros carry no value; drop them while the literal is too wide.
    while scale > 0
        && digits.ends_with('0')
        && (scale > max_scale || digits.trim_start_matches('0').len() > MAX_PRECISION)
    {
        digits.pop();
        scale -= 1;
    }
    if scale > max_scale || scale < -max_scale {
        return None;
    }
    if scale < 0 {
        digits.extend(std::iter::repeat_n('0', usize::try_from(-scale).ok()?));
        scale = 0;
    }

    let significant = digits.trim_start_matches('0');
    if significant.len() > MAX_PRECISION {
        return None;
    }
    let units = significant.parse::<i128>().ok()?;
    let units = if negative { -units } else { units };
    Decimal::try_from_i128_with_scale(units, u32::try_from(scale).ok()?).ok()
}

fn pow10(places: u32) -> Result<Decimal, ConversionError> {
    10i128
        .checked_pow(places)
        .and_then(|p| Decimal::try_from_i128_with_scale(p, 0).ok())
        .ok_or_else(|| ConversionError::invalid_option(DECIMAL_PLACES, places.to_string()))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use flatbed_api::option::DECIMAL_IMPLIED;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn implied(places: &str) -> ConversionOptions {
        ConversionOptions::new()
            .with(DECIMAL_IMPLIED, "true")
            .with(DECIMAL_PLACES, places)
    }

    #[test]
    fn implied_decode_is_exact() {
        let value = DecimalConverter.decode("0000000090123489", &implied("2")).unwrap();
        assert_eq!(value, Value::Decimal(dec("901234.89")));
    }

    #[test]
    fn implied_encode_rounds_half_toward_zero() {
        let opts = implied("2");
        let enc = |s: &str| DecimalConverter.encode(&Value::Decimal(dec(s)), &opts).unwrap();
        assert_eq!(enc("112233.80"), "11223380");
        assert_eq!(enc("1.005"), "100");
        assert_eq!(enc("1.0051"), "101");
        assert_eq!(enc("-1.005"), "-100");
    }

    #[test]
    fn literal_decode_preserves_precision() {
        let opts = ConversionOptions::new();
        let value = DecimalConverter.decode("0.1000000000000000000001", &opts).unwrap();
        assert_eq!(value, Value::Decimal(dec("0.1000000000000000000001")));

        let value = DecimalConverter.decode("1.5E3", &opts).unwrap();
        assert_eq!(value, Value::Decimal(dec("1500")));

        let value = DecimalConverter.decode("-2.50e-3", &opts).unwrap();
        assert_eq!(value, Value::Decimal(dec("-0.00250")));

        let value = DecimalConverter.decode("12.50", &opts).unwrap();
        assert_eq!(value.to_string(), "12.50");

        let value = DecimalConverter.decode(&format!("1.{}", "0".repeat(35)), &opts).unwrap();
        assert_eq!(value, Value::Decimal(Decimal::ONE));
    }

    #[test]
    fn literal_beyond_precision_is_out_of_range() {
        let opts = ConversionOptions::new();
        for text in [
            "1234567890.12345678901234567890123",
            "123456789012345678901234567890",
            "1e-29",
            "1e29",
            "5e99999999999999999999",
        ] {
            let err = DecimalConverter.decode(text, &opts).unwrap_err();
            assert!(matches!(err, ConversionError::OutOfRange { target: "decimal", .. }), "{text}");
            assert_eq!(err.raw_text(), Some(text));
        }

        let err = DecimalConverter
            .decode(&"9".repeat(30), &implied("2"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::OutOfRange { .. }));
    }

    #[test]
    fn text_outside_the_number_grammar_is_malformed() {
        let opts = ConversionOptions::new();
        for text in ["1_000", "1,000", "inf", "NaN", "1e", " 1", "0x10"] {
            let err = DecimalConverter.decode(text, &opts).unwrap_err();
            assert!(matches!(err, ConversionError::Malformed { target: "decimal", .. }), "{text}");
        }
    }

    #[test]
    fn literal_encode_without_places_keeps_legacy_output() {
        let opts = ConversionOptions::new();
        let enc = |s: &str| DecimalConverter.encode(&Value::Decimal(dec(s)), &opts).unwrap();
        assert_eq!(enc("12.50"), "12.5");
        assert_eq!(enc("100.00"), "100");
        assert_eq!(enc("3.14159"), "3.14");
        assert_eq!(enc("2.125"), "2.12");
    }

    #[test]
    fn literal_encode_honors_configured_places() {
        let opts = ConversionOptions::new().with(DECIMAL_PLACES, "4");
        let text = DecimalConverter.encode(&Value::Decimal(dec("12.5")), &opts).unwrap();
        assert_eq!(text, "12.5000");
        assert_eq!(
            DecimalConverter.decode(&text, &opts).unwrap(),
            Value::Decimal(dec("12.5"))
        );
    }

    #[test]
    fn blank_decodes_to_zero() {
        assert_eq!(
            DecimalConverter.decode("", &implied("2")).unwrap(),
            Value::Decimal(Decimal::ZERO)
        );
    }

    #[test]
    fn malformed_text_is_rejected() {
        let err = DecimalConverter.decode("12x", &ConversionOptions::new()).unwrap_err();
        assert_eq!(err.raw_text(), Some("12x"));
        assert!(DecimalConverter.decode("1.5", &implied("2")).is_err());
    }

    #[test]
    fn excessive_places_are_rejected() {
        let err = DecimalConverter
            .encode(&Value::Decimal(Decimal::ONE), &implied("40"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::InvalidOption { .. }));

        let literal = ConversionOptions::new().with(DECIMAL_PLACES, "30");
        assert!(matches!(
            DecimalConverter.encode(&Value::Decimal(Decimal::ONE), &literal),
            Err(ConversionError::InvalidOption { .. })
        ));
        assert!(matches!(
            DecimalConverter.decode("1", &implied("30")),
            Err(ConversionError::InvalidOption { .. })
        ));

        let widest = ConversionOptions::new().with(DECIMAL_PLACES, "28");
        let text = DecimalConverter.encode(&Value::Decimal(Decimal::ONE), &widest).unwrap();
        assert_eq!(text, format!("1.{}", "0".repeat(28)));
    }
}
