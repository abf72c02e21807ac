use flatbed_api::converter::FieldConverter;
use flatbed_api::error::ConversionError;
use flatbed_api::option::ConversionOptions;
use flatbed_api::value::Value;

use super::{is_decimal_literal, parse_digits, type_mismatch, without_negative_zero};

/// `f32` with optional implied decimal point.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatConverter;

/// `f64` with optional implied decimal point.
///
/// With `decimal-implied=true` the text is a bare integer and the point sits
/// `decimal-places` digits from the right: `123456` with two places is
/// `1234.56`. Otherwise the text is a literal decimal number and encoding
/// writes exactly `decimal-places` fraction digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleConverter;

impl FieldConverter for FloatConverter {
    fn type_name(&self) -> &'static str {
        "float"
    }

    fn decode(&self, text: &str, options: &ConversionOptions) -> Result<Value, ConversionError> {
        // Implied values are divided in f64 so a single rounding happens at the cast.
        let value = decode_f64(text, options, self.type_name(), |t| t.parse::<f32>().map(f64::from).ok())?;
        let narrowed = value as f32;
        if !narrowed.is_finite() {
            return Err(ConversionError::out_of_range(text, self.type_name()));
        }
        Ok(Value::Float(narrowed))
    }

    fn encode(&self, value: &Value, options: &ConversionOptions) -> Result<String, ConversionError> {
        match value {
            Value::Float(v) => encode_f64(f64::from(*v), options, self.type_name()),
            Value::Null => Ok(String::new()),
            other => Err(type_mismatch(self.type_name(), other)),
        }
    }
}

impl FieldConverter for DoubleConverter {
    fn type_name(&self) -> &'static str {
        "double"
    }

    fn decode(&self, text: &str, options: &ConversionOptions) -> Result<Value, ConversionError> {
        decode_f64(text, options, self.type_name(), |t| t.parse::<f64>().ok()).map(Value::Double)
    }

    fn encode(&self, value: &Value, options: &ConversionOptions) -> Result<String, ConversionError> {
        match value {
            Value::Double(v) => encode_f64(*v, options, self.type_name()),
            Value::Float(v) => encode_f64(f64::from(*v), options, self.type_name()),
            Value::Null => Ok(String::new()),
            other => Err(type_mismatch(self.type_name(), other)),
        }
    }
}

fn decode_f64(
    text: &str,
    options: &ConversionOptions,
    target: &'static str,
    literal: impl Fn(&str) -> Option<f64>,
) -> Result<f64, ConversionError> {
    let implied = options.decimal_implied()?;
    let places = options.decimal_places()?;

    if text.is_empty() {
        return Ok(0.0);
    }

    let value = if implied {
        let units = parse_digits(text, target)?;
        units as f64 / scale(places)
    } else {
        if !is_decimal_literal(text) {
            return Err(ConversionError::malformed(text, target));
        }
        literal(text).ok_or_else(|| ConversionError::malformed(text, target))?
    };

    if !value.is_finite() {
        return Err(ConversionError::out_of_range(text, target));
    }
    Ok(value)
}

fn encode_f64(value: f64, options: &ConversionOptions, target: &'static str) -> Result<String, ConversionError> {
    let implied = options.decimal_implied()?;
    let places = options.decimal_places()?;

    let shifted = if implied { value * scale(places) } else { value };
    if !shifted.is_finite() {
        return Err(ConversionError::out_of_range(value.to_string(), target));
    }

    let rendered = if implied {
        format!("{shifted:.0}")
    } else {
        let places = places as usize;
        format!("{value:.places$}")
    };
    Ok(without_negative_zero(rendered))
}

/// `10^places`; `places` is bounded by `MAX_DECIMAL_PLACES`, so the exponent fits.
fn scale(places: u32) -> f64 {
    10f64.powi(places as i32)
}
