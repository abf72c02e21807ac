//! Core converter catalog: string, date, integer, long, float, double, decimal.

pub mod date;
pub mod decimal;
pub mod float;
pub mod integer;
pub mod text;

use std::sync::Arc;

use serde::Deserialize;

use flatbed_api::converter::{ConverterRegistry, FieldConverter};
use flatbed_api::error::ConversionError;
use flatbed_api::value::Value;

pub use date::DateConverter;
pub use decimal::DecimalConverter;
pub use float::{DoubleConverter, FloatConverter};
pub use integer::{IntegerConverter, LongConverter};
pub use text::StringConverter;

/// Converter kinds shipped with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoreKind {
    #[serde(alias = "string")]
    Char,
    Date,
    #[serde(alias = "integer")]
    Int,
    Long,
    Float,
    Double,
    #[serde(alias = "bigDecimal", alias = "big-decimal")]
    Decimal,
}

impl CoreKind {
    pub const ALL: [CoreKind; 7] = [
        CoreKind::Char,
        CoreKind::Date,
        CoreKind::Int,
        CoreKind::Long,
        CoreKind::Float,
        CoreKind::Double,
        CoreKind::Decimal,
    ];

    /// Canonical registry name.
    pub fn name(self) -> &'static str {
        match self {
            CoreKind::Char => "char",
            CoreKind::Date => "date",
            CoreKind::Int => "int",
            CoreKind::Long => "long",
            CoreKind::Float => "float",
            CoreKind::Double => "double",
            CoreKind::Decimal => "decimal",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            CoreKind::Char => &["string"],
            CoreKind::Int => &["integer"],
            CoreKind::Decimal => &["bigDecimal", "big-decimal"],
            _ => &[],
        }
    }

    pub fn converter(self) -> Arc<dyn FieldConverter> {
        match self {
            CoreKind::Char => Arc::new(StringConverter),
            CoreKind::Date => Arc::new(DateConverter),
            CoreKind::Int => Arc::new(IntegerConverter),
            CoreKind::Long => Arc::new(LongConverter),
            CoreKind::Float => Arc::new(FloatConverter),
            CoreKind::Double => Arc::new(DoubleConverter),
            CoreKind::Decimal => Arc::new(DecimalConverter),
        }
    }
}

/// Registry holding every core converter under its canonical name and aliases.
pub fn core_registry() -> ConverterRegistry {
    let mut registry = ConverterRegistry::new();
    for kind in CoreKind::ALL {
        registry.register(kind.name(), kind.converter());
        for alias in kind.aliases() {
            registry.alias(*alias, kind.name());
        }
    }
    registry
}

pub(crate) fn type_mismatch(expected: &'static str, found: &Value) -> ConversionError {
    ConversionError::TypeMismatch {
        expected,
        found: found.type_name(),
    }
}

/// Optional sign followed by ASCII digits only.
pub(crate) fn parse_digits(text: &str, target: &'static str) -> Result<i128, ConversionError> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConversionError::malformed(text, target));
    }
    text.parse::<i128>()
        .map_err(|_| ConversionError::out_of_range(text, target))
}

/// Optional sign, digits with an optional fraction, optional exponent.
///
/// At least one mantissa digit is required: `1.`, `.5` and `-2.5e-3` pass,
/// `1_000`, `inf` and `1e` do not.
pub(crate) fn is_decimal_literal(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((m, e)) => (m, Some(e)),
        None => (unsigned, None),
    };

    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.len() + fraction.len() == 0 || !all_digits(whole) || !all_digits(fraction) {
        return false;
    }

    match exponent {
        None => true,
        Some(e) => {
            let digits = e.strip_prefix(['+', '-']).unwrap_or(e);
            !digits.is_empty() && all_digits(digits)
        }
    }
}

/// `-0`, `-0.00` and friends render as their unsigned form.
pub(crate) fn without_negative_zero(rendered: String) -> String {
    match rendered.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => rendered,
    }
}
