use flatbed_api::converter::FieldConverter;
use flatbed_api::error::ConversionError;
use flatbed_api::option::ConversionOptions;
use flatbed_api::value::Value;

/// Text passes through unchanged; padding is handled by the caller.
///
/// Encoding accepts any value and renders its display form.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringConverter;

impl FieldConverter for StringConverter {
    fn type_name(&self) -> &'static str {
        "string"
    }

    fn decode(&self, text: &str, _options: &ConversionOptions) -> Result<Value, ConversionError> {
        Ok(Value::String(text.to_string()))
    }

    fn encode(&self, value: &Value, _options: &ConversionOptions) -> Result<String, ConversionError> {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trips() {
        let opts = ConversionOptions::new();
        let value = StringConverter.decode("CNY", &opts).unwrap();
        assert_eq!(value, Value::from("CNY"));
        assert_eq!(StringConverter.encode(&value, &opts).unwrap(), "CNY");
    }

    #[test]
    fn null_encodes_empty() {
        let opts = ConversionOptions::new();
        assert_eq!(StringConverter.encode(&Value::Null, &opts).unwrap(), "");
        assert_eq!(StringConverter.encode(&Value::Long(7), &opts).unwrap(), "7");
    }
}
