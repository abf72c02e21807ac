use flatbed_api::converter::FieldConverter;
use flatbed_api::error::ConversionError;
use flatbed_api::option::ConversionOptions;
use flatbed_api::value::Value;

use super::type_mismatch;

/// Base-10 `i32`. Blank text decodes to `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerConverter;

/// Base-10 `i64`. Blank text decodes to `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongConverter;

impl FieldConverter for IntegerConverter {
    fn type_name(&self) -> &'static str {
        "integer"
    }

    fn decode(&self, text: &str, _options: &ConversionOptions) -> Result<Value, ConversionError> {
        if text.is_empty() {
            return Ok(Value::Int(0));
        }
        text.parse::<i32>()
            .map(Value::Int)
            .map_err(|_| ConversionError::malformed(text, self.type_name()))
    }

    fn encode(&self, value: &Value, _options: &ConversionOptions) -> Result<String, ConversionError> {
        match value {
            Value::Int(v) => Ok(v.to_string()),
            Value::Null => Ok(String::new()),
            other => Err(type_mismatch(self.type_name(), other)),
        }
    }
}

impl FieldConverter for LongConverter {
    fn type_name(&self) -> &'static str {
        "long"
    }

    fn decode(&self, text: &str, _options: &ConversionOptions) -> Result<Value, ConversionError> {
        if text.is_empty() {
            return Ok(Value::Long(0));
        }
        text.parse::<i64>()
            .map(Value::Long)
            .map_err(|_| ConversionError::malformed(text, self.type_name()))
    }

    fn encode(&self, value: &Value, _options: &ConversionOptions) -> Result<String, ConversionError> {
        match value {
            Value::Long(v) => Ok(v.to_string()),
            Value::Int(v) => Ok(v.to_string()),
            Value::Null => Ok(String::new()),
            other => Err(type_mismatch(self.type_name(), other)),
        }
    }
}
