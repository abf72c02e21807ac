//! Field and record level conversion: padding, default values, converter
//! dispatch and line slicing around the core converters.

use flatbed_api::converter::{ConverterRegistry, FieldConverter};
use flatbed_api::error::ConversionError;
use flatbed_api::schema::{FieldDescriptor, RecordDefinition};
use flatbed_api::value::{Row, Value};

use crate::justify::{pad, split_columns, strip_padding};

/// Decode one fixed-width slice into the field's typed value.
///
/// Padding is stripped per `justify` and `pad-character`; an empty result
/// is replaced by `default-value` when the field has one.
pub fn decode_field(
    field: &FieldDescriptor,
    converters: &ConverterRegistry,
    slice: &str,
) -> Result<Value, ConversionError> {
    decode_unlabeled(field, converters, slice).map_err(|e| e.for_field(field.name()))
}

/// Render `value` and pad it to the field's width.
pub fn encode_field(
    field: &FieldDescriptor,
    converters: &ConverterRegistry,
    value: &Value,
) -> Result<String, ConversionError> {
    encode_unlabeled(field, converters, value).map_err(|e| e.for_field(field.name()))
}

fn converter_for<'r>(
    field: &FieldDescriptor,
    converters: &'r ConverterRegistry,
) -> Result<&'r dyn FieldConverter, ConversionError> {
    converters
        .get(field.converter())
        .map(|c| c.as_ref())
        .ok_or_else(|| ConversionError::UnknownConverter(field.converter().to_string()))
}

fn decode_unlabeled(
    field: &FieldDescriptor,
    converters: &ConverterRegistry,
    slice: &str,
) -> Result<Value, ConversionError> {
    let options = field.options();
    let converter = converter_for(field, converters)?;

    let mut text = strip_padding(slice, options.justify()?, options.pad_character()?);
    if text.is_empty() {
        if let Some(default) = options.default_value() {
            text = default;
        }
    }
    converter.decode(text, options)
}

fn encode_unlabeled(
    field: &FieldDescriptor,
    converters: &ConverterRegistry,
    value: &Value,
) -> Result<String, ConversionError> {
    let options = field.options();
    let converter = converter_for(field, converters)?;

    let text = converter.encode(value, options)?;
    pad(&text, field.length(), options.justify()?, options.pad_character()?)
}

/// Whole-line codec for a record definition.
#[derive(Debug, Clone, Copy)]
pub struct RecordCodec<'r> {
    converters: &'r ConverterRegistry,
    enforce_line_length: bool,
}

impl<'r> RecordCodec<'r> {
    pub fn new(converters: &'r ConverterRegistry) -> Self {
        Self {
            converters,
            enforce_line_length: false,
        }
    }

    /// Reject lines whose width differs from the record's total field width.
    pub fn enforce_line_length(mut self, enforce: bool) -> Self {
        self.enforce_line_length = enforce;
        self
    }

    /// Slice `line` by field widths and decode every field in order.
    ///
    /// Errors name the field as `record.field`.
    pub fn decode(&self, record: &RecordDefinition, line: &str) -> Result<Row, ConversionError> {
        if self.enforce_line_length {
            let actual = line.chars().count();
            let expected = record.width();
            if actual != expected {
                return Err(ConversionError::LineLength {
                    record: record.name().to_string(),
                    expected,
                    actual,
                });
            }
        }

        let slices = split_columns(line, record.fields().iter().map(FieldDescriptor::length));
        record
            .fields()
            .iter()
            .zip(slices)
            .map(|(field, slice)| {
                decode_unlabeled(field, self.converters, slice)
                    .map_err(|e| e.for_field(qualified(record, field)))
            })
            .collect()
    }

    /// Encode `row` positionally into one line.
    pub fn encode(&self, record: &RecordDefinition, row: &Row) -> Result<String, ConversionError> {
        if row.len() != record.fields().len() {
            return Err(ConversionError::FieldCount {
                record: record.name().to_string(),
                expected: record.fields().len(),
                actual: row.len(),
            });
        }

        let mut line = String::with_capacity(record.width());
        for (field, value) in record.fields().iter().zip(&row.0) {
            let text = encode_unlabeled(field, self.converters, value)
                .map_err(|e| e.for_field(qualified(record, field)))?;
            line.push_str(&text);
        }
        Ok(line)
    }
}

fn qualified(record: &RecordDefinition, field: &FieldDescriptor) -> String {
    format!("{}.{}", record.name(), field.name())
}
