use crate::error::ConfigurationError;
use crate::identity::Identity;
use crate::option::ConversionOptions;

/// A single fixed-width field.
///
/// `length` is the number of characters consumed on decode and padded to on
/// encode. `converter` names an entry in the `ConverterRegistry`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    length: usize,
    converter: String,
    options: ConversionOptions,
}

impl FieldDescriptor {
    /// Zero-length fields are rejected.
    pub fn new(
        name: impl Into<String>,
        length: usize,
        converter: impl Into<String>,
        options: ConversionOptions,
    ) -> Result<Self, ConfigurationError> {
        let name = name.into();
        if length == 0 {
            return Err(ConfigurationError::ZeroLengthField { field: name });
        }
        Ok(Self {
            name,
            length,
            converter: converter.into(),
            options,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn converter(&self) -> &str {
        &self.converter
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }
}

/// Schema of one line shape: how to recognize it and how to convert its fields.
///
/// Field position in `fields` determines its index in the decoded `Row`.
/// A record without identities matches every line; callers order such
/// records last.
#[derive(Debug)]
pub struct RecordDefinition {
    name: String,
    identities: Vec<Box<dyn Identity>>,
    fields: Vec<FieldDescriptor>,
}

impl RecordDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identities: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_identity(mut self, identity: impl Identity + 'static) -> Self {
        self.identities.push(Box::new(identity));
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn push_identity(&mut self, identity: Box<dyn Identity>) {
        self.identities.push(identity);
    }

    pub fn push_field(&mut self, field: FieldDescriptor) {
        self.fields.push(field);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identities(&self) -> &[Box<dyn Identity>] {
        &self.identities
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Position of the field named `name`.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Total line width in characters.
    pub fn width(&self) -> usize {
        self.fields.iter().map(|f| f.length).sum()
    }

    pub fn is_unconditional(&self) -> bool {
        self.identities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_field_is_rejected() {
        let err = FieldDescriptor::new("id", 0, "char", ConversionOptions::new()).unwrap_err();
        assert!(matches!(err, ConfigurationError::ZeroLengthField { ref field } if field == "id"));
    }

    #[test]
    fn width_sums_field_lengths() {
        let record = RecordDefinition::new("msg")
            .with_field(FieldDescriptor::new("id", 16, "char", ConversionOptions::new()).unwrap())
            .with_field(FieldDescriptor::new("ccy", 3, "char", ConversionOptions::new()).unwrap());
        assert_eq!(record.width(), 19);
        assert_eq!(record.field_index("ccy"), Some(1));
        assert!(record.is_unconditional());
    }
}
