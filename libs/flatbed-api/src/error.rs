use std::fmt;

/// Layout cannot be assembled: unknown engine or converter, bad script,
/// unreadable resource, malformed field. Fatal at load time.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("script engine '{0}' could not be found")]
    UnknownEngine(String),

    #[error("script failed to compile: {message}")]
    ScriptCompile { message: String },

    #[error("script failed to evaluate: {message}")]
    ScriptEval { message: String },

    #[error("failed to load script file '{path}': {source}")]
    ScriptResource {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("field '{field}' has zero length")]
    ZeroLengthField { field: String },

    #[error("field '{field}' references unknown converter '{converter}'")]
    UnknownConverter { field: String, converter: String },

    #[error("field '{field}' has an invalid conversion option: {source}")]
    InvalidOption {
        field: String,
        #[source]
        source: ConversionError,
    },

    #[error("{0}")]
    Invalid(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ConfigurationError>,
    },
}

impl ConfigurationError {
    /// Add context to the error.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        ConfigurationError::Context {
            context: ctx.to_string(),
            source: Box::new(self),
        }
    }
}

/// A field's text cannot be parsed into its declared type, or a value
/// cannot be rendered back. Recoverable per field or per record.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("cannot convert '{text}' to {target}")]
    Malformed { text: String, target: &'static str },

    #[error("'{text}' is out of range for {target}")]
    OutOfRange { text: String, target: &'static str },

    #[error("expected a {expected} value, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid value '{value}' for option '{name}'")]
    InvalidOption { name: String, value: String },

    #[error("value '{text}' does not fit in {length} characters")]
    Overflow { text: String, length: usize },

    #[error("record '{record}' expects a {expected} character line, got {actual}")]
    LineLength {
        record: String,
        expected: usize,
        actual: usize,
    },

    #[error("record '{record}' has {expected} fields, got {actual} values")]
    FieldCount {
        record: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown converter '{0}'")]
    UnknownConverter(String),

    #[error("field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<ConversionError>,
    },
}

impl ConversionError {
    pub fn malformed(text: impl Into<String>, target: &'static str) -> Self {
        ConversionError::Malformed {
            text: text.into(),
            target,
        }
    }

    pub fn out_of_range(text: impl Into<String>, target: &'static str) -> Self {
        ConversionError::OutOfRange {
            text: text.into(),
            target,
        }
    }

    pub fn invalid_option(name: impl Into<String>, value: impl Into<String>) -> Self {
        ConversionError::InvalidOption {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Wrap the error with the name of the field being converted.
    pub fn for_field(self, field: impl Into<String>) -> Self {
        ConversionError::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }

    /// The raw text that failed to convert, looking through field context.
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            ConversionError::Malformed { text, .. }
            | ConversionError::OutOfRange { text, .. }
            | ConversionError::Overflow { text, .. } => Some(text),
            ConversionError::Field { source, .. } => source.raw_text(),
            _ => None,
        }
    }

    /// Name of the field the error was raised for, if known.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConversionError::Field { field, .. } => Some(field),
            _ => None,
        }
    }

    /// The innermost error, with field context stripped.
    pub fn root(&self) -> &ConversionError {
        match self {
            ConversionError::Field { source, .. } => source.root(),
            other => other,
        }
    }
}

/// An identity could not be evaluated for a line.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error(
        "record '{record}' has a script identity that does not return a boolean value - a {type_name} was returned"
    )]
    UnexpectedReturnType { record: String, type_name: String },

    #[error("record '{record}': identity evaluation failed: {message}")]
    Invocation {
        record: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ParserError {
    pub fn invocation(record: impl Into<String>, message: impl Into<String>) -> Self {
        ParserError::Invocation {
            record: record.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn record(&self) -> &str {
        match self {
            ParserError::UnexpectedReturnType { record, .. } | ParserError::Invocation { record, .. } => {
                record
            }
        }
    }
}
