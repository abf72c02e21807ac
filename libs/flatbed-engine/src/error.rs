use flatbed_api::error::{ConfigurationError, ConversionError, ParserError};

/// Identity resolution failed for a line.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No record definition's identity matched. The caller decides whether
    /// this is fatal or skippable.
    #[error("line {line_number} matched no record definition: '{line}'")]
    Unmatched { line_number: u64, line: String },

    #[error(transparent)]
    Parser(#[from] ParserError),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("parser error: {0}")]
    Parser(#[from] ParserError),

    #[error("{0}")]
    Unmatched(ResolveError),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ResolveError> for EngineError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Parser(p) => EngineError::Parser(p),
            unmatched => EngineError::Unmatched(unmatched),
        }
    }
}

impl EngineError {
    /// Add context to the error.
    ///
    /// For `Configuration` the context is attached to the inner error;
    /// `RecordNotFound` gets it prepended.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Configuration(e) => EngineError::Configuration(e.with_context(ctx)),
            EngineError::RecordNotFound(msg) => EngineError::RecordNotFound(format!("{ctx}: {msg}")),
            other => other,
        }
    }

    /// True for a line no record matched.
    pub fn is_unmatched(&self) -> bool {
        matches!(self, EngineError::Unmatched(ResolveError::Unmatched { .. }))
    }
}
