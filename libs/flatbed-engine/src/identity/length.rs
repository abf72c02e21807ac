use flatbed_api::context::FileContext;
use flatbed_api::error::{ConfigurationError, ParserError};
use flatbed_api::identity::Identity;
use flatbed_api::schema::RecordDefinition;

/// Matches lines whose character count lies within `min..=max`.
#[derive(Debug, Clone, Copy)]
pub struct LengthIdentity {
    min: usize,
    max: usize,
}

impl LengthIdentity {
    pub fn new(min: usize, max: usize) -> Result<Self, ConfigurationError> {
        if min > max {
            return Err(ConfigurationError::Invalid(format!(
                "length identity minimum {min} exceeds maximum {max}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Matches lines of exactly `length` characters.
    pub fn exact(length: usize) -> Self {
        Self {
            min: length,
            max: length,
        }
    }
}

impl Identity for LengthIdentity {
    fn matches(
        &self,
        _record: &RecordDefinition,
        _context: &FileContext,
        line: &str,
    ) -> Result<bool, ParserError> {
        let len = line.chars().count();
        Ok((self.min..=self.max).contains(&len))
    }
}
