use std::collections::BTreeSet;

use flatbed_api::context::FileContext;
use flatbed_api::error::{ConfigurationError, ParserError};
use flatbed_api::identity::Identity;
use flatbed_api::schema::RecordDefinition;

/// Matches when the characters at `start..start + length` equal one of the
/// configured identities.
///
/// Pure string comparison: no side effects, no context access. A line too
/// short to contain the slice never matches.
#[derive(Debug, Clone)]
pub struct FieldIdentity {
    start: usize,
    length: usize,
    identities: BTreeSet<String>,
    ignore_case: bool,
}

impl FieldIdentity {
    pub fn new(
        start: usize,
        length: usize,
        identities: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, ConfigurationError> {
        let identities: BTreeSet<String> = identities.into_iter().map(Into::into).collect();
        if identities.is_empty() {
            return Err(ConfigurationError::Invalid(
                "field identity needs at least one match value".into(),
            ));
        }
        if length == 0 {
            return Err(ConfigurationError::Invalid(
                "field identity length must be greater than zero".into(),
            ));
        }
        Ok(Self {
            start,
            length,
            identities,
            ignore_case: false,
        })
    }

    /// Compare ignoring ASCII case.
    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.identities.iter().map(String::as_str)
    }

    fn slice<'a>(&self, line: &'a str) -> Option<&'a str> {
        let mut indices = line.char_indices().map(|(i, _)| i).chain(std::iter::once(line.len()));
        let begin = indices.nth(self.start)?;
        let end = indices.nth(self.length - 1)?;
        Some(&line[begin..end])
    }

    fn is_match(&self, candidate: &str) -> bool {
        if self.ignore_case {
            self.identities.iter().any(|id| id.eq_ignore_ascii_case(candidate))
        } else {
            self.identities.contains(candidate)
        }
    }
}

impl Identity for FieldIdentity {
    fn matches(
        &self,
        _record: &RecordDefinition,
        _context: &FileContext,
        line: &str,
    ) -> Result<bool, ParserError> {
        Ok(self.slice(line).is_some_and(|s| self.is_match(s)))
    }
}
