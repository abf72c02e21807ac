use std::fmt;

use crate::context::FileContext;
use crate::error::ParserError;
use crate::schema::RecordDefinition;

/// Pluggable predicate deciding whether a raw line belongs to a record.
///
/// `record` is the definition owning this identity (for error context),
/// `context` carries cross-line state. Implementations must be safe to call
/// from several parsing sessions at once; any internal state that is not
/// (an embedded script session) has to be serialized by the implementation.
pub trait Identity: Send + Sync + fmt::Debug {
    fn matches(
        &self,
        record: &RecordDefinition,
        context: &FileContext,
        line: &str,
    ) -> Result<bool, ParserError>;
}
