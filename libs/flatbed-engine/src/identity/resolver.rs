use flatbed_api::context::FileContext;
use flatbed_api::schema::RecordDefinition;

use crate::error::ResolveError;

/// Pick the record definition that claims `line`.
///
/// Candidates are tried in declaration order and the first match wins. A
/// record without identities matches unconditionally, so it shadows every
/// record declared after it. Within a record, identities are alternatives:
/// any one matching is enough, and evaluation stops at the first hit.
///
/// An identity error aborts resolution for the line.
pub fn resolve<'a>(
    candidates: &'a [RecordDefinition],
    context: &FileContext,
    line: &str,
) -> Result<&'a RecordDefinition, ResolveError> {
    for record in candidates {
        if record.is_unconditional() {
            tracing::trace!(record = %record.name(), "unconditional record matched");
            return Ok(record);
        }
        for identity in record.identities() {
            if identity.matches(record, context, line)? {
                tracing::trace!(record = %record.name(), line = context.line_number() + 1, "record matched");
                return Ok(record);
            }
        }
    }

    Err(ResolveError::Unmatched {
        line_number: context.line_number() + 1,
        line: line.to_string(),
    })
}
