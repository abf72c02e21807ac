use std::sync::Arc;

use crate::converter::ConverterRegistry;

/// Per-run parsing state shared with identity strategies.
///
/// The outer parsing loop calls `advance()` once per physical line, after the
/// line has been resolved and decoded. While a line is being resolved,
/// `last_line()` therefore returns the line before it.
///
/// Must not be advanced while an identity evaluation is reading it; the
/// borrow rules enforce this for a single context.
#[derive(Debug, Clone)]
pub struct FileContext {
    last_line: Option<String>,
    line_number: u64,
    converters: Arc<ConverterRegistry>,
}

impl FileContext {
    pub fn new(converters: Arc<ConverterRegistry>) -> Self {
        Self {
            last_line: None,
            line_number: 0,
            converters,
        }
    }

    /// Record `line` as consumed.
    pub fn advance(&mut self, line: &str) {
        self.last_line = Some(line.to_string());
        self.line_number += 1;
    }

    /// The most recently consumed line, if any.
    pub fn last_line(&self) -> Option<&str> {
        self.last_line.as_deref()
    }

    /// Number of lines consumed so far.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    pub fn converters(&self) -> &Arc<ConverterRegistry> {
        &self.converters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_tracks_previous_line() {
        let mut ctx = FileContext::new(Arc::new(ConverterRegistry::new()));
        assert_eq!(ctx.last_line(), None);
        assert_eq!(ctx.line_number(), 0);

        ctx.advance("HDR 2020");
        ctx.advance("DTL 0001");
        assert_eq!(ctx.last_line(), Some("DTL 0001"));
        assert_eq!(ctx.line_number(), 2);
    }
}
