use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ConversionError;
use crate::option::ConversionOptions;
use crate::value::Value;

/// Field-level text ⇄ value converter for one domain type.
///
/// Solves one task: turn the text of a fixed-width slice into a typed value
/// and back, under the field's conversion options.
///
/// - `decode()` receives text that already had its padding stripped (and
///   `default-value` substituted) by the calling layer.
/// - `encode()` renders a value to bare text. Padding to the field width is
///   applied by the caller.
///
/// Implementations are stateless and shared across concurrent parses.
pub trait FieldConverter: Send + Sync {
    /// Name of the target type, used in error messages (`"integer"`, `"date"`).
    fn type_name(&self) -> &'static str;

    fn decode(&self, text: &str, options: &ConversionOptions) -> Result<Value, ConversionError>;

    fn encode(&self, value: &Value, options: &ConversionOptions) -> Result<String, ConversionError>;
}

/// Converters by name.
///
/// Built once while the layout is loaded and read-only afterwards; the same
/// converter instance may be registered under several names.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn FieldConverter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a converter. A repeated name replaces the earlier converter.
    pub fn register(&mut self, name: impl Into<String>, converter: Arc<dyn FieldConverter>) {
        self.converters.insert(name.into(), converter);
    }

    /// Register `alias` for the converter already known as `existing`.
    ///
    /// Returns `false` if `existing` is not registered.
    pub fn alias(&mut self, alias: impl Into<String>, existing: &str) -> bool {
        match self.converters.get(existing).cloned() {
            Some(converter) => {
                self.converters.insert(alias.into(), converter);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn FieldConverter>> {
        self.converters.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.converters.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.converters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("converters", &self.names())
            .finish()
    }
}
