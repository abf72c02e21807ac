//! Shared contracts for the flatbed fixed-width codec.
//!
//! Everything the engine, layout loaders and callers agree on lives here:
//! typed values, conversion options, the converter and identity traits,
//! record/field definitions and the per-run file context.

pub mod context;
pub mod converter;
pub mod error;
pub mod identity;
pub mod option;
pub mod schema;
pub mod value;

pub use context::FileContext;
pub use converter::{ConverterRegistry, FieldConverter};
pub use error::{ConfigurationError, ConversionError, ParserError};
pub use identity::Identity;
pub use option::{ConversionOption, ConversionOptions, Justify};
pub use schema::{FieldDescriptor, RecordDefinition};
pub use value::{Row, Value};
