//! Conversion and identity resolution for fixed-width flat files.
//!
//! A `Layout` is loaded once from configuration and shared; each input gets
//! its own `FileContext` from `Layout::new_context()`.

pub mod codec;
pub mod config;
pub mod converters;
pub mod error;
pub mod identity;
pub mod justify;
pub mod layout;
pub mod resource;

pub use codec::{decode_field, encode_field, RecordCodec};
pub use config::{ConfigParser, LayoutConfig, TomlParser};
pub use converters::{core_registry, CoreKind};
pub use error::{EngineError, ResolveError};
pub use identity::{resolve, FieldIdentity, LengthIdentity, ScriptEngineRegistry, ScriptIdentity};
pub use layout::{Layout, MatchedRecord};
pub use resource::{FsResolver, ResourceResolver};
