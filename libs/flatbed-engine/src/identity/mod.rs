//! Identity strategies and the resolver that applies them.

pub mod field;
pub mod length;
pub mod registry;
pub mod resolver;
pub mod script;

pub use field::FieldIdentity;
pub use length::LengthIdentity;
pub use registry::ScriptEngineRegistry;
pub use resolver::resolve;
pub use script::ScriptIdentity;
