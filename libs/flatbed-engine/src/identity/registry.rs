use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use flatbed_api::context::FileContext;
use flatbed_api::error::ConfigurationError;

/// Builds a fresh, fully configured script engine.
pub type EngineFactory = Arc<dyn Fn() -> rhai::Engine + Send + Sync>;

pub const DEFAULT_ENGINE: &str = "rhai";

/// Script engines by name.
///
/// Constructed by the layout loader and passed by reference to every
/// `ScriptIdentity`; each identity gets its own engine instance.
#[derive(Clone)]
pub struct ScriptEngineRegistry {
    factories: HashMap<String, EngineFactory>,
}

impl Default for ScriptEngineRegistry {
    /// Registry knowing the standard `rhai` engine.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(DEFAULT_ENGINE, Arc::new(standard_engine));
        registry
    }
}

impl ScriptEngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with no engines at all.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, factory: EngineFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Instantiate the engine registered as `name`.
    pub fn create(&self, name: &str) -> Result<rhai::Engine, ConfigurationError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| ConfigurationError::UnknownEngine(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ScriptEngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptEngineRegistry")
            .field("engines", &self.names())
            .finish()
    }
}

/// Rhai engine with the `FileContext` type exposed to scripts.
///
/// Scripts see `ctx.last_line` (empty before the first line),
/// `ctx.line_number` and `ctx.has_last_line()`.
pub fn standard_engine() -> rhai::Engine {
    let mut engine = rhai::Engine::new();
    engine
        .register_type_with_name::<FileContext>("FileContext")
        .register_get("last_line", |ctx: &mut FileContext| {
            ctx.last_line().unwrap_or_default().to_string()
        })
        .register_get("line_number", |ctx: &mut FileContext| ctx.line_number() as i64)
        .register_fn("has_last_line", |ctx: &mut FileContext| ctx.last_line().is_some());
    engine
}
