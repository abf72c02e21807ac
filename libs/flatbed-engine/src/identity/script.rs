use std::fmt;
use std::sync::{Mutex, PoisonError};

use rhai::{CallFnOptions, Dynamic, Engine, Scope, AST};

use flatbed_api::context::FileContext;
use flatbed_api::error::{ConfigurationError, ParserError};
use flatbed_api::identity::Identity;
use flatbed_api::schema::RecordDefinition;

use super::registry::{ScriptEngineRegistry, DEFAULT_ENGINE};
use crate::resource::ResourceResolver;

/// Entry point invoked when no method name is configured.
pub const DEFAULT_METHOD: &str = "matches_line";

/// Compiled script state. A script engine session is not reentrant, so the
/// whole session sits behind one lock per identity.
struct ScriptSession {
    engine: Engine,
    ast: Option<AST>,
    scope: Scope<'static>,
}

/// Identity delegating to a user-supplied script function.
///
/// The entry point is called as `method(ctx, line)` and must return a
/// boolean or nothing (treated as `false`). Any other return type, or a
/// failed call, is a `ParserError` for that line.
///
/// Calls on one instance are serialized; distinct instances run in parallel.
pub struct ScriptIdentity {
    engine_name: String,
    method: String,
    script: Option<String>,
    script_file: Option<String>,
    session: Mutex<ScriptSession>,
}

impl ScriptIdentity {
    /// Bind the named engine (default `rhai`) and entry point (default
    /// `matches_line`). Blank names select the defaults.
    pub fn new(
        registry: &ScriptEngineRegistry,
        engine_name: Option<&str>,
        method: Option<&str>,
    ) -> Result<Self, ConfigurationError> {
        let engine_name = non_blank(engine_name).unwrap_or(DEFAULT_ENGINE).to_string();
        let method = non_blank(method).unwrap_or(DEFAULT_METHOD).to_string();
        let engine = registry.create(&engine_name)?;

        Ok(Self {
            engine_name,
            method,
            script: None,
            script_file: None,
            session: Mutex::new(ScriptSession {
                engine,
                ast: None,
                scope: Scope::new(),
            }),
        })
    }

    /// Bind, then compile `body` in one step.
    pub fn compile(
        registry: &ScriptEngineRegistry,
        engine_name: Option<&str>,
        method: Option<&str>,
        body: &str,
    ) -> Result<Self, ConfigurationError> {
        let mut identity = Self::new(registry, engine_name, method)?;
        identity.set_script(body)?;
        Ok(identity)
    }

    /// Compile `body` and run its top-level statements once.
    ///
    /// The scope left behind by the top level is kept for later calls.
    pub fn set_script(&mut self, body: &str) -> Result<(), ConfigurationError> {
        let session = self
            .session
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);

        let ast = session
            .engine
            .compile(body)
            .map_err(|e| ConfigurationError::ScriptCompile {
                message: e.to_string(),
            })?;

        let mut scope = Scope::new();
        session
            .engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|e| ConfigurationError::ScriptEval {
                message: e.to_string(),
            })?;

        session.ast = Some(ast);
        session.scope = scope;
        self.script = Some(body.to_string());

        tracing::debug!(engine = %self.engine_name, method = %self.method, "compiled identity script");
        Ok(())
    }

    /// Load the script through `resolver` (UTF-8 text), then `set_script`.
    pub fn set_script_file(
        &mut self,
        path: &str,
        resolver: &dyn ResourceResolver,
    ) -> Result<(), ConfigurationError> {
        let body = resolver
            .read_to_string(path)
            .map_err(|source| ConfigurationError::ScriptResource {
                path: path.to_string(),
                source,
            })?;
        self.set_script(&body)?;
        self.script_file = Some(path.to_string());
        Ok(())
    }

    pub fn engine_name(&self) -> &str {
        &self.engine_name
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    pub fn script_file(&self) -> Option<&str> {
        self.script_file.as_deref()
    }
}

impl Identity for ScriptIdentity {
    fn matches(
        &self,
        record: &RecordDefinition,
        context: &FileContext,
        line: &str,
    ) -> Result<bool, ParserError> {
        let mut guard = self.session.lock().unwrap_or_else(|poisoned| {
            tracing::warn!(record = %record.name(), "script session lock was poisoned, recovering");
            poisoned.into_inner()
        });
        let ScriptSession { engine, ast, scope } = &mut *guard;

        let Some(ast) = ast.as_ref() else {
            return Err(ParserError::invocation(
                record.name(),
                "script identity has no script",
            ));
        };

        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        let result: Dynamic = engine
            .call_fn_with_options(
                options,
                scope,
                ast,
                &self.method,
                (context.clone(), line.to_string()),
            )
            .map_err(|e| ParserError::Invocation {
                record: record.name().to_string(),
                message: e.to_string(),
                source: Some(e as Box<dyn std::error::Error + Send + Sync>),
            })?;

        if result.is_unit() {
            return Ok(false);
        }
        result
            .as_bool()
            .map_err(|type_name| ParserError::UnexpectedReturnType {
                record: record.name().to_string(),
                type_name: type_name.to_string(),
            })
    }
}

impl fmt::Debug for ScriptIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptIdentity")
            .field("engine_name", &self.engine_name)
            .field("method", &self.method)
            .field("script_file", &self.script_file)
            .field("has_script", &self.script.is_some())
            .finish()
    }
}

fn non_blank(name: Option<&str>) -> Option<&str> {
    name.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use flatbed_api::converter::ConverterRegistry;

    use super::*;
    use crate::resource::FsResolver;

    fn ctx() -> FileContext {
        FileContext::new(Arc::new(ConverterRegistry::new()))
    }

    fn script(body: &str) -> ScriptIdentity {
        ScriptIdentity::compile(&ScriptEngineRegistry::new(), None, None, body).unwrap()
    }

    #[test]
    fn boolean_results_pass_through() {
        let id = script(r#"fn matches_line(ctx, line) { line.starts_with("HDR") }"#);
        let record = RecordDefinition::new("header");
        assert!(id.matches(&record, &ctx(), "HDR2020").unwrap());
        assert!(!id.matches(&record, &ctx(), "DTL0001").unwrap());
    }

    #[test]
    fn string_result_is_a_parser_error() {
        let id = script(r#"fn matches_line(ctx, line) { "true" }"#);
        let record = RecordDefinition::new("detail");
        let err = id.matches(&record, &ctx(), "anything").unwrap_err();
        match err {
            ParserError::UnexpectedReturnType { record, type_name } => {
                assert_eq!(record, "detail");
                assert_eq!(type_name, "string");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unit_result_is_no_match() {
        let id = script("fn matches_line(ctx, line) { }");
        let record = RecordDefinition::new("r");
        assert!(!id.matches(&record, &ctx(), "x").unwrap());
    }

    #[test]
    fn missing_entry_point_is_an_invocation_error() {
        let id = ScriptIdentity::compile(
            &ScriptEngineRegistry::new(),
            Some("rhai"),
            Some("isHeader"),
            "fn matches_line(ctx, line) { true }",
        )
        .unwrap();
        let record = RecordDefinition::new("r");
        let err = id.matches(&record, &ctx(), "x").unwrap_err();
        assert!(matches!(err, ParserError::Invocation { source: Some(_), .. }));
    }

    #[test]
    fn runtime_failure_is_an_invocation_error() {
        let id = script(r#"fn matches_line(ctx, line) { throw "boom"; }"#);
        let record = RecordDefinition::new("r");
        let err = id.matches(&record, &ctx(), "x").unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn unset_script_is_an_invocation_error() {
        let id = ScriptIdentity::new(&ScriptEngineRegistry::new(), None, None).unwrap();
        let record = RecordDefinition::new("r");
        assert!(matches!(
            id.matches(&record, &ctx(), "x"),
            Err(ParserError::Invocation { source: None, .. })
        ));
    }

    #[test]
    fn compile_failure_is_a_configuration_error() {
        let err = ScriptIdentity::compile(
            &ScriptEngineRegistry::new(),
            None,
            None,
            "fn matches_line(ctx, line) { ",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::ScriptCompile { .. }));
    }

    #[test]
    fn top_level_failure_is_a_configuration_error() {
        let err = ScriptIdentity::compile(&ScriptEngineRegistry::new(), None, None, r#"throw "no";"#)
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::ScriptEval { .. }));
    }

    #[test]
    fn unknown_engine_fails_at_construction() {
        let err = ScriptIdentity::new(&ScriptEngineRegistry::new(), Some("nashorn"), None).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownEngine(_)));
    }

    #[test]
    fn blank_names_select_defaults() {
        let id = ScriptIdentity::new(&ScriptEngineRegistry::new(), Some("  "), Some("")).unwrap();
        assert_eq!(id.engine_name(), DEFAULT_ENGINE);
        assert_eq!(id.method(), DEFAULT_METHOD);
    }

    #[test]
    fn scripts_see_the_previous_line() {
        let id = script(
            r#"fn matches_line(ctx, line) { ctx.has_last_line() && ctx.last_line.starts_with("HDR") }"#,
        );
        let record = RecordDefinition::new("first-detail");
        let mut ctx = ctx();
        assert!(!id.matches(&record, &ctx, "DTL1").unwrap());
        ctx.advance("HDR2020");
        assert!(id.matches(&record, &ctx, "DTL1").unwrap());
        ctx.advance("DTL1");
        assert!(!id.matches(&record, &ctx, "DTL2").unwrap());
    }

    #[test]
    fn script_file_is_loaded_through_resolver() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("trailer.rhai"),
            r#"fn is_trailer(ctx, line) { line.len() == 3 && line == "END" }"#,
        )
        .unwrap();

        let mut id =
            ScriptIdentity::new(&ScriptEngineRegistry::new(), None, Some("is_trailer")).unwrap();
        id.set_script_file("trailer.rhai", &FsResolver::with_base(dir.path()))
            .unwrap();
        assert_eq!(id.script_file(), Some("trailer.rhai"));

        let record = RecordDefinition::new("trailer");
        assert!(id.matches(&record, &ctx(), "END").unwrap());
    }

    #[test]
    fn unreadable_script_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut id = ScriptIdentity::new(&ScriptEngineRegistry::new(), None, None).unwrap();
        let err = id
            .set_script_file("missing.rhai", &FsResolver::with_base(dir.path()))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::ScriptResource { .. }));
    }

    #[test]
    fn one_instance_is_shared_across_threads() {
        let id = Arc::new(script(
            r#"fn matches_line(ctx, line) { line.sub_string(0, 1) == "A" }"#,
        ));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let id = Arc::clone(&id);
                std::thread::spawn(move || {
                    let record = RecordDefinition::new("r");
                    let ctx = ctx();
                    (0..50).all(|n| {
                        let line = if (i + n) % 2 == 0 { "A-line" } else { "B-line" };
                        id.matches(&record, &ctx, line).unwrap() == line.starts_with('A')
                    })
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
