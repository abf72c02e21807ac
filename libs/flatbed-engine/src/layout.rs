use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use flatbed_api::context::FileContext;
use flatbed_api::converter::ConverterRegistry;
use flatbed_api::error::{ConfigurationError, ConversionError};
use flatbed_api::identity::Identity;
use flatbed_api::option::ConversionOptions;
use flatbed_api::schema::{FieldDescriptor, RecordDefinition};
use flatbed_api::value::{Row, Value};

use crate::codec::RecordCodec;
use crate::config::{ConfigParser, IdentityConfig, LayoutConfig, RecordConfig, TomlParser};
use crate::converters::core_registry;
use crate::converters::date::DatePattern;
use crate::error::{EngineError, ResolveError};
use crate::identity::{resolve, FieldIdentity, LengthIdentity, ScriptEngineRegistry, ScriptIdentity};
use crate::resource::{FsResolver, ResourceResolver};

/// A loaded, validated set of record definitions plus the converters they
/// reference.
///
/// Immutable after construction and safe to share across threads; per-run
/// state lives in the `FileContext` each caller creates.
#[derive(Debug)]
pub struct Layout {
    records: Vec<RecordDefinition>,
    converters: Arc<ConverterRegistry>,
    enforce_line_length: bool,
}

/// One decoded line: the record that claimed it and its field values.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedRecord {
    pub record: String,
    pub fields: Vec<(String, Value)>,
}

impl MatchedRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(name, value)| (name == field).then_some(value))
    }

    /// Drop the field names, keeping values in field order.
    pub fn into_row(self) -> Row {
        self.fields.into_iter().map(|(_, value)| value).collect()
    }
}

impl Serialize for MatchedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Fields<'a>(&'a [(String, Value)]);

        impl Serialize for Fields<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (name, value) in self.0 {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("record", &self.record)?;
        map.serialize_entry("fields", &Fields(&self.fields))?;
        map.end()
    }
}

impl Layout {
    /// Assemble a layout from already-built record definitions.
    ///
    /// Every field must name a registered converter and carry well-formed
    /// options.
    pub fn new(
        records: Vec<RecordDefinition>,
        converters: ConverterRegistry,
    ) -> Result<Self, ConfigurationError> {
        validate(&records, &converters)?;
        Ok(Self {
            records,
            converters: Arc::new(converters),
            enforce_line_length: false,
        })
    }

    /// Reject decoded lines whose width differs from the record width.
    pub fn enforce_line_length(mut self, enforce: bool) -> Self {
        self.enforce_line_length = enforce;
        self
    }

    /// Build from parsed configuration. Scripts are compiled and evaluated
    /// here, so every configuration problem surfaces before the first line.
    pub fn from_config(
        config: &LayoutConfig,
        mut converters: ConverterRegistry,
        scripts: &ScriptEngineRegistry,
        resolver: &dyn ResourceResolver,
    ) -> Result<Self, ConfigurationError> {
        for alias in &config.converters {
            converters.register(alias.name.clone(), alias.kind.converter());
        }

        let records = config
            .records
            .iter()
            .map(|record| {
                build_record(record, scripts, resolver)
                    .map_err(|e| e.with_context(format!("record '{}'", record.name)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let layout = Self::new(records, converters)?.enforce_line_length(config.enforce_line_length);
        tracing::info!(
            records = layout.records.len(),
            converters = layout.converters.names().len(),
            enforce_line_length = layout.enforce_line_length,
            "loaded layout"
        );
        Ok(layout)
    }

    /// Load a TOML layout file with the core converters and the default
    /// script engines. Script files resolve against the layout's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Self::load_with(path, &[&TomlParser])
    }

    /// Like `load`, choosing the parser by file extension.
    pub fn load_with(
        path: impl AsRef<Path>,
        parsers: &[&dyn ConfigParser],
    ) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let config = LayoutConfig::load_with(path, parsers)?;
        let resolver = match path.parent() {
            Some(dir) => FsResolver::with_base(dir),
            None => FsResolver::new(),
        };
        Self::from_config(&config, core_registry(), &ScriptEngineRegistry::new(), &resolver)
            .map_err(|e| EngineError::from(e).with_context(path.display()))
    }

    pub fn records(&self) -> &[RecordDefinition] {
        &self.records
    }

    pub fn record(&self, name: &str) -> Option<&RecordDefinition> {
        self.records.iter().find(|r| r.name() == name)
    }

    pub fn converters(&self) -> &Arc<ConverterRegistry> {
        &self.converters
    }

    /// Fresh per-run state for one input.
    pub fn new_context(&self) -> FileContext {
        FileContext::new(Arc::clone(&self.converters))
    }

    pub fn resolve(&self, context: &FileContext, line: &str) -> Result<&RecordDefinition, ResolveError> {
        resolve(&self.records, context, line)
    }

    fn codec(&self) -> RecordCodec<'_> {
        RecordCodec::new(&self.converters).enforce_line_length(self.enforce_line_length)
    }

    /// Resolve and decode one line, then advance `context` past it.
    ///
    /// The context advances even when the line fails, so a caller skipping
    /// bad lines keeps correct line numbers.
    pub fn decode_line(
        &self,
        context: &mut FileContext,
        line: &str,
    ) -> Result<MatchedRecord, EngineError> {
        let result = self.decode_resolved(context, line);
        context.advance(line);
        result
    }

    fn decode_resolved(&self, context: &FileContext, line: &str) -> Result<MatchedRecord, EngineError> {
        let record = self.resolve(context, line)?;
        let row = self.codec().decode(record, line)?;
        Ok(MatchedRecord {
            record: record.name().to_string(),
            fields: record
                .fields()
                .iter()
                .map(|f| f.name().to_string())
                .zip(row.0)
                .collect(),
        })
    }

    /// Encode `row` with the record named `record_name`.
    pub fn encode(&self, record_name: &str, row: &Row) -> Result<String, EngineError> {
        let record = self
            .record(record_name)
            .ok_or_else(|| EngineError::RecordNotFound(record_name.to_string()))?;
        Ok(self.codec().encode(record, row)?)
    }
}

fn build_record(
    config: &RecordConfig,
    scripts: &ScriptEngineRegistry,
    resolver: &dyn ResourceResolver,
) -> Result<RecordDefinition, ConfigurationError> {
    let mut record = RecordDefinition::new(config.name.clone());

    for identity in &config.identities {
        record.push_identity(build_identity(identity, scripts, resolver)?);
    }

    for field in &config.fields {
        let options: ConversionOptions = field
            .options
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();
        record.push_field(FieldDescriptor::new(
            field.name.clone(),
            field.length,
            field.converter.clone(),
            options,
        )?);
    }

    Ok(record)
}

fn build_identity(
    config: &IdentityConfig,
    scripts: &ScriptEngineRegistry,
    resolver: &dyn ResourceResolver,
) -> Result<Box<dyn Identity>, ConfigurationError> {
    let identity: Box<dyn Identity> = match config {
        IdentityConfig::Field {
            start,
            length,
            matches,
            ignore_case,
        } => Box::new(FieldIdentity::new(*start, *length, matches.iter().cloned())?.ignore_case(*ignore_case)),

        IdentityConfig::Length { min, max } => Box::new(LengthIdentity::new(*min, *max)?),

        IdentityConfig::Script {
            engine,
            method,
            script,
            script_file,
        } => {
            let mut identity = ScriptIdentity::new(scripts, engine.as_deref(), method.as_deref())?;
            match (script, script_file) {
                (Some(body), None) => identity.set_script(body)?,
                (None, Some(path)) => identity.set_script_file(path, resolver)?,
                (Some(_), Some(_)) => {
                    return Err(ConfigurationError::Invalid(
                        "script identity takes either 'script' or 'script_file', not both".into(),
                    ));
                }
                (None, None) => {
                    return Err(ConfigurationError::Invalid(
                        "script identity needs 'script' or 'script_file'".into(),
                    ));
                }
            }
            Box::new(identity)
        }
    };
    Ok(identity)
}

fn validate(records: &[RecordDefinition], converters: &ConverterRegistry) -> Result<(), ConfigurationError> {
    let mut names = HashSet::new();

    for (index, record) in records.iter().enumerate() {
        let context = format!("record '{}'", record.name());
        if !names.insert(record.name()) {
            return Err(ConfigurationError::Invalid(format!("duplicate record '{}'", record.name())));
        }
        if record.is_unconditional() && index + 1 < records.len() {
            tracing::warn!(
                record = %record.name(),
                "record has no identities and shadows every record declared after it"
            );
        }

        for field in record.fields() {
            let converter = converters.get(field.converter()).ok_or_else(|| {
                ConfigurationError::UnknownConverter {
                    field: field.name().to_string(),
                    converter: field.converter().to_string(),
                }
                .with_context(&context)
            })?;

            let invalid = |source: ConversionError| {
                ConfigurationError::InvalidOption {
                    field: field.name().to_string(),
                    source,
                }
                .with_context(&context)
            };
            field.options().validate().map_err(invalid)?;
            if converter.type_name() == "date" {
                if let Some(format) = field.options().format() {
                    DatePattern::parse(format).map_err(invalid)?;
                }
            }
        }
    }
    Ok(())
}
