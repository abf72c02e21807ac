use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use flatbed_api::error::ConfigurationError;

use crate::converters::CoreKind;
use crate::error::EngineError;

/// Root layout configuration, parsed from TOML (or HCL through a plugged-in
/// `ConfigParser`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayoutConfig {
    /// Reject lines whose width differs from the matched record's width.
    #[serde(default)]
    pub enforce_line_length: bool,

    /// Extra names for core converters.
    #[serde(default)]
    pub converters: Vec<ConverterAliasConfig>,

    /// Record definitions, in resolution order.
    #[serde(default)]
    pub records: Vec<RecordConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConverterAliasConfig {
    pub name: String,
    pub kind: CoreKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordConfig {
    pub name: String,
    #[serde(default)]
    pub identities: Vec<IdentityConfig>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IdentityConfig {
    Field {
        start: usize,
        length: usize,
        matches: Vec<String>,
        #[serde(default)]
        ignore_case: bool,
    },
    Length {
        #[serde(default)]
        min: usize,
        max: usize,
    },
    Script {
        #[serde(default)]
        engine: Option<String>,
        #[serde(default)]
        method: Option<String>,
        #[serde(default)]
        script: Option<String>,
        #[serde(default)]
        script_file: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    pub length: usize,
    #[serde(default = "default_converter")]
    pub converter: String,
    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,
}

fn default_converter() -> String {
    CoreKind::Char.name().to_string()
}

/// Option value as written in the layout file. Normalized to text before
/// reaching converters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(v) => write!(f, "{v}"),
            OptionValue::Int(v) => write!(f, "{v}"),
            OptionValue::Float(v) => write!(f, "{v}"),
            OptionValue::Str(v) => f.write_str(v),
        }
    }
}

/// Layout file format, selected by file extension.
pub trait ConfigParser: Send + Sync {
    /// Extensions handled, without the leading dot.
    fn extensions(&self) -> &[&str];

    fn parse(&self, content: &str) -> Result<LayoutConfig, EngineError>;
}

pub struct TomlParser;

impl ConfigParser for TomlParser {
    fn extensions(&self) -> &[&str] {
        &["toml"]
    }

    fn parse(&self, content: &str) -> Result<LayoutConfig, EngineError> {
        LayoutConfig::parse(content)
    }
}

impl LayoutConfig {
    /// Load a TOML layout file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Self::load_with(path, &[&TomlParser])
    }

    /// Load a layout file with the first parser claiming its extension.
    pub fn load_with(
        path: impl AsRef<Path>,
        parsers: &[&dyn ConfigParser],
    ) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        let parser = parsers
            .iter()
            .find(|p| p.extensions().contains(&extension))
            .ok_or_else(|| {
                ConfigurationError::Invalid(format!(
                    "{}: no layout parser for extension '{extension}'",
                    path.display()
                ))
            })?;

        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::Invalid(format!("{}: {e}", path.display()))
        })?;
        parser
            .parse(&content)
            .map_err(|e| e.with_context(path.display()))
    }

    /// Parse a layout from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        toml::from_str(toml_str)
            .map_err(|e| ConfigurationError::Invalid(e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: &str = r#"
enforce_line_length = true

[[converters]]
name = "money"
kind = "decimal"

[[records]]
name = "header"

[[records.identities]]
type = "field"
start = 0
length = 3
matches = ["HDR"]

[[records.fields]]
name = "tag"
length = 3

[[records.fields]]
name = "run_date"
length = 8
converter = "date"
options = { format = "yyyyMMdd" }

[[records]]
name = "detail"

[[records.identities]]
type = "script"
script = "fn matches_line(ctx, line) { true }"

[[records.identities]]
type = "length"
max = 20

[[records.fields]]
name = "amount"
length = 10
converter = "money"
options = { justify = "right", pad-character = "0", decimal-implied = true, decimal-places = 2 }
"#;

    #[test]
    fn parses_records_identities_and_fields() {
        let config = LayoutConfig::parse(LAYOUT).unwrap();
        assert!(config.enforce_line_length);
        assert_eq!(config.converters[0].kind, CoreKind::Decimal);
        assert_eq!(config.records.len(), 2);

        let header = &config.records[0];
        assert_eq!(
            header.identities[0],
            IdentityConfig::Field {
                start: 0,
                length: 3,
                matches: vec!["HDR".into()],
                ignore_case: false,
            }
        );
        assert_eq!(header.fields[0].converter, "char");
        assert_eq!(header.fields[1].options["format"].to_string(), "yyyyMMdd");

        let detail = &config.records[1];
        assert!(matches!(detail.identities[0], IdentityConfig::Script { ref engine, .. } if engine.is_none()));
        assert_eq!(detail.identities[1], IdentityConfig::Length { min: 0, max: 20 });
    }

    #[test]
    fn option_values_normalize_to_text() {
        let config = LayoutConfig::parse(LAYOUT).unwrap();
        let options = &config.records[1].fields[0].options;
        assert_eq!(options["decimal-implied"], OptionValue::Bool(true));
        assert_eq!(options["decimal-implied"].to_string(), "true");
        assert_eq!(options["decimal-places"].to_string(), "2");
        assert_eq!(options["pad-character"].to_string(), "0");
    }

    #[test]
    fn unknown_identity_type_is_rejected() {
        let err = LayoutConfig::parse(
            r#"
[[records]]
name = "r"
identities = [{ type = "regex", pattern = "x" }]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn load_picks_parser_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.toml");
        std::fs::write(&path, LAYOUT).unwrap();
        assert_eq!(LayoutConfig::load(&path).unwrap().records.len(), 2);

        let other = dir.path().join("layout.yaml");
        std::fs::write(&other, "records: []").unwrap();
        assert!(LayoutConfig::load(&other).is_err());
    }
}
