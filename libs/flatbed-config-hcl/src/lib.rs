use flatbed_api::error::ConfigurationError;
use flatbed_engine::config::{ConfigParser, LayoutConfig};
use flatbed_engine::error::EngineError;

/// Reads `.hcl` layout files.
pub struct HclParser;

impl ConfigParser for HclParser {
    fn extensions(&self) -> &[&str] {
        &["hcl"]
    }

    fn parse(&self, content: &str) -> Result<LayoutConfig, EngineError> {
        hcl::from_str(content).map_err(|e| ConfigurationError::Invalid(e.to_string()).into())
    }
}
