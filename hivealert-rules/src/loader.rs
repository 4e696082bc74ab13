use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::RuleError;
use crate::rule::RuleConfig;

/// Loads a single rule file. JSON documents are accepted as well since they
/// are valid YAML.
pub fn load_rule(path: impl AsRef<Path>) -> Result<RuleConfig, RuleError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RuleError::MissingPath(path.display().to_string()));
    }

    debug!(path = %path.display(), "loading rule file");
    let raw = fs::read_to_string(path).map_err(|err| RuleError::from_io(path, err))?;
    parse_rule(&raw, path)
}

/// Parses a rule document. `path` is only used for error reporting.
pub fn parse_rule(raw: &str, path: impl AsRef<Path>) -> Result<RuleConfig, RuleError> {
    serde_yaml::from_str::<RuleConfig>(raw)
        .map_err(|err| RuleError::parse_error(path.as_ref(), err.to_string()))
}
