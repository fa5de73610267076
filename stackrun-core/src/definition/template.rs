//! Template checks

use serde_yaml::Value;
use std::path::Path;

use crate::error::{DefinitionError, Result};

/// Checks that a template body parses and declares a `Resources` section
///
/// JSON templates are accepted as well since they are valid YAML.
pub fn validate_template(stack_name: &str, path: &Path, body: &str) -> Result<()> {
    let template: Value = serde_yaml::from_str(body).map_err(|source| DefinitionError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    match template.get("Resources") {
        Some(Value::Mapping(resources)) if !resources.is_empty() => Ok(()),
        _ => Err(DefinitionError::EmptyTemplate {
            stack: stack_name.to_string(),
            path: path.to_path_buf(),
        }),
    }
}
