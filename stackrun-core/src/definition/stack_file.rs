//! Stack file parsing
//!
//! The stack file maps stack names to their account, region, template and
//! parameters:
//!
//! ```yaml
//! WebApp:
//!   Account: 111
//!   Region: us-east-1
//!   Template: web.yaml
//!   Parameters: {}
//! ```

use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::operation::{Action, OperationDescriptor, SecretOverride};
use crate::domain::stack::StackIdentity;
use crate::error::{DefinitionError, Result};

const PARAMETERS_HINT: &str = "\nShould you wish to deploy a stack with no parameters, \
                               please define the property as: \"Parameters: {}\"";

/// Parsed stack file
#[derive(Debug, Clone)]
pub struct StackFile {
    origin: String,
    base_dir: Option<PathBuf>,
    stacks: Mapping,
}

/// Fully validated definition of one stack
#[derive(Debug, Clone, PartialEq)]
pub struct StackDefinition {
    pub account: String,
    pub region: String,
    pub template: PathBuf,
    pub parameters: BTreeMap<String, String>,
}

impl StackDefinition {
    pub fn into_descriptor(
        self,
        stack_name: &str,
        action: Action,
        secrets: Vec<SecretOverride>,
    ) -> OperationDescriptor {
        OperationDescriptor {
            action,
            stack: StackIdentity::new(stack_name, self.account, self.region),
            template: self.template,
            parameters: self.parameters,
            secrets,
        }
    }
}

impl StackFile {
    /// Reads and parses a stack file
    ///
    /// Relative template paths are later resolved against the file's directory.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut file = Self::parse_at(&content, path)?;
        file.base_dir = path.parent().map(Path::to_path_buf);
        Ok(file)
    }

    /// Parses stack file content; `origin` names the source in error messages
    pub fn parse(content: &str, origin: &str) -> Result<Self> {
        Self::parse_at(content, Path::new(origin))
    }

    fn parse_at(content: &str, path: &Path) -> Result<Self> {
        let value: Value = serde_yaml::from_str(content).map_err(|source| DefinitionError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

        let stacks = match value {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            _ => {
                return Err(DefinitionError::InvalidStackFile(format!(
                    "stack file {} must be a mapping of stack names",
                    path.display()
                )));
            }
        };

        Ok(Self {
            origin: path.display().to_string(),
            base_dir: None,
            stacks,
        })
    }

    /// Looks up a stack and checks that every required property is present
    pub fn resolve(&self, stack_name: &str) -> Result<StackDefinition> {
        let entry = self
            .stacks
            .get(stack_name)
            .ok_or_else(|| DefinitionError::UnknownStack {
                stack: stack_name.to_string(),
                file: self.origin.clone(),
            })?;

        let entry = entry
            .as_mapping()
            .ok_or_else(|| DefinitionError::InvalidField {
                stack: stack_name.to_string(),
                field: "definition",
                message: "expected a mapping".to_string(),
            })?;

        let account = self.required_scalar(entry, stack_name, "Account")?;
        let region = self.required_scalar(entry, stack_name, "Region")?;
        let template = self.required_scalar(entry, stack_name, "Template")?;
        let parameters = self.parameters(entry, stack_name)?;

        let template = PathBuf::from(template);
        let template = match &self.base_dir {
            Some(dir) if template.is_relative() => dir.join(template),
            _ => template,
        };

        Ok(StackDefinition {
            account,
            region,
            template,
            parameters,
        })
    }

    fn required<'a>(
        &self,
        entry: &'a Mapping,
        stack_name: &str,
        field: &'static str,
        hint: &'static str,
    ) -> Result<&'a Value> {
        entry.get(field).ok_or_else(|| DefinitionError::MissingField {
            stack: stack_name.to_string(),
            field,
            file: self.origin.clone(),
            hint,
        })
    }

    fn required_scalar(
        &self,
        entry: &Mapping,
        stack_name: &str,
        field: &'static str,
    ) -> Result<String> {
        let value = self.required(entry, stack_name, field, "")?;
        match scalar_to_string(value) {
            Some(s) if !s.trim().is_empty() => Ok(s),
            _ => Err(DefinitionError::InvalidField {
                stack: stack_name.to_string(),
                field,
                message: "expected a non-empty scalar value".to_string(),
            }),
        }
    }

    fn parameters(&self, entry: &Mapping, stack_name: &str) -> Result<BTreeMap<String, String>> {
        let value = self.required(entry, stack_name, "Parameters", PARAMETERS_HINT)?;
        let invalid = |message: String| DefinitionError::InvalidField {
            stack: stack_name.to_string(),
            field: "Parameters",
            message,
        };

        let map = match value {
            Value::Mapping(map) => map,
            Value::Null => return Ok(BTreeMap::new()),
            _ => return Err(invalid("expected a mapping".to_string())),
        };

        map.iter()
            .map(|(key, value)| {
                let key = scalar_to_string(key)
                    .ok_or_else(|| invalid("parameter names must be scalars".to_string()))?;
                let value = parameter_value(value)
                    .ok_or_else(|| invalid(format!("unsupported value for parameter {}", key)))?;
                Ok((key, value))
            })
            .collect()
    }
}

/// Converts a YAML scalar to its string form
///
/// Accounts are commonly written as bare numbers, so numbers and booleans
/// are accepted wherever a string is expected.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parameter values may also be null (empty) or a list (comma-delimited)
fn parameter_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Sequence(items) => items
            .iter()
            .map(scalar_to_string)
            .collect::<Option<Vec<_>>>()
            .map(|items| items.join(",")),
        other => scalar_to_string(other),
    }
}
