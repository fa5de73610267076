//! Pipeline file parsing
//!
//! ```yaml
//! pipeline:
//!   pipeline_type: parallel   # optional, defaults to sequential
//!   create:
//!     - stack_name: WebApp
//!       secrets:
//!         - Name: DbPassword
//!           Value: ...
//!   update: []
//!   delete:
//!     - stack_name: OldQueue
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::domain::operation::{Action, SecretOverride};
use crate::domain::pipeline::PipelineMode;
use crate::error::{DefinitionError, Result};

/// Parsed pipeline file
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineFile {
    pipeline: PipelineSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PipelineSection {
    #[serde(default)]
    pipeline_type: Option<String>,
    #[serde(default)]
    create: Option<Vec<PipelineEntry>>,
    #[serde(default)]
    update: Option<Vec<PipelineEntry>>,
    #[serde(default)]
    delete: Option<Vec<PipelineEntry>>,
}

/// One stack listed in a pipeline group
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineEntry {
    pub stack_name: String,
    #[serde(default)]
    pub secrets: Vec<SecretOverride>,
}

impl PipelineFile {
    /// Reads and parses a pipeline file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parses pipeline file content; `origin` names the source in error messages
    pub fn parse(content: &str, origin: &str) -> Result<Self> {
        let file: Self = serde_yaml::from_str(content).map_err(|source| DefinitionError::Yaml {
            path: origin.into(),
            source,
        })?;

        for action in [Action::Create, Action::Update, Action::Delete] {
            if file
                .entries(action)
                .iter()
                .any(|e| e.stack_name.trim().is_empty())
            {
                return Err(DefinitionError::InvalidPipeline(format!(
                    "empty stack_name in the {} group",
                    action.to_string().to_lowercase()
                )));
            }
        }

        Ok(file)
    }

    /// Execution mode; sequential unless the file says otherwise
    pub fn mode(&self) -> Result<PipelineMode> {
        match &self.pipeline.pipeline_type {
            None => Ok(PipelineMode::default()),
            Some(kind) => kind.parse().map_err(DefinitionError::InvalidPipeline),
        }
    }

    /// Entries of one group, in declaration order
    pub fn entries(&self, action: Action) -> &[PipelineEntry] {
        let group = match action {
            Action::Create => &self.pipeline.create,
            Action::Update => &self.pipeline.update,
            Action::Delete => &self.pipeline.delete,
        };
        group.as_deref().unwrap_or_default()
    }

    /// Total number of operations across all groups
    pub fn len(&self) -> usize {
        [Action::Create, Action::Update, Action::Delete]
            .iter()
            .map(|a| self.entries(*a).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_groups_and_secrets() {
        let file = PipelineFile::parse(
            r#"
pipeline:
  pipeline_type: parallel
  create:
    - stack_name: A
      secrets:
        - Name: Token
          Value: abc
    - stack_name: B
  delete:
    - stack_name: C
"#,
            "pipeline.yaml",
        )
        .unwrap();

        assert_eq!(file.mode().unwrap(), PipelineMode::Parallel);
        assert_eq!(file.len(), 3);
        assert_eq!(file.entries(Action::Create)[0].secrets[0].value, "abc");
        assert!(file.entries(Action::Update).is_empty());
        assert_eq!(file.entries(Action::Delete)[0].stack_name, "C");
    }

    #[test]
    fn test_mode_defaults_to_sequential() {
        let file = PipelineFile::parse("pipeline:\n  update:\n", "p.yaml").unwrap();
        assert_eq!(file.mode().unwrap(), PipelineMode::Sequential);
        assert!(file.is_empty());
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let file =
            PipelineFile::parse("pipeline:\n  pipeline_type: fanout\n", "p.yaml").unwrap();
        assert!(matches!(
            file.mode(),
            Err(DefinitionError::InvalidPipeline(_))
        ));
    }

    #[test]
    fn test_missing_pipeline_key() {
        let err = PipelineFile::parse("create: []\n", "p.yaml").unwrap_err();
        assert!(matches!(err, DefinitionError::Yaml { .. }));
    }

    #[test]
    fn test_empty_stack_name() {
        let err =
            PipelineFile::parse("pipeline:\n  create:\n    - stack_name: \"\"\n", "p.yaml")
                .unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidPipeline(_)));
    }
}
