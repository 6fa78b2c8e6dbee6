use std::path::{Path, PathBuf};

use osbs_core::TemplateConfig;

use crate::document::BuildDocument;

/// Directory of JSON build templates.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &TemplateConfig) -> Self {
        Self::new(config.build_json_dir.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load and parse the template called `name`.
    pub fn load(&self, name: &str) -> Result<BuildDocument, TemplateError> {
        let path = self.root.join(name);
        tracing::debug!(path = %path.display(), "loading template");

        let content = std::fs::read_to_string(&path).map_err(|e| TemplateError::Open {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| TemplateError::Parse { path, source: e })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("can't open template {path}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("template {path} is not a valid build object")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
