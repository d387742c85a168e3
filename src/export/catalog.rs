use crate::error::ExportError;
use crate::types::Meta;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Description of every dataset produced by one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub repository_name: String,
    /// RFC 3339 timestamp of when the catalog was built
    pub generated_at: String,
    pub datasets: Vec<Meta>,
}

impl Catalog {
    pub fn new(repository_name: impl Into<String>, datasets: Vec<Meta>) -> Self {
        Self {
            repository_name: repository_name.into(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            datasets,
        }
    }

    /// Load a catalog from disk
    pub fn load(path: &Path) -> Result<Self, ExportError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ExportError::CatalogFailed(format!("failed to read {}: {}", path.display(), e))
        })?;

        let catalog: Catalog = serde_json::from_str(&content).map_err(|e| {
            ExportError::CatalogFailed(format!("failed to parse {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            "Loaded catalog with {} datasets from {:?}",
            catalog.datasets.len(),
            path
        );
        Ok(catalog)
    }

    /// Save catalog to disk
    pub fn save(&self, path: &Path) -> Result<(), ExportError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ExportError::OutputDirFailed {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ExportError::CatalogFailed(format!("failed to serialize: {}", e)))?;

        fs::write(path, content).map_err(|e| {
            ExportError::CatalogFailed(format!("failed to write {}: {}", path.display(), e))
        })?;

        tracing::info!("Saved catalog to {:?}", path);
        Ok(())
    }

    /// Find a dataset by name
    pub fn dataset(&self, name: &str) -> Option<&Meta> {
        self.datasets.iter().find(|meta| meta.name == name)
    }
}
