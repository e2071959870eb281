use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use once_cell::sync::OnceCell;
use tracing::debug;

use super::{sample, MetricsDocument, MetricsStore};

/// Source of the metrics a dashboard is composed from.
pub trait MetricsRepository: Send + Sync {
    /// Load and validate the full metrics store.
    fn load_store(&self) -> Result<MetricsStore>;
}

/// Serves the built-in February 2026 results.
#[derive(Debug, Default, Clone)]
pub struct SampleMetricsRepository;

impl MetricsRepository for SampleMetricsRepository {
    fn load_store(&self) -> Result<MetricsStore> {
        Ok(MetricsStore::from_document(sample::february_2026())?)
    }
}

/// Loads a metrics document from a YAML (`.yaml`/`.yml`) or JSON (`.json`) file.
pub struct FileMetricsRepository {
    path: PathBuf,
    cache: OnceCell<MetricsStore>,
}

impl FileMetricsRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<MetricsDocument> {
        let path = &self.path;
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read metrics document at {}", path.display()))?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let doc = match extension.as_deref() {
            Some("yaml" | "yml") => serde_yaml::from_str(&raw).with_context(|| {
                format!("invalid YAML metrics document at {}", path.display())
            })?,
            Some("json") => serde_json::from_str(&raw).with_context(|| {
                format!("invalid JSON metrics document at {}", path.display())
            })?,
            _ => bail!(
                "unsupported metrics document {} (expected .yaml, .yml or .json)",
                path.display()
            ),
        };
        Ok(doc)
    }
}

impl MetricsRepository for FileMetricsRepository {
    fn load_store(&self) -> Result<MetricsStore> {
        let store = self.cache.get_or_try_init(|| {
            let doc = self.read_document()?;
            let store = MetricsStore::from_document(doc).with_context(|| {
                format!("metrics document {} failed validation", self.path.display())
            })?;
            debug!(
                path = %self.path.display(),
                findings = store.findings().len(),
                "loaded metrics document"
            );
            Ok::<_, anyhow::Error>(store)
        })?;
        Ok(store.clone())
    }
}
