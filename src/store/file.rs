//! Store implementations.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use super::{Catalog, Store, StoreResult};

/// Catalog stored as a pretty-printed JSON file.
///
/// A missing file reads as an empty catalog. Saves write a sibling
/// temporary file and rename it over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Store for JsonFileStore {
    fn load(&self) -> StoreResult<Catalog> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "catalog file missing, starting empty");
            return Ok(Catalog::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Catalog::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, catalog: &Catalog) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(catalog)?;
        let temp = self.temp_path();
        fs::write(&temp, content)?;
        fs::rename(&temp, &self.path)?;

        debug!(
            path = %self.path.display(),
            renderers = catalog.renderers.len(),
            queries = catalog.queries.len(),
            reports = catalog.reports.len(),
            "saved catalog"
        );
        Ok(())
    }
}

/// In-memory store (for testing).
#[derive(Debug, Default)]
pub struct MemoryStore {
    catalog: RwLock<Catalog>,
}

impl MemoryStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
        }
    }

    /// Snapshot of the last saved catalog.
    pub fn snapshot(&self) -> Catalog {
        self.catalog
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Store for MemoryStore {
    fn load(&self) -> StoreResult<Catalog> {
        Ok(self.snapshot())
    }

    fn save(&self, catalog: &Catalog) -> StoreResult<()> {
        let mut guard = self
            .catalog
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = catalog.clone();
        Ok(())
    }
}
