use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::errors::{GenerationError, Result};

/// Default corpus directory, relative to the working directory.
pub const DEFAULT_RESOURCES_PATH: &str = "resources/files";

/// Reads line-per-value corpus files once and serves them from memory.
#[derive(Debug)]
pub struct AssetsLoader {
    root: PathBuf,
    cache: RwLock<BTreeMap<String, Arc<[String]>>>,
}

impl AssetsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Trimmed, non-blank lines of `relative`, shared with every later call.
    /// A missing file is an empty corpus; any other read failure is an error.
    pub fn load_lines(&self, relative: &str) -> Result<Arc<[String]>> {
        if let Some(lines) = self.cached(relative)? {
            return Ok(lines);
        }

        let lines = Self::read_lines(&self.root.join(relative))?;
        let mut cache = self.cache.write().map_err(|_| poisoned())?;
        let lines = cache
            .entry(relative.to_string())
            .or_insert(lines)
            .clone();
        Ok(lines)
    }

    fn cached(&self, relative: &str) -> Result<Option<Arc<[String]>>> {
        let cache = self.cache.read().map_err(|_| poisoned())?;
        Ok(cache.get(relative).cloned())
    }

    fn read_lines(path: &Path) -> Result<Arc<[String]>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "corpus file not found; treating as empty");
                return Ok(Arc::from(Vec::new()));
            }
            Err(err) => {
                return Err(GenerationError::Asset(format!(
                    "failed to read corpus {}: {}",
                    path.display(),
                    err
                )));
            }
        };

        let values: Vec<String> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        debug!(path = %path.display(), values = values.len(), "corpus loaded");
        Ok(Arc::from(values))
    }
}

fn poisoned() -> GenerationError {
    GenerationError::Asset("corpus cache poisoned".to_string())
}
