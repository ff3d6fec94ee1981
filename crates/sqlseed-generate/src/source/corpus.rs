use std::path::PathBuf;
use std::sync::Arc;

use rand::SeedableRng;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, warn};

use crate::assets::AssetsLoader;
use crate::errors::Result;
use crate::field_type::FieldType;
use crate::source::{UNKNOWN_VALUE, ValueSource, pick_constrained};

/// Draws values from one corpus file per field type.
#[derive(Debug)]
pub struct CorpusSource {
    loader: AssetsLoader,
    rng: ChaCha8Rng,
}

impl CorpusSource {
    pub fn new(root: impl Into<PathBuf>, seed: u64) -> Self {
        Self::with_rng(root, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn with_rng(root: impl Into<PathBuf>, rng: ChaCha8Rng) -> Self {
        Self {
            loader: AssetsLoader::new(root),
            rng,
        }
    }
}

impl CorpusSource {
    fn corpus(&self, field_type: &str) -> Result<Arc<[String]>> {
        let Some(known) = FieldType::from_label(field_type) else {
            warn!(field_type, "no corpus file for field type");
            return Ok(Arc::from(Vec::new()));
        };
        self.loader.load_lines(known.corpus_file())
    }
}

impl ValueSource for CorpusSource {
    fn values(&self, field_type: &str) -> Result<Vec<String>> {
        Ok(self.corpus(field_type)?.to_vec())
    }

    fn random_value(&mut self, field_type: &str, constraint: Option<&[String]>) -> Result<String> {
        if let Some(value) = pick_constrained(constraint, &mut self.rng) {
            debug!(field_type, value = %value, "picked referenced value");
            return Ok(value);
        }

        let corpus = self.corpus(field_type)?;
        match corpus.choose(&mut self.rng) {
            Some(value) => Ok(value.clone()),
            None => {
                error!(
                    field_type,
                    root = %self.loader.root().display(),
                    "no values available for field type"
                );
                Ok(UNKNOWN_VALUE.to_string())
            }
        }
    }
}
