//! Value sources: where raw column values come from.

mod corpus;
mod faker;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{GenerationError, Result};

pub use corpus::CorpusSource;
pub use faker::FakerSource;

/// Returned for type labels no source recognizes.
pub const UNKNOWN_VALUE: &str = "unknown_value";

/// Supplies raw values for field-type labels.
pub trait ValueSource {
    /// Every value available for `field_type`, or empty when values are
    /// synthesized on demand.
    fn values(&self, field_type: &str) -> Result<Vec<String>>;

    /// One value for `field_type`. A non-empty `constraint` restricts the
    /// answer to one of its members.
    fn random_value(&mut self, field_type: &str, constraint: Option<&[String]>) -> Result<String>;
}

/// Which [`ValueSource`] implementation a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    #[serde(alias = "file")]
    Corpus,
    Faker,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Corpus => "corpus",
            SourceKind::Faker => "faker",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = GenerationError;

    /// Accepts `corpus`/`file` and `faker` in any case, matching the
    /// `REPOSITORY_TYPE` values of existing deployments.
    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "corpus" | "file" => Ok(SourceKind::Corpus),
            "faker" => Ok(SourceKind::Faker),
            other => Err(GenerationError::InvalidConfig(format!(
                "unknown value source '{other}' (expected corpus, file or faker)"
            ))),
        }
    }
}

/// Build the source selected by `kind`.
pub fn build_source(kind: SourceKind, resources: PathBuf, seed: u64) -> Box<dyn ValueSource> {
    match kind {
        SourceKind::Corpus => Box::new(CorpusSource::new(resources, seed)),
        SourceKind::Faker => Box::new(FakerSource::new(seed)),
    }
}

/// Uniform pick from a non-empty constraint set.
pub(crate) fn pick_constrained<R: Rng + ?Sized>(
    constraint: Option<&[String]>,
    rng: &mut R,
) -> Option<String> {
    let values = constraint.filter(|values| !values.is_empty())?;
    let index = rng.random_range(0..values.len());
    values.get(index).cloned()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn source_kind_accepts_deployment_names() {
        assert_eq!("FILE".parse::<SourceKind>().expect("file"), SourceKind::Corpus);
        assert_eq!("Faker".parse::<SourceKind>().expect("faker"), SourceKind::Faker);
        assert!("csv".parse::<SourceKind>().is_err());
    }

    #[test]
    fn constrained_pick_is_a_member() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let set = vec!["1".to_string(), "2".to_string(), "3".to_string()];
        for _ in 0..50 {
            let value = pick_constrained(Some(set.as_slice()), &mut rng).expect("non-empty set");
            assert!(set.contains(&value));
        }
        assert_eq!(pick_constrained(Some(&set[..0]), &mut rng), None);
        assert_eq!(pick_constrained(None, &mut rng), None);
    }
}
