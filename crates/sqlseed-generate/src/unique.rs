use std::collections::{HashMap, HashSet};

use crate::model::UniqueScope;

/// Literals already emitted for uniqueness-constrained columns.
///
/// Pools outlive individual tables: with [`UniqueScope::ColumnName`] two
/// tables that both have an `id` column draw from one shared pool.
#[derive(Debug, Default)]
pub struct UniquenessPool {
    scope: UniqueScope,
    seen: HashMap<String, HashSet<String>>,
}

impl UniquenessPool {
    pub fn new(scope: UniqueScope) -> Self {
        Self {
            scope,
            seen: HashMap::new(),
        }
    }

    pub fn key(&self, table: &str, column: &str) -> String {
        match self.scope {
            UniqueScope::ColumnName => column.to_string(),
            UniqueScope::TableColumn => format!("{table}.{column}"),
        }
    }

    pub fn contains(&self, key: &str, literal: &str) -> bool {
        self.seen
            .get(key)
            .is_some_and(|values| values.contains(literal))
    }

    /// Returns false when the literal was already present.
    pub fn insert(&mut self, key: String, literal: String) -> bool {
        self.seen.entry(key).or_default().insert(literal)
    }

    pub fn len(&self, key: &str) -> usize {
        self.seen.get(key).map_or(0, HashSet::len)
    }
}
