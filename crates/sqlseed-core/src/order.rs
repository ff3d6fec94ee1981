use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::table::Table;

/// Table that could not be placed, with the referenced tables it waited on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedTable {
    pub name: String,
    pub missing: Vec<String>,
}

/// Outcome of dependency ordering.
#[derive(Debug, Clone, Default)]
pub struct DependencyOrder {
    /// Tables such that every foreign-key target precedes its referer.
    pub ordered: Vec<Table>,
    /// Tables dropped because of a cycle or a reference to an unknown table.
    pub unresolved: Vec<UnresolvedTable>,
}

/// Serializable summary of a [`DependencyOrder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReport {
    pub order: Vec<String>,
    pub unresolved: Vec<UnresolvedTable>,
}

impl DependencyOrder {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.ordered.iter().map(Table::name).collect()
    }

    pub fn report(&self) -> OrderReport {
        OrderReport {
            order: self.names().into_iter().map(str::to_string).collect(),
            unresolved: self.unresolved.clone(),
        }
    }
}

/// Linearize tables so that referenced tables come first.
///
/// Tables without foreign keys keep their parse order at the front. The rest
/// are scanned in parse order, repeatedly, and a table is placed as soon as
/// all of its referenced tables are placed. When a full scan places nothing
/// the remaining tables are dropped and reported instead of failing.
pub fn order_tables(tables: Vec<Table>) -> DependencyOrder {
    let mut ordered = Vec::with_capacity(tables.len());
    let mut placed: HashSet<String> = HashSet::new();
    let mut pending = Vec::new();

    for table in tables {
        if table.foreign_keys().is_empty() {
            debug!(table = %table.name(), "placed table without dependencies");
            placed.insert(table.name().to_string());
            ordered.push(table);
        } else {
            pending.push(table);
        }
    }

    while !pending.is_empty() {
        let mut progressed = false;
        let mut still_pending = Vec::with_capacity(pending.len());

        for table in pending {
            let resolved = table
                .foreign_keys()
                .iter()
                .all(|fk| placed.contains(&fk.referenced_table));
            if resolved {
                debug!(table = %table.name(), "placed table with resolved dependencies");
                placed.insert(table.name().to_string());
                ordered.push(table);
                progressed = true;
            } else {
                still_pending.push(table);
            }
        }

        pending = still_pending;
        if !progressed {
            break;
        }
    }

    let unresolved: Vec<UnresolvedTable> = pending
        .iter()
        .map(|table| {
            let mut missing: Vec<String> = Vec::new();
            for fk in table.foreign_keys() {
                if !placed.contains(&fk.referenced_table) && !missing.contains(&fk.referenced_table)
                {
                    missing.push(fk.referenced_table.clone());
                }
            }
            UnresolvedTable {
                name: table.name().to_string(),
                missing,
            }
        })
        .collect();

    for table in &unresolved {
        error!(
            table = %table.name,
            missing = ?table.missing,
            "circular dependency or reference to an unknown table; table dropped"
        );
    }

    DependencyOrder {
        ordered,
        unresolved,
    }
}
