use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqlseed_generate::{FieldType, RowPlan, SourceKind, TypeOverrides, UniqueScope};
use tracing::debug;

use crate::{CliError, CliResult};

/// Settings file picked up from the working directory when `--config` is
/// not given.
pub const DEFAULT_SETTINGS_FILE: &str = "sqlseed.toml";

/// Persistent defaults; command-line flags take precedence over every field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub source: Option<SourceKind>,
    pub resources_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub default_rows: Option<u64>,
    pub unique_scope: Option<UniqueScope>,
    pub max_unique_attempts: Option<u32>,
    pub tables: BTreeMap<String, TableSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableSettings {
    pub rows: Option<u64>,
    /// Column name to field-type label.
    pub columns: BTreeMap<String, FieldType>,
}

impl Settings {
    pub fn row_plan(&self, default_rows: u64) -> RowPlan {
        let mut plan = RowPlan::new(default_rows);
        for (table, settings) in &self.tables {
            if let Some(rows) = settings.rows {
                plan.set(table, rows);
            }
        }
        plan
    }

    pub fn type_overrides(&self) -> TypeOverrides {
        let mut overrides = TypeOverrides::new();
        for (table, settings) in &self.tables {
            for (column, field_type) in &settings.columns {
                overrides.insert(table, column, *field_type);
            }
        }
        overrides
    }
}

/// Load settings from `path`, or from [`DEFAULT_SETTINGS_FILE`] when it
/// exists, or fall back to defaults.
pub fn load_settings(path: Option<&Path>) -> CliResult<Settings> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_SETTINGS_FILE);
            if !fallback.exists() {
                debug!("no settings file; using defaults");
                return Ok(Settings::default());
            }
            fallback
        }
    };

    let content = std::fs::read_to_string(&path).map_err(|source| CliError::SettingsRead {
        path: path.clone(),
        source,
    })?;
    let settings: Settings = toml::from_str(&content).map_err(|source| CliError::Settings {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), tables = settings.tables.len(), "settings loaded");
    Ok(settings)
}
