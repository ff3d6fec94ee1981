mod logging;
mod settings;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use sqlseed_core::{Error as CoreError, order_tables, parse_schema_file};
use sqlseed_generate::assets::DEFAULT_RESOURCES_PATH;
use sqlseed_generate::{
    DEFAULT_ROWS, FieldType, GenerateOptions, GenerationEngine, GenerationError, GenerationReport,
    SourceKind, UniqueScope, ValueSource, build_manual_table, build_source, parse_column_spec,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::logging::init_logging;
use crate::settings::{Settings, load_settings};

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("schema error: {0}")]
    Core(#[from] CoreError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot read settings {path}: {source}")]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub(crate) type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Parser, Debug)]
#[command(
    name = "sqlseed",
    version,
    about = "Generate INSERT statements from CREATE TABLE schemas"
)]
struct Cli {
    /// Settings file (defaults to ./sqlseed.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Log level or filter directive.
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
    /// Also append JSON logs to this file.
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate rows for every table of a schema file.
    Generate(GenerateArgs),
    /// Print the order in which tables would be generated.
    Order(OrderArgs),
    /// Generate rows for a single table defined on the command line.
    Manual(ManualArgs),
    /// List the supported field types.
    FieldTypes,
}

#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// Where values come from: corpus (alias: file) or faker.
    #[arg(long, env = "REPOSITORY_TYPE")]
    source: Option<SourceKind>,
    /// Root directory of the corpus files.
    #[arg(long, env = "RESOURCES_PATH", value_name = "DIR")]
    resources: Option<PathBuf>,
    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
    /// Uniqueness pool key: column_name or table_column.
    #[arg(long)]
    unique_scope: Option<UniqueScope>,
    /// Redraws allowed per unique column before a row fails.
    #[arg(long)]
    max_unique_attempts: Option<u32>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Schema file with CREATE TABLE statements.
    #[arg(value_name = "DDL")]
    schema: PathBuf,
    /// Rows per table.
    #[arg(long)]
    rows: Option<u64>,
    /// Rows for one table, as TABLE=N.
    #[arg(long = "table-rows", value_name = "TABLE=N")]
    table_rows: Vec<String>,
    /// Field type for a column, as TABLE.COLUMN=LABEL.
    #[arg(long = "type", value_name = "TABLE.COLUMN=LABEL")]
    types: Vec<String>,
    #[command(flatten)]
    source: SourceArgs,
    /// Write statements to this file instead of stdout.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
    /// Write the JSON generation report to this file.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct OrderArgs {
    /// Schema file with CREATE TABLE statements.
    #[arg(value_name = "DDL")]
    schema: PathBuf,
    /// Print the order as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct ManualArgs {
    /// Table name.
    #[arg(long)]
    table: String,
    /// Column definition, as NAME:LABEL.
    #[arg(long = "column", value_name = "NAME:LABEL", required = true)]
    columns: Vec<String>,
    /// Column whose values must not repeat.
    #[arg(long, value_name = "NAME")]
    unique: Vec<String>,
    /// Number of rows.
    #[arg(long)]
    rows: Option<u64>,
    #[command(flatten)]
    source: SourceArgs,
    /// Write statements to this file instead of stdout.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

/// Source and generator settings after merging flags over the settings file.
#[derive(Debug)]
struct ResolvedSource {
    kind: SourceKind,
    resources: PathBuf,
    seed: u64,
    options: GenerateOptions,
}

impl ResolvedSource {
    fn resolve(args: &SourceArgs, settings: &Settings) -> Self {
        let defaults = GenerateOptions::default();
        Self {
            kind: args.source.or(settings.source).unwrap_or_default(),
            resources: args
                .resources
                .clone()
                .or_else(|| settings.resources_path.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RESOURCES_PATH)),
            seed: args.seed.or(settings.seed).unwrap_or(0),
            options: GenerateOptions {
                max_unique_attempts: args
                    .max_unique_attempts
                    .or(settings.max_unique_attempts)
                    .unwrap_or(defaults.max_unique_attempts),
                unique_scope: args
                    .unique_scope
                    .or(settings.unique_scope)
                    .unwrap_or(defaults.unique_scope),
            },
        }
    }

    fn build(&self) -> Box<dyn ValueSource> {
        build_source(self.kind, self.resources.clone(), self.seed)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    init_logging(&cli.log_level, cli.log_file.as_deref())?;

    match cli.command {
        Command::Generate(args) => {
            let settings = load_settings(cli.config.as_deref())?;
            run_generate(args, &settings)
        }
        Command::Order(args) => run_order(args),
        Command::Manual(args) => {
            let settings = load_settings(cli.config.as_deref())?;
            run_manual(args, &settings)
        }
        Command::FieldTypes => {
            let mut stdout = io::stdout().lock();
            for (index, field_type) in FieldType::ALL.iter().enumerate() {
                writeln!(stdout, "{}. {field_type}", index + 1)?;
            }
            Ok(())
        }
    }
}

fn run_generate(args: GenerateArgs, settings: &Settings) -> CliResult<()> {
    let parsed = parse_schema_file(&args.schema)?;
    let skipped = parsed.skipped.clone();
    let order = order_tables(parsed.tables);

    let default_rows = args.rows.or(settings.default_rows).unwrap_or(DEFAULT_ROWS);
    let mut plan = settings.row_plan(default_rows);
    for spec in &args.table_rows {
        let (table, rows) = parse_table_rows(spec)?;
        plan.set(&table, rows);
    }

    let mut overrides = settings.type_overrides();
    for spec in &args.types {
        overrides.insert_assignment(spec)?;
    }

    let resolved = ResolvedSource::resolve(&args.source, settings);
    info!(
        schema = %args.schema.display(),
        source = %resolved.kind,
        seed = resolved.seed,
        default_rows,
        "generation configured"
    );
    let mut source = resolved.build();
    let engine = GenerationEngine::new(resolved.options);

    let mut result = with_sink(args.out.as_deref(), |sink| {
        Ok(engine.run(order, &plan, &overrides, source.as_mut(), sink)?)
    })?;
    result.report.record_skipped_lines(&skipped);

    if let Some(path) = &args.report {
        write_report(path, &result.report)?;
    }
    summarize(&result.report);
    Ok(())
}

fn run_order(args: OrderArgs) -> CliResult<()> {
    let parsed = parse_schema_file(&args.schema)?;
    let order = order_tables(parsed.tables);
    let mut stdout = io::stdout().lock();

    if args.json {
        let json = serde_json::to_string_pretty(&order.report())?;
        writeln!(stdout, "{json}")?;
        return Ok(());
    }

    for (index, name) in order.names().iter().enumerate() {
        writeln!(stdout, "{}. {name}", index + 1)?;
    }
    for unresolved in &order.unresolved {
        writeln!(
            stdout,
            "unresolved: {} (missing: {})",
            unresolved.name,
            unresolved.missing.join(", ")
        )?;
    }
    Ok(())
}

fn run_manual(args: ManualArgs, settings: &Settings) -> CliResult<()> {
    let columns = args
        .columns
        .iter()
        .map(|spec| parse_column_spec(spec))
        .collect::<Result<Vec<_>, _>>()?;
    let table = build_manual_table(&args.table, &columns, &args.unique)?;
    let rows = args.rows.or(settings.default_rows).unwrap_or(DEFAULT_ROWS);

    let resolved = ResolvedSource::resolve(&args.source, settings);
    let mut source = resolved.build();
    let engine = GenerationEngine::new(resolved.options);

    let result = with_sink(args.out.as_deref(), |sink| {
        Ok(engine.run_manual(table, rows, source.as_mut(), sink)?)
    })?;
    summarize(&result.report);
    Ok(())
}

/// Run `write` against the output file, or stdout when no file is given.
fn with_sink<T>(
    out: Option<&Path>,
    write: impl FnOnce(&mut dyn Write) -> CliResult<T>,
) -> CliResult<T> {
    match out {
        Some(path) => {
            let mut sink = BufWriter::new(File::create(path)?);
            let value = write(&mut sink)?;
            sink.flush()?;
            info!(path = %path.display(), "statements written");
            Ok(value)
        }
        None => {
            let mut stdout = io::stdout().lock();
            write(&mut stdout)
        }
    }
}

fn write_report(path: &Path, report: &GenerationReport) -> CliResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec_pretty(report)?)?;
    info!(path = %path.display(), "report written");
    Ok(())
}

fn summarize(report: &GenerationReport) {
    if report.has_errors() {
        warn!(
            run_id = %report.run_id,
            rows_total = report.rows_total,
            issues = report.issues.len(),
            "generation finished with errors"
        );
    } else {
        info!(
            run_id = %report.run_id,
            rows_total = report.rows_total,
            "generation finished"
        );
    }
}

fn parse_table_rows(spec: &str) -> CliResult<(String, u64)> {
    let invalid =
        || CliError::InvalidConfig(format!("invalid table rows '{spec}' (expected TABLE=N)"));
    let (table, rows) = spec.split_once('=').ok_or_else(invalid)?;
    let table = table.trim();
    sqlseed_core::validate_identifier(table)?;
    let rows = rows.trim().parse::<u64>().map_err(|_| invalid())?;
    Ok((table.to_string(), rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_flags_parse() {
        let cli = Cli::try_parse_from([
            "sqlseed",
            "generate",
            "schema.sql",
            "--rows",
            "5",
            "--type",
            "users.zip=Postal code",
            "--type",
            "users.city=City",
            "--source",
            "file",
            "--unique-scope",
            "table_column",
            "--log-level",
            "debug",
        ])
        .expect("valid command line");

        assert_eq!(cli.log_level, "debug");
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.schema, PathBuf::from("schema.sql"));
        assert_eq!(args.rows, Some(5));
        assert_eq!(args.types.len(), 2);
        assert_eq!(args.source.source, Some(SourceKind::Corpus));
        assert_eq!(args.source.unique_scope, Some(UniqueScope::TableColumn));
    }

    #[test]
    fn manual_requires_columns() {
        assert!(Cli::try_parse_from(["sqlseed", "manual", "--table", "people"]).is_err());
        let cli = Cli::try_parse_from([
            "sqlseed",
            "manual",
            "--table",
            "people",
            "--column",
            "id:Number [0,10000]",
            "--column",
            "email:Email",
            "--unique",
            "id",
        ])
        .expect("valid command line");
        let Command::Manual(args) = cli.command else {
            panic!("expected manual");
        };
        assert_eq!(args.columns, vec!["id:Number [0,10000]", "email:Email"]);
        assert_eq!(args.unique, vec!["id"]);
    }

    #[test]
    fn flags_win_over_settings() {
        let settings = Settings {
            source: Some(SourceKind::Faker),
            seed: Some(3),
            max_unique_attempts: Some(20),
            ..Settings::default()
        };
        let args = SourceArgs {
            seed: Some(9),
            ..SourceArgs::default()
        };
        let resolved = ResolvedSource::resolve(&args, &settings);
        assert_eq!(resolved.kind, SourceKind::Faker);
        assert_eq!(resolved.seed, 9);
        assert_eq!(resolved.options.max_unique_attempts, 20);
        assert_eq!(resolved.options.unique_scope, UniqueScope::ColumnName);
        assert_eq!(resolved.resources, PathBuf::from(DEFAULT_RESOURCES_PATH));
    }

    #[test]
    fn row_count_defaults_match_the_engine() {
        let plan = Settings::default().row_plan(DEFAULT_ROWS);
        assert_eq!(
            plan.rows_for("orders"),
            sqlseed_generate::RowPlan::default().rows_for("orders")
        );
    }

    #[test]
    fn table_rows_need_name_and_count() {
        assert_eq!(
            parse_table_rows("orders=40").expect("valid"),
            ("orders".to_string(), 40)
        );
        assert!(parse_table_rows("orders").is_err());
        assert!(parse_table_rows("orders=many").is_err());
        assert!(parse_table_rows("bad-name=3").is_err());
    }
}
