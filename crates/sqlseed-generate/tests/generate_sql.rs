use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use sqlseed_core::{Table, order_tables, parse_schema};
use sqlseed_generate::{
    CorpusSource, FakerSource, GenerateOptions, GenerationEngine, GenerationError, RowGenerator,
    RowPlan, TypeOverrides, UNKNOWN_VALUE, UniqueScope, ValueSource,
};

const COMPANY_SCHEMA: &str = "
CREATE TABLE emp (
    id INT PRIMARY KEY,
    first_name VARCHAR(40),
    hired DATE,
    dept_id INT,
    FOREIGN KEY (dept_id) REFERENCES dept(id)
);

CREATE TABLE dept (
    id INT PRIMARY KEY,
    city VARCHAR(60)
);
";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date")
}

fn temp_corpus_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("sqlseed_generate_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp corpus dir");
    dir
}

fn run_company(seed: u64, plan: &RowPlan) -> (String, sqlseed_generate::GenerationResult) {
    let order = order_tables(parse_schema(COMPANY_SCHEMA).tables);
    let mut source = FakerSource::with_today(seed, today());
    let mut sink = Vec::new();
    let result = GenerationEngine::new(GenerateOptions::default())
        .run(order, plan, &TypeOverrides::new(), &mut source, &mut sink)
        .expect("generation runs");
    (String::from_utf8(sink).expect("utf8 output"), result)
}

#[test]
fn foreign_keys_draw_from_referenced_rows() {
    let (output, result) = run_company(0, &RowPlan::new(5).with_table("emp", 20));

    let tables: Vec<&str> = result
        .report
        .tables
        .iter()
        .map(|table| table.table.as_str())
        .collect();
    assert_eq!(tables, vec!["dept", "emp"]);

    let dept_ids: HashSet<String> = result.tables["dept"]
        .column_values("id")
        .into_iter()
        .collect();
    let emp_dept_ids = result.tables["emp"].column_values("dept_id");
    assert_eq!(emp_dept_ids.len(), 20);
    assert!(emp_dept_ids.iter().all(|id| dept_ids.contains(id)));

    let first_emp = output
        .lines()
        .find(|line| line.starts_with("INSERT INTO emp "))
        .expect("emp statements");
    assert!(first_emp.starts_with("INSERT INTO emp (id, first_name, hired, dept_id) VALUES ("));
    assert!(first_emp.ends_with(");"));
    assert_eq!(output.lines().count(), 25);
}

#[test]
fn literals_follow_their_column_types() {
    let (_, result) = run_company(3, &RowPlan::new(10));
    for row in result.tables["emp"].generated_rows() {
        let id = row.get("id").expect("id");
        assert!(id.parse::<u32>().is_ok(), "numeric literal {id}");

        let first_name = row.get("first_name").expect("first_name");
        assert!(first_name.starts_with('\'') && first_name.ends_with('\''));

        let hired = row.get("hired").expect("hired");
        assert!(hired.starts_with("to_date('") && hired.ends_with("', 'YYYY-MM-DD')"));
    }
}

#[test]
fn primary_keys_are_pairwise_distinct() {
    let (_, result) = run_company(9, &RowPlan::new(200));
    let ids = result.tables["emp"].column_values("id");
    let distinct: HashSet<&String> = ids.iter().collect();
    assert_eq!(ids.len(), 200);
    assert_eq!(distinct.len(), ids.len());
}

#[test]
fn same_seed_gives_same_output() {
    let plan = RowPlan::new(8);
    let (first, _) = run_company(42, &plan);
    let (second, _) = run_company(42, &plan);
    assert_eq!(first, second);
}

#[test]
fn small_corpus_allows_exactly_its_size_in_unique_rows() {
    let root = temp_corpus_dir("small_corpus");
    fs::write(root.join("city.txt"), "Lima\nOslo\nQuito\n").expect("write corpus");

    let mut table = Table::new("places");
    table.add_column("city", "City");
    table.add_unique_column("city");

    let mut source = CorpusSource::new(&root, 5);
    let mut generator = RowGenerator::new(&mut source, &GenerateOptions::default());
    let processed = HashMap::new();
    for _ in 0..3 {
        generator
            .generate_row(&mut table, &processed)
            .expect("a fresh city is still available");
    }

    let err = generator
        .generate_row(&mut table, &processed)
        .expect_err("corpus exhausted");
    match err {
        GenerationError::UniqueExhausted { column, attempts } => {
            assert_eq!(column, "city");
            assert_eq!(attempts, 1000);
        }
        other => panic!("unexpected error: {other}"),
    }

    let mut cities = table.column_values("city");
    cities.sort();
    assert_eq!(cities, vec!["'Lima'", "'Oslo'", "'Quito'"]);
}

#[test]
fn row_failure_ends_only_its_table() {
    let schema = "
CREATE TABLE scores (
    score INT UNIQUE
);
CREATE TABLE notes (
    id INT PRIMARY KEY
);
";
    let mut overrides = TypeOverrides::new();
    overrides
        .insert_assignment("scores.score=Number [0,10]")
        .expect("valid assignment");

    let order = order_tables(parse_schema(schema).tables);
    let mut source = FakerSource::with_today(1, today());
    let mut sink: Vec<u8> = Vec::new();
    let result = GenerationEngine::new(GenerateOptions::default())
        .run(order, &RowPlan::new(30), &overrides, &mut source, &mut sink)
        .expect("run completes");

    let scores = result.report.table("scores").expect("scores report");
    assert_eq!(scores.rows_generated, 11);
    assert!(scores.error.as_deref().is_some_and(|msg| msg.contains("score")));

    let notes = result.report.table("notes").expect("notes report");
    assert_eq!(notes.rows_generated, 30);
    assert!(notes.error.is_none());
    assert_eq!(result.report.warnings_by_code["row.unique_exhausted"], 1);
    assert!(result.report.has_errors());
}

#[test]
fn table_column_scope_keeps_pools_apart() {
    let schema = "
CREATE TABLE a (
    code INT UNIQUE
);
CREATE TABLE b (
    code INT UNIQUE
);
";
    let mut overrides = TypeOverrides::new();
    overrides
        .insert_assignment("a.code=Number [0,10]")
        .expect("valid assignment");
    overrides
        .insert_assignment("b.code=Number [0,10]")
        .expect("valid assignment");

    let options = GenerateOptions {
        unique_scope: UniqueScope::TableColumn,
        ..GenerateOptions::default()
    };
    let order = order_tables(parse_schema(schema).tables);
    let mut source = FakerSource::with_today(2, today());
    let result = GenerationEngine::new(options)
        .run(order, &RowPlan::new(11), &overrides, &mut source, &mut Vec::<u8>::new())
        .expect("run completes");

    assert!(!result.report.has_errors());
    assert_eq!(result.report.rows_total, 22);
}

#[test]
fn dropped_tables_and_unknown_types_are_reported() {
    let schema = "
CREATE TABLE a (
    id INT,
    b_id INT,
    FOREIGN KEY (b_id) REFERENCES b(id)
);
CREATE TABLE b (
    id INT,
    a_id INT,
    FOREIGN KEY (a_id) REFERENCES a(id)
);
CREATE TABLE files (
    payload BLOB
);
";
    let order = order_tables(parse_schema(schema).tables);
    let mut source = FakerSource::with_today(0, today());
    let mut sink = Vec::new();
    let result = GenerationEngine::new(GenerateOptions::default())
        .run(order, &RowPlan::new(2), &TypeOverrides::new(), &mut source, &mut sink)
        .expect("run completes");

    let dropped: Vec<&str> = result
        .report
        .dropped_tables
        .iter()
        .map(|table| table.name.as_str())
        .collect();
    assert_eq!(dropped, vec!["a", "b"]);

    let output = String::from_utf8(sink).expect("utf8 output");
    assert_eq!(
        output.lines().next(),
        Some(format!("INSERT INTO files (payload) VALUES ('{UNKNOWN_VALUE}');").as_str())
    );
    assert_eq!(result.report.warnings_by_code["field_type.unknown"], 1);
    assert_eq!(result.report.warnings_by_code["order.unresolved"], 2);

    let json = serde_json::to_value(&result.report).expect("serialize report");
    assert_eq!(json["tables"][0]["table"], "files");
}

#[test]
fn bundled_corpus_covers_every_field_type() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../resources/files");
    let mut source = CorpusSource::new(&root, 11);

    for field_type in sqlseed_generate::FieldType::ALL {
        let values = source.values(field_type.label()).expect("corpus readable");
        assert!(!values.is_empty(), "empty corpus for {field_type}");
        let value = source
            .random_value(field_type.label(), None)
            .expect("value drawn");
        assert_ne!(value, UNKNOWN_VALUE);
    }
}

const ONE_TO_ONE_SCHEMA: &str = "
CREATE TABLE emp (
    id INT PRIMARY KEY
);
CREATE TABLE emp_detail (
    id INT PRIMARY KEY,
    FOREIGN KEY (id) REFERENCES emp(id)
);
";

fn run_one_to_one(unique_scope: UniqueScope) -> sqlseed_generate::GenerationResult {
    let options = GenerateOptions {
        unique_scope,
        ..GenerateOptions::default()
    };
    let order = order_tables(parse_schema(ONE_TO_ONE_SCHEMA).tables);
    let mut source = FakerSource::with_today(6, today());
    GenerationEngine::new(options)
        .run(order, &RowPlan::new(5), &TypeOverrides::new(), &mut source, &mut Vec::<u8>::new())
        .expect("run completes")
}

#[test]
fn shared_key_pool_leaves_one_to_one_child_empty() {
    let result = run_one_to_one(UniqueScope::ColumnName);

    let detail = result.report.table("emp_detail").expect("emp_detail report");
    assert_eq!(detail.rows_generated, 0);
    assert!(detail.error.as_deref().is_some_and(|msg| msg.contains("'id'")));
    assert_eq!(result.report.warnings_by_code["unique.shared_pool"], 1);
    let warning = result
        .report
        .issues
        .iter()
        .find(|issue| issue.code == "unique.shared_pool")
        .expect("shared pool warning");
    assert!(warning.message.contains("--unique-scope table_column"));
    assert_eq!(warning.table.as_deref(), Some("emp_detail"));
}

#[test]
fn table_column_scope_fills_one_to_one_child() {
    let result = run_one_to_one(UniqueScope::TableColumn);

    assert!(!result.report.has_errors());
    assert!(!result.report.warnings_by_code.contains_key("unique.shared_pool"));
    let mut emp_ids = result.tables["emp"].column_values("id");
    let mut detail_ids = result.tables["emp_detail"].column_values("id");
    emp_ids.sort();
    detail_ids.sort();
    assert_eq!(detail_ids, emp_ids);
}

#[test]
fn report_records_field_type_assignments() {
    let (_, result) = run_company(1, &RowPlan::new(2));

    let emp = &result.report.assignments["emp"];
    let dept_id = emp
        .iter()
        .find(|assignment| assignment.column == "dept_id")
        .expect("dept_id assignment");
    assert_eq!(dept_id.origin, sqlseed_generate::AssignmentOrigin::ForeignKey);

    let json = serde_json::to_value(&result.report).expect("serialize report");
    assert_eq!(json["assignments"]["dept"][1]["column"], "city");
    assert_eq!(json["assignments"]["dept"][1]["label"], "City");
}
