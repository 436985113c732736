use calamine::{DataType, Reader, Xlsx, open_workbook};
use chrono::Utc;
use customer_wrangler::PipelineError;
use customer_wrangler::error::Stage;
use customer_wrangler::io::billing::BillingSchema;
use customer_wrangler::model::Cell;
use customer_wrangler::pipeline::{self, PipelineConfig, Variant};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const CURRENT_YEAR: i32 = 2026;

fn write_sources(dir: &Path) {
    let personal = serde_json::json!([
        {"PID": 1, "name": "A", "gender": "F", "last_contacted": "2023-01-01T00:00:00", "birth_year": 1990},
        {"PID": 2, "name": "B", "gender": "", "last_contacted": "2019-06-01T12:00:00", "birth_year": 1980},
        {"PID": 3, "name": "C", "gender": "M", "last_contacted": "2021-01-01T00:00:00", "birth_year": 2000}
    ]);
    let billing = serde_json::json!([
        {
            "PID": "1",
            "last_updated": 1577836800000i64,
            "address_info": {"ZIP": "", "city": "Berlin", "street": "Main", "number": 1}
        },
        {
            "PID": "2",
            "last_updated": 1577836800000i64,
            "address_info": {"ZIP": "01234", "city": "Hamburg", "street": "Dock", "number": "-1"}
        },
        {
            "PID": "4",
            "last_updated": 1577836800000i64,
            "address_info": {"ZIP": "99999", "city": "Bonn", "street": "Rhein", "number": 4}
        }
    ]);
    let offers = "1;2023-02-01;hello\n2;2023-03-01;\"half; off\"\n3;2023-04-01;unused\n";

    fs::write(dir.join("personal_entries.json"), personal.to_string()).expect("personal written");
    fs::write(dir.join("billing_entries.json"), billing.to_string()).expect("billing written");
    fs::write(dir.join("sales_entries.csv"), offers).expect("offers written");
}

fn config_in(dir: &Path, variant: Variant) -> PipelineConfig {
    PipelineConfig {
        personal_path: dir.join("personal_entries.json"),
        billing_path: dir.join("billing_entries.json"),
        offers_path: dir.join("sales_entries.csv"),
        output_path: dir.join("merged_data.xlsx"),
        ..PipelineConfig::for_variant(variant)
    }
}

fn read_sheet(path: &Path) -> Vec<Vec<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).expect("workbook opened");
    let range = workbook
        .worksheet_range("Sheet1")
        .expect("report sheet present")
        .expect("report sheet read");
    range.rows().map(|row| row.to_vec()).collect()
}

fn string(value: &str) -> DataType {
    DataType::String(value.to_string())
}

#[test]
fn default_config_points_at_source_directory() {
    let config = PipelineConfig::default();

    assert_eq!(config.personal_path, Path::new("source/personal_entries.json"));
    assert_eq!(config.billing_path, Path::new("source/billing_entries.json"));
    assert_eq!(config.offers_path, Path::new("source/sales_entries.csv"));
    assert_eq!(config.output_path, Path::new("merged_data.xlsx"));
    assert_eq!(config.billing_schema, BillingSchema::Extended);
    assert!(config.reshape);

    let basic = PipelineConfig::for_variant(Variant::Basic);
    assert_eq!(basic.billing_schema, BillingSchema::Basic);
    assert!(!basic.reshape);
}

#[test]
fn extended_run_writes_reshaped_report() {
    let temp_dir = tempdir().expect("temporary directory");
    write_sources(temp_dir.path());
    let config = config_in(temp_dir.path(), Variant::Extended);

    let summary = pipeline::run_with_clock(&config, CURRENT_YEAR, &Utc).expect("pipeline run");

    assert_eq!(summary.personal_rows, 3);
    assert_eq!(summary.billing_rows, 3);
    assert_eq!(summary.offer_rows, 3);
    assert_eq!(summary.report_rows, 2);

    let rows = read_sheet(&config.output_path);
    assert_eq!(
        rows[0],
        [
            "PID",
            "name",
            "gender",
            "age",
            "ZIP",
            "city",
            "street",
            "number",
            "offer_date",
            "offer_text",
            "update_needed"
        ]
        .map(string)
    );
    assert_eq!(
        rows[1],
        vec![
            string("1"),
            string("A"),
            string("F"),
            DataType::Float(36.0),
            string("NaN"),
            string("Berlin"),
            string("Main"),
            string("1"),
            string("2023-02-01"),
            string("hello"),
            DataType::Bool(true),
        ]
    );
    assert_eq!(
        rows[2],
        vec![
            string("2"),
            string("B"),
            string("NaN"),
            DataType::Float(46.0),
            string("01234"),
            string("Hamburg"),
            string("Dock"),
            string("NaN"),
            string("2023-03-01"),
            string("half; off"),
            DataType::Bool(false),
        ]
    );
    assert_eq!(rows.len(), 3);
}

#[test]
fn basic_run_keeps_raw_timestamps() {
    let temp_dir = tempdir().expect("temporary directory");
    write_sources(temp_dir.path());
    let config = config_in(temp_dir.path(), Variant::Basic);

    pipeline::run_with_clock(&config, CURRENT_YEAR, &Utc).expect("pipeline run");

    let rows = read_sheet(&config.output_path);
    assert_eq!(
        rows[0],
        [
            "PID",
            "name",
            "gender",
            "last_contacted",
            "age",
            "last_updated",
            "ZIP",
            "offer_date",
            "offer_text"
        ]
        .map(string)
    );
    assert_eq!(rows[1][5], DataType::Float(1577836800000.0));
    assert_eq!(rows.len(), 3);
}

#[test]
fn assembling_twice_yields_identical_tables() {
    let temp_dir = tempdir().expect("temporary directory");
    write_sources(temp_dir.path());
    let config = config_in(temp_dir.path(), Variant::Extended);

    let first = pipeline::assemble_report(&config, CURRENT_YEAR, &Utc).expect("first run");
    let second = pipeline::assemble_report(&config, CURRENT_YEAR, &Utc).expect("second run");

    assert_eq!(first, second);
    for row in &first.table.rows {
        for cell in row {
            let rendered = cell.to_string();
            assert!(!rendered.is_empty() && rendered != "-1");
        }
    }
}

#[test]
fn missing_source_aborts_in_its_stage_without_output() {
    let temp_dir = tempdir().expect("temporary directory");
    write_sources(temp_dir.path());
    fs::remove_file(temp_dir.path().join("billing_entries.json")).expect("billing removed");
    let config = config_in(temp_dir.path(), Variant::Extended);

    let err = pipeline::run_with_clock(&config, CURRENT_YEAR, &Utc).expect_err("run aborted");

    assert!(matches!(
        err,
        PipelineError::Stage {
            stage: Stage::LoadBilling,
            ..
        }
    ));
    assert!(matches!(err.root(), PipelineError::MissingInput(_)));
    assert!(!config.output_path.exists());
}

#[test]
fn unwritable_output_fails_in_write_stage() {
    let temp_dir = tempdir().expect("temporary directory");
    write_sources(temp_dir.path());
    let config = PipelineConfig {
        output_path: temp_dir.path().join("missing").join("out.xlsx"),
        ..config_in(temp_dir.path(), Variant::Extended)
    };

    let err = pipeline::run_with_clock(&config, CURRENT_YEAR, &Utc).expect_err("write failed");

    assert!(matches!(
        err,
        PipelineError::Stage {
            stage: Stage::Write,
            ..
        }
    ));
    assert!(matches!(err.root(), PipelineError::ExcelWrite(_)));
    assert!(!config.output_path.exists());
}

#[test]
fn sentinel_contact_date_aborts_reshape() {
    let temp_dir = tempdir().expect("temporary directory");
    write_sources(temp_dir.path());
    let personal = serde_json::json!([
        {"PID": 1, "name": "A", "gender": "F", "last_contacted": "", "birth_year": 1990}
    ]);
    fs::write(
        temp_dir.path().join("personal_entries.json"),
        personal.to_string(),
    )
    .expect("personal written");
    let config = config_in(temp_dir.path(), Variant::Extended);

    let err = pipeline::assemble_report(&config, CURRENT_YEAR, &Utc).expect_err("reshape aborted");

    assert!(err.to_string().starts_with("reshape stage failed"));
    match err.root() {
        PipelineError::InvalidTimestamp { pid, column, .. } => {
            assert_eq!(pid, "1");
            assert_eq!(column, "last_contacted");
        }
        other => panic!("unexpected error: {other}"),
    }

    let basic = config_in(temp_dir.path(), Variant::Basic);
    let report = pipeline::assemble_report(&basic, CURRENT_YEAR, &Utc).expect("basic report");
    assert_eq!(report.table.cell(0, "last_contacted"), Some(&Cell::Missing));
}
