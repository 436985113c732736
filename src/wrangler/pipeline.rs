use std::path::PathBuf;

use chrono::{Datelike, Local, TimeZone};
use tracing::{debug, info, instrument};

use crate::wrangler::error::{Result, Stage, StageContext};
use crate::wrangler::io::billing::{self, BillingSchema};
use crate::wrangler::io::{excel_write, offers, personal};
use crate::wrangler::model::Table;
use crate::wrangler::transform::{merge_sources, normalize, reshape};

pub const DEFAULT_PERSONAL_PATH: &str = "source/personal_entries.json";
pub const DEFAULT_BILLING_PATH: &str = "source/billing_entries.json";
pub const DEFAULT_OFFERS_PATH: &str = "source/sales_entries.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "merged_data.xlsx";

/// Preset combinations of billing schema and reshaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// ZIP-only billing addresses, raw timestamps kept in the report.
    Basic,
    /// Full billing addresses and the derived `update_needed` flag.
    #[default]
    Extended,
}

/// Locations of the three sources and the report, plus the optional stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub personal_path: PathBuf,
    pub billing_path: PathBuf,
    pub offers_path: PathBuf,
    pub output_path: PathBuf,
    pub billing_schema: BillingSchema,
    /// Whether to run the reshaping stage.
    pub reshape: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::for_variant(Variant::default())
    }
}

impl PipelineConfig {
    /// Default paths with the stages of the given variant.
    pub fn for_variant(variant: Variant) -> Self {
        let (billing_schema, reshape) = match variant {
            Variant::Basic => (BillingSchema::Basic, false),
            Variant::Extended => (BillingSchema::Extended, true),
        };
        Self {
            personal_path: PathBuf::from(DEFAULT_PERSONAL_PATH),
            billing_path: PathBuf::from(DEFAULT_BILLING_PATH),
            offers_path: PathBuf::from(DEFAULT_OFFERS_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            billing_schema,
            reshape,
        }
    }
}

/// Row counts observed during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub personal_rows: usize,
    pub billing_rows: usize,
    pub offer_rows: usize,
    pub report_rows: usize,
}

/// The final table together with the counts that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub table: Table,
    pub summary: RunSummary,
}

/// Runs the whole pipeline against the current date and local time zone and
/// writes the report to `config.output_path`.
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    run_with_clock(config, Local::now().year(), &Local)
}

/// Like [`run`], with the year used for age derivation and the zone used to
/// read epoch timestamps supplied by the caller.
#[instrument(
    level = "info",
    skip_all,
    fields(output = %config.output_path.display(), current_year = current_year)
)]
pub fn run_with_clock<Tz: TimeZone>(
    config: &PipelineConfig,
    current_year: i32,
    zone: &Tz,
) -> Result<RunSummary> {
    let report = assemble_report(config, current_year, zone)?;
    excel_write::write_report(&config.output_path, &report.table).in_stage(Stage::Write)?;
    info!(
        rows = report.summary.report_rows,
        columns = report.table.columns.len(),
        "report written"
    );
    Ok(report.summary)
}

/// Loads, merges, normalizes, and optionally reshapes the sources without
/// writing anything.
#[instrument(level = "debug", skip_all, fields(schema = ?config.billing_schema, reshape = config.reshape))]
pub fn assemble_report<Tz: TimeZone>(
    config: &PipelineConfig,
    current_year: i32,
    zone: &Tz,
) -> Result<Report> {
    let personal = personal::load_personal(&config.personal_path, current_year)
        .in_stage(Stage::LoadPersonal)?;
    let billing = billing::load_billing(&config.billing_path, config.billing_schema)
        .in_stage(Stage::LoadBilling)?;
    let offers = offers::load_offers(&config.offers_path).in_stage(Stage::LoadOffers)?;
    info!(
        personal = personal.len(),
        billing = billing.len(),
        offers = offers.len(),
        "sources loaded"
    );

    let merged = merge_sources(&personal, &billing, &offers).in_stage(Stage::Merge)?;
    if merged.len() < personal.len().min(billing.len()).min(offers.len()) {
        debug!(
            merged = merged.len(),
            "some identifiers are absent from at least one source"
        );
    }

    let mut table = normalize(merged);
    if config.reshape {
        table = reshape(table, zone).in_stage(Stage::Reshape)?;
    }

    let summary = RunSummary {
        personal_rows: personal.len(),
        billing_rows: billing.len(),
        offer_rows: offers.len(),
        report_rows: table.len(),
    };
    Ok(Report { table, summary })
}
