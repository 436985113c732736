use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::wrangler::error::{PipelineError, Result};
use crate::wrangler::model::{Cell, PID_COLUMN, Table, canonical_id};

const SOURCE_NAME: &str = "personal";

/// Output columns, in order.
pub const COLUMNS: [&str; 5] = [PID_COLUMN, "name", "gender", "last_contacted", "age"];

#[derive(Debug, Deserialize)]
struct PersonalEntry {
    #[serde(rename = "PID")]
    pid: Value,
    name: String,
    gender: String,
    last_contacted: String,
    birth_year: i64,
}

/// Loads the personal entries file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_personal(path: &Path, current_year: i32) -> Result<Table> {
    let source = super::read_source(path)?;
    let table = parse_personal(&source, current_year)?;
    debug!(rows = table.len(), "loaded personal entries");
    Ok(table)
}

/// Parses a JSON array of personal entries, deriving each customer's age
/// from their birth year and `current_year`.
pub fn parse_personal(source: &str, current_year: i32) -> Result<Table> {
    let entries: Vec<PersonalEntry> =
        serde_json::from_str(source).map_err(|err| PipelineError::parse(SOURCE_NAME, err))?;

    let mut table = Table::with_columns(&COLUMNS);
    for (index, entry) in entries.into_iter().enumerate() {
        let pid = canonical_id(&entry.pid).ok_or_else(|| {
            PipelineError::parse(
                SOURCE_NAME,
                format!("record {index}: unsupported PID value {}", entry.pid),
            )
        })?;

        let age = i64::from(current_year)
            .checked_sub(entry.birth_year)
            .ok_or_else(|| {
                PipelineError::parse(
                    SOURCE_NAME,
                    format!("record {index}: birth_year out of range"),
                )
            })?;

        table.push_row(vec![
            Cell::Text(pid),
            Cell::Text(entry.name),
            Cell::Text(entry.gender),
            Cell::Text(entry.last_contacted),
            Cell::Integer(age),
        ]);
    }

    Ok(table)
}
