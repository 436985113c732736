use chrono::{NaiveDateTime, TimeZone};
use tracing::{debug, instrument};

use crate::wrangler::error::{PipelineError, Result};
use crate::wrangler::model::{Cell, PID_COLUMN, Table};

pub const LAST_CONTACTED_COLUMN: &str = "last_contacted";
pub const LAST_UPDATED_COLUMN: &str = "last_updated";
pub const ZIP_COLUMN: &str = "ZIP";
pub const UPDATE_NEEDED_COLUMN: &str = "update_needed";

/// Format of `last_contacted`: ISO-8601 local time without zone.
pub const LAST_CONTACTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Appends the `update_needed` flag and drops the two raw timestamp columns.
///
/// A customer needs an update when they were contacted after their billing
/// data last changed, or when their ZIP code is missing. `last_updated` holds
/// epoch milliseconds and is read as wall-clock time in `zone`.
///
/// A timestamp that is missing or unparseable aborts with
/// [`PipelineError::InvalidTimestamp`] naming the row's PID.
#[instrument(level = "info", skip_all, fields(rows = table.len()))]
pub fn reshape<Tz: TimeZone>(table: Table, zone: &Tz) -> Result<Table> {
    let pid_idx = require(&table, PID_COLUMN)?;
    let contacted_idx = require(&table, LAST_CONTACTED_COLUMN)?;
    let updated_idx = require(&table, LAST_UPDATED_COLUMN)?;
    let zip_idx = require(&table, ZIP_COLUMN)?;

    let mut columns: Vec<String> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != contacted_idx && *index != updated_idx)
        .map(|(_, name)| name.clone())
        .collect();
    columns.push(UPDATE_NEEDED_COLUMN.to_string());

    let mut reshaped = Table {
        columns,
        rows: Vec::with_capacity(table.len()),
    };
    let mut flagged = 0usize;

    for row in table.rows {
        let pid = &row[pid_idx];
        let contacted = parse_last_contacted(pid, &row[contacted_idx])?;
        let updated = parse_last_updated(pid, &row[updated_idx], zone)?;
        let update_needed = contacted > updated || row[zip_idx].is_missing();
        if update_needed {
            flagged += 1;
        }

        let mut cells: Vec<Cell> = row
            .into_iter()
            .enumerate()
            .filter(|(index, _)| *index != contacted_idx && *index != updated_idx)
            .map(|(_, cell)| cell)
            .collect();
        cells.push(Cell::Boolean(update_needed));
        reshaped.push_row(cells);
    }

    debug!(flagged, "derived update flags");
    Ok(reshaped)
}

fn require(table: &Table, column: &str) -> Result<usize> {
    table
        .column_index(column)
        .ok_or_else(|| PipelineError::MissingColumn(column.to_string()))
}

fn parse_last_contacted(pid: &Cell, cell: &Cell) -> Result<NaiveDateTime> {
    match cell {
        Cell::Text(value) => NaiveDateTime::parse_from_str(value, LAST_CONTACTED_FORMAT)
            .map_err(|_| invalid_timestamp(pid, LAST_CONTACTED_COLUMN, cell)),
        _ => Err(invalid_timestamp(pid, LAST_CONTACTED_COLUMN, cell)),
    }
}

fn parse_last_updated<Tz: TimeZone>(pid: &Cell, cell: &Cell, zone: &Tz) -> Result<NaiveDateTime> {
    match cell {
        Cell::Integer(millis) => zone
            .timestamp_millis_opt(*millis)
            .earliest()
            .map(|moment| moment.naive_local())
            .ok_or_else(|| invalid_timestamp(pid, LAST_UPDATED_COLUMN, cell)),
        _ => Err(invalid_timestamp(pid, LAST_UPDATED_COLUMN, cell)),
    }
}

fn invalid_timestamp(pid: &Cell, column: &str, value: &Cell) -> PipelineError {
    PipelineError::InvalidTimestamp {
        pid: pid.to_string(),
        column: column.to_string(),
        value: value.to_string(),
    }
}
