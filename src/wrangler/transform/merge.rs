use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::wrangler::error::{PipelineError, Result};
use crate::wrangler::model::{Cell, PID_COLUMN, Table};

/// Suffixes appended to non-key columns present on both sides of a join.
const LEFT_SUFFIX: &str = "_x";
const RIGHT_SUFFIX: &str = "_y";

/// Joins personal, billing, and offer tables on the customer identifier,
/// left to right. Only identifiers present in all three survive.
#[instrument(
    level = "info",
    skip_all,
    fields(personal = personal.len(), billing = billing.len(), offers = offers.len())
)]
pub fn merge_sources(personal: &Table, billing: &Table, offers: &Table) -> Result<Table> {
    let merged = inner_join(personal, billing, PID_COLUMN)?;
    let merged = inner_join(&merged, offers, PID_COLUMN)?;
    debug!(rows = merged.len(), "merged sources");
    Ok(merged)
}

/// Inner join of two tables on `key`.
///
/// Keys compare by exact string equality of their rendered form. Output rows
/// follow left-table order, each paired with every matching right row in
/// right-table order. The key column appears once, in its left position, and
/// the right table's remaining columns follow the left table's.
pub fn inner_join(left: &Table, right: &Table, key: &str) -> Result<Table> {
    let left_key = left
        .column_index(key)
        .ok_or_else(|| PipelineError::MissingColumn(key.to_string()))?;
    let right_key = right
        .column_index(key)
        .ok_or_else(|| PipelineError::MissingColumn(key.to_string()))?;

    let mut right_rows: HashMap<String, Vec<&[Cell]>> = HashMap::new();
    for row in &right.rows {
        right_rows
            .entry(row[right_key].to_string())
            .or_default()
            .push(row.as_slice());
    }

    let mut joined = Table {
        columns: joined_columns(left, right, key, right_key),
        rows: Vec::new(),
    };

    for row in &left.rows {
        let Some(matches) = right_rows.get(&row[left_key].to_string()) else {
            continue;
        };
        for right_row in matches {
            let mut cells = row.clone();
            cells.extend(
                right_row
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| *index != right_key)
                    .map(|(_, cell)| cell.clone()),
            );
            joined.push_row(cells);
        }
    }

    Ok(joined)
}

fn joined_columns(left: &Table, right: &Table, key: &str, right_key: usize) -> Vec<String> {
    let left_names: HashSet<&str> = left.columns.iter().map(String::as_str).collect();
    let right_names: HashSet<&str> = right
        .columns
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != right_key)
        .map(|(_, name)| name.as_str())
        .collect();

    let left_columns = left.columns.iter().map(|name| {
        if name != key && right_names.contains(name.as_str()) {
            format!("{name}{LEFT_SUFFIX}")
        } else {
            name.clone()
        }
    });
    let right_columns = right
        .columns
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != right_key)
        .map(|(_, name)| {
            if left_names.contains(name.as_str()) {
                format!("{name}{RIGHT_SUFFIX}")
            } else {
                name.clone()
            }
        });

    left_columns.chain(right_columns).collect()
}
