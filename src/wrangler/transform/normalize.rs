use tracing::{debug, instrument};

use crate::wrangler::model::{Cell, Table};

/// Raw values the sources use as informal nulls.
pub const NULL_SENTINELS: [&str; 2] = ["", "-1"];

/// Replaces every cell whose string form is a null sentinel with
/// [`Cell::Missing`], across all columns.
#[instrument(level = "info", skip_all, fields(rows = table.len()))]
pub fn normalize(table: Table) -> Table {
    let mut replaced = 0usize;
    let rows: Vec<Vec<Cell>> = table
        .rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| {
                    if is_null_sentinel(&cell) {
                        replaced += 1;
                        Cell::Missing
                    } else {
                        cell
                    }
                })
                .collect::<Vec<Cell>>()
        })
        .collect();

    debug!(replaced, "normalized missing values");
    Table {
        columns: table.columns,
        rows,
    }
}

fn is_null_sentinel(cell: &Cell) -> bool {
    let rendered = cell.to_string();
    NULL_SENTINELS.contains(&rendered.as_str())
}
