use std::path::Path;

use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::{debug, instrument};

use crate::wrangler::error::Result;
use crate::wrangler::model::{Cell, MISSING_MARKER, Table};

/// Name of the single sheet in the report.
pub const REPORT_SHEET: &str = "Sheet1";

/// Writes the table to a single-sheet workbook at the given path: a header
/// row of column names followed by one row per record.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = table.len()))]
pub fn write_report(path: &Path, table: &Table) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(REPORT_SHEET)?;

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            write_cell(worksheet, (row_idx + 1) as u32, col_idx as u16, cell)?;
        }
    }

    if !table.is_empty() && !table.columns.is_empty() {
        let mut excel_table = rust_xlsxwriter::Table::new();
        excel_table.set_autofilter(true);
        let col_end = (table.columns.len() as u16).saturating_sub(1);
        worksheet.add_table(0, 0, table.len() as u32, col_end, &excel_table)?;
    }

    workbook.save(path)?;
    debug!("workbook saved");
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    match cell {
        Cell::Text(value) => worksheet.write_string(row, col, value)?,
        Cell::Integer(value) => worksheet.write_number(row, col, *value as f64)?,
        Cell::Boolean(value) => worksheet.write_boolean(row, col, *value)?,
        Cell::Missing => worksheet.write_string(row, col, MISSING_MARKER)?,
    };
    Ok(())
}
