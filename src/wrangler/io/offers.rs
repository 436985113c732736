use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, instrument};

use crate::wrangler::error::{PipelineError, Result};
use crate::wrangler::model::{Cell, PID_COLUMN, Table};

const SOURCE_NAME: &str = "offers";

/// Output columns, in order.
pub const COLUMNS: [&str; 3] = [PID_COLUMN, "offer_date", "offer_text"];

/// Loads the sales offers file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_offers(path: &Path) -> Result<Table> {
    let file = super::open_source(path)?;
    let table = parse_offers(file)?;
    debug!(rows = table.len(), "loaded offers");
    Ok(table)
}

/// Parses a headerless `;`-separated, `"`-quoted offers table. Fields are
/// kept verbatim; anything after the third field is ignored.
///
/// A quote inside an unquoted field, text directly after a closing quote, or
/// a quoted field left open at end of input is rejected.
pub fn parse_offers<R: Read>(mut source: R) -> Result<Table> {
    let mut raw = Vec::new();
    source.read_to_end(&mut raw)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b';')
        .quote(b'"')
        .flexible(true)
        .from_reader(raw.as_slice());

    let mut table = Table::with_columns(&COLUMNS);
    let mut record = StringRecord::new();
    loop {
        let start = reader.position().byte() as usize;
        let more = reader
            .read_record(&mut record)
            .map_err(|err| PipelineError::parse(SOURCE_NAME, err))?;
        if !more {
            break;
        }
        let end = (reader.position().byte() as usize).min(raw.len());
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        check_quoting(&raw[start.min(end)..end], line)?;

        if record.len() < COLUMNS.len() {
            return Err(PipelineError::parse(
                SOURCE_NAME,
                format!(
                    "line {line}: expected {} fields, found {}",
                    COLUMNS.len(),
                    record.len()
                ),
            ));
        }

        table.push_row(
            record
                .iter()
                .take(COLUMNS.len())
                .map(Cell::text)
                .collect(),
        );
    }

    Ok(table)
}

/// Validates the quoting of one record's raw bytes.
fn check_quoting(span: &[u8], line: u64) -> Result<()> {
    let mut bytes = span.iter().copied().peekable();
    let mut at_field_start = true;

    while let Some(byte) = bytes.next() {
        match byte {
            b'"' if at_field_start => {
                loop {
                    match bytes.next() {
                        None => return Err(malformed_quoting(line)),
                        Some(b'"') => match bytes.peek() {
                            Some(&b'"') => {
                                bytes.next();
                            }
                            None | Some(&(b';' | b'\n' | b'\r')) => break,
                            Some(_) => return Err(malformed_quoting(line)),
                        },
                        Some(_) => {}
                    }
                }
                at_field_start = false;
            }
            b'"' => return Err(malformed_quoting(line)),
            b';' | b'\n' | b'\r' => at_field_start = true,
            _ => at_field_start = false,
        }
    }

    Ok(())
}

fn malformed_quoting(line: u64) -> PipelineError {
    PipelineError::parse(SOURCE_NAME, format!("line {line}: malformed quoting"))
}
