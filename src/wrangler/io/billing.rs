use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::wrangler::error::{PipelineError, Result};
use crate::wrangler::model::{Cell, PID_COLUMN, Table, canonical_id};

const SOURCE_NAME: &str = "billing";

/// Layout of the billing export's address block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BillingSchema {
    /// Address carries only the ZIP code.
    Basic,
    /// Address also carries city, street, and house number.
    #[default]
    Extended,
}

impl BillingSchema {
    /// Output columns for this schema, in order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            BillingSchema::Basic => &[PID_COLUMN, "last_updated", "ZIP"],
            BillingSchema::Extended => &[
                PID_COLUMN,
                "last_updated",
                "ZIP",
                "city",
                "street",
                "number",
            ],
        }
    }
}

#[derive(Debug, Deserialize)]
struct BillingEntry {
    #[serde(rename = "PID")]
    pid: Value,
    last_updated: i64,
    address_info: AddressInfo,
}

#[derive(Debug, Deserialize)]
struct AddressInfo {
    #[serde(rename = "ZIP")]
    zip: Value,
    city: Option<String>,
    street: Option<String>,
    number: Option<Value>,
}

/// Loads the billing entries file.
#[instrument(level = "info", skip_all, fields(path = %path.display(), ?schema))]
pub fn load_billing(path: &Path, schema: BillingSchema) -> Result<Table> {
    let source = super::read_source(path)?;
    let table = parse_billing(&source, schema)?;
    debug!(rows = table.len(), "loaded billing entries");
    Ok(table)
}

/// Parses a JSON array of billing entries. Identifier, ZIP, and house number
/// are canonicalised to strings.
pub fn parse_billing(source: &str, schema: BillingSchema) -> Result<Table> {
    let entries: Vec<BillingEntry> =
        serde_json::from_str(source).map_err(|err| PipelineError::parse(SOURCE_NAME, err))?;

    let mut table = Table::with_columns(schema.columns());
    for (index, entry) in entries.into_iter().enumerate() {
        let mut row = vec![
            Cell::Text(identifier(index, "PID", &entry.pid)?),
            Cell::Integer(entry.last_updated),
            Cell::Text(identifier(index, "ZIP", &entry.address_info.zip)?),
        ];

        if schema == BillingSchema::Extended {
            let address = entry.address_info;
            let number = address
                .number
                .ok_or_else(|| missing_field(index, "number"))?;
            row.push(Cell::Text(
                address.city.ok_or_else(|| missing_field(index, "city"))?,
            ));
            row.push(Cell::Text(
                address.street.ok_or_else(|| missing_field(index, "street"))?,
            ));
            row.push(Cell::Text(identifier(index, "number", &number)?));
        }

        table.push_row(row);
    }

    Ok(table)
}

fn identifier(index: usize, field: &str, value: &Value) -> Result<String> {
    canonical_id(value).ok_or_else(|| {
        PipelineError::parse(
            SOURCE_NAME,
            format!("record {index}: unsupported {field} value {value}"),
        )
    })
}

fn missing_field(index: usize, field: &str) -> PipelineError {
    PipelineError::parse(
        SOURCE_NAME,
        format!("record {index}: missing field `address_info.{field}`"),
    )
}
