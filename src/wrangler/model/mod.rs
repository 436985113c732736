use std::fmt;

use serde_json::Value;

/// Name of the customer identifier column shared by every source.
pub const PID_COLUMN: &str = "PID";

/// Rendering of [`Cell::Missing`] in textual and spreadsheet output.
pub const MISSING_MARKER: &str = "NaN";

/// A single table value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Plain text.
    Text(String),
    /// Whole number, e.g. an age or an epoch-millisecond timestamp.
    Integer(i64),
    /// Derived flag.
    Boolean(bool),
    /// Explicit missing value, substituted for the informal nulls of the sources.
    Missing,
}

impl Cell {
    /// Text cell from anything string-like.
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Whether this is the explicit missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(value) => f.write_str(value),
            Cell::Integer(value) => write!(f, "{value}"),
            Cell::Boolean(value) => write!(f, "{value}"),
            Cell::Missing => f.write_str(MISSING_MARKER),
        }
    }
}

/// Row-oriented table with a fixed, ordered column schema.
///
/// Every row holds exactly one cell per column, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Creates an empty table with the given column names.
    pub fn with_columns(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|name| name.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. The row must match the column count.
    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len(), "row width mismatch");
        self.rows.push(row);
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Value of the named column in the given row.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|cells| cells.get(index))
    }

    /// All values of the named column, top to bottom.
    pub fn column_values<'a>(
        &'a self,
        column: &str,
    ) -> Option<impl Iterator<Item = &'a Cell> + use<'a>> {
        let index = self.column_index(column)?;
        Some(self.rows.iter().map(move |row| &row[index]))
    }
}

/// Canonical string form of an identifier-like JSON value (PID, ZIP, house
/// number).
///
/// Strings are taken verbatim, so leading zeros survive. Integers render in
/// decimal and floats through `Display`, which never uses scientific notation.
/// Any other JSON type has no canonical form and yields `None`.
pub fn canonical_id(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Some(int.to_string())
            } else if let Some(uint) = number.as_u64() {
                Some(uint.to_string())
            } else {
                number.as_f64().map(|float| float.to_string())
            }
        }
        _ => None,
    }
}
