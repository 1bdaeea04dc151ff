//! Result table.
//!
//! Built from raw engine records: columns are the union of record keys in
//! first-seen order, rows keep the order of the input records. A record
//! without a column leaves that cell empty.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use crate::engine::output::{Record, Value};
use crate::error::{SimError, SimResult};

/// Serialization format for a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableFormat {
    /// Comma-separated values with a header row.
    #[default]
    Csv,
    /// JSON array of row objects.
    Json,
}

impl FromStr for TableFormat {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(SimError::config(format!(
                "unknown output format '{other}' (expected 'csv' or 'json')"
            ))),
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Rectangular view over engine records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<Value>>>,
}

impl Table {
    /// Build a table from records.
    #[must_use]
    pub fn from_records(records: Vec<Record>) -> Self {
        let columns: IndexSet<String> = records
            .iter()
            .flat_map(|r| r.keys().map(str::to_string).collect::<Vec<_>>())
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.get(column).cloned())
                    .collect()
            })
            .collect();

        Self {
            columns: columns.into_iter().collect(),
            rows,
        }
    }

    /// Column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of one row.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[Option<Value>]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Cell at `(row, column)`; `None` if out of range or empty.
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)?.as_ref()
    }

    /// All cells of one column, top to bottom.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<Option<&Value>>> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[col].as_ref()).collect())
    }

    /// Rows converted back to records (empty cells omitted).
    #[must_use]
    pub fn to_records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .filter_map(|(column, cell)| cell.clone().map(|v| (column.clone(), v)))
                    .collect()
            })
            .collect()
    }

    /// Write the table as CSV.
    ///
    /// # Errors
    ///
    /// Returns error if writing fails.
    pub fn to_csv_writer<W: Write>(&self, writer: &mut W) -> SimResult<()> {
        let header: Vec<String> = self.columns.iter().map(|c| csv_field(c)).collect();
        writeln!(writer, "{}", header.join(","))
            .map_err(|e| SimError::io(format!("Write header failed: {e}")))?;

        for row in &self.rows {
            let line: Vec<String> = row
                .iter()
                .map(|cell| cell.as_ref().map_or_else(String::new, |v| csv_field(&v.to_string())))
                .collect();
            writeln!(writer, "{}", line.join(","))
                .map_err(|e| SimError::io(format!("Write row failed: {e}")))?;
        }

        Ok(())
    }

    /// Export the table to a CSV file.
    ///
    /// # Errors
    ///
    /// Returns error if file operations fail.
    pub fn to_csv(&self, path: &Path) -> SimResult<()> {
        let file =
            File::create(path).map_err(|e| SimError::io(format!("Failed to create file: {e}")))?;
        let mut writer = BufWriter::new(file);
        self.to_csv_writer(&mut writer)?;
        writer
            .flush()
            .map_err(|e| SimError::io(format!("Flush failed: {e}")))
    }

    /// Serialize the table as a JSON array of row objects.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json_string(&self) -> SimResult<String> {
        serde_json::to_string_pretty(&self.to_records())
            .map_err(|e| SimError::serialization(format!("JSON serialization failed: {e}")))
    }

    /// Export the table to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file operations fail.
    pub fn write_json(&self, path: &Path) -> SimResult<()> {
        let json = self.to_json_string()?;
        std::fs::write(path, json).map_err(|e| SimError::io(format!("Write failed: {e}")))
    }

    /// Render in the given format.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn render(&self, format: TableFormat) -> SimResult<String> {
        match format {
            TableFormat::Csv => {
                let mut buf = Vec::new();
                self.to_csv_writer(&mut buf)?;
                String::from_utf8(buf).map_err(|e| SimError::serialization(e.to_string()))
            }
            TableFormat::Json => self.to_json_string(),
        }
    }

    /// Write to `path` in the given format.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file operations fail.
    pub fn write(&self, path: &Path, format: TableFormat) -> SimResult<()> {
        match format {
            TableFormat::Csv => self.to_csv(path),
            TableFormat::Json => self.write_json(path),
        }
    }
}

impl From<Vec<Record>> for Table {
    fn from(records: Vec<Record>) -> Self {
        Self::from_records(records)
    }
}

/// Quote a CSV field when it contains a separator, quote or newline.
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
