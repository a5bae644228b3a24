//! Flat result rows and the CSV store they are appended to.
//!
//! The first row of a file carries the header. Appending to an existing,
//! non-empty file writes values only, after checking that the header matches.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use evtol_core::outputs::Outputs;
use evtol_core::units::{Quantity, Unit};

use crate::{ExportError, create_parent};

/// One result row: leading text labels, then unit-tagged values in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRecord {
    labels: Vec<(String, String)>,
    values: Vec<(String, Quantity)>,
}

impl ResultRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_outputs(outputs: &Outputs) -> Self {
        let mut record = Self::new();
        record.extend(outputs);
        record
    }

    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((name.into(), value.into()));
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: f64, unit: Unit) {
        self.values.push((name.into(), Quantity::new(value, unit)));
    }

    pub fn extend(&mut self, outputs: &Outputs) {
        for (name, quantity) in outputs.iter() {
            self.values.push((name.to_string(), *quantity));
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len() + self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column names; value columns carry their unit as `name [unit]`.
    pub fn header(&self) -> Vec<String> {
        self.labels
            .iter()
            .map(|(name, _)| name.clone())
            .chain(
                self.values
                    .iter()
                    .map(|(name, q)| format!("{name} [{}]", q.unit.symbol())),
            )
            .collect()
    }

    pub fn fields(&self) -> Vec<String> {
        self.labels
            .iter()
            .map(|(_, value)| value.clone())
            .chain(self.values.iter().map(|(_, q)| q.value.to_string()))
            .collect()
    }

    /// Write header and row to any writer.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        write_rows(writer, std::slice::from_ref(self))
    }

    /// Append the row to `path`, writing the header first when the file is new or empty.
    pub fn append_csv(&self, path: &Path) -> Result<(), ExportError> {
        append_rows(path, std::slice::from_ref(self))
    }
}

/// Write a header and `rows` to any writer.
pub fn write_rows<W: Write>(writer: W, rows: &[ResultRecord]) -> Result<(), ExportError> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(first.header())?;
    for row in rows {
        csv.write_record(row.fields())?;
    }
    csv.flush()?;
    Ok(())
}

/// Append rows sharing one header to `path`.
pub fn append_rows(path: &Path, rows: &[ResultRecord]) -> Result<(), ExportError> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let header = first.header();
    let needs_header = match std::fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    };
    if !needs_header {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        let existing = reader.records().next().transpose()?;
        let matches = existing
            .map(|row| row.iter().eq(header.iter().map(String::as_str)))
            .unwrap_or(false);
        if !matches {
            return Err(ExportError::HeaderMismatch {
                path: path.display().to_string(),
            });
        }
    }

    create_parent(path)?;
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut csv = csv::Writer::from_writer(file);
    if needs_header {
        csv.write_record(&header)?;
    }
    for row in rows {
        csv.write_record(row.fields())?;
    }
    csv.flush()?;
    Ok(())
}
