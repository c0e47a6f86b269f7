// Delimited inventory report and alternatives table.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::info;

use cartons_recon::{AlternativesTable, ReportRow};

use crate::error::IoError;
use crate::{check_overwrite, delimiter_byte};

/// Streams report rows to a delimited file, header first.
pub struct ReportWriter {
    writer: csv::Writer<File>,
    path: PathBuf,
    columns: usize,
    rows: usize,
}

impl ReportWriter {
    pub fn create(path: &Path, delimiter: char, header: &[String], overwrite: bool) -> Result<Self, IoError> {
        check_overwrite(path, overwrite)?;
        let file = File::create(path).map_err(|source| IoError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter_byte(delimiter)?)
            .from_writer(file);
        writer.write_record(header)?;
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            columns: header.len(),
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_row(&mut self, row: &ReportRow) -> Result<(), IoError> {
        let cells = row.to_record();
        debug_assert_eq!(cells.len(), self.columns);
        self.writer.write_record(&cells)?;
        self.rows += 1;
        Ok(())
    }

    /// Flush and close. Returns the number of data rows written.
    pub fn finish(mut self) -> Result<usize, IoError> {
        self.writer.flush()?;
        info!(path = %self.path.display(), rows = self.rows, "saved output file");
        Ok(self.rows)
    }
}

/// Write an alternatives table as delimited text with a header row.
pub fn write_alternatives<W: std::io::Write>(
    out: W,
    table: &AlternativesTable,
    delimiter: char,
) -> Result<(), IoError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter_byte(delimiter)?)
        .from_writer(out);
    if table.is_empty() {
        writer.write_record(["name", "plan", "category", "stage", "active", "tag", "version_id", "found"])?;
    }
    for row in &table.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
