// Per-vintage ingestion and stacking into the unified table.
//
// Each year's file is read with its headers mapped through the rename
// table, every row is stamped with the vintage it came from, and the
// result is appended below the previous years. Row order is preserved
// within and across years and nothing is deduplicated.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::renames::{self, canonical_name};
use super::table::{Cell, Table};
use crate::error::{PipelineError, Result};

/// File name of the unified-table checkpoint inside the output directory.
pub const CHECKPOINT_FILE: &str = "data_all_years.csv";

/// Where the yearly tables live and how to read them.
#[derive(Debug, Clone)]
pub struct Normalizer {
    pub input_dir: PathBuf,
    /// File name with a `{year}` (or `{yy}`) placeholder, e.g. `state_M{year}_dl.csv`.
    pub filename_template: String,
    pub delimiter: u8,
}

impl Normalizer {
    pub fn new(input_dir: impl Into<PathBuf>, filename_template: impl Into<String>) -> Self {
        Self {
            input_dir: input_dir.into(),
            filename_template: filename_template.into(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Full path of the input file for `year`.
    pub fn path_for(&self, year: i32) -> PathBuf {
        self.input_dir
            .join(resolve_filename(&self.filename_template, year))
    }

    /// Read every year in `years` (inclusive) and stack them into one table.
    ///
    /// A missing or unreadable year aborts the whole run.
    pub fn normalize(&self, years: RangeInclusive<i32>) -> Result<Table> {
        if years.is_empty() {
            return Err(PipelineError::InvalidConfig(format!(
                "empty year range {}..={}",
                years.start(),
                years.end()
            )));
        }

        let mut unified = Table::new();
        for year in years {
            let table = self.read_year(year)?;
            info!(
                year,
                rows = table.len(),
                columns = table.columns().len(),
                "Read vintage"
            );
            unified.append(table);
        }

        info!(
            rows = unified.len(),
            columns = unified.columns().len(),
            "Built unified table"
        );
        Ok(unified)
    }

    /// Read a single vintage with canonical column names and a YEAR column.
    pub fn read_year(&self, year: i32) -> Result<Table> {
        let path = self.path_for(year);
        if !path.is_file() {
            return Err(PipelineError::MissingInput { year, path });
        }

        let mut table = self.read_header(&path)?;
        let year_idx = table.ensure_column(renames::YEAR);
        let year_text = year.to_string();

        let mut rdr = self.reader(&path)?;
        let mut record = csv::ByteRecord::new();
        loop {
            let more = rdr
                .read_byte_record(&mut record)
                .map_err(|e| PipelineError::malformed(&path, e.to_string()))?;
            if !more {
                break;
            }
            let mut row: Vec<Cell> = record.iter().map(decode_cell).collect();
            row.resize(table.columns().len(), None);
            row[year_idx] = Some(year_text.clone());
            table.push_row(row);
        }

        Ok(table)
    }

    /// Canonical column names of a vintage, without reading its rows.
    pub fn read_columns(&self, year: i32) -> Result<Vec<String>> {
        let path = self.path_for(year);
        if !path.is_file() {
            return Err(PipelineError::MissingInput { year, path });
        }
        Ok(self.read_header(&path)?.columns().to_vec())
    }

    fn reader(&self, path: &Path) -> Result<csv::Reader<std::fs::File>> {
        csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_path(path)
            .map_err(|e| PipelineError::malformed(path, e.to_string()))
    }

    /// Build an empty table from the file's header row, renamed to canonical names.
    fn read_header(&self, path: &Path) -> Result<Table> {
        let mut rdr = self.reader(path)?;
        let headers = rdr
            .byte_headers()
            .map_err(|e| PipelineError::malformed(path, e.to_string()))?
            .clone();
        if headers.is_empty() {
            return Err(PipelineError::malformed(path, "no header row"));
        }

        let mut table = Table::new();
        for (i, raw) in headers.iter().enumerate() {
            let raw = decode(raw);
            let name = match canonical_name(&raw) {
                n if n.is_empty() => format!("UNNAMED: {i}"),
                n => n,
            };
            if table.column_index(&name).is_some() {
                return Err(PipelineError::malformed(
                    path,
                    format!("column {raw:?} duplicates canonical column {name}"),
                ));
            }
            if !raw.trim().eq_ignore_ascii_case(&name) {
                debug!(from = %raw, to = %name, "Renamed column");
            }
            table.ensure_column(&name);
        }

        for required in renames::REQUIRED {
            if table.column_index(required).is_none() {
                return Err(PipelineError::malformed(
                    path,
                    format!("missing required column {required}"),
                ));
            }
        }

        Ok(table)
    }
}

/// Substitute the year into a file name template.
///
/// `{year}` becomes the four-digit year and `{yy}` the last two digits.
pub fn resolve_filename(template: &str, year: i32) -> String {
    template
        .replace("{year}", &year.to_string())
        .replace("{yy}", &format!("{:02}", year.rem_euclid(100)))
}

/// Write the unified table to `<output_dir>/data_all_years.csv`.
pub fn write_checkpoint(table: &Table, output_dir: &Path, delimiter: u8) -> Result<PathBuf> {
    let path = output_dir.join(CHECKPOINT_FILE);
    table.write_csv(&path, delimiter)?;
    info!(path = %path.display(), rows = table.len(), "Wrote unified checkpoint");
    Ok(path)
}

/// UTF-8 if valid, otherwise each byte taken as a Latin-1 code point.
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn decode_cell(bytes: &[u8]) -> Cell {
    if bytes.is_empty() {
        None
    } else {
        Some(decode(bytes))
    }
}
