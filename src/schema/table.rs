// The unified table: canonical column names plus rectangular rows of
// nullable string cells.
//
// Cells are kept as the exact text read from the input so the checkpoint
// written back out is reproducible byte for byte. Nothing is parsed into
// numbers; downstream stages only compare strings.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PipelineError, Result};

/// One cell. `None` is null (empty in the source file).
pub type Cell = Option<String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Return the index of `name`, appending it as a new all-null column
    /// if the table doesn't have it yet.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(None);
        }
        debug!(column = name, "Added column to unified table");
        self.columns.len() - 1
    }

    /// Append a row. Short rows are padded with nulls; the caller must
    /// never pass more cells than there are columns.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        debug_assert!(row.len() <= self.columns.len());
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    /// Stack `other` below the existing rows. Columns are matched by name;
    /// columns new to this table are appended and null-filled for the
    /// rows already present.
    pub fn append(&mut self, other: Table) {
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|c| self.ensure_column(c))
            .collect();
        let width = self.columns.len();

        self.rows.reserve(other.rows.len());
        for src in other.rows {
            let mut row = vec![None; width];
            for (cell, &dst) in src.into_iter().zip(&mapping) {
                row[dst] = cell;
            }
            self.rows.push(row);
        }
    }

    /// Value of `column` in row `row`, or `None` if null or the column is absent.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// All values of a column in row order. Absent column yields all nulls.
    pub fn column_values<'a>(&'a self, column: &str) -> Vec<Option<&'a str>> {
        match self.column_index(column) {
            Some(idx) => self.rows.iter().map(|r| r[idx].as_deref()).collect(),
            None => vec![None; self.rows.len()],
        }
    }

    /// Distinct non-null values of a column, in first-seen order.
    /// Equality is exact (case-sensitive).
    pub fn distinct_values(&self, column: &str) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.column_values(column)
            .into_iter()
            .flatten()
            .filter(|v| seen.insert(*v))
            .collect()
    }

    /// Copy of the rows whose index satisfies `keep`, with the same columns.
    pub fn select<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(usize) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .enumerate()
                .filter(|(i, _)| keep(*i))
                .map(|(_, r)| r.clone())
                .collect(),
        }
    }

    /// Rewrite every non-null value of `column` in place.
    pub fn map_column<F>(&mut self, column: &str, mut f: F)
    where
        F: FnMut(&str) -> String,
    {
        let Some(idx) = self.column_index(column) else {
            return;
        };
        for row in &mut self.rows {
            if let Some(value) = row[idx].as_mut() {
                *value = f(value);
            }
        }
    }

    /// Write the table as a delimited file. Nulls become empty fields.
    ///
    /// The file is written under a temporary name and renamed into place
    /// once complete, so a failed write leaves no file at `path`.
    pub fn write_csv(&self, path: &Path, delimiter: u8) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }

        let tmp = partial_path(path);
        let written = self.write_to(&tmp, delimiter);
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, path).map_err(|e| PipelineError::io(path, e))?;

        debug!(path = %path.display(), rows = self.len(), "Wrote table");
        Ok(())
    }

    fn write_to(&self, tmp: &Path, delimiter: u8) -> Result<()> {
        let to_io = |e: csv::Error| PipelineError::io(tmp, e.into());

        let mut wtr = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(tmp)
            .map_err(to_io)?;
        wtr.write_record(&self.columns).map_err(to_io)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))
                .map_err(to_io)?;
        }
        wtr.flush().map_err(|e| PipelineError::io(tmp, e))?;
        Ok(())
    }
}

/// Sibling temp name an output is written under before the rename.
pub(crate) fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new();
        t.ensure_column("OCC_TITLE");
        t.ensure_column("STATE");
        t.push_row(vec![Some("Welders".into()), Some("Texas".into())]);
        t.push_row(vec![Some("Cooks".into()), None]);
        t.push_row(vec![Some("Welders".into()), Some("Ohio".into())]);
        t
    }

    #[test]
    fn test_ensure_column_pads_existing_rows() {
        let mut t = sample();
        let idx = t.ensure_column("YEAR");
        assert_eq!(idx, 2);
        assert!(t.rows().iter().all(|r| r.len() == 3 && r[2].is_none()));
        // Existing column is not duplicated
        assert_eq!(t.ensure_column("STATE"), 1);
        assert_eq!(t.columns().len(), 3);
    }

    #[test]
    fn test_distinct_values_first_seen_order() {
        let t = sample();
        assert_eq!(t.distinct_values("OCC_TITLE"), vec!["Welders", "Cooks"]);
        assert_eq!(t.distinct_values("STATE"), vec!["Texas", "Ohio"]);
        assert!(t.distinct_values("MISSING").is_empty());
    }

    #[test]
    fn test_append_unions_columns_and_preserves_order() {
        let mut t = sample();
        let mut other = Table::new();
        other.ensure_column("STATE");
        other.ensure_column("LOC_Q");
        other.push_row(vec![Some("Iowa".into()), Some("1.2".into())]);
        t.append(other);

        assert_eq!(t.columns(), &["OCC_TITLE", "STATE", "LOC_Q"]);
        assert_eq!(t.len(), 4);
        assert_eq!(t.get(0, "LOC_Q"), None);
        assert_eq!(t.get(3, "OCC_TITLE"), None);
        assert_eq!(t.get(3, "STATE"), Some("Iowa"));
        assert_eq!(t.get(3, "LOC_Q"), Some("1.2"));
    }

    #[test]
    fn test_select_copies_subset() {
        let t = sample();
        let sub = t.select(|i| i != 1);
        assert_eq!(sub.len(), 2);
        assert_eq!(t.len(), 3, "original untouched");
        assert_eq!(sub.get(1, "STATE"), Some("Ohio"));
    }

    #[test]
    fn test_map_column_skips_nulls() {
        let mut t = sample();
        t.map_column("STATE", |s| s.to_uppercase());
        assert_eq!(t.get(0, "STATE"), Some("TEXAS"));
        assert_eq!(t.get(1, "STATE"), None);
    }

    #[test]
    fn test_write_csv_nulls_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        sample().write_csv(&path, b',').unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "OCC_TITLE,STATE\nWelders,Texas\nCooks,\nWelders,Ohio\n");
        assert!(!partial_path(&path).exists());
    }
}
