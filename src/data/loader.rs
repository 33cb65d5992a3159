// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Loads the parallel corpus from a CSV file using the csv crate.
//
// Expected layout (header row required, extra columns ignored,
// column order irrelevant):
//
//   modern,shakespearean
//   "I am very tired.","I am sore weary."
//   ...
//
// Both columns must be present. A missing column is a data-format
// error naming the column and the file. Cell contents are taken
// as-is: no deduplication, no trimming, empty cells allowed.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::domain::parallel_record::ParallelRecord;
use crate::domain::traits::CorpusSource;

/// Header of the modern English column
pub const MODERN_COLUMN: &str = "modern";

/// Header of the Shakespearean English column
pub const SHAKESPEAREAN_COLUMN: &str = "shakespearean";

/// Reads sentence pairs from a CSV file.
/// Implements the CorpusSource trait from Layer 3.
pub struct CsvCorpusLoader {
    path: PathBuf,
}

impl CsvCorpusLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CorpusSource for CsvCorpusLoader {
    fn load_records(&self) -> Result<Vec<ParallelRecord>> {
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Cannot open corpus '{}'", self.path.display()))?;

        let headers = reader
            .headers()
            .with_context(|| format!("Cannot read header row of '{}'", self.path.display()))?
            .clone();

        let modern_idx = column_index(&headers, MODERN_COLUMN, &self.path)?;
        let shakespearean_idx = column_index(&headers, SHAKESPEAREAN_COLUMN, &self.path)?;

        let mut records = Vec::new();

        for (i, row) in reader.records().enumerate() {
            // +2: one for the header row, one for 1-based line numbers
            let row = row.with_context(|| {
                format!("Malformed CSV row {} in '{}'", i + 2, self.path.display())
            })?;

            let modern        = row.get(modern_idx).unwrap_or_default();
            let shakespearean = row.get(shakespearean_idx).unwrap_or_default();
            records.push(ParallelRecord::new(modern, shakespearean));
        }

        tracing::info!(
            "Loaded {} sentence pairs from '{}'",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }
}

/// Position of a required column, or a data-format error.
fn column_index(headers: &csv::StringRecord, name: &str, path: &Path) -> Result<usize> {
    match headers.iter().position(|h| h.trim() == name) {
        Some(idx) => Ok(idx),
        None => bail!(
            "Corpus '{}' is missing required column '{}' (found: {})",
            path.display(),
            name,
            headers.iter().collect::<Vec<_>>().join(", ")
        ),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_loads_pairs_in_order() {
        let f = write_csv(
            "modern,shakespearean\n\
             Hello,Good morrow\n\
             \"Where are you, friend?\",\"Where art thou, friend?\"\n",
        );
        let records = CsvCorpusLoader::new(f.path()).load_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], ParallelRecord::new("Hello", "Good morrow"));
        assert_eq!(records[1].modern, "Where are you, friend?");
    }

    #[test]
    fn test_column_order_and_extra_columns() {
        let f = write_csv("id,shakespearean,modern\n1,Hark,Listen\n");
        let records = CsvCorpusLoader::new(f.path()).load_records().unwrap();
        assert_eq!(records, vec![ParallelRecord::new("Listen", "Hark")]);
    }

    #[test]
    fn test_missing_column_is_format_error() {
        let f = write_csv("modern,elizabethan\nHello,Good morrow\n");
        let err = CsvCorpusLoader::new(f.path()).load_records().unwrap_err();
        assert!(err.to_string().contains("shakespearean"));
    }

    #[test]
    fn test_missing_file_fails() {
        let loader = CsvCorpusLoader::new("definitely/not/here.csv");
        assert!(loader.load_records().is_err());
    }

    #[test]
    fn test_empty_cells_are_kept() {
        let f = write_csv("modern,shakespearean\n,Alas\n");
        let records = CsvCorpusLoader::new(f.path()).load_records().unwrap();
        assert_eq!(records[0].modern, "");
        assert_eq!(records[0].shakespearean, "Alas");
    }
}
