//! Table loading for the CLI and callers holding text data.
//!
//! Both readers funnel through [`Matrix::from_rows`], so ragged, empty and
//! non-finite inputs are rejected the same way as in-memory tables.

use crate::error::{CopodError, Result};
use crate::matrix::Matrix;
use std::io::Read;
use std::path::Path;

/// Read a numeric CSV table. Every cell must parse as a finite float.
pub fn read_csv<R: Read>(reader: R, has_headers: bool) -> Result<Matrix> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record =
            record.map_err(|e| CopodError::InvalidInput(format!("csv row {}: {}", i, e)))?;
        let row = record
            .iter()
            .enumerate()
            .map(|(j, cell)| {
                cell.parse::<f64>().map_err(|_| {
                    CopodError::InvalidInput(format!(
                        "non-numeric value {:?} at row {}, column {}",
                        cell, i, j
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    Matrix::from_rows(&rows)
}

/// Read a JSON array of numeric arrays.
pub fn read_json<R: Read>(reader: R) -> Result<Matrix> {
    let rows: Vec<Vec<f64>> = serde_json::from_reader(reader)
        .map_err(|e| CopodError::InvalidInput(format!("json table: {}", e)))?;
    Matrix::from_rows(&rows)
}

/// Pick the reader from the file extension (`.json`, otherwise CSV).
pub fn read_path(path: impl AsRef<Path>, has_headers: bool) -> Result<Matrix> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        read_json(std::io::BufReader::new(file))
    } else {
        read_csv(file, has_headers)
    }
}
