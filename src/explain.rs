//! Dimensional outlier breakdown.
//!
//! [`Explanation`] is plain data: one row of the contribution matrix and two
//! per-feature quantile bands over all of its rows. [`Explanation::render`]
//! turns it into a text chart and is the only presentation step.

use crate::algo::stats::quantile_sorted;
use crate::error::{CopodError, Result};
use crate::matrix::Matrix;
use serde::{Deserialize, Serialize};

const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub index: usize,
    /// Per-feature contribution of the explained row
    pub row: Vec<f64>,
    /// `cutoffs[0]`-quantile of each feature column
    pub low_band: Vec<f64>,
    /// `cutoffs[1]`-quantile of each feature column
    pub high_band: Vec<f64>,
    pub cutoffs: [f64; 2],
    /// Label of the row when it belongs to the current labels
    pub label: Option<u8>,
}

pub fn validate_cutoffs(cutoffs: [f64; 2]) -> Result<()> {
    for c in cutoffs {
        if !(c > 0.0 && c < 1.0) {
            return Err(CopodError::InvalidParameter(format!(
                "cutoff must be in (0, 1), got {}",
                c
            )));
        }
    }
    Ok(())
}

impl Explanation {
    pub fn from_contributions(
        outlier: &Matrix,
        index: usize,
        cutoffs: [f64; 2],
        label: Option<u8>,
    ) -> Result<Self> {
        if index >= outlier.rows() {
            return Err(CopodError::IndexOutOfRange {
                index,
                len: outlier.rows(),
            });
        }
        validate_cutoffs(cutoffs)?;

        let mut low_band = Vec::with_capacity(outlier.cols());
        let mut high_band = Vec::with_capacity(outlier.cols());
        for mut column in outlier.columns() {
            column.sort_by(f64::total_cmp);
            low_band.push(quantile_sorted(&column, cutoffs[0]));
            high_band.push(quantile_sorted(&column, cutoffs[1]));
        }

        Ok(Self {
            index,
            row: outlier.row(index).to_vec(),
            low_band,
            high_band,
            cutoffs,
            label,
        })
    }

    pub fn dims(&self) -> usize {
        self.row.len()
    }

    /// Dimensions (0-based) where the row exceeds the upper band.
    pub fn exceeding_dims(&self) -> Vec<usize> {
        self.row
            .iter()
            .zip(&self.high_band)
            .enumerate()
            .filter(|(_, (v, band))| v > band)
            .map(|(j, _)| j)
            .collect()
    }

    pub fn render(&self) -> String {
        let label = match self.label {
            Some(1) => " (Outlier)",
            Some(_) => " (Inlier)",
            None => "",
        };
        let max = self
            .row
            .iter()
            .chain(&self.low_band)
            .chain(&self.high_band)
            .copied()
            .fold(0.0_f64, f64::max);
        let scale = if max > 0.0 { BAR_WIDTH as f64 / max } else { 0.0 };

        let mut out = String::new();
        out.push_str(&format!(
            "Outlier Score Breakdown for Data #{}{}\n",
            self.index + 1,
            label
        ));
        out.push_str(&format!(
            "{:<5} | {:>10} | {:>10} | {:>10} |\n",
            "Dim",
            "Score",
            format!("{} Band", self.cutoffs[0]),
            format!("{} Band", self.cutoffs[1]),
        ));
        out.push_str(&format!("{}\n", "-".repeat(48 + BAR_WIDTH)));

        for j in 0..self.dims() {
            let v = self.row[j];
            let bar = "#".repeat((v * scale).round() as usize);
            let flag = if v > self.high_band[j] { " !" } else { "" };
            out.push_str(&format!(
                "{:<5} | {:>10.4} | {:>10.4} | {:>10.4} | {}{}\n",
                j + 1,
                v,
                self.low_band[j],
                self.high_band[j],
                bar,
                flag
            ));
        }
        out
    }
}

impl std::fmt::Display for Explanation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contributions() -> Matrix {
        Matrix::from_rows(&[
            vec![0.1, 1.0],
            vec![0.2, 2.0],
            vec![0.3, 3.0],
            vec![0.4, 4.0],
            vec![5.0, 5.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_bands_are_column_quantiles() {
        let e = Explanation::from_contributions(&contributions(), 4, [0.5, 0.75], Some(1)).unwrap();
        assert_eq!(e.row, vec![5.0, 5.0]);
        assert_eq!(e.low_band, vec![0.3, 3.0]);
        assert_eq!(e.high_band, vec![0.4, 4.0]);
        assert_eq!(e.exceeding_dims(), vec![0, 1]);
    }

    #[test]
    fn test_index_out_of_range() {
        let err = Explanation::from_contributions(&contributions(), 5, [0.9, 0.99], None);
        assert!(matches!(
            err,
            Err(CopodError::IndexOutOfRange { index: 5, len: 5 })
        ));
    }

    #[test]
    fn test_cutoffs_validated() {
        assert!(validate_cutoffs([0.9, 0.99]).is_ok());
        assert!(validate_cutoffs([0.0, 0.99]).is_err());
        assert!(validate_cutoffs([0.9, 1.0]).is_err());
    }

    #[test]
    fn test_render_lists_every_dimension() {
        let e = Explanation::from_contributions(&contributions(), 0, [0.9, 0.99], Some(0)).unwrap();
        let text = e.render();
        assert!(text.starts_with("Outlier Score Breakdown for Data #1 (Inlier)"));
        assert_eq!(text.lines().count(), 3 + e.dims());
    }
}
