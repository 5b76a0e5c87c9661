//! Tail surprise transforms.
//!
//! The right tail is the left tail of the negated column under its own
//! freshly fitted ECDF, not a reflection of the left-tail ECDF.

use super::ecdf::ecdf_at_samples;

/// `-ln(ECDF(x))` for each value of the column.
pub fn left_tail(column: &[f64]) -> Vec<f64> {
    ecdf_at_samples(column)
        .into_iter()
        .map(|p| -p.ln())
        .collect()
}

/// `-ln(ECDF'(-x))`, with ECDF' fitted on the negated column.
pub fn right_tail(column: &[f64]) -> Vec<f64> {
    let negated: Vec<f64> = column.iter().map(|v| -v).collect();
    left_tail(&negated)
}
