//! Empirical Cumulative Distribution Function
//!
//! Right-continuous step function built from a sample:
//! `F(x) = #{v <= x} / n`. No interpolation, no smoothing. Ties all map to
//! the inclusive fraction, so evaluating the ECDF on its own sample never
//! yields zero.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ecdf {
    /// Sample sorted ascending
    sorted: Vec<f64>,
}

impl Ecdf {
    pub fn fit(sample: &[f64]) -> Self {
        let mut sorted = sample.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self { sorted }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Fraction of the sample `<= x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        if self.sorted.is_empty() {
            return 0.0;
        }
        let count = self.sorted.partition_point(|&v| v <= x);
        count as f64 / self.sorted.len() as f64
    }
}

/// ECDF of `values` evaluated at each of `values`.
pub fn ecdf_at_samples(values: &[f64]) -> Vec<f64> {
    let ecdf = Ecdf::fit(values);
    values.iter().map(|&x| ecdf.evaluate(x)).collect()
}
