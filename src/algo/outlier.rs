//! Per-dimension outlier contribution.
//!
//! The skew-directed evidence never drops below the symmetric two-tail
//! average: `O = max(U_skew, (U_l + U_r) / 2)`.

pub fn outlier_contribution(skewed: &[f64], left: &[f64], right: &[f64]) -> Vec<f64> {
    skewed
        .iter()
        .zip(left.iter().zip(right))
        .map(|(&s, (&l, &r))| s.max((l + r) / 2.0))
        .collect()
}
