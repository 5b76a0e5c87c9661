//! Skewness Combiner
//!
//! Picks, per feature, which tail carries the outlier evidence. The blend
//! `U_l * (-sign(s - 1)) + U_r * sign(s + 1)` is applied to the skewness
//! sign `s`, which gives three regimes:
//!
//! | sign | result        |
//! |------|---------------|
//! | +1   | `U_r`         |
//! | -1   | `U_l`         |
//! |  0   | `U_l + U_r`   |

/// Sample skewness from biased moments: `m3 / m2^1.5`.
///
/// A column whose second moment vanishes relative to its mean is treated as
/// having zero skewness.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;

    let (m2, m3) = values.iter().fold((0.0, 0.0), |(m2, m3), &v| {
        let d = v - mean;
        (m2 + d * d, m3 + d * d * d)
    });
    let m2 = m2 / nf;
    let m3 = m3 / nf;

    let floor = f64::EPSILON * mean.abs();
    if m2 <= floor * floor {
        return 0.0;
    }
    m3 / m2.powf(1.5)
}

/// Sign as a real: -1, 0 or +1.
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Skew-adjusted tail evidence for one column.
pub fn skew_adjusted(left: &[f64], right: &[f64], skew_sign: f64) -> Vec<f64> {
    let left_weight = -sign(skew_sign - 1.0);
    let right_weight = sign(skew_sign + 1.0);
    left.iter()
        .zip(right)
        .map(|(&l, &r)| l * left_weight + r * right_weight)
        .collect()
}
