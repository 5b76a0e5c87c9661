pub mod ecdf;
pub mod outlier;
pub mod skew;
pub mod stats;
pub mod tail;

// Re-exports for convenience
pub use ecdf::{Ecdf, ecdf_at_samples};
pub use outlier::outlier_contribution;
pub use skew::{sign, skew_adjusted, skewness};
pub use stats::{percentile, quantile};
pub use tail::{left_tail, right_tail};
