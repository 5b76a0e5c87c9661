//! Shared detector bookkeeping.
//!
//! Contamination validation, percentile thresholding and labeling, the
//! class-count record and the prediction surface that every detector in
//! the family exposes. Detectors embed a [`DetectorBase`] and implement
//! [`OutlierDetector`] on top of it.

use crate::algo::stats;
use crate::error::{CopodError, Result};
use crate::matrix::Matrix;
use serde::{Deserialize, Serialize};
use statrs::function::erf::erf;
use std::collections::HashSet;
use tracing::warn;

pub const DEFAULT_CONTAMINATION: f64 = 0.1;

/// Expected outlier fraction, guaranteed to lie in (0, 0.5].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contamination(f64);

impl Contamination {
    pub fn new(value: f64) -> Result<Self> {
        if value > 0.0 && value <= 0.5 {
            Ok(Self(value))
        } else {
            Err(CopodError::InvalidParameter(format!(
                "contamination must be in (0, 0.5], got {}",
                value
            )))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Percentile (0-100) used as the labeling cutoff.
    pub fn cutoff_percentile(&self) -> f64 {
        (1.0 - self.0) * 100.0
    }
}

impl Default for Contamination {
    fn default() -> Self {
        Self(DEFAULT_CONTAMINATION)
    }
}

/// Scores, cutoff and labels derived from one scoring pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub scores: Vec<f64>,
    pub threshold: f64,
    pub labels: Vec<u8>,
}

impl Decision {
    pub fn from_scores(scores: Vec<f64>, contamination: Contamination) -> Self {
        let threshold = stats::percentile(&scores, contamination.cutoff_percentile());
        let labels = scores
            .iter()
            .map(|&s| if s >= threshold { 1 } else { 0 })
            .collect();
        Self {
            scores,
            threshold,
            labels,
        }
    }

    pub fn outlier_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }
}

/// Training-score statistics captured at fit time for later predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub scores: Vec<f64>,
    pub threshold: f64,
    pub min: f64,
    pub max: f64,
    pub mu: f64,
    pub sigma: f64,
}

impl FitSummary {
    pub fn from_decision(decision: &Decision) -> Self {
        Self {
            scores: decision.scores.clone(),
            threshold: decision.threshold,
            min: decision.scores.iter().copied().fold(f64::INFINITY, f64::min),
            max: decision.scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mu: stats::mean(&decision.scores),
            sigma: stats::std_dev(&decision.scores),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectorBase {
    contamination: Contamination,
    n_classes: usize,
    decision: Decision,
    fit_summary: Option<FitSummary>,
}

impl DetectorBase {
    pub fn new(contamination: f64) -> Result<Self> {
        Ok(Self::with_contamination(Contamination::new(contamination)?))
    }

    pub fn with_contamination(contamination: Contamination) -> Self {
        Self {
            contamination,
            n_classes: 2,
            decision: Decision::default(),
            fit_summary: None,
        }
    }

    pub fn contamination(&self) -> Contamination {
        self.contamination
    }

    /// Class-count bookkeeping. Unsupervised detectors always see two
    /// classes; supplied labels only change the recorded count.
    pub fn set_n_classes(&mut self, labels: Option<&[i64]>) {
        self.n_classes = match labels {
            Some(y) => {
                warn!("labels are ignored by unsupervised detectors");
                y.iter().collect::<HashSet<_>>().len()
            }
            None => 2,
        };
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Derive threshold and labels for `scores` without touching state.
    pub fn decide(&self, scores: Vec<f64>) -> Decision {
        Decision::from_scores(scores, self.contamination)
    }

    pub fn commit(&mut self, decision: Decision) {
        self.decision = decision;
    }

    pub fn commit_fit(&mut self, decision: Decision) {
        self.fit_summary = Some(FitSummary::from_decision(&decision));
        self.decision = decision;
    }

    pub fn decision_scores(&self) -> &[f64] {
        &self.decision.scores
    }

    pub fn threshold(&self) -> f64 {
        self.decision.threshold
    }

    pub fn labels(&self) -> &[u8] {
        &self.decision.labels
    }

    pub fn fit_summary(&self) -> Option<&FitSummary> {
        self.fit_summary.as_ref()
    }
}

/// How raw scores are mapped to outlier probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbaMethod {
    /// Min-max scaling against the training scores
    #[default]
    Linear,
    /// Gaussian scaling through the error function
    Unify,
}

impl ProbaMethod {
    /// Probability that a score is an outlier, in [0, 1].
    pub fn outlier_probability(self, score: f64, fit: &FitSummary) -> f64 {
        let p = match self {
            ProbaMethod::Linear => {
                let range = fit.max - fit.min;
                let scale = if range > 0.0 { range } else { 1.0 };
                (score - fit.min) / scale
            }
            ProbaMethod::Unify => {
                if fit.sigma > 0.0 {
                    erf((score - fit.mu) / (fit.sigma * std::f64::consts::SQRT_2))
                } else if score > fit.mu {
                    1.0
                } else {
                    0.0
                }
            }
        };
        p.clamp(0.0, 1.0)
    }
}

/// Common surface of the batch outlier detectors.
pub trait OutlierDetector {
    fn base(&self) -> &DetectorBase;

    /// Fit on a training table.
    fn fit(&mut self, table: &Matrix) -> Result<()>;

    /// Raw anomaly scores; larger is more abnormal.
    fn decision_function(&mut self, table: &Matrix) -> Result<Vec<f64>>;

    fn fit_predict(&mut self, table: &Matrix) -> Result<Vec<u8>> {
        self.fit(table)?;
        Ok(self.base().labels().to_vec())
    }

    /// Binary labels for new rows against the threshold recorded at fit.
    fn predict(&mut self, table: &Matrix) -> Result<Vec<u8>> {
        let threshold = self
            .base()
            .fit_summary()
            .map(|f| f.threshold)
            .ok_or(CopodError::NotFitted)?;
        let scores = self.decision_function(table)?;
        Ok(scores
            .iter()
            .map(|&s| if s > threshold { 1 } else { 0 })
            .collect())
    }

    /// `[inlier, outlier]` probabilities per row.
    fn predict_proba(&mut self, table: &Matrix, method: ProbaMethod) -> Result<Vec<[f64; 2]>> {
        let fit = self
            .base()
            .fit_summary()
            .cloned()
            .ok_or(CopodError::NotFitted)?;
        let scores = self.decision_function(table)?;
        Ok(scores
            .iter()
            .map(|&s| {
                let p = method.outlier_probability(s, &fit);
                [1.0 - p, p]
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contamination_bounds() {
        assert!(Contamination::new(0.1).is_ok());
        assert!(Contamination::new(0.5).is_ok());
        assert!(matches!(
            Contamination::new(0.0),
            Err(CopodError::InvalidParameter(_))
        ));
        assert!(Contamination::new(0.51).is_err());
        assert!(Contamination::new(-0.2).is_err());
        assert!(Contamination::new(f64::NAN).is_err());
    }

    #[test]
    fn test_decision_labels_upper_tail() {
        let scores: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let decision = Decision::from_scores(scores, Contamination::new(0.2).unwrap());
        // 80th percentile of 1..=10 is 8.2
        assert!((decision.threshold - 8.2).abs() < 1e-12);
        assert_eq!(decision.labels, vec![0, 0, 0, 0, 0, 0, 0, 0, 1, 1]);
        assert_eq!(decision.outlier_count(), 2);
    }

    #[test]
    fn test_n_classes() {
        let mut base = DetectorBase::new(0.1).unwrap();
        assert_eq!(base.n_classes(), 2);
        base.set_n_classes(Some(&[0, 1, 2, 1]));
        assert_eq!(base.n_classes(), 3);
        base.set_n_classes(None);
        assert_eq!(base.n_classes(), 2);
    }

    #[test]
    fn test_proba_methods() {
        let decision = Decision::from_scores(vec![0.0, 1.0, 2.0, 3.0, 4.0], Contamination::default());
        let fit = FitSummary::from_decision(&decision);

        assert_eq!(ProbaMethod::Linear.outlier_probability(2.0, &fit), 0.5);
        assert_eq!(ProbaMethod::Linear.outlier_probability(9.0, &fit), 1.0);
        assert_eq!(ProbaMethod::Linear.outlier_probability(-1.0, &fit), 0.0);

        assert!(ProbaMethod::Unify.outlier_probability(fit.mu, &fit) < 1e-12);
        assert_eq!(ProbaMethod::Unify.outlier_probability(0.0, &fit), 0.0);
        assert!(ProbaMethod::Unify.outlier_probability(100.0, &fit) > 0.99);
    }

    #[test]
    fn test_proba_with_flat_training_scores() {
        let decision = Decision::from_scores(vec![1.5; 6], Contamination::default());
        let fit = FitSummary::from_decision(&decision);
        assert_eq!(fit.sigma, 0.0);
        assert_eq!((fit.min, fit.max), (1.5, 1.5));

        // Unify degrades to a step at the training mean.
        assert_eq!(ProbaMethod::Unify.outlier_probability(1.5, &fit), 0.0);
        assert_eq!(ProbaMethod::Unify.outlier_probability(1.4, &fit), 0.0);
        assert_eq!(ProbaMethod::Unify.outlier_probability(1.6, &fit), 1.0);

        // Linear falls back to a unit range.
        assert!((ProbaMethod::Linear.outlier_probability(1.75, &fit) - 0.25).abs() < 1e-12);
    }
}
