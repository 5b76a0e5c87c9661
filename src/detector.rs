//! COPOD: Copula-Based Outlier Detector
//!
//! Parameter-free batch detector. Each feature's empirical marginal gives a
//! left and right tail surprise per sample; the skewness of the feature picks
//! which tail counts, and the per-feature evidence is summed into one score
//! per sample.
//!
//! Once fitted, new rows are scored jointly with the training rows: the
//! ECDFs and skewness are recomputed over `[training; query]` and only the
//! query scores are returned. `fit` itself goes through the same path with
//! the training table as the query, so its contribution matrix has twice the
//! training rows.
//!
//! Reference: "COPOD: Copula-Based Outlier Detection" (Li et al., ICDM 2020)

use crate::base::{Contamination, Decision, DetectorBase, OutlierDetector};
use crate::config::DetectorConfig;
use crate::engine::CopulaTables;
use crate::error::{CopodError, Result};
use crate::explain::{Explanation, validate_cutoffs};
use crate::matrix::Matrix;
use tracing::{debug, info};

/// Training rows kept after `fit` so later queries share their marginals.
#[derive(Debug, Clone)]
pub struct TrainingReference {
    pub table: Matrix,
}

#[derive(Debug, Clone)]
pub struct Copod {
    base: DetectorBase,
    parallel: bool,
    explain_cutoffs: Option<[f64; 2]>,
    training: Option<TrainingReference>,
    tables: Option<CopulaTables>,
    /// Last pass was `fit`: both halves of the tables are training rows.
    fit_pass: bool,
}

impl Default for Copod {
    fn default() -> Self {
        Self {
            base: DetectorBase::with_contamination(Contamination::default()),
            parallel: false,
            explain_cutoffs: None,
            training: None,
            tables: None,
            fit_pass: false,
        }
    }
}

impl Copod {
    /// Create a detector with the given contamination in (0, 0.5].
    pub fn new(contamination: f64) -> Result<Self> {
        Ok(Self {
            base: DetectorBase::new(contamination)?,
            ..Self::default()
        })
    }

    pub fn from_config(config: &DetectorConfig) -> Result<Self> {
        if let Some(cutoffs) = config.explain_cutoffs {
            validate_cutoffs(cutoffs)?;
        }
        let mut detector = Self::new(config.contamination)?;
        detector.parallel = config.parallel;
        detector.explain_cutoffs = config.explain_cutoffs;
        Ok(detector)
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn contamination(&self) -> f64 {
        self.base.contamination().value()
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn explain_cutoffs(&self) -> Option<[f64; 2]> {
        self.explain_cutoffs
    }

    pub fn is_fitted(&self) -> bool {
        self.training.is_some()
    }

    pub fn training(&self) -> Option<&TrainingReference> {
        self.training.as_ref()
    }

    /// Fit on `table`: store it as the training reference and score it.
    pub fn fit(&mut self, table: &Matrix) -> Result<()> {
        let reference = TrainingReference {
            table: table.clone(),
        };
        let (tables, scores) = self.evaluate(Some(&reference), table)?;
        let decision = self.base.decide(scores);

        self.base.set_n_classes(None);
        info!(
            rows = table.rows(),
            cols = table.cols(),
            threshold = decision.threshold,
            outliers = decision.outlier_count(),
            "copod fitted"
        );
        self.training = Some(reference);
        self.tables = Some(tables);
        self.fit_pass = true;
        self.base.commit_fit(decision);
        Ok(())
    }

    /// Convenience wrapper validating raw rows before fitting.
    pub fn fit_rows<R: AsRef<[f64]>>(&mut self, rows: &[R]) -> Result<()> {
        let table = Matrix::from_rows(rows)?;
        self.fit(&table)
    }

    /// Anomaly scores for `table`, larger is more abnormal.
    ///
    /// Overwrites the intermediate tables, decision scores, threshold and
    /// labels; nothing is replaced if the call fails.
    pub fn score(&mut self, table: &Matrix) -> Result<Vec<f64>> {
        let (tables, scores) = self.evaluate(self.training.as_ref(), table)?;

        let decision = self.base.decide(scores.clone());
        debug!(
            rows = table.rows(),
            joint_rows = tables.outlier.rows(),
            threshold = decision.threshold,
            "copod scored"
        );
        self.tables = Some(tables);
        self.fit_pass = false;
        self.base.commit(decision);
        Ok(scores)
    }

    /// Tables over `[reference; table]` and the scores of the `table` rows.
    fn evaluate(
        &self,
        reference: Option<&TrainingReference>,
        table: &Matrix,
    ) -> Result<(CopulaTables, Vec<f64>)> {
        match reference {
            None => {
                let tables = CopulaTables::compute(table, self.parallel);
                let scores = tables.row_scores();
                Ok((tables, scores))
            }
            Some(reference) => {
                let combined = reference.table.vstack(table)?;
                let tables = CopulaTables::compute(&combined, self.parallel);
                let mut scores = tables.row_scores();
                let scores = scores.split_off(reference.table.rows());
                Ok((tables, scores))
            }
        }
    }

    /// Per-dimension breakdown of row `index` of the last contribution matrix.
    ///
    /// Defaults to the `[1 - contamination, 0.99]` bands.
    pub fn explain(&self, index: usize, cutoffs: Option<[f64; 2]>) -> Result<Explanation> {
        let tables = self.tables.as_ref().ok_or(CopodError::IndexOutOfRange {
            index,
            len: 0,
        })?;
        let cutoffs = cutoffs
            .or(self.explain_cutoffs)
            .unwrap_or([1.0 - self.contamination(), 0.99]);
        // Labels cover the trailing query rows of the contribution matrix.
        let labels = self.base.labels();
        let offset = tables.outlier.rows().saturating_sub(labels.len());
        let label = match index.checked_sub(offset) {
            Some(i) => labels.get(i),
            None if self.fit_pass => labels.get(index),
            None => None,
        }
        .copied();
        Explanation::from_contributions(&tables.outlier, index, cutoffs, label)
    }

    pub fn decision_scores(&self) -> &[f64] {
        self.base.decision_scores()
    }

    pub fn threshold(&self) -> f64 {
        self.base.threshold()
    }

    pub fn labels(&self) -> &[u8] {
        self.base.labels()
    }

    pub fn n_classes(&self) -> usize {
        self.base.n_classes()
    }

    /// Intermediate tables of the last scoring pass.
    pub fn tables(&self) -> Option<&CopulaTables> {
        self.tables.as_ref()
    }

    pub fn last_decision(&self) -> Decision {
        Decision {
            scores: self.decision_scores().to_vec(),
            threshold: self.threshold(),
            labels: self.labels().to_vec(),
        }
    }
}

impl OutlierDetector for Copod {
    fn base(&self) -> &DetectorBase {
        &self.base
    }

    fn fit(&mut self, table: &Matrix) -> Result<()> {
        Copod::fit(self, table)
    }

    fn decision_function(&mut self, table: &Matrix) -> Result<Vec<f64>> {
        self.score(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[f64]) -> Matrix {
        let rows: Vec<Vec<f64>> = values.iter().map(|&v| vec![v]).collect();
        Matrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_invalid_contamination() {
        assert!(matches!(
            Copod::new(0.0),
            Err(CopodError::InvalidParameter(_))
        ));
        assert!(Copod::new(0.6).is_err());
        assert!(Copod::new(0.5).is_ok());
        assert_eq!(Copod::default().contamination(), 0.1);
    }

    #[test]
    fn test_single_extreme_value() {
        let mut copod = Copod::new(0.25).unwrap();
        copod.fit(&column(&[1.0, 2.0, 3.0, 100.0])).unwrap();

        let scores = copod.decision_scores();
        assert!(scores[3] > scores[0]);
        assert!(scores[3] > scores[1]);
        assert!(scores[3] > scores[2]);
        assert_eq!(copod.labels(), &[0, 0, 0, 1]);
        assert_eq!(copod.n_classes(), 2);
    }

    #[test]
    fn test_unfitted_score_matches_fit() {
        let table = Matrix::from_rows(&[
            vec![0.5, 3.0],
            vec![1.5, -2.0],
            vec![2.0, 0.0],
            vec![-4.0, 7.5],
            vec![0.1, 0.2],
        ])
        .unwrap();

        let mut unfitted = Copod::default();
        let scores = unfitted.score(&table).unwrap();

        let mut fitted = Copod::default();
        fitted.fit(&table).unwrap();
        assert_eq!(scores, fitted.decision_scores());
        assert_eq!(unfitted.threshold(), fitted.threshold());
        assert!(!unfitted.is_fitted());
    }

    #[test]
    fn test_scoring_after_fit_returns_query_rows_only() {
        let mut copod = Copod::new(0.2).unwrap();
        copod.fit(&column(&[1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();

        let scores = copod.score(&column(&[3.0, 50.0])).unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores[1] > scores[0]);
        assert_eq!(copod.decision_scores().len(), 2);
        assert_eq!(copod.labels().len(), 2);
        // Contribution matrix spans training and query rows.
        assert_eq!(copod.tables().unwrap().outlier.rows(), 7);
    }

    #[test]
    fn test_query_width_mismatch_leaves_state() {
        let mut copod = Copod::default();
        copod.fit(&column(&[1.0, 2.0, 3.0])).unwrap();
        let before = copod.last_decision();

        let wide = Matrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        assert!(matches!(
            copod.score(&wide),
            Err(CopodError::InvalidInput(_))
        ));
        assert_eq!(copod.last_decision(), before);
    }

    #[test]
    fn test_explain_defaults_and_bounds() {
        let mut copod = Copod::new(0.25).unwrap();
        assert!(matches!(
            copod.explain(0, None),
            Err(CopodError::IndexOutOfRange { .. })
        ));

        copod.fit(&column(&[1.0, 2.0, 3.0, 100.0])).unwrap();
        let e = copod.explain(3, None).unwrap();
        assert_eq!(e.cutoffs, [0.75, 0.99]);
        assert_eq!(e.label, Some(1));
        assert_eq!(e.row.len(), 1);

        // The second copy of the training rows carries the same labels.
        let twin = copod.explain(7, None).unwrap();
        assert_eq!(twin.row, e.row);
        assert_eq!(twin.label, Some(1));
        assert_eq!(copod.explain(4, None).unwrap().label, Some(0));

        let before = copod.last_decision();
        assert!(matches!(
            copod.explain(8, None),
            Err(CopodError::IndexOutOfRange { index: 8, len: 8 })
        ));
        assert_eq!(copod.last_decision(), before);
    }

    #[test]
    fn test_fit_matches_scoring_the_doubled_table() {
        let x = column(&[1.0, 2.0, 3.0, 100.0]);
        let mut fitted = Copod::new(0.25).unwrap();
        fitted.fit(&x).unwrap();

        let mut unfitted = Copod::new(0.25).unwrap();
        let joint = unfitted.score(&x.vstack(&x).unwrap()).unwrap();
        assert_eq!(fitted.decision_scores(), &joint[4..]);
        assert_eq!(
            fitted.tables().unwrap().outlier,
            unfitted.tables().unwrap().outlier
        );

        for i in 0..8 {
            let a = fitted.explain(i, None).unwrap();
            let b = unfitted.explain(i, None).unwrap();
            assert_eq!(a.row, b.row);
            assert_eq!(a.low_band, b.low_band);
            assert_eq!(a.high_band, b.high_band);
        }
        // 0.99 band over [1, 2, 3, 100] twice is the largest contribution, ln 4.
        let e = fitted.explain(0, None).unwrap();
        assert!((e.high_band[0] - 4f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_predict_requires_fit() {
        let mut copod = Copod::default();
        assert!(matches!(
            copod.predict(&column(&[1.0])),
            Err(CopodError::NotFitted)
        ));
    }

    #[test]
    fn test_predict_against_training_threshold() {
        let training: Vec<f64> = (0..40).map(|i| (i as f64 * 0.7).sin()).collect();
        let mut copod = Copod::new(0.1).unwrap();
        copod.fit(&column(&training)).unwrap();

        let labels = copod.predict(&column(&[0.0, 25.0])).unwrap();
        assert_eq!(labels, vec![0, 1]);

        let proba = copod
            .predict_proba(&column(&[25.0]), crate::base::ProbaMethod::Linear)
            .unwrap();
        assert_eq!(proba[0][1], 1.0);
        assert_eq!(proba[0][0], 0.0);
    }
}
