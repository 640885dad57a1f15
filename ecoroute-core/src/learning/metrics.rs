//! Regression quality measures

use serde::Serialize;

/// Coefficient of determination.
/// A constant truth scores 1 when matched exactly and 0 otherwise, so the
/// score stays finite.
pub fn r2_score(truth: &[f64], pred: &[f64]) -> f64 {
    if truth.is_empty() {
        return f64::NAN;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = truth.iter().sum::<f64>() / truth.len() as f64;
    let ss_res: f64 = truth.iter().zip(pred).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn rmse(truth: &[f64], pred: &[f64]) -> f64 {
    if truth.is_empty() {
        return f64::NAN;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = truth.len() as f64;
    (truth.iter().zip(pred).map(|(t, p)| (t - p).powi(2)).sum::<f64>() / n).sqrt()
}

/// Share of predictions within 10% relative error.
/// Rows with a zero truth never count as hits.
pub fn robust_score(truth: &[f64], pred: &[f64]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let hits = truth
        .iter()
        .zip(pred)
        .filter(|(t, p)| **t != 0.0 && ((*p - *t) / *t).abs() < 0.10)
        .count();
    #[allow(clippy::cast_precision_loss)]
    let score = hits as f64 / truth.len() as f64;
    score
}

/// Median of a sample, `NaN` when empty
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// High/low agreement at a threshold, laid out as `[[tn, fp], [fn, tp]]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix(pub [[usize; 2]; 2]);

impl ConfusionMatrix {
    pub fn at_threshold(truth: &[f64], pred: &[f64], threshold: f64) -> Self {
        let mut cells = [[0usize; 2]; 2];
        for (t, p) in truth.iter().zip(pred) {
            let actual = usize::from(*t > threshold);
            let predicted = usize::from(*p > threshold);
            cells[actual][predicted] += 1;
        }
        Self(cells)
    }

    pub fn accuracy(&self) -> f64 {
        let [[tn, fp], [fn_, tp]] = self.0;
        let total = tn + fp + fn_ + tp;
        if total == 0 {
            return f64::NAN;
        }
        #[allow(clippy::cast_precision_loss)]
        let acc = (tn + tp) as f64 / total as f64;
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn r2_edge_cases() {
        assert_eq!(r2_score(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 1.0);
        assert_eq!(r2_score(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0]), 0.0);
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 2.0]), 1.0);
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 3.0]), 0.0);
        assert!(r2_score(&[5.0, 5.0, 5.0], &[1.0, 9.0, 5.0]).is_finite());
    }

    #[test]
    fn robust_score_counts_close_predictions() {
        let truth = [100.0, 100.0, 0.0, 50.0];
        let pred = [109.0, 111.0, 0.0, 50.0];
        assert_eq!(robust_score(&truth, &pred), 0.5);
    }

    #[test]
    fn rmse_and_median() {
        assert_eq!(rmse(&[0.0, 0.0], &[3.0, 4.0]), (12.5f64).sqrt());
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
    }

    #[test]
    fn confusion_matrix_layout() {
        let truth = [1.0, 5.0, 6.0, 2.0];
        let pred = [1.0, 6.0, 2.0, 7.0];
        let cm = ConfusionMatrix::at_threshold(&truth, &pred, 3.0);
        assert_eq!(cm.0, [[1, 1], [1, 1]]);
        assert_eq!(cm.accuracy(), 0.5);
    }
}
