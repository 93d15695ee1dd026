use crate::config::{ModelKind, Regularizer};
use crate::data::{Batch, SparseGrad, SparseRow};
use crate::loss_fm::FactorLoss;
use crate::loss_lr::LogitLoss;
use crate::model::{Model, BIAS};

/// The gradient engine: scores a batch against the current parameters and
/// turns it into a sparse gradient. One implementation per scoring
/// function; the driver picks one by model kind.
pub trait Loss {
    /// One raw score per row. The caller sizes `predictions` to the
    /// batch's row count.
    fn predict(&self, batch: &Batch, model: &Model, predictions: &mut [f32]);

    /// Clears `grad` and fills it with the loss gradient of the whole
    /// batch, regularization included.
    fn calc_grad(&self, batch: &Batch, model: &Model, grad: &mut SparseGrad);

    /// Mean cross-entropy loss, ln(1 + exp(-y * pred)). Labels are taken
    /// as positive iff > 0, so a stray 0 label still counts as negative.
    fn evaluate(&self, predictions: &[f32], labels: &[f32]) -> f32 {
        assert_eq!(predictions.len(), labels.len());
        if predictions.is_empty() {
            return 0.0;
        }
        let mut objv = 0.0;
        for (pred, label) in predictions.iter().zip(labels.iter()) {
            let y = if *label > 0.0 { 1.0 } else { -1.0 };
            objv += (1.0 + (-y * pred).exp()).ln();
        }
        objv / predictions.len() as f32
    }
}

pub fn new_loss(kind: ModelKind) -> Box<dyn Loss> {
    match kind {
        ModelKind::LR => Box::new(LogitLoss {}),
        ModelKind::FM | ModelKind::FFM => Box::new(FactorLoss {}),
    }
}

/// d/dscore of ln(1 + exp(-y * score)).
#[inline(always)]
pub fn partial_gradient(y: f32, score: f32) -> f32 {
    -y / (1.0 + (y * score).exp())
}

/// Gradient of the regularization term for one weight: 0 for none,
/// sign(w) for L1, w for L2.
#[inline(always)]
pub fn regularization_gradient(regu: Regularizer, weight: f32) -> f32 {
    match regu {
        Regularizer::None => 0.0,
        Regularizer::L1 => {
            if weight > 0.0 {
                1.0
            } else if weight < 0.0 {
                -1.0
            } else {
                0.0
            }
        }
        Regularizer::L2 => weight,
    }
}

/// bias + sum of linear weights times values. Shared by every model kind.
#[inline(always)]
pub(crate) fn linear_score(row: &SparseRow, model: &Model) -> f32 {
    let w = model.parameters();
    let mut score = w[BIAS];
    for j in 0..row.len() {
        score += w[model.linear_offset(row.idx[j])] * row.x[j];
    }
    score
}

/// Emits the bias and per-feature linear gradient entries for one row.
pub(crate) fn accumulate_linear_gradient(
    row: &SparseRow,
    partial: f32,
    model: &Model,
    grad: &mut SparseGrad,
) {
    let w = model.parameters();
    let lambda = model.regu_lambda();
    let regu = model.regularizer();
    grad.push_linear(BIAS, partial + lambda * regularization_gradient(regu, w[BIAS]));
    for j in 0..row.len() {
        let pos = model.linear_offset(row.idx[j]);
        grad.push_linear(
            pos,
            partial * row.x[j] + lambda * regularization_gradient(regu, w[pos]),
        );
    }
}

#[cfg(test)]
mod tests {
    // Note this useful idiom: importing names from outer (for mod tests) scope.
    use super::*;

    #[test]
    fn test_regularization_gradient() {
        assert_eq!(regularization_gradient(Regularizer::None, 3.5), 0.0);
        assert_eq!(regularization_gradient(Regularizer::L1, 3.5), 1.0);
        assert_eq!(regularization_gradient(Regularizer::L1, -0.1), -1.0);
        assert_eq!(regularization_gradient(Regularizer::L1, 0.0), 0.0);
        assert_eq!(regularization_gradient(Regularizer::L2, 3.5), 3.5);
        assert_eq!(regularization_gradient(Regularizer::L2, -0.1), -0.1);
    }

    #[test]
    fn test_partial_gradient_at_zero_score() {
        assert_eq!(partial_gradient(1.0, 0.0), -0.5);
        assert_eq!(partial_gradient(-1.0, 0.0), 0.5);
    }

    #[test]
    fn test_evaluate() {
        let loss = new_loss(ModelKind::LR);
        // score 0 gives ln(2) regardless of the label
        let v = loss.evaluate(&[0.0, 0.0], &[1.0, -1.0]);
        assert!((v - std::f32::consts::LN_2).abs() < 1e-6);

        // a 0 label is treated as negative: large positive score is penalized
        let confident_wrong = loss.evaluate(&[10.0], &[0.0]);
        let confident_right = loss.evaluate(&[-10.0], &[0.0]);
        assert!(confident_wrong > confident_right);

        assert_eq!(loss.evaluate(&[], &[]), 0.0);
    }
}
