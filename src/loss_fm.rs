use crate::config::ModelKind;
use crate::data::{Batch, SparseGrad, SparseRow};
use crate::loss::{
    accumulate_linear_gradient, linear_score, partial_gradient, regularization_gradient, Loss,
};
use crate::model::Model;

/// Factorization machine scoring, shared between FM and FFM. The score
/// adds a pairwise interaction term to the linear one:
///
///   score = linear + sum_{j<k} x_j * x_k * <v_j, v_k>
///
/// where FM uses one latent vector per feature and FFM the vector of the
/// feature paired against the *other* feature's field. The pairwise loop
/// is quadratic in the row's active features and is the hottest path in
/// the whole trainer.
pub struct FactorLoss {}

impl Loss for FactorLoss {
    fn predict(&self, batch: &Batch, model: &Model, predictions: &mut [f32]) {
        assert_eq!(predictions.len(), batch.row_count());
        for (i, row) in batch.rows().iter().enumerate() {
            predictions[i] = factor_score(row, model);
        }
    }

    fn calc_grad(&self, batch: &Batch, model: &Model, grad: &mut SparseGrad) {
        grad.clear();
        let k = model.k() as usize;
        let lambda = model.regu_lambda();
        let regu = model.regularizer();
        for (row, y) in batch.rows().iter().zip(batch.labels().iter()) {
            let partial = partial_gradient(*y, factor_score(row, model));
            accumulate_linear_gradient(row, partial, model, grad);

            let w = model.parameters();
            for j in 0..row.len() {
                for jj in (j + 1)..row.len() {
                    let (pos_j, pos_jj) = latent_pair(row, j, jj, model);
                    let xx = partial * row.x[j] * row.x[jj];
                    for l in 0..k {
                        let w_j = w[pos_j + l];
                        let w_jj = w[pos_jj + l];
                        grad.push_latent(
                            pos_j + l,
                            xx * w_jj + lambda * regularization_gradient(regu, w_j),
                        );
                        grad.push_latent(
                            pos_jj + l,
                            xx * w_j + lambda * regularization_gradient(regu, w_jj),
                        );
                    }
                }
            }
        }
    }
}

/// Latent slots of the pair (j, jj): under FFM each feature's vector is
/// selected by the other feature's field.
#[inline(always)]
fn latent_pair(row: &SparseRow, j: usize, jj: usize, model: &Model) -> (usize, usize) {
    let (field_for_j, field_for_jj) = match model.kind() {
        ModelKind::FFM => (row.field[jj], row.field[j]),
        _ => (0, 0),
    };
    (
        model.latent_offset(row.idx[j], field_for_j),
        model.latent_offset(row.idx[jj], field_for_jj),
    )
}

fn factor_score(row: &SparseRow, model: &Model) -> f32 {
    let mut score = linear_score(row, model);
    let w = model.parameters();
    let k = model.k() as usize;
    for j in 0..row.len() {
        for jj in (j + 1)..row.len() {
            let (pos_j, pos_jj) = latent_pair(row, j, jj, model);
            let mut dot = 0.0;
            for l in 0..k {
                dot += w[pos_j + l] * w[pos_jj + l];
            }
            score += row.x[j] * row.x[jj] * dot;
        }
    }
    score
}
