use crate::data::{Batch, SparseGrad};
use crate::loss::{accumulate_linear_gradient, linear_score, partial_gradient, Loss};
use crate::model::Model;

/// Plain logistic regression: bias plus a linear weight per feature.
pub struct LogitLoss {}

impl Loss for LogitLoss {
    fn predict(&self, batch: &Batch, model: &Model, predictions: &mut [f32]) {
        assert_eq!(predictions.len(), batch.row_count());
        for (i, row) in batch.rows().iter().enumerate() {
            predictions[i] = linear_score(row, model);
        }
    }

    fn calc_grad(&self, batch: &Batch, model: &Model, grad: &mut SparseGrad) {
        grad.clear();
        for (row, y) in batch.rows().iter().zip(batch.labels().iter()) {
            let partial = partial_gradient(*y, linear_score(row, model));
            accumulate_linear_gradient(row, partial, model, grad);
        }
    }
}

#[cfg(test)]
mod tests {
    // Note this useful idiom: importing names from outer (for mod tests) scope.
    use super::*;
    use crate::config::{ModelKind, Regularizer};
    use crate::data::SparseRow;
    use crate::model::{test_config, BIAS};

    fn one_row_batch(row: SparseRow, label: f32) -> Batch {
        let mut batch = Batch::new();
        batch.resize(1);
        *batch.row_mut(0) = row;
        batch.set_label(0, label);
        batch
    }

    fn lr_row(idx: Vec<u32>, x: Vec<f32>) -> SparseRow {
        SparseRow {
            x,
            idx,
            field: Vec::new(),
        }
    }

    #[test]
    fn test_zero_model_score_and_partial() {
        let model = Model::new(&test_config(ModelKind::LR, 5, 0, 0)).unwrap();
        let batch = one_row_batch(lr_row(vec![0, 2], vec![0.5, 1.5]), 1.0);

        let mut predictions = vec![99.0; 1];
        let loss = LogitLoss {};
        loss.predict(&batch, &model, &mut predictions);
        assert_eq!(predictions[0], 0.0);

        // partial at score 0 is -y/2; bias entry carries it with implicit x=1
        let mut grad = SparseGrad::new();
        loss.calc_grad(&batch, &model, &mut grad);
        assert_eq!(grad.size_v(), 0);
        assert_eq!(grad.pos_w, vec![BIAS, 1, 3]);
        assert_eq!(grad.w, vec![-0.5, -0.5 * 0.5, -0.5 * 1.5]);
    }

    #[test]
    fn test_score_with_weights() {
        let mut model = Model::new(&test_config(ModelKind::LR, 5, 0, 0)).unwrap();
        {
            let p = model.parameters_mut();
            p[BIAS] = 0.1;
            p[1] = 1.0; // feature 0
            p[3] = -2.0; // feature 2
        }
        let batch = one_row_batch(lr_row(vec![0, 2], vec![0.5, 1.5]), 1.0);
        let mut predictions = vec![0.0; 1];
        LogitLoss {}.predict(&batch, &model, &mut predictions);
        assert!((predictions[0] - (0.1 + 0.5 - 3.0)).abs() < 1e-6);
    }

    #[test]
    fn test_l2_regularization_enters_gradient() {
        let mut cfg = test_config(ModelKind::LR, 5, 0, 0);
        cfg.regularizer = Regularizer::L2;
        cfg.regu_lambda = 0.1;
        let mut model = Model::new(&cfg).unwrap();
        model.parameters_mut()[1] = 2.0;

        let batch = one_row_batch(lr_row(vec![0], vec![1.0]), 1.0);
        let mut grad = SparseGrad::new();
        LogitLoss {}.calc_grad(&batch, &model, &mut grad);

        // score = 2.0, partial = -1/(1+e^2); entry = partial*1 + 0.1*2.0
        let partial = -1.0 / (1.0 + 2.0f32.exp());
        assert_eq!(grad.pos_w, vec![BIAS, 1]);
        assert!((grad.w[1] - (partial + 0.2)).abs() < 1e-6);
    }

    #[test]
    fn test_gradient_covers_every_row() {
        let model = Model::new(&test_config(ModelKind::LR, 5, 0, 0)).unwrap();
        let mut batch = Batch::new();
        batch.resize(3);
        for i in 0..3 {
            *batch.row_mut(i) = lr_row(vec![i as u32], vec![1.0]);
            batch.set_label(i, if i % 2 == 0 { 1.0 } else { -1.0 });
        }
        let mut grad = SparseGrad::new();
        LogitLoss {}.calc_grad(&batch, &model, &mut grad);
        // one bias + one feature entry per row
        assert_eq!(grad.size_w(), 6);
    }
}
