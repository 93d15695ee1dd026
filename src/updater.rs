use std::error::Error;
use std::io::Error as IOError;
use std::io::ErrorKind;

use crate::config::{OptimizerKind, TrainConfig};
use crate::data::SparseGrad;
use crate::model::Model;

/// Applies a sparse gradient to the parameter store. Positions absent
/// from the gradient are never touched, which is what makes sparse
/// updates cheap. There is no per-model-kind dispatch here: an LR
/// gradient simply arrives with an empty latent segment.
pub trait UpdaterTrait {
    fn apply(&mut self, model: &mut Model, grad: &SparseGrad);
}

pub fn new_updater(
    config: &TrainConfig,
    model: &Model,
) -> Result<Box<dyn UpdaterTrait>, Box<dyn Error>> {
    match config.optimizer {
        OptimizerKind::SGD => Ok(Box::new(SgdUpdater::new(config.learning_rate))),
        OptimizerKind::Adagrad => Ok(Box::new(AdagradUpdater::new(
            model,
            config.learning_rate,
            config.ada_eta,
            config.ada_epsilon,
        )?)),
    }
}

/******************* SGD **************************/
pub struct SgdUpdater {
    learning_rate: f32,
}

impl SgdUpdater {
    pub fn new(learning_rate: f32) -> SgdUpdater {
        SgdUpdater { learning_rate }
    }
}

impl UpdaterTrait for SgdUpdater {
    fn apply(&mut self, model: &mut Model, grad: &SparseGrad) {
        let parameters = model.parameters_mut();
        for i in 0..grad.size_w() {
            parameters[grad.pos_w[i]] -= self.learning_rate * grad.w[i];
        }
        for i in 0..grad.size_v() {
            parameters[grad.pos_v[i]] -= self.learning_rate * grad.v[i];
        }
    }
}

/******************* AdaGrad **************************/
/// Keeps a per-position accumulator of squared gradients and scales each
/// step by its inverse square root. The accumulator is allocated once,
/// same length as the parameter array, every slot starting at a small
/// positive epsilon so the first division is well defined.
pub struct AdagradUpdater {
    ada_eta: f32,
    accumulated: Vec<f32>,
}

impl AdagradUpdater {
    pub fn new(
        model: &Model,
        learning_rate: f32,
        ada_eta: f32,
        ada_epsilon: f32,
    ) -> Result<AdagradUpdater, Box<dyn Error>> {
        if ada_epsilon <= 0.0 {
            return Err(Box::new(IOError::new(
                ErrorKind::Other,
                format!("adagrad epsilon has to be positive, got: {}", ada_epsilon),
            )));
        }
        // no separate adagrad rate given means the base learning rate
        let ada_eta = if ada_eta <= 0.0 { learning_rate } else { ada_eta };
        Ok(AdagradUpdater {
            ada_eta,
            accumulated: vec![ada_epsilon; model.parameter_num()],
        })
    }

    pub fn accumulated(&self) -> &[f32] {
        &self.accumulated
    }

    #[inline(always)]
    fn apply_one(&mut self, parameters: &mut [f32], pos: usize, gradient: f32) {
        self.accumulated[pos] += gradient * gradient;
        parameters[pos] -= self.ada_eta * gradient / self.accumulated[pos].sqrt();
    }
}

impl UpdaterTrait for AdagradUpdater {
    fn apply(&mut self, model: &mut Model, grad: &SparseGrad) {
        let parameters = model.parameters_mut();
        for i in 0..grad.size_w() {
            self.apply_one(parameters, grad.pos_w[i], grad.w[i]);
        }
        for i in 0..grad.size_v() {
            self.apply_one(parameters, grad.pos_v[i], grad.v[i]);
        }
    }
}
