use std::error::Error;
use std::io::Error as IOError;
use std::io::ErrorKind;

use rand_distr::{Distribution, Normal};
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::config::{InitKind, ModelKind, Regularizer, TrainConfig};

pub const INIT_MEAN: f32 = 0.0;
pub const INIT_STDEV: f32 = 0.01;

/// Position of the bias term in the parameter array.
pub const BIAS: usize = 0;

/// The flat parameter store. No matter the model kind all parameters live
/// in one contiguous f32 array:
///
///   [0]                      bias
///   [1 ..= feature_num]      linear weight per feature
///   [feature_num + 1 ..]     latent vectors, k floats per slot
///
/// The latent segment holds feature_num slots for FM and
/// feature_num * field_num slots for FFM; LR has none. The array length
/// is fixed at construction and never changes.
pub struct Model {
    parameters: Vec<f32>,
    parameter_num: usize,
    kind: ModelKind,
    feature_num: u32,
    k: u32,
    field_num: u32,
    regu_lambda: f32,
    regularizer: Regularizer,
}

impl Model {
    pub fn new(config: &TrainConfig) -> Result<Model, Box<dyn Error>> {
        if config.feature_num == 0 {
            return Err(Box::new(IOError::new(
                ErrorKind::Other,
                "cannot build a model with zero features",
            )));
        }
        if config.model_kind == ModelKind::FFM && config.field_num == 0 {
            return Err(Box::new(IOError::new(
                ErrorKind::Other,
                "an FFM model needs at least one field",
            )));
        }

        let feature_num = config.feature_num as usize;
        let k = config.k as usize;
        let field_num = config.field_num as usize;
        let parameter_num = match config.model_kind {
            ModelKind::LR => feature_num + 1,
            ModelKind::FM => feature_num + 1 + k * feature_num,
            ModelKind::FFM => feature_num + 1 + k * field_num * feature_num,
        };

        let mut model = Model {
            parameters: vec![0.0; parameter_num],
            parameter_num,
            kind: config.model_kind,
            feature_num: config.feature_num,
            k: config.k,
            field_num: config.field_num,
            regu_lambda: config.regu_lambda,
            regularizer: config.regularizer,
        };
        model.init_parameters(config.init_kind, config.seed)?;
        Ok(model)
    }

    fn init_parameters(&mut self, init_kind: InitKind, seed: u64) -> Result<(), Box<dyn Error>> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let normal = Normal::new(INIT_MEAN, INIT_STDEV)
            .map_err(|e| format!("bad gaussian init parameters: {:?}", e))?;
        let gaussian_from = match init_kind {
            InitKind::ZeroLinear => self.feature_num as usize + 1,
            InitKind::FullGaussian => 0,
        };
        // bias and linear weights stay zero under ZeroLinear
        for p in &mut self.parameters[gaussian_from..] {
            *p = normal.sample(&mut rng);
        }
        Ok(())
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn feature_num(&self) -> u32 {
        self.feature_num
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn field_num(&self) -> u32 {
        self.field_num
    }

    pub fn regu_lambda(&self) -> f32 {
        self.regu_lambda
    }

    pub fn regularizer(&self) -> Regularizer {
        self.regularizer
    }

    pub fn parameter_num(&self) -> usize {
        self.parameter_num
    }

    pub fn parameters(&self) -> &[f32] {
        &self.parameters
    }

    /// The backing array, for in-place update by the updater. Nothing else
    /// is supposed to write through this.
    pub fn parameters_mut(&mut self) -> &mut [f32] {
        &mut self.parameters
    }

    /// Position of feature `i`'s linear weight.
    #[inline(always)]
    pub fn linear_offset(&self, feature: u32) -> usize {
        debug_assert!(feature < self.feature_num);
        1 + feature as usize
    }

    /// Position of the first float of a latent vector. For FM the slot is
    /// per feature and `other_field` is ignored; for FFM it selects the
    /// vector of `feature` paired against the other feature's field.
    #[inline(always)]
    pub fn latent_offset(&self, feature: u32, other_field: u32) -> usize {
        debug_assert!(feature < self.feature_num);
        let base = self.feature_num as usize + 1;
        match self.kind {
            ModelKind::FM => base + feature as usize * self.k as usize,
            ModelKind::FFM => {
                debug_assert!(other_field < self.field_num);
                base + (feature as usize * self.field_num as usize + other_field as usize)
                    * self.k as usize
            }
            ModelKind::LR => unreachable!("LR model has no latent segment"),
        }
    }
}

/// Shorthand config for unit tests across the crate.
#[cfg(test)]
pub fn test_config(kind: ModelKind, feature_num: u32, k: u32, field_num: u32) -> TrainConfig {
    let mut cfg = TrainConfig::new_empty();
    cfg.model_kind = kind;
    cfg.feature_num = feature_num;
    cfg.k = k;
    cfg.field_num = field_num;
    cfg
}
