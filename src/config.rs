use std::error::Error;
use std::io::Error as IOError;
use std::io::ErrorKind;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum ModelKind {
    LR,
    FM,
    FFM,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum Regularizer {
    None,
    L1,
    L2,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum OptimizerKind {
    SGD,
    Adagrad,
}

/// How the parameter array gets its initial values: zero bias/linear
/// weights with gaussian latent vectors, or a gaussian draw for everything.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum InitKind {
    ZeroLinear,
    FullGaussian,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TrainConfig {
    pub model_kind: ModelKind,
    pub feature_num: u32,
    pub field_num: u32,
    pub k: u32,
    pub learning_rate: f32,
    pub regu_lambda: f32,
    pub regularizer: Regularizer,
    pub optimizer: OptimizerKind,
    #[serde(default = "default_f32_zero")]
    pub ada_eta: f32, // 0.0 means "use learning_rate"
    #[serde(default = "default_ada_epsilon")]
    pub ada_epsilon: f32,
    pub init_kind: InitKind,
    #[serde(default = "default_u64_zero")]
    pub seed: u64,
}

fn default_f32_zero() -> f32 {
    0.0
}
fn default_u64_zero() -> u64 {
    0
}
fn default_ada_epsilon() -> f32 {
    1e-8
}

impl TrainConfig {
    pub fn new_empty() -> TrainConfig {
        TrainConfig {
            model_kind: ModelKind::LR,
            feature_num: 0,
            field_num: 0,
            k: 4,
            learning_rate: 0.2,
            regu_lambda: 0.0,
            regularizer: Regularizer::None,
            optimizer: OptimizerKind::SGD,
            ada_eta: 0.0,
            ada_epsilon: default_ada_epsilon(),
            init_kind: InitKind::ZeroLinear,
            seed: 0,
        }
    }

    pub fn new_from_cmdline(cl: &clap::ArgMatches) -> Result<TrainConfig, Box<dyn Error>> {
        let mut cfg = TrainConfig::new_empty();

        if let Some(val) = cl.value_of("model") {
            cfg.model_kind = match val {
                "lr" => ModelKind::LR,
                "fm" => ModelKind::FM,
                "ffm" => ModelKind::FFM,
                other => {
                    return Err(Box::new(IOError::new(
                        ErrorKind::Other,
                        format!("--model supports lr, fm, ffm; got: {}", other),
                    )))
                }
            };
        }

        let feature_num = cl.value_of("feature_num").ok_or("--feature_num expected")?;
        cfg.feature_num = parse_or_error(feature_num, "--feature_num")?;
        if cfg.feature_num == 0 {
            return Err(Box::new(IOError::new(
                ErrorKind::Other,
                "--feature_num has to be greater than zero",
            )));
        }

        if let Some(val) = cl.value_of("field_num") {
            cfg.field_num = parse_or_error(val, "--field_num")?;
        }
        if cfg.model_kind == ModelKind::FFM && cfg.field_num == 0 {
            return Err(Box::new(IOError::new(
                ErrorKind::Other,
                "--model ffm requires --field_num greater than zero",
            )));
        }

        if let Some(val) = cl.value_of("k") {
            cfg.k = parse_or_error(val, "--k")?;
        }
        if cfg.model_kind == ModelKind::LR {
            // the latent segment does not exist for plain logistic regression
            cfg.k = 0;
        }

        if let Some(val) = cl.value_of("learning_rate") {
            cfg.learning_rate = parse_or_error(val, "--learning_rate")?;
        }
        if let Some(val) = cl.value_of("lambda") {
            cfg.regu_lambda = parse_or_error(val, "--lambda")?;
        }

        if let Some(val) = cl.value_of("regularizer") {
            cfg.regularizer = match val {
                "none" => Regularizer::None,
                "l1" => Regularizer::L1,
                "l2" => Regularizer::L2,
                other => {
                    return Err(Box::new(IOError::new(
                        ErrorKind::Other,
                        format!("--regularizer supports none, l1, l2; got: {}", other),
                    )))
                }
            };
        }

        if let Some(val) = cl.value_of("optimizer") {
            cfg.optimizer = match val {
                "sgd" => OptimizerKind::SGD,
                "adagrad" => OptimizerKind::Adagrad,
                other => {
                    return Err(Box::new(IOError::new(
                        ErrorKind::Other,
                        format!("--optimizer supports sgd, adagrad; got: {}", other),
                    )))
                }
            };
        }

        if let Some(val) = cl.value_of("ada_eta") {
            cfg.ada_eta = parse_or_error(val, "--ada_eta")?;
        }
        if let Some(val) = cl.value_of("ada_epsilon") {
            cfg.ada_epsilon = parse_or_error(val, "--ada_epsilon")?;
        }

        if cl.is_present("init_gaussian") {
            cfg.init_kind = InitKind::FullGaussian;
        }

        if let Some(val) = cl.value_of("seed") {
            cfg.seed = parse_or_error(val, "--seed")?;
        }

        Ok(cfg)
    }
}

fn parse_or_error<T: std::str::FromStr>(val: &str, what: &str) -> Result<T, Box<dyn Error>> {
    match val.parse::<T>() {
        Ok(v) => Ok(v),
        Err(_) => Err(Box::new(IOError::new(
            ErrorKind::Other,
            format!("failed parsing the value of {}: {}", what, val),
        ))),
    }
}
