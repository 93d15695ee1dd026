use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::time::Instant;

use sfm::cmdline;
use sfm::config::TrainConfig;
use sfm::data::SparseGrad;
use sfm::logging_layer;
use sfm::loss::{new_loss, Loss};
use sfm::model::Model;
use sfm::persistence;
use sfm::reader::Reader;
use sfm::updater::new_updater;

fn main() {
    logging_layer::initialize_logging_layer();

    if let Err(e) = main_loop() {
        log::error!("Global error: {:?}", e);
        std::process::exit(1)
    }
}

fn main_loop() -> Result<(), Box<dyn Error>> {
    let cl = cmdline::parse();
    let cfg = TrainConfig::new_from_cmdline(&cl)?;
    let input_filename = cl.value_of("data").ok_or("--data expected")?;
    let in_memory = cl.is_present("in_memory");
    let testonly = cl.is_present("testonly");
    let batch_size: usize = match cl.value_of("batch_size") {
        Some(val) => val.parse()?,
        None => 64,
    };

    let mut model = Model::new(&cfg)?;
    if let Some(filename) = cl.value_of("initial_model") {
        log::info!("initial_model = {}", filename);
        persistence::load_model(filename, &mut model)?;
    }
    let loss = new_loss(cfg.model_kind);

    if testonly {
        run_predictions(
            &cl,
            &cfg,
            &model,
            loss.as_ref(),
            input_filename,
            batch_size,
            in_memory,
        )?;
    } else {
        let iterations: u64 = match cl.value_of("iterations") {
            Some(val) => val.parse()?,
            None => 1000,
        };
        let eval_every: u64 = match cl.value_of("eval_every") {
            Some(val) => val.parse()?,
            None => 100,
        };

        let mut updater = new_updater(&cfg, &model)?;
        // training wants an endless stream, so the reader loops
        let mut reader = Reader::new(input_filename, batch_size, &cfg, true, in_memory)?;
        let mut grad = SparseGrad::new();
        let mut predictions: Vec<f32> = Vec::new();

        let now = Instant::now();
        for iteration in 0..iterations {
            let batch = reader.samples()?;
            if eval_every > 0 && iteration % eval_every == 0 {
                predictions.resize(batch.row_count(), 0.0);
                loss.predict(batch, &model, &mut predictions);
                log::info!(
                    "iteration: {} log-loss: {:.6}",
                    iteration,
                    loss.evaluate(&predictions, batch.labels())
                );
            }
            loss.calc_grad(batch, &model, &mut grad);
            updater.apply(&mut model, &grad);
        }
        log::info!("Elapsed: {:.2?} iterations: {}", now.elapsed(), iterations);
    }

    if let Some(filename) = cl.value_of("final_model") {
        log::info!("final_model = {}", filename);
        persistence::save_model(filename, &model)?;
    }
    if let Some(filename) = cl.value_of("dump_json") {
        persistence::dump_model_json(filename, &model)?;
    }
    Ok(())
}

/// Single pass over the input, writing one raw score per row. A short
/// batch from the non-looping reader marks the end of the data.
fn run_predictions(
    cl: &clap::ArgMatches,
    cfg: &TrainConfig,
    model: &Model,
    loss: &dyn Loss,
    input_filename: &str,
    batch_size: usize,
    in_memory: bool,
) -> Result<(), Box<dyn Error>> {
    let mut predictions_file = match cl.value_of("predictions") {
        Some(filename) => Some(BufWriter::new(File::create(filename)?)),
        None => None,
    };
    let output_pred_stdout = cl.is_present("predictions_stdout");

    let mut reader = Reader::new(input_filename, batch_size, cfg, false, in_memory)?;
    let mut predictions: Vec<f32> = Vec::new();
    let mut example_num: u64 = 0;
    let mut loss_sum: f64 = 0.0;
    loop {
        let batch = reader.samples()?;
        if batch.row_count() == 0 {
            break;
        }
        predictions.resize(batch.row_count(), 0.0);
        loss.predict(batch, model, &mut predictions);
        loss_sum += loss.evaluate(&predictions, batch.labels()) as f64 * batch.row_count() as f64;
        for p in &predictions {
            if output_pred_stdout {
                println!("{:.6}", p);
            }
            if let Some(file) = predictions_file.as_mut() {
                writeln!(file, "{:.6}", p)?;
            }
        }
        example_num += batch.row_count() as u64;
        if batch.row_count() < batch_size {
            break;
        }
    }
    if let Some(file) = predictions_file.as_mut() {
        file.flush()?;
    }
    if example_num > 0 {
        log::info!(
            "rows: {} mean log-loss: {:.6}",
            example_num,
            loss_sum / example_num as f64
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfm::config::{ModelKind, OptimizerKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_training_file(lines: &[&str]) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file.as_file(), "{}", line).unwrap();
        }
        file
    }

    fn mean_loss(loss: &dyn Loss, model: &Model, reader: &mut Reader) -> f32 {
        let batch = reader.samples().unwrap();
        let mut predictions = vec![0.0; batch.row_count()];
        loss.predict(batch, model, &mut predictions);
        loss.evaluate(&predictions, batch.labels())
    }

    fn train(cfg: &TrainConfig, file: &NamedTempFile, iterations: usize) -> (Model, f32, f32) {
        let mut model = Model::new(cfg).unwrap();
        let loss = new_loss(cfg.model_kind);
        let mut updater = new_updater(cfg, &model).unwrap();
        let mut reader =
            Reader::new(file.path().to_str().unwrap(), 4, cfg, true, true).unwrap();
        let mut grad = SparseGrad::new();

        let initial_loss = mean_loss(loss.as_ref(), &model, &mut reader);
        for _ in 0..iterations {
            let batch = reader.samples().unwrap();
            loss.calc_grad(batch, &model, &mut grad);
            updater.apply(&mut model, &grad);
        }
        let final_loss = mean_loss(loss.as_ref(), &model, &mut reader);
        (model, initial_loss, final_loss)
    }

    #[test]
    fn test_lr_training_reduces_loss() {
        // feature 0 marks positives, feature 1 negatives
        let file = write_training_file(&["1\t0:1.0", "-1\t1:1.0", "1\t0:1.0", "-1\t1:1.0"]);
        let mut cfg = TrainConfig::new_empty();
        cfg.model_kind = ModelKind::LR;
        cfg.feature_num = 2;
        cfg.k = 0;
        cfg.learning_rate = 0.1;

        let (model, initial_loss, final_loss) = train(&cfg, &file, 200);
        assert!(final_loss < initial_loss);
        assert!(final_loss < 0.2);
        // positive feature learned a positive weight, negative a negative one
        assert!(model.parameters()[1] > 0.0);
        assert!(model.parameters()[2] < 0.0);
    }

    #[test]
    fn test_fm_adagrad_training_reduces_loss() {
        // label depends on the co-occurrence of features 0 and 1
        let file = write_training_file(&[
            "1\t0:1.0\t1:1.0",
            "-1\t0:1.0\t2:1.0",
            "-1\t3:1.0\t1:1.0",
            "1\t0:1.0\t1:1.0",
        ]);
        let mut cfg = TrainConfig::new_empty();
        cfg.model_kind = ModelKind::FM;
        cfg.feature_num = 4;
        cfg.k = 4;
        cfg.learning_rate = 0.1;
        cfg.optimizer = OptimizerKind::Adagrad;
        cfg.seed = 1;

        let (_, initial_loss, final_loss) = train(&cfg, &file, 300);
        assert!(final_loss < initial_loss);
    }

    #[test]
    fn test_ffm_training_runs() {
        let file = write_training_file(&["1\t0:0:1.0\t1:1:1.0", "-1\t0:2:1.0\t1:3:1.0"]);
        let mut cfg = TrainConfig::new_empty();
        cfg.model_kind = ModelKind::FFM;
        cfg.feature_num = 4;
        cfg.field_num = 2;
        cfg.k = 2;
        cfg.learning_rate = 0.05;

        let (_, initial_loss, final_loss) = train(&cfg, &file, 200);
        assert!(final_loss < initial_loss);
    }
}
