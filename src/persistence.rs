use std::error::Error;
use std::fs;
use std::io;
use std::io::Error as IOError;
use std::io::ErrorKind;
use std::io::{Read, Write};

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::config::ModelKind;
use crate::model::{Model, BIAS};

/// Checkpoint I/O goes through a bounded scratch buffer of this many
/// floats (16 MB), so peak memory stays independent of the model size.
pub const CHECKPOINT_BUF_FLOATS: usize = 4 * 1024 * 1024;

/// Writes the parameter array as raw little-endian f32, chunk by chunk.
/// The checkpoint carries no header: the reader is expected to know the
/// parameter count from its own configuration.
pub fn write_parameters(
    output: &mut dyn Write,
    parameters: &[f32],
    buf_floats: usize,
) -> Result<(), Box<dyn Error>> {
    let mut byte_buf = vec![0u8; buf_floats * 4];
    for chunk in parameters.chunks(buf_floats) {
        let bytes = &mut byte_buf[..chunk.len() * 4];
        LittleEndian::write_f32_into(chunk, bytes);
        output.write_all(bytes)?;
    }
    Ok(())
}

/// Reads exactly `parameters.len()` little-endian f32 back, chunk by
/// chunk. A checkpoint with fewer or more floats than that is a format
/// error, since the layout has no length prefix to fall back on.
pub fn read_parameters(
    input: &mut dyn Read,
    parameters: &mut [f32],
    buf_floats: usize,
) -> Result<(), Box<dyn Error>> {
    let mut byte_buf = vec![0u8; buf_floats * 4];
    let param_len = parameters.len();
    for chunk in parameters.chunks_mut(buf_floats) {
        let bytes = &mut byte_buf[..chunk.len() * 4];
        input.read_exact(bytes).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                Box::new(IOError::new(
                    ErrorKind::Other,
                    format!(
                        "checkpoint holds fewer than {} floats, model shape mismatch",
                        param_len
                    ),
                )) as Box<dyn Error>
            } else {
                Box::new(e) as Box<dyn Error>
            }
        })?;
        LittleEndian::read_f32_into(bytes, chunk);
    }
    let mut probe = [0u8; 1];
    match input.read(&mut probe) {
        Ok(0) => Ok(()),
        Ok(_) => Err(Box::new(IOError::new(
            ErrorKind::Other,
            format!(
                "checkpoint holds more than {} floats, model shape mismatch",
                parameters.len()
            ),
        ))),
        Err(e) => Err(Box::new(e)),
    }
}

pub fn save_model(filename: &str, model: &Model) -> Result<(), Box<dyn Error>> {
    let file = fs::File::create(filename)
        .map_err(|e| format!("cannot create model file {}: {}", filename, e))?;
    let mut output_bufwriter = io::BufWriter::new(file);
    write_parameters(
        &mut output_bufwriter,
        model.parameters(),
        CHECKPOINT_BUF_FLOATS,
    )?;
    output_bufwriter.flush()?;
    Ok(())
}

/// Loads a checkpoint into a model constructed with the same shape
/// (feature_num, kind, k, field_num).
pub fn load_model(filename: &str, model: &mut Model) -> Result<(), Box<dyn Error>> {
    let file = fs::File::open(filename)
        .map_err(|e| format!("cannot open model file {}: {}", filename, e))?;
    let mut input_bufreader = io::BufReader::new(file);
    read_parameters(
        &mut input_bufreader,
        model.parameters_mut(),
        CHECKPOINT_BUF_FLOATS,
    )
}

#[derive(Serialize)]
struct ModelDump<'a> {
    model_kind: ModelKind,
    feature_num: u32,
    k: u32,
    field_num: u32,
    bias: f32,
    linear: &'a [f32],
    latent: &'a [f32],
}

/// Human-readable JSON export of the model, for inspection and debugging.
/// Write-only: the binary checkpoint is the only format loaded back.
pub fn dump_model_json(filename: &str, model: &Model) -> Result<(), Box<dyn Error>> {
    let p = model.parameters();
    let linear_end = model.feature_num() as usize + 1;
    let dump = ModelDump {
        model_kind: model.kind(),
        feature_num: model.feature_num(),
        k: model.k(),
        field_num: model.field_num(),
        bias: p[BIAS],
        linear: &p[1..linear_end],
        latent: &p[linear_end..],
    };
    let serialized = serde_json::to_vec_pretty(&dump)?;
    let mut output_bufwriter = io::BufWriter::new(fs::File::create(filename)?);
    output_bufwriter.write_all(&serialized)?;
    output_bufwriter.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    // Note this useful idiom: importing names from outer (for mod tests) scope.
    use super::*;
    use crate::config::ModelKind;
    use crate::model::test_config;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip_multiple_chunks() {
        // buffer of 8 floats against 100 parameters forces 13 chunked passes
        let original: Vec<f32> = (0..100).map(|i| i as f32 * 0.25 - 10.0).collect();
        let mut serialized: Vec<u8> = Vec::new();
        write_parameters(&mut serialized, &original, 8).unwrap();
        assert_eq!(serialized.len(), 100 * 4);

        let mut restored = vec![0.0f32; 100];
        read_parameters(&mut Cursor::new(&serialized), &mut restored, 8).unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn test_float_count_mismatch() {
        let original = vec![1.0f32; 10];
        let mut serialized: Vec<u8> = Vec::new();
        write_parameters(&mut serialized, &original, 4).unwrap();

        let mut too_many = vec![0.0f32; 11];
        assert!(read_parameters(&mut Cursor::new(&serialized), &mut too_many, 4).is_err());

        let mut too_few = vec![0.0f32; 9];
        assert!(read_parameters(&mut Cursor::new(&serialized), &mut too_few, 4).is_err());
    }

    #[test]
    fn test_save_load_model_file() {
        let mut cfg = test_config(ModelKind::FM, 50, 4, 0);
        cfg.seed = 7;
        let model = Model::new(&cfg).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        save_model(path.to_str().unwrap(), &model).unwrap();

        // a freshly constructed store of identical shape, different seed
        cfg.seed = 8;
        let mut restored = Model::new(&cfg).unwrap();
        assert_ne!(model.parameters(), restored.parameters());
        load_model(path.to_str().unwrap(), &mut restored).unwrap();
        assert_eq!(model.parameters(), restored.parameters());
    }

    #[test]
    fn test_load_into_wrong_shape_fails() {
        let model = Model::new(&test_config(ModelKind::FM, 50, 4, 0)).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        save_model(path.to_str().unwrap(), &model).unwrap();

        let mut wrong = Model::new(&test_config(ModelKind::FM, 50, 8, 0)).unwrap();
        assert!(load_model(path.to_str().unwrap(), &mut wrong).is_err());
    }

    #[test]
    fn test_dump_model_json() {
        let model = Model::new(&test_config(ModelKind::FM, 5, 2, 0)).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        dump_model_json(path.to_str().unwrap(), &model).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let v: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(v["feature_num"], 5);
        assert_eq!(v["linear"].as_array().unwrap().len(), 5);
        assert_eq!(v["latent"].as_array().unwrap().len(), 10);
    }
}
