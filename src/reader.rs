use std::error::Error;
use std::fs::File;
use std::io;
use std::io::Error as IOError;
use std::io::ErrorKind;
use std::io::{BufRead, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use zstd::stream::read::Decoder as ZstdDecoder;

use crate::config::TrainConfig;
use crate::data::Batch;
use crate::parser::TsvParser;

/// Hard ceiling on one input line. A longer line is a fatal format error
/// rather than a truncation, so a corrupt row can never slip through as a
/// shorter valid-looking one.
pub const MAX_LINE_BYTES: usize = 100 * 1024;

/// Opens an input file with transparent decompression keyed off the
/// extension; anything that is not .gz or .zst is read as plain text.
pub fn create_buffered_input(input_filename: &str) -> Result<Box<dyn BufRead>, Box<dyn Error>> {
    let input = File::open(input_filename)
        .map_err(|e| format!("cannot open input file {}: {}", input_filename, e))?;
    let input_format = Path::new(input_filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");
    match input_format {
        "gz" => Ok(Box::new(io::BufReader::new(MultiGzDecoder::new(input)))),
        "zst" => Ok(Box::new(io::BufReader::new(ZstdDecoder::new(input)?))),
        _ => Ok(Box::new(io::BufReader::new(input))),
    }
}

enum Source {
    Disk {
        input: Box<dyn BufRead>,
        line_buf: Vec<u8>,
    },
    Memory {
        memory_batch: Batch,
        cursor: usize,
    },
}

/// Supplies fixed-size batches of parsed examples, either by scanning the
/// file with buffered reads or by sampling from one fully parsed
/// in-memory copy. With `looping` the stream wraps around at end of data
/// and a batch is never short; without it, a batch with fewer rows than
/// requested (possibly zero) tells the caller the data is exhausted.
///
/// The returned batch is reused across calls: the borrow it hands out
/// ends before the next `samples()` call can start, so stale references
/// cannot outlive a refill.
pub struct Reader {
    filename: String,
    num_samples: usize,
    looping: bool,
    parser: TsvParser,
    source: Source,
    samples: Batch,
}

impl Reader {
    pub fn new(
        filename: &str,
        num_samples: usize,
        config: &TrainConfig,
        looping: bool,
        in_memory: bool,
    ) -> Result<Reader, Box<dyn Error>> {
        if filename.is_empty() {
            return Err(Box::new(IOError::new(
                ErrorKind::Other,
                "input filename cannot be empty",
            )));
        }
        if num_samples == 0 {
            return Err(Box::new(IOError::new(
                ErrorKind::Other,
                "batch size has to be greater than zero",
            )));
        }
        let parser = TsvParser::new(config.model_kind, config.feature_num, config.field_num);
        let source = if in_memory {
            let memory_batch = load_memory_batch(filename, &parser)?;
            Source::Memory {
                memory_batch,
                cursor: 0,
            }
        } else {
            Source::Disk {
                input: create_buffered_input(filename)?,
                line_buf: Vec::with_capacity(1024),
            }
        };
        Ok(Reader {
            filename: filename.to_string(),
            num_samples,
            looping,
            parser,
            source,
            samples: Batch::new(),
        })
    }

    /// Fills and returns the next batch. The result has `num_samples`
    /// rows, except at end of a non-looping stream where it is short.
    pub fn samples(&mut self) -> Result<&Batch, Box<dyn Error>> {
        if matches!(self.source, Source::Memory { .. }) {
            self.sample_from_memory()?;
        } else {
            self.sample_from_disk()?;
        }
        Ok(&self.samples)
    }

    fn sample_from_disk(&mut self) -> Result<(), Box<dyn Error>> {
        let (input, line_buf) = match &mut self.source {
            Source::Disk { input, line_buf } => (input, line_buf),
            _ => unreachable!(),
        };
        self.samples.resize(self.num_samples);
        let mut filled = 0;
        let mut rewound_without_progress = false;
        while filled < self.num_samples {
            let n = read_one_line(input, line_buf)?;
            if n == 0 {
                if !self.looping {
                    break;
                }
                if rewound_without_progress {
                    return Err(Box::new(IOError::new(
                        ErrorKind::Other,
                        format!("input file {} has no usable lines", self.filename),
                    )));
                }
                // wraparound continues filling the same batch
                *input = create_buffered_input(&self.filename)?;
                rewound_without_progress = true;
                continue;
            }
            rewound_without_progress = false;
            let line = line_as_str(line_buf)?;
            let label = self.parser.parse_line(line, self.samples.row_mut(filled))?;
            self.samples.set_label(filled, label);
            filled += 1;
        }
        self.samples.resize(filled);
        Ok(())
    }

    fn sample_from_memory(&mut self) -> Result<(), Box<dyn Error>> {
        let (memory_batch, cursor) = match &mut self.source {
            Source::Memory {
                memory_batch,
                cursor,
            } => (&*memory_batch, cursor),
            _ => unreachable!(),
        };
        if memory_batch.row_count() == 0 && self.looping {
            return Err(Box::new(IOError::new(
                ErrorKind::Other,
                format!("input file {} has no usable lines", self.filename),
            )));
        }
        self.samples.resize(self.num_samples);
        let mut filled = 0;
        while filled < self.num_samples {
            if *cursor >= memory_batch.row_count() {
                if !self.looping {
                    break;
                }
                *cursor = 0;
            }
            self.samples
                .row_mut(filled)
                .copy_from(&memory_batch.rows()[*cursor]);
            let label = memory_batch.labels()[*cursor];
            self.samples.set_label(filled, label);
            *cursor += 1;
            filled += 1;
        }
        self.samples.resize(filled);
        Ok(())
    }
}

/// Reads one newline-terminated line into `line_buf`, enforcing the line
/// size ceiling. Returns the number of bytes read, 0 on end of stream.
fn read_one_line(
    input: &mut Box<dyn BufRead>,
    line_buf: &mut Vec<u8>,
) -> Result<usize, Box<dyn Error>> {
    line_buf.clear();
    let mut limited = input.by_ref().take((MAX_LINE_BYTES + 1) as u64);
    let n = limited.read_until(b'\n', line_buf)?;
    if n > MAX_LINE_BYTES && line_buf.last() != Some(&b'\n') {
        return Err(Box::new(IOError::new(
            ErrorKind::Other,
            format!("encountered a line longer than {} bytes", MAX_LINE_BYTES),
        )));
    }
    Ok(n)
}

/// Strips the trailing newline (and a \r left by CRLF files) and
/// validates utf-8.
fn line_as_str(line_buf: &[u8]) -> Result<&str, Box<dyn Error>> {
    let mut end = line_buf.len();
    if end > 0 && line_buf[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && line_buf[end - 1] == b'\r' {
        end -= 1;
    }
    std::str::from_utf8(&line_buf[..end]).map_err(|_| {
        Box::new(IOError::new(ErrorKind::Other, "input line is not valid utf-8")) as Box<dyn Error>
    })
}

/// Reads and parses the entire input once, for memory-mode sampling.
fn load_memory_batch(filename: &str, parser: &TsvParser) -> Result<Batch, Box<dyn Error>> {
    let mut input = create_buffered_input(filename)?;
    let mut buffer: Vec<u8> = Vec::new();
    input.read_to_end(&mut buffer)?;

    let mut lines: Vec<&[u8]> = buffer.split(|b| *b == b'\n').collect();
    if let Some(last) = lines.last() {
        if last.is_empty() {
            lines.pop();
        }
    }

    let mut batch = Batch::new();
    batch.resize(lines.len());
    for (i, raw) in lines.iter().enumerate() {
        if raw.len() > MAX_LINE_BYTES {
            return Err(Box::new(IOError::new(
                ErrorKind::Other,
                format!("encountered a line longer than {} bytes", MAX_LINE_BYTES),
            )));
        }
        let line = line_as_str(raw)?;
        let label = parser.parse_line(line, batch.row_mut(i))?;
        batch.set_label(i, label);
    }
    Ok(batch)
}
