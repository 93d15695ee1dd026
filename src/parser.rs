use std::error::Error;
use std::io::Error as IOError;
use std::io::ErrorKind;

use crate::config::ModelKind;
use crate::data::SparseRow;

/// Parses one tab-delimited text line into a label and a SparseRow.
///
/// Line format, one example per line:
///   label <TAB> index:value <TAB> index:value ...          (LR, FM)
///   label <TAB> field:index:value <TAB> field:index:value  (FFM)
///
/// The label is parsed as a float and interpreted as positive iff > 0,
/// so "0" and "-1" both mean a negative example and come out as -1.0.
/// Every numeric conversion is validated; a malformed token is an error,
/// never a silent zero.
#[derive(Clone)]
pub struct TsvParser {
    model_kind: ModelKind,
    feature_num: u32,
    field_num: u32,
}

impl TsvParser {
    pub fn new(model_kind: ModelKind, feature_num: u32, field_num: u32) -> TsvParser {
        TsvParser {
            model_kind,
            feature_num,
            field_num,
        }
    }

    pub fn model_kind(&self) -> ModelKind {
        self.model_kind
    }

    /// Parses `line` into `row`, returning the canonical +-1 label.
    /// The row is resized to the token count before population.
    pub fn parse_line(&self, line: &str, row: &mut SparseRow) -> Result<f32, Box<dyn Error>> {
        let with_field = self.model_kind == ModelKind::FFM;
        let token_count = line.split('\t').count();
        row.resize(token_count - 1, with_field);

        let mut tokens = line.split('\t');
        let label_token = tokens.next().unwrap(); // split always yields at least one token
        let label_value = parse_f32(label_token, "label")?;
        let label = if label_value > 0.0 { 1.0 } else { -1.0 };

        for (j, token) in tokens.enumerate() {
            let expected = if with_field { 3 } else { 2 };
            let mut parts = token.split(':');
            if with_field {
                let field = parse_u32(next_part(&mut parts, token, expected)?, "field index")?;
                if field >= self.field_num {
                    return Err(Box::new(IOError::new(
                        ErrorKind::Other,
                        format!(
                            "field index {} out of range, field_num is {}",
                            field, self.field_num
                        ),
                    )));
                }
                row.field[j] = field;
            }
            let idx = parse_u32(next_part(&mut parts, token, expected)?, "feature index")?;
            if idx >= self.feature_num {
                return Err(Box::new(IOError::new(
                    ErrorKind::Other,
                    format!(
                        "feature index {} out of range, feature_num is {}",
                        idx, self.feature_num
                    ),
                )));
            }
            row.idx[j] = idx;
            row.x[j] = parse_f32(next_part(&mut parts, token, expected)?, "feature value")?;
            if parts.next().is_some() {
                return Err(wrong_arity(token, expected));
            }
        }
        Ok(label)
    }
}

fn next_part<'a>(
    parts: &mut std::str::Split<'a, char>,
    token: &str,
    expected: usize,
) -> Result<&'a str, Box<dyn Error>> {
    match parts.next() {
        Some(p) => Ok(p),
        None => Err(wrong_arity(token, expected)),
    }
}

fn wrong_arity(token: &str, expected: usize) -> Box<dyn Error> {
    Box::new(IOError::new(
        ErrorKind::Other,
        format!(
            "expected {} colon-delimited parts in token: {}",
            expected, token
        ),
    ))
}

fn parse_f32(s: &str, what: &str) -> Result<f32, Box<dyn Error>> {
    match s.parse::<f32>() {
        Ok(v) => Ok(v),
        Err(_) => Err(Box::new(IOError::new(
            ErrorKind::Other,
            format!("failed parsing {} as a float: {}", what, s),
        ))),
    }
}

fn parse_u32(s: &str, what: &str) -> Result<u32, Box<dyn Error>> {
    match s.parse::<u32>() {
        Ok(v) => Ok(v),
        Err(_) => Err(Box::new(IOError::new(
            ErrorKind::Other,
            format!("failed parsing {} as an unsigned integer: {}", what, s),
        ))),
    }
}

#[cfg(test)]
mod tests {
    // Note this useful idiom: importing names from outer (for mod tests) scope.
    use super::*;

    #[test]
    fn test_parse_lr() {
        let parser = TsvParser::new(ModelKind::LR, 10, 0);
        let mut row = SparseRow::new();
        let label = parser.parse_line("1\t0:0.5\t2:1.5", &mut row).unwrap();
        assert_eq!(label, 1.0);
        assert_eq!(row.len(), 2);
        assert_eq!(row.idx, vec![0, 2]);
        assert_eq!(row.x, vec![0.5, 1.5]);
        assert!(row.field.is_empty());
    }

    #[test]
    fn test_parse_ffm() {
        let parser = TsvParser::new(ModelKind::FFM, 10, 2);
        let mut row = SparseRow::new();
        let label = parser.parse_line("1\t0:0:0.5\t1:2:1.5", &mut row).unwrap();
        assert_eq!(label, 1.0);
        assert_eq!(row.field, vec![0, 1]);
        assert_eq!(row.idx, vec![0, 2]);
        assert_eq!(row.x, vec![0.5, 1.5]);
    }

    #[test]
    fn test_label_normalization() {
        let parser = TsvParser::new(ModelKind::LR, 10, 0);
        let mut row = SparseRow::new();
        // both "0" and "-1" are negative examples
        assert_eq!(parser.parse_line("0\t1:1", &mut row).unwrap(), -1.0);
        assert_eq!(parser.parse_line("-1\t1:1", &mut row).unwrap(), -1.0);
        assert_eq!(parser.parse_line("1\t1:1", &mut row).unwrap(), 1.0);
    }

    #[test]
    fn test_row_is_resized_per_line() {
        let parser = TsvParser::new(ModelKind::LR, 10, 0);
        let mut row = SparseRow::new();
        parser
            .parse_line("1\t0:0.5\t2:1.5\t3:2.0", &mut row)
            .unwrap();
        assert_eq!(row.len(), 3);
        parser.parse_line("-1\t4:1.0", &mut row).unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(row.idx, vec![4]);
    }

    #[test]
    fn test_wrong_arity() {
        let parser = TsvParser::new(ModelKind::LR, 10, 0);
        let mut row = SparseRow::new();
        // FFM-style token under LR
        assert!(parser.parse_line("1\t0:1:0.5", &mut row).is_err());
        // missing value
        assert!(parser.parse_line("1\t0", &mut row).is_err());

        let parser = TsvParser::new(ModelKind::FFM, 10, 2);
        // LR-style token under FFM
        assert!(parser.parse_line("1\t0:0.5", &mut row).is_err());
    }

    #[test]
    fn test_malformed_numbers_are_errors() {
        let parser = TsvParser::new(ModelKind::LR, 10, 0);
        let mut row = SparseRow::new();
        assert!(parser.parse_line("abc\t0:0.5", &mut row).is_err());
        assert!(parser.parse_line("1\tx:0.5", &mut row).is_err());
        assert!(parser.parse_line("1\t0:zz", &mut row).is_err());
        assert!(parser.parse_line("", &mut row).is_err());
    }

    #[test]
    fn test_out_of_range_indexes() {
        let parser = TsvParser::new(ModelKind::LR, 3, 0);
        let mut row = SparseRow::new();
        assert!(parser.parse_line("1\t3:0.5", &mut row).is_err());
        assert!(parser.parse_line("1\t2:0.5", &mut row).is_ok());

        let parser = TsvParser::new(ModelKind::FFM, 10, 2);
        assert!(parser.parse_line("1\t2:0:0.5", &mut row).is_err());
    }
}
