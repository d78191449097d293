// Archivo: input.rs
use segment_domain::SegmentInterval;
use thiserror::Error;

/// Un segmento leído de la entrada del publicador.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentLine {
  pub ifo: String,
  pub interval: SegmentInterval,
  pub major: i32,
  pub minor: i32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
  #[error("línea {line}: se esperaban 7 campos, hay {found}")]
  FieldCount { line: usize, found: usize },
  #[error("línea {line}: valor inválido para {field}: {value}")]
  BadValue { line: usize, field: &'static str, value: String },
}

/// Interpreta `<ifo> <start> <start_ns> <end> <end_ns> <major> <minor>`.
/// Líneas vacías y comentarios `#` dan `Ok(None)`.
pub fn parse_segment_line(line_no: usize, raw: &str) -> Result<Option<SegmentLine>, InputError> {
  let text = raw.trim();
  if text.is_empty() || text.starts_with('#') {
    return Ok(None);
  }
  let fields: Vec<&str> = text.split_whitespace().collect();
  if fields.len() != 7 {
    return Err(InputError::FieldCount { line: line_no, found: fields.len() });
  }
  let int = |idx: usize, field: &'static str| -> Result<i64, InputError> {
    fields[idx].parse::<i64>()
               .map_err(|_| InputError::BadValue { line: line_no, field, value: fields[idx].to_string() })
  };
  let small = |idx: usize, field: &'static str| -> Result<i32, InputError> {
    fields[idx].parse::<i32>()
               .map_err(|_| InputError::BadValue { line: line_no, field, value: fields[idx].to_string() })
  };
  Ok(Some(SegmentLine { ifo: fields[0].to_string(),
                        interval: SegmentInterval::new(int(1, "start")?,
                                                       small(2, "start_ns")?,
                                                       int(3, "end")?,
                                                       small(4, "end_ns")?),
                        major: small(5, "major")?,
                        minor: small(6, "minor")? }))
}
