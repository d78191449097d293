// Archivo: logical_file.rs
// Propósito: reconocer nombres de archivo tipo frame y calcular el
// intervalo GPS que cubre un LFN.
use crate::{StateDbError, UniqueId};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// Solo ASCII: `\d` y `\w` aceptarían dígitos y letras Unicode.
static FRAME_NAME: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[A-Za-z0-9]+-[A-Za-z0-9_]+-([0-9]+)-([0-9]+)\.[A-Za-z0-9_]+$").expect("patrón de frame constante")
});

/// Intervalo codificado en un nombre `<prefijo>-<descripción>-<inicio>-<duración>.<ext>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFileName {
  pub start: i64,
  pub duration: i64,
}

impl FrameFileName {
  /// `None` si `name` no sigue la convención o sus números desbordan.
  pub fn parse(name: &str) -> Option<Self> {
    let caps = FRAME_NAME.captures(name)?;
    let start: i64 = caps[1].parse().ok()?;
    let duration: i64 = caps[2].parse().ok()?;
    start.checked_add(duration)?;
    Some(Self { start, duration })
  }

  pub fn end(&self) -> i64 {
    self.start + self.duration
  }
}

/// Fila de la tabla `lfn`. No se modifica una vez creada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalFile {
  pub process_id: UniqueId,
  pub lfn_id: UniqueId,
  pub lfn: String,
  pub start_time: i64,
  pub end_time: i64,
}

impl LogicalFile {
  /// Intervalo cubierto por `name`. Un nombre tipo frame manda sobre los
  /// tiempos explícitos; el resto necesita `start` y `end`.
  pub fn resolve_interval(name: &str, start: Option<i64>, end: Option<i64>) -> Result<(i64, i64), StateDbError> {
    if let Some(frame) = FrameFileName::parse(name) {
      return Ok((frame.start, frame.end()));
    }
    match (start, end) {
      (Some(s), Some(e)) => Ok((s, e)),
      _ => Err(StateDbError::Validation(format!("El archivo {} no es un frame; se deben indicar inicio y fin", name))),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_frame_names() {
    let f = FrameFileName::parse("H1-TEST-1000000000-64.gwf").unwrap();
    assert_eq!(f.start, 1_000_000_000);
    assert_eq!(f.end(), 1_000_000_064);

    let f = FrameFileName::parse("H-H1_RDS_C03_L2-815155213-128.gwf").unwrap();
    assert_eq!(f.duration, 128);
  }

  #[test]
  fn rejects_non_frame_names() {
    for name in ["state.txt", "H1-TEST-abc-64.gwf", "/data/H1-TEST-1-2.gwf", "H1-TEST-1-2", "H1-TEST-1-2.gwf.bak"] {
      assert!(FrameFileName::parse(name).is_none(), "{name} should not parse");
    }
  }

  #[test]
  fn only_ascii_names_are_frames() {
    // Dígitos arábigo-índicos y letras acentuadas.
    for name in ["H1-TEST-\u{0661}\u{0660}\u{0660}-64.gwf", "H1-T\u{00C9}ST-1000-64.gwf", "H1-TEST-1000-64.gw\u{00E9}"] {
      assert!(FrameFileName::parse(name).is_none(), "{name} should not parse");
    }
    assert!(matches!(LogicalFile::resolve_interval("H1-TEST-\u{0661}-64.gwf", None, None),
                     Err(StateDbError::Validation(_))));
  }

  #[test]
  fn frame_name_overrides_explicit_interval() {
    let got = LogicalFile::resolve_interval("L-R-900000000-16.gwf", Some(1), Some(2)).unwrap();
    assert_eq!(got, (900_000_000, 900_000_016));
  }

  #[test]
  fn plain_names_need_both_times() {
    assert_eq!(LogicalFile::resolve_interval("segments.xml", Some(10), Some(20)).unwrap(), (10, 20));
    assert!(matches!(LogicalFile::resolve_interval("segments.xml", Some(10), None),
                     Err(StateDbError::Validation(_))));
    assert!(matches!(LogicalFile::resolve_interval("segments.xml", None, None),
                     Err(StateDbError::Validation(_))));
  }
}
