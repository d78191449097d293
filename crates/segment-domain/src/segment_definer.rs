// Archivo: segment_definer.rs
// Propósito: tipos de segmento de vector de estado (`segment_definer`).
use crate::UniqueId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comentario de todo definer creado por el publicador.
pub const AUTO_DEFINER_COMMENT: &str = "Created automatically by StateSegmentDatabase";

/// Tipo de segmento de vector de estado: detector más major/minor. El
/// almacén guarda como mucho una fila `segment_definer` por clave.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefinerKey {
  pub ifo: String,
  pub major: i32,
  pub minor: i32,
}

impl DefinerKey {
  pub fn new(ifo: &str, major: i32, minor: i32) -> Self {
    Self { ifo: ifo.trim().to_string(), major, minor }
  }

  /// Nombre guardado en `segment_definer.name`.
  pub fn definer_name(&self) -> String {
    format!("STATEVEC.{}.{}", self.major, self.minor)
  }
}

impl fmt::Display for DefinerKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({},{},{})", self.ifo, self.major, self.minor)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentDefiner {
  pub process_id: UniqueId,
  pub segment_def_id: UniqueId,
  pub ifos: String,
  pub name: String,
  pub version: i32,
  pub comment: Option<String>,
  pub state_vec_major: Option<i32>,
  pub state_vec_minor: Option<i32>,
}

impl SegmentDefiner {
  /// Fila que el publicador inserta la primera vez que ve `key`.
  pub fn for_state_vector(process_id: UniqueId, segment_def_id: UniqueId, key: &DefinerKey) -> Self {
    Self { process_id,
           segment_def_id,
           ifos: key.ifo.clone(),
           name: key.definer_name(),
           version: 0,
           comment: Some(AUTO_DEFINER_COMMENT.to_string()),
           state_vec_major: Some(key.major),
           state_vec_minor: Some(key.minor) }
  }

  /// Clave del definer; `None` si no es de vector de estado.
  pub fn key(&self) -> Option<DefinerKey> {
    match (self.state_vec_major, self.state_vec_minor) {
      (Some(major), Some(minor)) => Some(DefinerKey::new(&self.ifos, major, minor)),
      _ => None,
    }
  }
}
