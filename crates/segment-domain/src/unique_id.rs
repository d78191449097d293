// Archivo: unique_id.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identificador opaco generado por el propio almacén (process, lfn,
/// segment_definer y state_segment). El cliente nunca lo interpreta.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueId(String);

impl UniqueId {
  pub fn new(raw: impl Into<String>) -> Self {
    Self(raw.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<String> for UniqueId {
  fn from(raw: String) -> Self {
    Self(raw)
  }
}

impl From<&str> for UniqueId {
  fn from(raw: &str) -> Self {
    Self(raw.to_string())
  }
}

impl fmt::Display for UniqueId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
