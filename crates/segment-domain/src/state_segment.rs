// Archivo: state_segment.rs
use crate::UniqueId;
use serde::{Deserialize, Serialize};

/// Intervalo de un segmento: segundos GPS enteros más la fracción en
/// nanosegundos de cada extremo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentInterval {
  pub start_time: i64,
  pub start_time_ns: i32,
  pub end_time: i64,
  pub end_time_ns: i32,
}

impl SegmentInterval {
  pub fn new(start_time: i64, start_time_ns: i32, end_time: i64, end_time_ns: i32) -> Self {
    Self { start_time, start_time_ns, end_time, end_time_ns }
  }
}

/// Fila de `state_segment`. El almacén rechaza una segunda fila con el
/// mismo definer e intervalo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSegment {
  pub process_id: UniqueId,
  pub segment_id: UniqueId,
  pub segment_def_id: UniqueId,
  pub interval: SegmentInterval,
  pub lfn_id: UniqueId,
}

impl StateSegment {
  /// Clave de unicidad que impone el almacén.
  pub fn identity(&self) -> (&UniqueId, SegmentInterval) {
    (&self.segment_def_id, self.interval)
  }
}
