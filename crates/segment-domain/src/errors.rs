// errors.rs
use thiserror::Error;

/// Errores visibles para el caller de una sesión de publicación.
///
/// Las carreras sobre restricciones de unicidad se resuelven localmente y
/// nunca llegan aquí. `SegmentExists` no es un bug: indica que el intervalo
/// ya estaba publicado y el caller puede tratarlo como resultado idempotente.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateDbError {
  #[error("Error de inicialización: {0}")]
  Initialization(String),
  #[error("Error al cerrar la sesión: {0}")]
  Shutdown(String),
  #[error("Error de validación: {0}")]
  Validation(String),
  #[error("Error resolviendo segment_definer: {0}")]
  DefinerLookup(String),
  #[error("Error registrando LFN: {0}")]
  Registration(String),
  #[error("Error insertando segmento: {0}")]
  Publish(String),
  #[error("No hay LFN registrado para publicar información de estado")]
  NoActiveFile,
  #[error("Reintentos agotados tras {attempts} intentos: {message}")]
  TransientPublish { attempts: u32, message: String },
  #[error("El state_segment ya existe: {0}")]
  SegmentExists(String),
}

impl StateDbError {
  /// `true` cuando el segmento ya estaba publicado.
  pub fn is_segment_exists(&self) -> bool {
    matches!(self, Self::SegmentExists(_))
  }
}
