// Archivo: errors.rs
// Propósito: clasificar los fallos crudos del almacén compartido. Las capas
// superiores deciden con esta clasificación si adoptan una fila existente,
// reintentan o abortan.
use thiserror::Error;

/// Fallo de una sentencia contra el almacén.
///
/// - `UniqueViolation`: otra sesión ya insertó la misma clave.
/// - `Transient`: deadlock o fallo de serialización; reintentable.
/// - `NotFound`: la fila esperada no existe.
/// - `Other`: conectividad, esquema o cualquier otro error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Violación de una restricción de unicidad.
    #[error("Violación de unicidad: {0}")]
    UniqueViolation(String),
    /// Conflicto transitorio de escritura.
    #[error("Conflicto transitorio: {0}")]
    Transient(String),
    /// Fila no encontrada.
    #[error("No encontrado: {0}")]
    NotFound(String),
    /// Error genérico de almacenamiento.
    #[error("Error de almacenamiento: {0}")]
    Other(String),
}

/// Alias de resultado usado por las implementaciones de `SegmentStore`.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
