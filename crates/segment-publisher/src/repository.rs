// Archivo: repository.rs
// Propósito: definir el trait `SegmentStore`, el contrato con la base de
// metadatos compartida. Cada método corresponde a una sentencia atómica
// seguida de commit; no hay transacciones que abarquen varias llamadas.
use crate::errors::StoreResult;
use segment_domain::{DefinerKey, LogicalFile, ProcessRecord, SegmentDefiner, StateSegment, UniqueId};

/// Contrato de una conexión al almacén de segmentos.
///
/// Una implementación representa una única conexión propiedad de una
/// `Session`; por eso todos los métodos toman `&mut self`. La concurrencia
/// entre procesos la resuelven las restricciones de unicidad del almacén,
/// que deben reportarse como `StoreError::UniqueViolation`.
pub trait SegmentStore: Send {
    /// Pide al almacén un identificador único nuevo.
    fn generate_unique(&mut self) -> StoreResult<UniqueId>;

    /// Inserta la fila `process` de la sesión.
    fn insert_process(&mut self, record: &ProcessRecord) -> StoreResult<()>;

    /// Fija `end_time` de la fila `process`.
    fn finish_process(&mut self, process_id: &UniqueId, end_time: i64) -> StoreResult<()>;

    /// Lee `end_time` de una fila `process`. `Ok(None)` si sigue abierta.
    fn find_process_end(&mut self, process_id: &UniqueId) -> StoreResult<Option<i64>>;

    /// Todos los `segment_definer` con major y minor no nulos.
    fn load_state_definers(&mut self) -> StoreResult<Vec<SegmentDefiner>>;

    /// Inserta un `segment_definer`. Única por (ifos, major, minor).
    fn insert_definer(&mut self, definer: &SegmentDefiner) -> StoreResult<()>;

    /// Busca el id del definer existente para `key`.
    fn find_definer(&mut self, key: &DefinerKey) -> StoreResult<Option<UniqueId>>;

    /// Inserta una fila `lfn`. Única por nombre.
    fn insert_lfn(&mut self, lfn: &LogicalFile) -> StoreResult<()>;

    /// Busca el id de un `lfn` por nombre.
    fn find_lfn(&mut self, name: &str) -> StoreResult<Option<UniqueId>>;

    /// Inserta un `state_segment`. Única por definer + intervalo.
    fn insert_segment(&mut self, segment: &StateSegment) -> StoreResult<()>;

    /// Libera la conexión. Llamadas posteriores fallan con `StoreError::Other`.
    fn release(&mut self) -> StoreResult<()>;
}
