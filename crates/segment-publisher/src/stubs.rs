// Archivo: stubs.rs
// Propósito: almacén en memoria para pruebas y demos.
//
// Aplica las mismas restricciones de unicidad que el esquema SQL y permite
// inyectar fallos por operación. Varios handles (`handle()`) comparten el
// mismo estado, lo que simula varios procesos contra una base común.
use crate::errors::{StoreError, StoreResult};
use crate::repository::SegmentStore;
use segment_domain::{DefinerKey, LogicalFile, ProcessRecord, SegmentDefiner, StateSegment, UniqueId};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Operaciones del contrato `SegmentStore`, usadas para inyectar fallos y
/// contar intentos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GenerateUnique,
    InsertProcess,
    FinishProcess,
    LoadDefiners,
    InsertDefiner,
    FindDefiner,
    InsertLfn,
    FindLfn,
    InsertSegment,
    Release,
}

#[derive(Debug, Default)]
struct SharedState {
    processes: HashMap<UniqueId, ProcessRecord>,
    lfns: Vec<LogicalFile>,
    definers: Vec<SegmentDefiner>,
    segments: Vec<StateSegment>,
    faults: HashMap<StoreOp, VecDeque<StoreError>>,
    calls: HashMap<StoreOp, usize>,
}

/// Almacén en memoria, no durable.
#[derive(Debug)]
pub struct InMemorySegmentStore {
    shared: Arc<Mutex<SharedState>>,
    open: bool,
}

impl InMemorySegmentStore {
    pub fn new() -> Self {
        Self { shared: Arc::new(Mutex::new(SharedState::default())), open: true }
    }

    /// Nueva conexión abierta sobre el mismo estado compartido.
    pub fn handle(&self) -> Self {
        Self { shared: Arc::clone(&self.shared), open: true }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, SharedState>> {
        self.shared.lock().map_err(|e| StoreError::Other(format!("mutex poisoned: {:?}", e)))
    }

    fn state(&self) -> MutexGuard<'_, SharedState> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Encola `error` para la próxima llamada a `op` (de cualquier handle).
    pub fn inject(&self, op: StoreOp, error: StoreError) {
        self.state().faults.entry(op).or_default().push_back(error);
    }

    /// Veces que se invocó `op`, fallos inyectados incluidos.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.state().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn definers(&self) -> Vec<SegmentDefiner> {
        self.state().definers.clone()
    }

    pub fn lfns(&self) -> Vec<LogicalFile> {
        self.state().lfns.clone()
    }

    pub fn segments(&self) -> Vec<StateSegment> {
        self.state().segments.clone()
    }

    pub fn process(&self, process_id: &UniqueId) -> Option<ProcessRecord> {
        self.state().processes.get(process_id).cloned()
    }

    /// Registra la llamada y devuelve el siguiente fallo inyectado, si hay.
    fn enter(&self, op: StoreOp) -> StoreResult<MutexGuard<'_, SharedState>> {
        if !self.open {
            return Err(StoreError::Other("conexión cerrada".into()));
        }
        let mut state = self.lock()?;
        *state.calls.entry(op).or_insert(0) += 1;
        if let Some(err) = state.faults.get_mut(&op).and_then(|q| q.pop_front()) {
            return Err(err);
        }
        Ok(state)
    }
}

impl Default for InMemorySegmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentStore for InMemorySegmentStore {
    fn generate_unique(&mut self) -> StoreResult<UniqueId> {
        let _state = self.enter(StoreOp::GenerateUnique)?;
        Ok(UniqueId::new(Uuid::new_v4().simple().to_string()))
    }

    fn insert_process(&mut self, record: &ProcessRecord) -> StoreResult<()> {
        let mut state = self.enter(StoreOp::InsertProcess)?;
        if state.processes.contains_key(&record.process_id) {
            return Err(StoreError::UniqueViolation(format!("process {}", record.process_id)));
        }
        state.processes.insert(record.process_id.clone(), record.clone());
        Ok(())
    }

    fn finish_process(&mut self, process_id: &UniqueId, end_time: i64) -> StoreResult<()> {
        let mut state = self.enter(StoreOp::FinishProcess)?;
        let rec = state.processes
                       .get_mut(process_id)
                       .ok_or_else(|| StoreError::NotFound(format!("process {}", process_id)))?;
        rec.end_time = Some(end_time);
        Ok(())
    }

    fn find_process_end(&mut self, process_id: &UniqueId) -> StoreResult<Option<i64>> {
        if !self.open {
            return Err(StoreError::Other("conexión cerrada".into()));
        }
        let state = self.lock()?;
        state.processes
             .get(process_id)
             .map(|p| p.end_time)
             .ok_or_else(|| StoreError::NotFound(format!("process {}", process_id)))
    }

    fn load_state_definers(&mut self) -> StoreResult<Vec<SegmentDefiner>> {
        let state = self.enter(StoreOp::LoadDefiners)?;
        Ok(state.definers
                .iter()
                .filter(|d| d.state_vec_major.is_some() && d.state_vec_minor.is_some())
                .cloned()
                .collect())
    }

    fn insert_definer(&mut self, definer: &SegmentDefiner) -> StoreResult<()> {
        let mut state = self.enter(StoreOp::InsertDefiner)?;
        let key = definer.key();
        if key.is_some() && state.definers.iter().any(|d| d.key() == key) {
            return Err(StoreError::UniqueViolation(format!("segment_definer {}", definer.name)));
        }
        state.definers.push(definer.clone());
        Ok(())
    }

    fn find_definer(&mut self, key: &DefinerKey) -> StoreResult<Option<UniqueId>> {
        let state = self.enter(StoreOp::FindDefiner)?;
        Ok(state.definers
                .iter()
                .find(|d| d.key().as_ref() == Some(key))
                .map(|d| d.segment_def_id.clone()))
    }

    fn insert_lfn(&mut self, lfn: &LogicalFile) -> StoreResult<()> {
        let mut state = self.enter(StoreOp::InsertLfn)?;
        if state.lfns.iter().any(|l| l.lfn == lfn.lfn) {
            return Err(StoreError::UniqueViolation(format!("lfn {}", lfn.lfn)));
        }
        state.lfns.push(lfn.clone());
        Ok(())
    }

    fn find_lfn(&mut self, name: &str) -> StoreResult<Option<UniqueId>> {
        let state = self.enter(StoreOp::FindLfn)?;
        Ok(state.lfns.iter().find(|l| l.lfn == name).map(|l| l.lfn_id.clone()))
    }

    fn insert_segment(&mut self, segment: &StateSegment) -> StoreResult<()> {
        let mut state = self.enter(StoreOp::InsertSegment)?;
        if state.segments.iter().any(|s| s.identity() == segment.identity()) {
            return Err(StoreError::UniqueViolation(format!("state_segment {:?}", segment.interval)));
        }
        state.segments.push(segment.clone());
        Ok(())
    }

    fn release(&mut self) -> StoreResult<()> {
        if !self.open {
            return Ok(());
        }
        let fault = {
            let mut state = self.lock()?;
            *state.calls.entry(StoreOp::Release).or_insert(0) += 1;
            state.faults.get_mut(&StoreOp::Release).and_then(|q| q.pop_front())
        };
        self.open = false;
        match fault {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
