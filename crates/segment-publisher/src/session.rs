// Archivo: session.rs
// Propósito: implementar la `Session`, dueña de la conexión al almacén y de
// la fila `process` del publicador. Compone la caché de definers, el
// registro de LFNs y el publicador de segmentos sobre esa única conexión.
use crate::definer_cache::DefinerCache;
use crate::publisher::{RetryPolicy, SegmentPublisher, Sleeper, ThreadSleeper};
use crate::registrar::FileRegistrar;
use crate::repository::SegmentStore;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use segment_domain::{DefinerKey, GpsClock, ProcessInfo, ProcessRecord, SegmentInterval, StateDbError, SystemGpsClock,
                     UniqueId};
use std::sync::Arc;

/// Piezas inyectables de una sesión.
pub struct SessionConfig {
    pub clock: Arc<dyn GpsClock>,
    pub retry: RetryPolicy,
    pub rng: Box<dyn RngCore + Send>,
    pub sleeper: Arc<dyn Sleeper>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { clock: Arc::new(SystemGpsClock),
               retry: RetryPolicy::default(),
               rng: Box::new(StdRng::from_os_rng()),
               sleeper: Arc::new(ThreadSleeper) }
    }
}

/// Unidad de trabajo de un publicador contra el almacén compartido.
///
/// Todas las llamadas son secuenciales y bloqueantes. Si la sesión se
/// descarta sin `close()`, `Drop` intenta el mismo cierre e ignora errores.
pub struct Session<S>
    where S: SegmentStore
{
    store: S,
    process: ProcessRecord,
    clock: Arc<dyn GpsClock>,
    definers: DefinerCache,
    registrar: FileRegistrar,
    publisher: SegmentPublisher,
    closed: bool,
}

impl<S> Session<S> where S: SegmentStore
{
    /// Abre una sesión con la configuración por defecto.
    pub fn open(store: S, info: ProcessInfo) -> Result<Self, StateDbError> {
        Self::open_with(store, info, SessionConfig::default())
    }

    /// Registra la fila `process` y precarga los definers conocidos.
    /// Cualquier fallo es `Initialization` y la conexión se libera.
    pub fn open_with(mut store: S, info: ProcessInfo, config: SessionConfig) -> Result<Self, StateDbError> {
        match Self::initialize(&mut store, info, config.clock.as_ref()) {
            Ok((process, definers)) => Ok(Self { store,
                                                 process,
                                                 clock: config.clock,
                                                 definers,
                                                 registrar: FileRegistrar::new(),
                                                 publisher:
                                                     SegmentPublisher::with_parts(config.retry, config.rng, config.sleeper),
                                                 closed: false }),
            Err(e) => {
                if let Err(release_err) = store.release() {
                    log::warn!("no se pudo liberar la conexión tras fallo de apertura: {}", release_err);
                }
                Err(e)
            }
        }
    }

    fn initialize(store: &mut S, info: ProcessInfo, clock: &dyn GpsClock) -> Result<(ProcessRecord, DefinerCache), StateDbError> {
        let process_id =
            store.generate_unique()
                 .map_err(|e| StateDbError::Initialization(format!("no se pudo generar process_id: {}", e)))?;
        let process = ProcessRecord::new(process_id, info, clock.gps_now());
        store.insert_process(&process)
             .map_err(|e| StateDbError::Initialization(format!("no se pudo inicializar la tabla process: {}", e)))?;

        let rows = store.load_state_definers().map_err(|e| {
                                                  StateDbError::Initialization(format!("error leyendo segment_definer: {}",
                                                                                       e))
                                              })?;
        let mut definers = DefinerCache::new();
        let n = definers.prime(rows);
        log::info!("sesión {} abierta en {} con {} tipos de vector de estado conocidos",
                   process.process_id,
                   process.info.node,
                   n);
        log::debug!("tipos de vector de estado conocidos: {:?}", definers.keys());
        Ok((process, definers))
    }

    pub fn process_id(&self) -> &UniqueId {
        &self.process.process_id
    }

    pub fn process(&self) -> &ProcessRecord {
        &self.process
    }

    /// LFN activo, fijado por el último `register_lfn` exitoso.
    pub fn active_file(&self) -> Option<&UniqueId> {
        self.registrar.active()
    }

    pub fn definers(&self) -> &DefinerCache {
        &self.definers
    }

    /// Registra un LFN y lo deja como archivo activo.
    pub fn register_lfn(&mut self, name: &str, start: Option<i64>, end: Option<i64>) -> Result<UniqueId, StateDbError> {
        self.registrar.register(&mut self.store, &self.process.process_id, name, start, end)
    }

    /// Resuelve (o crea) el definer de `(ifo, major, minor)`.
    pub fn resolve_definer(&mut self, ifo: &str, major: i32, minor: i32) -> Result<UniqueId, StateDbError> {
        let key = DefinerKey::new(ifo, major, minor);
        self.definers.resolve(&mut self.store, &self.process.process_id, &key)
    }

    /// Publica un segmento de estado en el archivo activo.
    pub fn publish_state(&mut self,
                         ifo: &str,
                         interval: SegmentInterval,
                         major: i32,
                         minor: i32)
                         -> Result<UniqueId, StateDbError> {
        let key = DefinerKey::new(ifo, major, minor);
        self.publisher.publish(&mut self.store,
                               &mut self.definers,
                               &self.process.process_id,
                               self.registrar.active(),
                               &key,
                               interval)
    }

    /// Cierra la sesión: fija `end_time` y libera la conexión. La conexión
    /// se libera aunque falle la actualización.
    pub fn close(mut self) -> Result<(), StateDbError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), StateDbError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let now = self.clock.gps_now();
        let finished = self.store
                           .finish_process(&self.process.process_id, now)
                           .map_err(|e| StateDbError::Shutdown(format!("error guardando end_time: {}", e)));
        let released = self.store
                           .release()
                           .map_err(|e| StateDbError::Shutdown(format!("error cerrando la conexión: {}", e)));
        finished?;
        released?;
        self.process.end_time = Some(now);
        log::info!("sesión {} cerrada", self.process.process_id);
        Ok(())
    }
}

impl<S> Drop for Session<S> where S: SegmentStore
{
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::warn!("cierre implícito de la sesión {} con errores: {}", self.process.process_id, e);
        }
    }
}
