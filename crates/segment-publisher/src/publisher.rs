// Archivo: publisher.rs
// Propósito: insertar segmentos de estado ligados al LFN activo, con
// reintento acotado ante deadlocks y detección de duplicados.
use crate::definer_cache::DefinerCache;
use crate::errors::StoreError;
use crate::repository::SegmentStore;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use segment_domain::{DefinerKey, SegmentInterval, StateDbError, StateSegment, UniqueId};
use std::sync::Arc;
use std::time::Duration;

/// Política de reintento ante conflictos transitorios.
///
/// Entre intentos se duerme `slot * k` con `k` uniforme en
/// `[0, backoff_slots)`. El espaciado es lineal, no exponencial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Intentos totales, incluido el primero.
    pub max_attempts: u32,
    pub backoff_slots: u32,
    pub slot: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 4, backoff_slots: 5, slot: Duration::from_secs(1) }
    }
}

impl RetryPolicy {
    /// Misma política sin esperas, útil en pruebas.
    pub fn immediate() -> Self {
        Self { slot: Duration::ZERO, ..Self::default() }
    }
}

/// Forma de esperar entre reintentos.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration);
}

/// Duerme el hilo actual.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

/// Publicador de segmentos. La aleatoriedad del backoff es inyectable.
pub struct SegmentPublisher {
    policy: RetryPolicy,
    rng: Box<dyn RngCore + Send>,
    sleeper: Arc<dyn Sleeper>,
}

impl SegmentPublisher {
    /// Publicador con semilla del sistema operativo y espera real.
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_parts(policy, Box::new(StdRng::from_os_rng()), Arc::new(ThreadSleeper))
    }

    pub fn with_parts(policy: RetryPolicy, rng: Box<dyn RngCore + Send>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, rng, sleeper }
    }

    fn backoff_delay(&mut self) -> Duration {
        if self.policy.backoff_slots == 0 {
            return Duration::ZERO;
        }
        let k: u32 = self.rng.random_range(0..self.policy.backoff_slots);
        self.policy.slot * k
    }

    /// Inserta un `state_segment` para `key` e `interval` en el archivo activo.
    ///
    /// - Sin archivo activo: `NoActiveFile`.
    /// - Violación de unicidad: `SegmentExists`, sin reintentar.
    /// - Conflicto transitorio: hasta `max_attempts` intentos con el mismo id;
    ///   agotados, `TransientPublish`.
    /// - Cualquier otro fallo: `Publish`, sin reintentar.
    pub fn publish<S>(&mut self,
                      store: &mut S,
                      definers: &mut DefinerCache,
                      process_id: &UniqueId,
                      active_file: Option<&UniqueId>,
                      key: &DefinerKey,
                      interval: SegmentInterval)
                      -> Result<UniqueId, StateDbError>
        where S: SegmentStore + ?Sized
    {
        let lfn_id = active_file.cloned().ok_or(StateDbError::NoActiveFile)?;
        let segment_def_id = definers.resolve(store, process_id, key)?;
        let segment_id = store.generate_unique()
                              .map_err(|e| StateDbError::Publish(format!("id para segmento: {}", e)))?;

        let segment = StateSegment { process_id: process_id.clone(),
                                     segment_id: segment_id.clone(),
                                     segment_def_id,
                                     interval,
                                     lfn_id };

        let max_attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match store.insert_segment(&segment) {
                Ok(()) => {
                    log::debug!("state_segment {} insertado para {} (intento {})", segment_id, key, attempt);
                    return Ok(segment_id);
                }
                Err(StoreError::UniqueViolation(msg)) => {
                    log::debug!("state_segment duplicado para {} {:?}", key, interval);
                    return Err(StateDbError::SegmentExists(msg));
                }
                Err(StoreError::Transient(msg)) => {
                    if attempt == max_attempts {
                        return Err(StateDbError::TransientPublish { attempts: attempt, message: msg });
                    }
                    let delay = self.backoff_delay();
                    log::warn!("deadlock insertando segmento (intento {}/{}), reintento en {:?}: {}",
                               attempt,
                               max_attempts,
                               delay,
                               msg);
                    self.sleeper.sleep(delay);
                }
                Err(e) => return Err(StateDbError::Publish(format!("error insertando segmento: {}", e))),
            }
        }

        unreachable!("el bucle de reintento siempre retorna")
    }
}
