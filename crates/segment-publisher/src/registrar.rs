// Archivo: registrar.rs
// Propósito: registrar la identidad lógica (LFN) de un archivo de datos y
// mantener el LFN activo al que se asocian los segmentos publicados.
use crate::errors::StoreError;
use crate::repository::SegmentStore;
use segment_domain::{LogicalFile, StateDbError, UniqueId};

/// Registro de LFNs con contexto de "archivo activo".
///
/// Registrar dos veces el mismo nombre, desde este proceso o desde otro,
/// devuelve siempre el mismo id.
#[derive(Debug, Default, Clone)]
pub struct FileRegistrar {
    active: Option<UniqueId>,
}

impl FileRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// LFN activo, si lo hay.
    pub fn active(&self) -> Option<&UniqueId> {
        self.active.as_ref()
    }

    /// Registra `name` y lo deja como archivo activo.
    ///
    /// Los nombres tipo frame (`P-D-S-L.ext`) fijan el intervalo `[S, S+L)`
    /// ignorando `start`/`end`. El contexto activo se limpia antes de
    /// empezar, así que un fallo deja la sesión sin archivo activo.
    pub fn register<S>(&mut self,
                       store: &mut S,
                       process_id: &UniqueId,
                       name: &str,
                       start: Option<i64>,
                       end: Option<i64>)
                       -> Result<UniqueId, StateDbError>
        where S: SegmentStore + ?Sized
    {
        self.active = None;
        let (start_time, end_time) = LogicalFile::resolve_interval(name, start, end)?;

        let new_id = store.generate_unique()
                          .map_err(|e| StateDbError::Registration(format!("id para LFN {}: {}", name, e)))?;
        let row = LogicalFile { process_id: process_id.clone(),
                                lfn_id: new_id.clone(),
                                lfn: name.to_string(),
                                start_time,
                                end_time };

        let id = match store.insert_lfn(&row) {
            Ok(()) => {
                log::info!("LFN {} registrado [{}, {}) con id {}", name, start_time, end_time, new_id);
                new_id
            }
            Err(StoreError::UniqueViolation(_)) => {
                let existing = store.find_lfn(name)
                                    .map_err(|e| StateDbError::Registration(format!("LFN {}: {}", name, e)))?
                                    .ok_or_else(|| {
                                        StateDbError::Registration(format!("LFN {} duplicado pero no encontrado", name))
                                    })?;
                log::debug!("LFN {} ya registrado, se adopta {}", name, existing);
                existing
            }
            Err(e) => return Err(StateDbError::Registration(format!("no se pudo crear el LFN {}: {}", name, e))),
        };

        self.active = Some(id.clone());
        Ok(id)
    }
}
