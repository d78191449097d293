// Archivo: definer_cache.rs
// Propósito: vista local de la tabla `segment_definer`, indexada por
// (detector, major, minor). Se puebla al abrir la sesión y se extiende
// bajo demanda con el patrón crear-o-adoptar.
use crate::errors::StoreError;
use crate::repository::SegmentStore;
use segment_domain::{DefinerKey, SegmentDefiner, StateDbError, UniqueId};
use std::collections::HashMap;

/// Directorio en memoria de definers de vector de estado.
///
/// Tras un `resolve` exitoso la caché y el almacén coinciden en el id del
/// definer para esa clave.
#[derive(Debug, Default, Clone)]
pub struct DefinerCache {
    entries: HashMap<DefinerKey, UniqueId>,
}

impl DefinerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Carga filas existentes. Las que no son de vector de estado se
    /// ignoran. Devuelve cuántas entradas quedaron cacheadas.
    pub fn prime<I>(&mut self, rows: I) -> usize
        where I: IntoIterator<Item = SegmentDefiner>
    {
        for row in rows {
            if let Some(key) = row.key() {
                self.entries.insert(key, row.segment_def_id);
            }
        }
        self.entries.len()
    }

    pub fn get(&self, key: &DefinerKey) -> Option<&UniqueId> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Claves conocidas, ordenadas.
    pub fn keys(&self) -> Vec<&DefinerKey> {
        let mut keys: Vec<&DefinerKey> = self.entries.keys().collect();
        keys.sort();
        keys
    }

    /// Devuelve el id del definer para `key`, creándolo si hace falta.
    ///
    /// Si otra sesión gana la carrera de inserción, el id generado se
    /// descarta y se adopta el de la fila existente.
    pub fn resolve<S>(&mut self, store: &mut S, process_id: &UniqueId, key: &DefinerKey) -> Result<UniqueId, StateDbError>
        where S: SegmentStore + ?Sized
    {
        if let Some(id) = self.entries.get(key) {
            return Ok(id.clone());
        }

        let new_id = store.generate_unique()
                          .map_err(|e| StateDbError::DefinerLookup(format!("id para {}: {}", key, e)))?;
        let definer = SegmentDefiner::for_state_vector(process_id.clone(), new_id.clone(), key);

        let id = match store.insert_definer(&definer) {
            Ok(()) => {
                log::info!("nuevo segment_definer {} para {}", new_id, key);
                new_id
            }
            Err(StoreError::UniqueViolation(_)) => {
                let existing =
                    store.find_definer(key)
                         .map_err(|e| StateDbError::DefinerLookup(format!("carrera en {}: {}", key, e)))?
                         .ok_or_else(|| {
                             StateDbError::DefinerLookup(format!("carrera en {}: la fila existente no aparece", key))
                         })?;
                log::debug!("segment_definer {} ya creado por otro proceso: {}", key, existing);
                existing
            }
            Err(e) => return Err(StateDbError::DefinerLookup(format!("insertando {}: {}", key, e))),
        };

        self.entries.insert(key.clone(), id.clone());
        Ok(id)
    }
}
