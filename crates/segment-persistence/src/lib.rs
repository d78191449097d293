//! Persistencia Diesel para el trait `SegmentStore`.
//! Este archivo expone el módulo `schema` y reexporta el almacén Diesel
//! que implementa el contrato del publicador. La implementación detallada
//! está en `segment_persistence.rs`.
//!
//! `DieselSegmentStore::connect` no crea tablas: un almacén nuevo se
//! prepara una vez con `DieselSegmentStore::migrate`.

mod segment_persistence;
pub mod schema;

pub use segment_persistence::{database_url_from_env, new_from_env, open_session, Credentials, DieselSegmentStore,
                              DEFAULT_BUSY_TIMEOUT_MS, MIGRATIONS};
