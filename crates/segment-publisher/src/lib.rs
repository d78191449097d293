//! Crate `segment-publisher`: cliente de publicación de segmentos de estado
//!
//! Este crate define el contrato con el almacén compartido (`SegmentStore`),
//! la caché de definers (`DefinerCache`), el registro de LFNs
//! (`FileRegistrar`), el publicador con reintentos (`SegmentPublisher`) y la
//! `Session` que los compone sobre una única conexión. Incluye además un
//! almacén en memoria (`InMemorySegmentStore`) útil para pruebas.
//!
//! Diseño resumido:
//! - Crear-o-adoptar: definers y LFNs se insertan con un id nuevo; si otra
//!   sesión ganó la carrera, se descarta el id y se adopta la fila existente.
//! - Reintento acotado: los deadlocks al insertar segmentos se reintentan
//!   hasta 4 veces con espera aleatoria lineal.
//! - Duplicados: un segmento ya publicado se reporta como
//!   `StateDbError::SegmentExists`, distinguible del resto de errores.
//!
//! Ejemplo rápido:
//! ```rust
//! use segment_domain::{ProcessInfo, SegmentInterval};
//! use segment_publisher::{InMemorySegmentStore, Session};
//! let store = InMemorySegmentStore::new();
//! let mut session = Session::open(store.handle(), ProcessInfo::from_env("1.0", "demo", 0)).unwrap();
//! session.register_lfn("H1-TEST-1000000000-64.gwf", None, None).unwrap();
//! session.publish_state("H1", SegmentInterval::new(1000000000, 0, 1000000010, 0), 1, 3).unwrap();
//! session.close().unwrap();
//! ```
pub mod definer_cache;
pub mod errors;
pub mod publisher;
pub mod registrar;
pub mod repository;
pub mod session;
pub mod stubs;

pub use definer_cache::*;
pub use errors::*;
pub use publisher::*;
pub use registrar::*;
pub use repository::*;
pub use session::*;
pub use stubs::*;
