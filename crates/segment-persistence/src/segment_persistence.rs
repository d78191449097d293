// Archivo: segment_persistence.rs
// Propósito: implementar `SegmentStore` sobre una conexión Diesel (SQLite
// por defecto, Postgres con la feature `pg`). El esquema se crea con
// `migrate`, nunca al conectar: el almacén compartido ya existe.
use crate::schema;
use crate::schema::lfn::dsl as lfn_dsl;
use crate::schema::process::dsl as process_dsl;
use crate::schema::segment_definer::dsl as def_dsl;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Text;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use segment_domain::{DefinerKey, LogicalFile, ProcessInfo, ProcessRecord, SegmentDefiner, StateDbError, StateSegment,
                     UniqueId};
use segment_publisher::{SegmentStore, Session, StoreError, StoreResult};
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");
#[cfg(feature = "pg")]
type DbConn = PgConnection;
#[cfg(not(feature = "pg"))]
type DbConn = SqliteConnection;
#[cfg(feature = "pg")]
const GENERATE_UNIQUE_SQL: &str = "SELECT replace(gen_random_uuid()::text, '-', '') AS id";
#[cfg(not(feature = "pg"))]
const GENERATE_UNIQUE_SQL: &str = "SELECT lower(hex(randomblob(16))) AS id";
/// Tiempo de espera por defecto ante un bloqueo de SQLite.
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5000;
/// Login opcional para el almacén compartido. Se añade a las URLs Postgres
/// que no traen usuario; SQLite lo ignora.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
  pub user: String,
  pub password: Option<String>,
}
/// `SegmentStore` sobre una única conexión Diesel.
pub struct DieselSegmentStore {
  conn: Option<DbConn>,
}
impl DieselSegmentStore {
  /// Abre la conexión. No toca el esquema; ver `migrate`.
  pub fn connect(database_url: &str, credentials: Option<&Credentials>) -> StoreResult<Self> {
    let url = apply_credentials(database_url, credentials);
    let conn = DbConn::establish(&url).map_err(|e| StoreError::Other(format!("connect: {}", e)))?;
    let mut store = DieselSegmentStore { conn: Some(conn) };
    store.configure_connection()?;
    Ok(store)
  }

  #[cfg(not(feature = "pg"))]
  fn configure_connection(&mut self) -> StoreResult<()> {
    self.conn()?.batch_execute("PRAGMA foreign_keys = ON;").map_err(map_db_err)?;
    self.set_lock_timeout(DEFAULT_BUSY_TIMEOUT_MS)
  }

  #[cfg(feature = "pg")]
  fn configure_connection(&mut self) -> StoreResult<()> {
    Ok(())
  }

  /// Aplica las migraciones pendientes y devuelve cuántas se aplicaron.
  /// Se ejecuta una vez al desplegar un almacén nuevo, no por sesión.
  pub fn migrate(&mut self) -> StoreResult<usize> {
    let conn = self.conn()?;
    let applied =
      conn.run_pending_migrations(MIGRATIONS).map_err(|e| StoreError::Other(format!("migrations: {}", e)))?;
    for version in &applied {
      log::info!("migración aplicada: {}", version);
    }
    Ok(applied.len())
  }

  /// Cuánto espera una sentencia por un bloqueo ajeno antes de fallar con
  /// un error transitorio. `busy_timeout` en SQLite, `lock_timeout` en
  /// Postgres; 0 no espera en SQLite y desactiva el límite en Postgres.
  pub fn set_lock_timeout(&mut self, millis: u32) -> StoreResult<()> {
    #[cfg(feature = "pg")]
    let sql = format!("SET lock_timeout = {}", millis);
    #[cfg(not(feature = "pg"))]
    let sql = format!("PRAGMA busy_timeout = {};", millis);
    self.conn()?.batch_execute(&sql).map_err(map_db_err)
  }
  fn conn(&mut self) -> StoreResult<&mut DbConn> {
    self.conn.as_mut().ok_or_else(|| StoreError::Other("conexión cerrada".into()))
  }
  pub fn is_open(&self) -> bool {
    self.conn.is_some()
  }
}
// Filas Diesel de las cuatro tablas
#[derive(Debug, Insertable)]
#[diesel(table_name = schema::process)]
struct ProcessRow {
  pub process_id: String,
  pub program: String,
  pub version: String,
  pub cvs_repository: String,
  pub cvs_entry_time: i64,
  pub is_online: i32,
  pub node: String,
  pub username: String,
  pub unix_procid: i32,
  pub start_time: i64,
  pub end_time: Option<i64>,
}
#[derive(Debug, Insertable)]
#[diesel(table_name = schema::lfn)]
struct LfnRow {
  pub process_id: String,
  pub lfn_id: String,
  pub lfn_name: String,
  pub start_time: i64,
  pub end_time: i64,
}
#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::segment_definer)]
struct DefinerRow {
  pub process_id: String,
  pub segment_def_id: String,
  pub ifos: String,
  pub name: String,
  pub version: i32,
  pub comment: Option<String>,
  pub state_vec_major: Option<i32>,
  pub state_vec_minor: Option<i32>,
}
#[derive(Debug, Insertable)]
#[diesel(table_name = schema::state_segment)]
struct SegmentRow {
  pub process_id: String,
  pub segment_id: String,
  pub segment_def_id: String,
  pub start_time: i64,
  pub start_time_ns: i32,
  pub end_time: i64,
  pub end_time_ns: i32,
  pub lfn_id: String,
}
#[derive(QueryableByName)]
struct UniqueRow {
  #[diesel(sql_type = Text)]
  id: String,
}
impl From<DefinerRow> for SegmentDefiner {
  fn from(r: DefinerRow) -> Self {
    SegmentDefiner { process_id: r.process_id.into(),
                     segment_def_id: r.segment_def_id.into(),
                     ifos: r.ifos.trim().to_string(),
                     name: r.name,
                     version: r.version,
                     comment: r.comment,
                     state_vec_major: r.state_vec_major,
                     state_vec_minor: r.state_vec_minor }
  }
}
/// Clasifica un fallo de Diesel. Las violaciones de unicidad alimentan el
/// crear-o-adoptar; deadlocks, fallos de serialización y bloqueos de
/// SQLite son reintentables.
pub(crate) fn map_db_err(e: DieselError) -> StoreError {
  match e {
    DieselError::DatabaseError(kind, info) => match kind {
      DatabaseErrorKind::UniqueViolation => StoreError::UniqueViolation(info.message().to_string()),
      DatabaseErrorKind::SerializationFailure => StoreError::Transient(info.message().to_string()),
      _ if is_lock_conflict(info.message()) => StoreError::Transient(info.message().to_string()),
      _ => StoreError::Other(format!("db ({:?}): {}", kind, info.message())),
    },
    DieselError::NotFound => StoreError::NotFound("db: fila no encontrada".into()),
    other => StoreError::Other(format!("db: {}", other)),
  }
}
fn is_lock_conflict(message: &str) -> bool {
  let m = message.to_lowercase();
  m.contains("deadlock")
  || m.contains("database is locked")
  || m.contains("could not serialize")
  || m.contains("lock timeout")
}
impl SegmentStore for DieselSegmentStore {
  fn generate_unique(&mut self) -> StoreResult<UniqueId> {
    let conn = self.conn()?;
    let row = diesel::sql_query(GENERATE_UNIQUE_SQL).get_result::<UniqueRow>(conn).map_err(map_db_err)?;
    Ok(UniqueId::new(row.id))
  }
  fn insert_process(&mut self, record: &ProcessRecord) -> StoreResult<()> {
    let conn = self.conn()?;
    let info = &record.info;
    let row = ProcessRow { process_id: record.process_id.to_string(),
                           program: info.program.clone(),
                           version: info.version.clone(),
                           cvs_repository: info.cvs_repository.clone(),
                           cvs_entry_time: info.cvs_entry_time,
                           is_online: i32::from(info.is_online),
                           node: info.node.clone(),
                           username: info.username.clone(),
                           unix_procid: info.unix_procid,
                           start_time: record.start_time,
                           end_time: record.end_time };
    diesel::insert_into(process_dsl::process).values(&row).execute(conn).map_err(map_db_err)?;
    Ok(())
  }
  fn finish_process(&mut self, process_id: &UniqueId, end_time: i64) -> StoreResult<()> {
    let conn = self.conn()?;
    let updated = diesel::update(process_dsl::process.filter(process_dsl::process_id.eq(process_id.as_str())))
      .set(process_dsl::end_time.eq(Some(end_time)))
      .execute(conn)
      .map_err(map_db_err)?;
    if updated == 0 {
      return Err(StoreError::NotFound(format!("process {}", process_id)));
    }
    Ok(())
  }
  fn find_process_end(&mut self, process_id: &UniqueId) -> StoreResult<Option<i64>> {
    let conn = self.conn()?;
    process_dsl::process.filter(process_dsl::process_id.eq(process_id.as_str()))
                        .select(process_dsl::end_time)
                        .first::<Option<i64>>(conn)
                        .optional()
                        .map_err(map_db_err)?
                        .ok_or_else(|| StoreError::NotFound(format!("process {}", process_id)))
  }
  fn load_state_definers(&mut self) -> StoreResult<Vec<SegmentDefiner>> {
    let conn = self.conn()?;
    let rows = def_dsl::segment_definer.filter(def_dsl::state_vec_major.is_not_null())
                                       .filter(def_dsl::state_vec_minor.is_not_null())
                                       .load::<DefinerRow>(conn)
                                       .map_err(map_db_err)?;
    Ok(rows.into_iter().map(SegmentDefiner::from).collect())
  }
  fn insert_definer(&mut self, definer: &SegmentDefiner) -> StoreResult<()> {
    let conn = self.conn()?;
    let row = DefinerRow { process_id: definer.process_id.to_string(),
                           segment_def_id: definer.segment_def_id.to_string(),
                           ifos: definer.ifos.clone(),
                           name: definer.name.clone(),
                           version: definer.version,
                           comment: definer.comment.clone(),
                           state_vec_major: definer.state_vec_major,
                           state_vec_minor: definer.state_vec_minor };
    diesel::insert_into(def_dsl::segment_definer).values(&row).execute(conn).map_err(map_db_err)?;
    Ok(())
  }
  fn find_definer(&mut self, key: &DefinerKey) -> StoreResult<Option<UniqueId>> {
    let conn = self.conn()?;
    let found = def_dsl::segment_definer.filter(def_dsl::ifos.eq(&key.ifo))
                                        .filter(def_dsl::state_vec_major.eq(key.major))
                                        .filter(def_dsl::state_vec_minor.eq(key.minor))
                                        .select(def_dsl::segment_def_id)
                                        .first::<String>(conn)
                                        .optional()
                                        .map_err(map_db_err)?;
    Ok(found.map(UniqueId::from))
  }
  fn insert_lfn(&mut self, lfn: &LogicalFile) -> StoreResult<()> {
    let conn = self.conn()?;
    let row = LfnRow { process_id: lfn.process_id.to_string(),
                       lfn_id: lfn.lfn_id.to_string(),
                       lfn_name: lfn.lfn.clone(),
                       start_time: lfn.start_time,
                       end_time: lfn.end_time };
    diesel::insert_into(lfn_dsl::lfn).values(&row).execute(conn).map_err(map_db_err)?;
    Ok(())
  }
  fn find_lfn(&mut self, name: &str) -> StoreResult<Option<UniqueId>> {
    let conn = self.conn()?;
    let found = lfn_dsl::lfn.filter(lfn_dsl::lfn_name.eq(name))
                            .select(lfn_dsl::lfn_id)
                            .first::<String>(conn)
                            .optional()
                            .map_err(map_db_err)?;
    Ok(found.map(UniqueId::from))
  }
  fn insert_segment(&mut self, segment: &StateSegment) -> StoreResult<()> {
    let conn = self.conn()?;
    let row = SegmentRow { process_id: segment.process_id.to_string(),
                           segment_id: segment.segment_id.to_string(),
                           segment_def_id: segment.segment_def_id.to_string(),
                           start_time: segment.interval.start_time,
                           start_time_ns: segment.interval.start_time_ns,
                           end_time: segment.interval.end_time,
                           end_time_ns: segment.interval.end_time_ns,
                           lfn_id: segment.lfn_id.to_string() };
    diesel::insert_into(schema::state_segment::table).values(&row).execute(conn).map_err(map_db_err)?;
    Ok(())
  }
  fn release(&mut self) -> StoreResult<()> {
    // cerrar = soltar la conexión
    self.conn.take();
    Ok(())
  }
}
/// Inserta `user[:password]@` tras el esquema de una URL Postgres sin
/// usuario. El resto de URLs se devuelven igual.
pub(crate) fn apply_credentials(url: &str, credentials: Option<&Credentials>) -> String {
  let Some(c) = credentials else {
    return url.to_string();
  };
  if !looks_like_postgres_url(url) || url.contains('@') {
    return url.to_string();
  }
  match url.split_once("://") {
    Some((scheme, rest)) => {
      let login = match &c.password {
        Some(p) => format!("{}:{}", c.user, p),
        None => c.user.clone(),
      };
      format!("{}://{}@{}", scheme, login, rest)
    }
    None => url.to_string(),
  }
}
fn looks_like_postgres_url(url: &str) -> bool {
  let l = url.to_lowercase();
  l.starts_with("postgres://") || l.starts_with("postgresql://")
}
fn looks_like_sqlite_url(url: &str) -> bool {
  let l = url.to_lowercase();
  !looks_like_postgres_url(url)
  && (l.starts_with("file:") || l == ":memory:" || l.contains("sqlite") || l.ends_with(".db") || !l.contains("://"))
}
/// Lee `STATEDB_URL` (o `DATABASE_URL`) tras cargar `.env` y comprueba que
/// encaja con el backend compilado.
pub fn database_url_from_env() -> Result<String, StateDbError> {
  dotenvy::dotenv().ok();
  let url = std::env::var("STATEDB_URL").or_else(|_| std::env::var("DATABASE_URL"))
                                        .map_err(|_| {
                                          StateDbError::Initialization("STATEDB_URL / DATABASE_URL not set".into())
                                        })?;
  if cfg!(feature = "pg") {
    if !(looks_like_postgres_url(&url) || url.contains('@')) {
      return Err(StateDbError::Initialization("STATEDB_URL / DATABASE_URL does not look like Postgres URL".into()));
    }
  } else if !looks_like_sqlite_url(&url) {
    return Err(StateDbError::Initialization("segment-persistence was compiled without 'pg' feature; enable the \
                                             'pg' feature to use Postgres"
                                                                          .into()));
  }
  Ok(url)
}
/// Construye el almacén a partir del entorno.
pub fn new_from_env(credentials: Option<&Credentials>) -> Result<DieselSegmentStore, StateDbError> {
  let url = database_url_from_env()?;
  DieselSegmentStore::connect(&url, credentials).map_err(|e| StateDbError::Initialization(e.to_string()))
}
/// Conecta a `database_url` y abre una sesión de publicación.
pub fn open_session(database_url: &str,
                    credentials: Option<&Credentials>,
                    info: ProcessInfo)
                    -> Result<Session<DieselSegmentStore>, StateDbError> {
  let store = DieselSegmentStore::connect(database_url, credentials)
    .map_err(|e| StateDbError::Initialization(format!("Error connecting to database: {}", e)))?;
  Session::open(store, info)
}
