use clap::Parser;
use serde::Serialize;
use segment_domain::{gps_seconds_from_unix, ProcessInfo, StateDbError};
use segment_persistence::{new_from_env, Credentials, DieselSegmentStore, DEFAULT_BUSY_TIMEOUT_MS};
use segment_publisher::Session;
use std::error::Error;
use std::io::{self, BufRead};

mod input;

/// Publica segmentos de vector de estado de un archivo en la base de
/// metadatos compartida.
///
/// Lee un segmento por línea de stdin:
/// `<ifo> <start> <start_ns> <end> <end_ns> <major> <minor>`.
#[derive(Parser, Debug)]
#[command(name = "publish-segments", version)]
struct Args {
  /// Nombre lógico del archivo (LFN) del que salen los segmentos.
  lfn: String,
  /// Inicio GPS del archivo; ignorado si el nombre es tipo frame.
  #[arg(long)]
  start: Option<i64>,
  /// Fin GPS del archivo; ignorado si el nombre es tipo frame.
  #[arg(long)]
  end: Option<i64>,
  /// URL de la base; por defecto STATEDB_URL / DATABASE_URL.
  #[arg(long)]
  database_url: Option<String>,
  #[arg(long, env = "STATEDB_USER")]
  user: Option<String>,
  #[arg(long, env = "STATEDB_PASSWORD", hide_env_values = true)]
  password: Option<String>,
  /// Espera máxima ante un bloqueo de otro escritor, en milisegundos.
  #[arg(long, default_value_t = DEFAULT_BUSY_TIMEOUT_MS)]
  lock_timeout_ms: u32,
  /// Aplica las migraciones pendientes antes de publicar. Solo para
  /// preparar un almacén nuevo.
  #[arg(long)]
  migrate: bool,
  /// Activa logs de depuración.
  #[arg(long)]
  debug: bool,
}

/// Resumen de la ejecución, impreso en JSON por stdout.
#[derive(Debug, Serialize)]
struct RunSummary {
  process_id: String,
  lfn: String,
  lfn_id: String,
  published: usize,
  already_present: usize,
}

fn main() {
  let args = Args::parse();
  let level = if args.debug { "debug" } else { "info" };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

  if let Err(e) = run(args) {
    log::error!("{}", e);
    std::process::exit(1);
  }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
  let credentials = args.user.map(|user| Credentials { user, password: args.password });
  let build_time = option_env!("STATEDB_BUILD_UNIX").and_then(|s| s.parse::<i64>().ok())
                                                    .map(gps_seconds_from_unix)
                                                    .unwrap_or(0);
  let info = ProcessInfo::from_env(env!("CARGO_PKG_VERSION"), env!("CARGO_PKG_NAME"), build_time);

  let mut store = match &args.database_url {
    Some(url) => DieselSegmentStore::connect(url, credentials.as_ref())
      .map_err(|e| StateDbError::Initialization(format!("Error connecting to database: {}", e)))?,
    None => new_from_env(credentials.as_ref())?,
  };
  store.set_lock_timeout(args.lock_timeout_ms)?;
  if args.migrate {
    let applied = store.migrate()?;
    log::info!("{} migraciones aplicadas", applied);
  }

  let mut session = Session::open(store, info)?;
  let lfn_id = session.register_lfn(&args.lfn, args.start, args.end)?;

  let mut published = 0usize;
  let mut existing = 0usize;
  let mut failure: Option<Box<dyn Error>> = None;
  for (idx, line) in io::stdin().lock().lines().enumerate() {
    let line = match line {
      Ok(l) => l,
      Err(e) => {
        failure = Some(e.into());
        break;
      }
    };
    let seg = match input::parse_segment_line(idx + 1, &line) {
      Ok(Some(seg)) => seg,
      Ok(None) => continue,
      Err(e) => {
        failure = Some(e.into());
        break;
      }
    };
    match session.publish_state(&seg.ifo, seg.interval, seg.major, seg.minor) {
      Ok(_) => published += 1,
      Err(e) if e.is_segment_exists() => {
        log::info!("segmento ya publicado: {} {:?}", seg.ifo, seg.interval);
        existing += 1;
      }
      Err(e) => {
        failure = Some(e.into());
        break;
      }
    }
  }

  let process_id = session.process_id().to_string();
  let closed = session.close();
  let summary = RunSummary { process_id,
                             lfn: args.lfn,
                             lfn_id: lfn_id.to_string(),
                             published,
                             already_present: existing };
  println!("{}", serde_json::to_string(&summary)?);

  if let Some(e) = failure {
    return Err(e);
  }
  closed?;
  Ok(())
}
