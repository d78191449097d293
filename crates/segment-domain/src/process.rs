// Archivo: process.rs
// Propósito: identidad del proceso publicador (fila `process`).
use crate::UniqueId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadatos del publicador en ejecución. Se escriben una vez en la tabla
/// `process` al abrir la sesión.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
  pub program: String,
  pub version: String,
  /// Origen del build (ruta del repositorio o similar).
  pub cvs_repository: String,
  /// Fecha del build en segundos GPS.
  pub cvs_entry_time: i64,
  pub is_online: bool,
  pub node: String,
  pub username: String,
  pub unix_procid: i32,
}

impl ProcessInfo {
  /// Toma programa, host, usuario y pid del proceso actual. Versión y
  /// origen los aporta quien llama.
  pub fn from_env(version: &str, source: &str, build_time_gps: i64) -> Self {
    let program = std::env::args().next()
                                  .as_deref()
                                  .and_then(|p| Path::new(p).file_name())
                                  .map(|n| n.to_string_lossy().into_owned())
                                  .unwrap_or_else(|| "unknown".to_string());
    Self { program,
           version: version.to_string(),
           cvs_repository: source.to_string(),
           cvs_entry_time: build_time_gps,
           is_online: true,
           node: hostname(),
           username: username(),
           unix_procid: std::process::id() as i32 }
  }
}

fn hostname() -> String {
  if let Ok(h) = std::env::var("HOSTNAME") {
    if !h.trim().is_empty() {
      return h.trim().to_string();
    }
  }
  std::fs::read_to_string("/etc/hostname").ok()
                                         .map(|s| s.trim().to_string())
                                         .filter(|s| !s.is_empty())
                                         .unwrap_or_else(|| "localhost".to_string())
}

fn username() -> String {
  std::env::var("USER").or_else(|_| std::env::var("LOGNAME"))
                       .or_else(|_| std::env::var("USERNAME"))
                       .unwrap_or_else(|_| "unknown".to_string())
}

/// Fila `process` de una sesión. `end_time` queda vacío hasta el cierre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
  pub process_id: UniqueId,
  pub info: ProcessInfo,
  pub start_time: i64,
  pub end_time: Option<i64>,
}

impl ProcessRecord {
  pub fn new(process_id: UniqueId, info: ProcessInfo, start_time: i64) -> Self {
    Self { process_id, info, start_time, end_time: None }
  }
}
