// Archivo: gps_time.rs
// Propósito: convertir instantes UTC a segundos GPS y exponer el reloj
// inyectable que usan las sesiones.
use chrono::{DateTime, TimeZone, Utc};

/// Timestamp unix de la época GPS, 1980-01-06T00:00:00Z.
pub const GPS_EPOCH_UNIX: i64 = 315_964_800;

/// Instantes unix a partir de los cuales ya se había insertado un segundo
/// intercalar desde la época GPS. Cada entrada suma un segundo al desfase.
const LEAP_SECONDS_UNIX: [i64; 18] = [362_793_600,   // 1981-07-01
                                      394_329_600,   // 1982-07-01
                                      425_865_600,   // 1983-07-01
                                      489_024_000,   // 1985-07-01
                                      567_993_600,   // 1988-01-01
                                      631_152_000,   // 1990-01-01
                                      662_688_000,   // 1991-01-01
                                      709_948_800,   // 1992-07-01
                                      741_484_800,   // 1993-07-01
                                      773_020_800,   // 1994-07-01
                                      820_454_400,   // 1996-01-01
                                      867_715_200,   // 1997-07-01
                                      915_148_800,   // 1999-01-01
                                      1_136_073_600, // 2006-01-01
                                      1_230_768_000, // 2009-01-01
                                      1_341_100_800, // 2012-07-01
                                      1_435_708_800, // 2015-07-01
                                      1_483_228_800  /* 2017-01-01 */];

/// Segundos GPS enteros de un instante UTC.
pub fn gps_seconds_from_utc(when: DateTime<Utc>) -> i64 {
  let unix = when.timestamp();
  let leaps = LEAP_SECONDS_UNIX.iter().filter(|&&t| t <= unix).count() as i64;
  unix - GPS_EPOCH_UNIX + leaps
}

/// Segundos GPS de un timestamp unix. Fuera de rango devuelve 0.
pub fn gps_seconds_from_unix(unix: i64) -> i64 {
  match Utc.timestamp_opt(unix, 0).single() {
    Some(dt) => gps_seconds_from_utc(dt),
    None => 0,
  }
}

/// Fuente del instante actual en segundos GPS.
pub trait GpsClock: Send + Sync {
  fn gps_now(&self) -> i64;
}

/// Reloj del sistema.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGpsClock;

impl GpsClock for SystemGpsClock {
  fn gps_now(&self) -> i64 {
    gps_seconds_from_utc(Utc::now())
  }
}

/// Reloj fijo, para pruebas.
#[derive(Debug, Clone, Copy)]
pub struct FixedGpsClock(pub i64);

impl GpsClock for FixedGpsClock {
  fn gps_now(&self) -> i64 {
    self.0
  }
}
