#![allow(dead_code)]
use rand::rngs::StdRng;
use rand::SeedableRng;
use segment_domain::{FixedGpsClock, ProcessInfo};
use segment_publisher::{InMemorySegmentStore, RetryPolicy, Session, SessionConfig, Sleeper};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const NOW: i64 = 1_000_000_500;

/// Sleeper that only records the requested delays.
#[derive(Default)]
pub struct RecordingSleeper {
  pub delays: Mutex<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
  fn sleep(&self, delay: Duration) {
    self.delays.lock().unwrap().push(delay);
  }
}

impl RecordingSleeper {
  pub fn recorded(&self) -> Vec<Duration> {
    self.delays.lock().unwrap().clone()
  }
}

pub fn info(program: &str) -> ProcessInfo {
  ProcessInfo { program: program.into(),
                version: "1.0".into(),
                cvs_repository: "statevec/publisher".into(),
                cvs_entry_time: 900_000_000,
                is_online: true,
                node: "node01".into(),
                username: "tester".into(),
                unix_procid: 4242 }
}

pub fn config(seed: u64, sleeper: Arc<RecordingSleeper>) -> SessionConfig {
  SessionConfig { clock: Arc::new(FixedGpsClock(NOW)),
                  retry: RetryPolicy { slot: Duration::from_millis(10), ..RetryPolicy::default() },
                  rng: Box::new(StdRng::seed_from_u64(seed)),
                  sleeper }
}

pub fn open(store: &InMemorySegmentStore) -> Session<InMemorySegmentStore> {
  Session::open_with(store.handle(), info("publisher"), config(7, Arc::new(RecordingSleeper::default())))
    .expect("open session")
}
