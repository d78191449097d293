use segment_domain::StateDbError;
use segment_publisher::{FileRegistrar, InMemorySegmentStore, StoreError, StoreOp};

#[test]
fn frame_names_define_their_own_interval() {
  let store = InMemorySegmentStore::new();
  let mut conn = store.handle();
  let mut reg = FileRegistrar::new();

  let id = reg.register(&mut conn, &"p".into(), "H1-TEST-1000000000-64.gwf", Some(5), Some(6)).unwrap();

  assert_eq!(reg.active(), Some(&id));
  let rows = store.lfns();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].start_time, 1_000_000_000);
  assert_eq!(rows[0].end_time, 1_000_000_064);
  assert_eq!(rows[0].lfn_id, id);
}

#[test]
fn explicit_interval_is_used_for_other_names() {
  let store = InMemorySegmentStore::new();
  let mut conn = store.handle();
  let mut reg = FileRegistrar::new();

  reg.register(&mut conn, &"p".into(), "state-dump.xml", Some(100), Some(164)).unwrap();
  let rows = store.lfns();
  assert_eq!((rows[0].start_time, rows[0].end_time), (100, 164));
}

#[test]
fn non_frame_name_without_interval_fails_validation() {
  let store = InMemorySegmentStore::new();
  let mut conn = store.handle();
  let mut reg = FileRegistrar::new();

  let err = reg.register(&mut conn, &"p".into(), "state-dump.xml", Some(100), None).unwrap_err();
  assert!(matches!(err, StateDbError::Validation(_)));
  assert_eq!(store.calls(StoreOp::InsertLfn), 0);
  assert!(reg.active().is_none());
}

#[test]
fn registering_the_same_name_twice_yields_the_same_id() {
  let store = InMemorySegmentStore::new();
  let mut conn = store.handle();
  let mut reg = FileRegistrar::new();
  let name = "L-R-900000000-16.gwf";

  let first = reg.register(&mut conn, &"p".into(), name, None, None).unwrap();
  let second = reg.register(&mut conn, &"p".into(), name, None, None).unwrap();

  assert_eq!(first, second);
  assert_eq!(reg.active(), Some(&first));
  assert_eq!(store.lfns().len(), 1);
  assert_eq!(store.calls(StoreOp::FindLfn), 1);
}

#[test]
fn registering_from_another_process_adopts_the_existing_row() {
  let store = InMemorySegmentStore::new();
  let (mut a, mut b) = (store.handle(), store.handle());
  let (mut reg_a, mut reg_b) = (FileRegistrar::new(), FileRegistrar::new());
  let name = "H-H1_RDS-815155213-128.gwf";

  let id_a = reg_a.register(&mut a, &"pa".into(), name, None, None).unwrap();
  let id_b = reg_b.register(&mut b, &"pb".into(), name, None, None).unwrap();

  assert_eq!(id_a, id_b);
  assert_eq!(store.lfns()[0].process_id.as_str(), "pa");
}

#[test]
fn other_failures_are_registration_errors_and_clear_the_active_file() {
  let store = InMemorySegmentStore::new();
  let mut conn = store.handle();
  let mut reg = FileRegistrar::new();
  reg.register(&mut conn, &"p".into(), "H1-A-1-1.gwf", None, None).unwrap();
  store.inject(StoreOp::InsertLfn, StoreError::Other("connection reset".into()));

  let err = reg.register(&mut conn, &"p".into(), "H1-B-2-1.gwf", None, None).unwrap_err();
  assert!(matches!(err, StateDbError::Registration(_)));
  assert!(reg.active().is_none());
}
