use segment_domain::{DefinerKey, StateDbError};
use segment_publisher::{DefinerCache, InMemorySegmentStore, StoreError, StoreOp};

#[test]
fn second_resolve_is_served_from_cache() {
  let store = InMemorySegmentStore::new();
  let mut conn = store.handle();
  let mut cache = DefinerCache::new();
  let key = DefinerKey::new("H1", 1, 3);

  let first = cache.resolve(&mut conn, &"p1".into(), &key).expect("first resolve");
  let ids_before = store.calls(StoreOp::GenerateUnique);
  let second = cache.resolve(&mut conn, &"p1".into(), &key).expect("second resolve");

  assert_eq!(first, second);
  assert_eq!(store.calls(StoreOp::InsertDefiner), 1);
  assert_eq!(store.calls(StoreOp::GenerateUnique), ids_before);
  let rows = store.definers();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].name, "STATEVEC.1.3");
  assert_eq!(rows[0].version, 0);
}

#[test]
fn racing_resolvers_adopt_the_single_stored_row() {
  let store = InMemorySegmentStore::new();
  let (mut a, mut b, mut c) = (store.handle(), store.handle(), store.handle());
  let (mut cache_a, mut cache_b, mut cache_c) = (DefinerCache::new(), DefinerCache::new(), DefinerCache::new());
  let key = DefinerKey::new("L1", 2, 7);

  // Las tres cachés se poblaron antes de que nadie creara la fila.
  let id_a = cache_a.resolve(&mut a, &"pa".into(), &key).unwrap();
  let id_b = cache_b.resolve(&mut b, &"pb".into(), &key).unwrap();
  let id_c = cache_c.resolve(&mut c, &"pc".into(), &key).unwrap();

  assert_eq!(id_a, id_b);
  assert_eq!(id_b, id_c);
  assert_eq!(store.definers().len(), 1);
  assert_eq!(store.calls(StoreOp::InsertDefiner), 3);
  assert_eq!(store.calls(StoreOp::FindDefiner), 2);
  assert_eq!(cache_b.get(&key), Some(&id_a));
}

#[test]
fn other_insert_failures_are_not_retried_or_cached() {
  let store = InMemorySegmentStore::new();
  let mut conn = store.handle();
  let mut cache = DefinerCache::new();
  let key = DefinerKey::new("H2", 0, 1);
  store.inject(StoreOp::InsertDefiner, StoreError::Other("table missing".into()));

  let err = cache.resolve(&mut conn, &"p".into(), &key).unwrap_err();
  assert!(matches!(err, StateDbError::DefinerLookup(_)), "got {err:?}");
  assert_eq!(store.calls(StoreOp::InsertDefiner), 1);
  assert_eq!(store.calls(StoreOp::FindDefiner), 0);
  assert!(cache.is_empty());
}

#[test]
fn unique_violation_without_visible_row_is_a_lookup_error() {
  let store = InMemorySegmentStore::new();
  let mut conn = store.handle();
  let mut cache = DefinerCache::new();
  store.inject(StoreOp::InsertDefiner, StoreError::UniqueViolation("dup".into()));

  let err = cache.resolve(&mut conn, &"p".into(), &DefinerKey::new("H1", 9, 9)).unwrap_err();
  assert!(matches!(err, StateDbError::DefinerLookup(_)));
  assert!(cache.is_empty());
}
