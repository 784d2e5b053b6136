use jagged::{
  CompressedRows, JaggedError, JaggedStore, RowState, counts_to_row_pointers, sample_row_counts,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

type Rows = Vec<Option<Vec<u16>>>;

fn init_logging() {
  let _ = tracing_subscriber::fmt()
    .with_target(false)
    .with_env_filter(EnvFilter::from_default_env())
    .try_init();
}

fn insert_in_order(rows: &Rows, order: &[usize]) -> JaggedStore<u16> {
  let total = rows.iter().flatten().map(Vec::len).sum();
  let mut store = JaggedStore::create(rows.len(), total).unwrap();
  for &row in order {
    match &rows[row] {
      Some(values) => store.set_row(row, values).unwrap(),
      None => store.set_null(row).unwrap(),
    }
  }
  store
}

fn read_back(store: &JaggedStore<u16>) -> Rows {
  (0..store.capacity())
    .map(|row| store.get_row(row).unwrap().map(<[u16]>::to_vec))
    .collect()
}

fn rows_and_order() -> impl Strategy<Value = (Rows, Vec<usize>)> {
  prop::collection::vec(
    prop::option::of(prop::collection::vec(any::<u16>(), 0..5)),
    0..24,
  )
  .prop_flat_map(|rows| {
    let order: Vec<usize> = (0..rows.len()).collect();
    (Just(rows), Just(order).prop_shuffle())
  })
}

#[test]
fn scenario_out_of_order_with_null() {
  init_logging();
  let mut store = JaggedStore::create(4, 6).unwrap();
  store.set_row(2, &[4, 5]).unwrap();
  store.set_null(1).unwrap();
  store.set_row(3, &[6]).unwrap();
  store.set_row(0, &[1, 2, 3]).unwrap();
  store.normalize().unwrap();

  assert_eq!(store.values(), &[1, 2, 3, 4, 5, 6]);
  assert_eq!(store.encoded_offsets(), vec![0, -(3 + 1), 3, 5, 6]);
  assert_eq!(store.get_row(1).unwrap(), None);
  assert_eq!(store.get_row(0).unwrap(), Some(&[1, 2, 3][..]));
  assert_eq!(store.get_row(2).unwrap(), Some(&[4, 5][..]));
  assert_eq!(store.get_row(3).unwrap(), Some(&[6][..]));
}

#[test]
fn scenario_sampler_extremes() {
  assert_eq!(sample_row_counts(5, 3, 0, None).unwrap(), vec![0, 0, 0, 0, 0]);
  assert_eq!(sample_row_counts(5, 3, 15, None).unwrap(), vec![3, 3, 3, 3, 3]);
}

#[test]
fn scenario_not_found_and_incomplete() {
  let mut store = JaggedStore::<u16>::create(3, 3).unwrap();
  assert_eq!(store.get_row(2), Err(JaggedError::NotFound { row: 2 }));
  store.set_row(0, &[1]).unwrap();
  assert!(matches!(store.normalize(), Err(JaggedError::Incomplete { .. })));
}

#[test]
fn sampled_layout_feeds_store() {
  init_logging();
  let mut rng = StdRng::seed_from_u64(11);
  let (n_rows, n_cols, total) = (60, 12, 300);
  let counts = sample_row_counts(n_rows, n_cols, total, Some(5)).unwrap();
  let rows: Rows = counts
    .iter()
    .map(|&count| {
      if count == 0 && rng.gen_bool(0.5) {
        None
      } else {
        Some((0..count).map(|_| rng.r#gen::<u16>()).collect())
      }
    })
    .collect();
  let mut order: Vec<usize> = (0..n_rows).collect();
  order.shuffle(&mut rng);

  let csr: CompressedRows<u16> = insert_in_order(&rows, &order).into_compressed().unwrap();
  assert_eq!(csr.row_pointers(), counts_to_row_pointers(&counts));
  for (row, values) in csr.iter_rows() {
    assert_eq!(values.map(<[u16]>::to_vec), rows[row]);
  }
}

proptest! {
  #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

  #[test]
  fn round_trip_any_insertion_order((rows, order) in rows_and_order()) {
    let store = insert_in_order(&rows, &order);
    prop_assert!(store.is_complete());
    prop_assert_eq!(read_back(&store), rows);
  }

  #[test]
  fn normalize_preserves_rows((rows, order) in rows_and_order()) {
    let mut store = insert_in_order(&rows, &order);
    let before = read_back(&store);
    store.normalize().unwrap();
    prop_assert_eq!(read_back(&store), before);

    // normalized offsets follow the row lengths directly
    let mut expected = vec![0i64; rows.len() + 1];
    let mut ptr = 0i64;
    for (row, values) in rows.iter().enumerate() {
      match values {
        Some(values) => {
          expected[row] = ptr;
          ptr += values.len() as i64;
        }
        None => expected[row] = -(ptr + 1),
      }
    }
    expected[rows.len()] = ptr;
    prop_assert_eq!(store.encoded_offsets(), expected);

    let csr = store.to_compressed().unwrap();
    let decoded = CompressedRows::from_parts(csr.values().to_vec(), &csr.encoded_offsets()).unwrap();
    prop_assert_eq!(decoded, csr);
  }

  #[test]
  fn partial_fill_then_finalize((rows, order) in rows_and_order(), keep in 0usize..24) {
    let keep = keep.min(order.len());
    let mut store = insert_in_order(&rows, &order[..keep]);
    prop_assert_eq!(store.inserted_count(), keep);
    for &row in &order[keep..] {
      prop_assert_eq!(store.get_row(row), Err(JaggedError::NotFound { row }));
    }

    store.finalize().normalize().unwrap();
    for (row, state) in store.iter() {
      if order[..keep].contains(&row) {
        prop_assert_eq!(state.values().map(<[u16]>::to_vec), rows[row].clone());
      } else {
        prop_assert_eq!(state, RowState::Null);
      }
    }
  }

  #[test]
  fn double_insert_is_rejected((rows, order) in rows_and_order(), as_null in any::<bool>()) {
    prop_assume!(!rows.is_empty());
    let mut store = insert_in_order(&rows, &order);
    let row = order[0];
    let offsets = store.encoded_offsets();
    let err = if as_null { store.set_null(row) } else { store.set_row(row, &[1]) };
    prop_assert_eq!(err, Err(JaggedError::AlreadyInserted { row }));
    prop_assert_eq!(store.encoded_offsets(), offsets);
  }

  #[test]
  fn overflowing_payload_leaves_store_unchanged(
    first in prop::collection::vec(any::<u16>(), 0..8),
    second in prop::collection::vec(any::<u16>(), 0..8),
    room in 0usize..8,
  ) {
    let max_values = first.len() + room;
    let mut store = JaggedStore::create(2, max_values).unwrap();
    store.set_row(1, &first).unwrap();
    let offsets = store.encoded_offsets();

    let result = store.set_row(0, &second);
    if second.len() > room {
      prop_assert_eq!(
        result,
        Err(JaggedError::CapacityExceeded { requested: second.len(), available: room })
      );
      prop_assert_eq!(store.inserted_count(), 1);
      prop_assert_eq!(store.values(), &first[..]);
      prop_assert_eq!(store.encoded_offsets(), offsets);
    } else {
      prop_assert!(result.is_ok());
      prop_assert_eq!(store.total_len(), first.len() + second.len());
    }
  }

  #[test]
  fn sampler_sum_and_bounds(
    (n_rows, n_cols, target) in (0usize..60, 0usize..25)
      .prop_flat_map(|(r, c)| (Just(r), Just(c), 0..=r * c)),
    seed in any::<Option<u64>>(),
  ) {
    let counts = sample_row_counts(n_rows, n_cols, target, seed).unwrap();
    prop_assert_eq!(counts.len(), n_rows);
    prop_assert_eq!(counts.iter().sum::<usize>(), target);
    prop_assert!(counts.iter().all(|&c| c <= n_cols));
    prop_assert_eq!(*counts_to_row_pointers(&counts).last().unwrap(), target);
  }

  #[test]
  fn sampler_rejects_unreachable_totals(n_rows in 0usize..40, n_cols in 0usize..40, extra in 1usize..100) {
    let result = sample_row_counts(n_rows, n_cols, n_rows * n_cols + extra, None);
    let is_invalid = matches!(result, Err(JaggedError::InvalidArgument { .. }));
    prop_assert!(is_invalid);
  }
}
