//! Synthetic jagged stores for exercising compressed-row consumers.
//!
//! [`build_store`] samples a row-count histogram, fills each row with distinct
//! sorted column indices, and inserts the rows in a shuffled order, so the
//! result looks like the column-index array of a random CSR matrix built out
//! of order.
use crate::{errors::JaggedError, sampler::RowCountSampler, start_span, store::JaggedStore};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use rayon::prelude::*;
use tracing::info;

/// Shape and randomness of a synthetic store.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildConfig {
  /// Number of rows
  pub n_rows: usize,
  /// Upper bound on the entries of one row; column indices are drawn from `0..n_cols`
  pub n_cols: usize,
  /// Exact number of entries across all rows
  pub target_total: usize,
  /// Probability that a row with no entries is stored as null instead of empty
  pub null_probability: f64,
  /// Seed for the histogram permutation, the row payloads and the insertion order
  pub seed: u64,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      n_rows: 16,
      n_cols: 8,
      target_total: 48,
      null_probability: 0.5,
      seed: 0,
    }
  }
}

impl BuildConfig {
  /// A config for the given shape with the default null probability and seed.
  pub fn new(n_rows: usize, n_cols: usize, target_total: usize) -> Self {
    Self {
      n_rows,
      n_cols,
      target_total,
      ..Self::default()
    }
  }

  /// Replace the seed.
  pub fn with_seed(mut self, seed: u64) -> Self {
    self.seed = seed;
    self
  }

  /// Replace the null probability.
  pub fn with_null_probability(mut self, null_probability: f64) -> Self {
    self.null_probability = null_probability;
    self
  }

  /// Check the parameters that the sampler does not check itself.
  pub fn validate(&self) -> Result<(), JaggedError> {
    if !(0.0..=1.0).contains(&self.null_probability) {
      return Err(JaggedError::invalid(format!(
        "null_probability {} is not in [0, 1]",
        self.null_probability
      )));
    }
    Ok(())
  }
}

// output `index + 1` of a splitmix64 generator started at `seed`
fn row_seed(seed: u64, index: usize) -> u64 {
  let step = (index as u64).wrapping_add(1);
  let mut z = seed.wrapping_add(step.wrapping_mul(0x9E37_79B9_7F4A_7C15));
  z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
  z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
  z ^ (z >> 31)
}

// rows take streams 0..n_rows, the insertion order the next one
fn insertion_order(config: &BuildConfig) -> Vec<usize> {
  let mut order: Vec<usize> = (0..config.n_rows).collect();
  order.shuffle(&mut StdRng::seed_from_u64(row_seed(config.seed, config.n_rows)));
  order
}

fn row_payload(config: &BuildConfig, row: usize, count: usize) -> Option<Vec<usize>> {
  let mut rng = StdRng::seed_from_u64(row_seed(config.seed, row));
  if count == 0 {
    return (!rng.gen_bool(config.null_probability)).then(Vec::new);
  }
  let mut columns = rand::seq::index::sample(&mut rng, config.n_cols, count).into_vec();
  columns.sort_unstable();
  Some(columns)
}

/// Build a complete, not yet normalized store described by `config`.
///
/// Row payloads depend only on the seed and the row index, so the result is
/// the same however rayon schedules the generation.
pub fn build_store(config: &BuildConfig) -> Result<JaggedStore<usize>, JaggedError> {
  config.validate()?;
  let (span, t) = start_span!("build_store", rows = config.n_rows, total = config.target_total);
  let _enter = span.enter();

  let counts = RowCountSampler::new(config.n_rows, config.n_cols)
    .sample(config.target_total, Some(config.seed))?;

  let rows: Vec<Option<Vec<usize>>> = counts
    .par_iter()
    .enumerate()
    .map(|(row, &count)| row_payload(config, row, count))
    .collect();

  let mut store = JaggedStore::create(config.n_rows, config.target_total)?;
  for row in insertion_order(config) {
    match &rows[row] {
      Some(columns) => store.set_row(row, columns)?,
      None => store.set_null(row)?,
    }
  }

  info!(
    elapsed_ms = %t.elapsed().as_millis(),
    rows = config.n_rows,
    values = store.total_len(),
    "build_store"
  );
  Ok(store)
}
