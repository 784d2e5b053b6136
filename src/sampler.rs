//! Row counts for synthetic compressed-row layouts.
//!
//! [`sample_row_counts`] returns how many entries each row of an
//! `n_rows x n_cols` CSR layout holds, hitting an exact total while spreading
//! the counts over as many distinct values as possible. Viewed as a histogram
//! over row indices the result has up to four regions:
//!
//! ```text
//!   ^ count
//!   |   *   *   *   *   ###
//!   |  **  **  **  **+ o###
//!   | *** *** *** ***+oo###
//!   | @@@@@@@@@@@@@@@@@@###
//!   | @@@@@@@@@@@@@@@@@@###      --> row index
//! ```
//!
//! `#` is the right rectangle of full rows, `@` the lower rectangle (a common
//! baseline), `*` a run of complete sawteeth, `o` one incomplete sawtooth and
//! `+` the correction on its first row. The lower rectangle and the complete
//! sawteeth never appear together.
use crate::{
  errors::JaggedError,
  math::{Math, bisect, sawtooth_total},
};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use tracing::debug;

/// Row-count sampler for a fixed `n_rows x n_cols` shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowCountSampler {
  n_rows: usize,
  n_cols: usize,
}

impl RowCountSampler {
  /// Sampler for `n_rows` rows of at most `n_cols` entries each.
  pub fn new(n_rows: usize, n_cols: usize) -> Self {
    Self { n_rows, n_cols }
  }

  /// Largest total the shape can hold.
  pub fn max_total(&self) -> u128 {
    self.n_rows as u128 * self.n_cols as u128
  }

  /// Per-row counts summing exactly to `target_total`, each in `0..=n_cols`.
  ///
  /// The histogram shape depends only on the sizes. With a `seed` the rows
  /// are shuffled, which keeps the multiset of counts.
  #[tracing::instrument(level = "debug", skip(self))]
  pub fn sample(&self, target_total: usize, seed: Option<u64>) -> Result<Vec<usize>, JaggedError> {
    if target_total as u128 > self.max_total() {
      return Err(JaggedError::invalid(format!(
        "target_total {target_total} exceeds {} rows x {} columns",
        self.n_rows, self.n_cols
      )));
    }
    let mut counts = self.histogram(target_total as u128);
    if let Some(seed) = seed {
      counts.shuffle(&mut StdRng::seed_from_u64(seed));
    }
    Ok(counts)
  }

  fn histogram(&self, target: u128) -> Vec<usize> {
    let mut counts = vec![0usize; self.n_rows];
    if self.n_rows == 0 || self.n_cols == 0 {
      return counts;
    }
    let n_rows = self.n_rows as u128;
    let n_cols = self.n_cols as u128;

    // Right rectangle: widest suffix of full rows that still leaves the
    // remaining rows enough room for their sawteeth.
    let sawteeth = sawtooth_total(n_rows, n_cols);
    let (width, sawteeth) = if sawteeth == 0 || target < sawteeth.max(n_cols) {
      (0, sawteeth)
    } else {
      bisect(0, n_rows - 1, |width| {
        let rest = sawtooth_total(n_rows - width, n_cols);
        (rest == 0 || width * n_cols + rest.max(n_cols) > target).then_some(rest)
      })
    };
    let rows = n_rows - width;
    let residual = target - width * n_cols;
    counts[rows as usize..].fill(self.n_cols);

    // Lower rectangle: highest baseline under the remaining rows.
    let (height, sawteeth) = if sawteeth == 0 || residual < sawteeth.max(rows) {
      (0, sawteeth)
    } else {
      bisect(0, n_cols - 1, |height| {
        let rest = sawtooth_total(rows, n_cols - height);
        (rest == 0 || height * rows + rest.max(rows) > residual).then_some(rest)
      })
    };
    let residual = residual - height * rows;
    counts[..rows as usize].fill(height as usize);

    if sawteeth == 0 {
      counts[0] += residual as usize;
      debug!(
        right_width = %width,
        lower_height = %height,
        residual = %residual,
        "row count histogram without sawteeth"
      );
      return counts;
    }

    // Sawteeth 0, 1, ..., n_cols - height: complete teeth first, then one
    // partial tooth whose first row absorbs the leftover.
    let period = n_cols - height + 1;
    let tooth = (n_cols - height).triangular();
    let full = (residual / tooth * period) as usize;
    let partial = residual % tooth;
    let peak = partial.triangular_root();
    let correction = partial - peak.triangular();

    let period = period as usize;
    for (i, count) in counts[..full].iter_mut().enumerate() {
      *count += i % period;
    }
    if peak > 0 {
      for (i, count) in counts[full..=full + peak as usize].iter_mut().enumerate() {
        *count += i;
      }
      counts[full] += correction as usize;
    }

    debug!(
      right_width = %width,
      lower_height = %height,
      sawtooth_rows = full,
      partial_peak = %peak,
      correction = %correction,
      "row count histogram"
    );
    counts
  }
}

/// Per-row counts for an `n_rows x n_cols` layout holding exactly
/// `target_total` entries. See [`RowCountSampler::sample`].
pub fn sample_row_counts(
  n_rows: usize,
  n_cols: usize,
  target_total: usize,
  seed: Option<u64>,
) -> Result<Vec<usize>, JaggedError> {
  RowCountSampler::new(n_rows, n_cols).sample(target_total, seed)
}

/// Cumulative row pointers (`[0, c0, c0 + c1, ...]`) for a list of counts,
/// i.e. the CSR row index array of the sampled layout.
pub fn counts_to_row_pointers(counts: &[usize]) -> Vec<usize> {
  std::iter::once(0)
    .chain(counts.iter().scan(0, |acc, &count| {
      *acc += count;
      Some(*acc)
    }))
    .collect()
}
