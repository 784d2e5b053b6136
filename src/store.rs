//! Random-order storage for a jagged array.
//!
//! A [`JaggedStore`] holds a fixed number of rows, each either null or a
//! variable-length run of values, in a single value buffer plus an offset
//! array, the same two-buffer layout as a compressed sparse row matrix.
//! Rows may be written in any order: slots are handed out in insertion order
//! and a row-to-slot map records where each row went. [`JaggedStore::normalize`]
//! rewrites the buffers into row order so the offsets can be indexed by row
//! directly.
use crate::{csr::CompressedRows, errors::JaggedError, offset::Offset, start_span};
use std::fmt;
use tracing::info;

/// What a row of a [`JaggedStore`] currently holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowState<'a, T> {
  /// The row has not been inserted yet
  Unwritten,
  /// The row was inserted as null
  Null,
  /// The row was inserted with these values (possibly none)
  Values(&'a [T]),
}

impl<'a, T> RowState<'a, T> {
  /// The row as returned by [`JaggedStore::get_row`]: `None` for a null row.
  pub fn values(self) -> Option<&'a [T]> {
    match self {
      RowState::Values(values) => Some(values),
      RowState::Unwritten | RowState::Null => None,
    }
  }
}

/// A pre-sized jagged array supporting O(1) inserts in arbitrary row order.
///
/// Every row is written exactly once, with [`JaggedStore::set_row`] or
/// [`JaggedStore::set_null`]. Payloads are appended to the value buffer in
/// insertion order; `offsets[k]` is the start of the `k`-th inserted row and
/// `offsets[k + 1]` its end.
#[derive(Clone)]
pub struct JaggedStore<T> {
  max_values: usize,
  values: Vec<T>,
  offsets: Vec<Offset>,
  row_to_slot: Vec<Option<usize>>,
  inserted: usize,
  normalized: bool,
}

// a vector of `len` copies of `fill`, or an error if it cannot be allocated
fn filled<E: Clone>(len: usize, fill: E) -> Result<Vec<E>, JaggedError> {
  let mut buf = Vec::new();
  buf
    .try_reserve_exact(len)
    .map_err(|e| JaggedError::invalid(format!("cannot allocate {len} row entries: {e}")))?;
  buf.resize(len, fill);
  Ok(buf)
}

impl<T> JaggedStore<T> {
  /// Create a store for `capacity` rows holding at most `max_values` values
  /// in total.
  pub fn create(capacity: usize, max_values: usize) -> Result<Self, JaggedError> {
    // null markers borrow the sign bit of the flat encoding
    if max_values as u128 > (i64::MAX - 1) as u128 {
      return Err(JaggedError::invalid(format!(
        "max_values {max_values} does not fit the signed offset encoding"
      )));
    }
    if capacity == usize::MAX {
      return Err(JaggedError::invalid("capacity must leave room for the final offset"));
    }
    Ok(Self {
      max_values,
      values: Vec::new(),
      offsets: filled(capacity + 1, Offset::Pointer(0))?,
      row_to_slot: filled(capacity, None)?,
      inserted: 0,
      normalized: false,
    })
  }

  /// Number of rows the store was created for.
  #[inline]
  pub fn capacity(&self) -> usize {
    self.row_to_slot.len()
  }

  /// Upper bound on the total number of stored values.
  #[inline]
  pub fn max_values(&self) -> usize {
    self.max_values
  }

  /// Number of rows inserted so far, which is also the next free slot.
  #[inline]
  pub fn inserted_count(&self) -> usize {
    self.inserted
  }

  /// Number of values written so far across all rows.
  #[inline]
  pub fn total_len(&self) -> usize {
    self.values.len()
  }

  /// Whether every row has been inserted.
  #[inline]
  pub fn is_complete(&self) -> bool {
    self.inserted == self.capacity()
  }

  /// Whether slots are known to be in row order.
  #[inline]
  pub fn is_normalized(&self) -> bool {
    self.normalized
  }

  /// Mark `row` as null.
  pub fn set_null(&mut self, row: usize) -> Result<(), JaggedError> {
    self.check_insert(row, 0)?;
    self.append_null(row);
    Ok(())
  }

  /// Look up `row`, failing only if the index is out of range.
  pub fn row_state(&self, row: usize) -> Result<RowState<'_, T>, JaggedError> {
    self.check_row(row)?;
    Ok(self.state_of(row))
  }

  /// The values of `row`, or `None` if it is null.
  ///
  /// O(1) before and after normalization: one lookup in the slot map and two
  /// offset reads.
  pub fn get_row(&self, row: usize) -> Result<Option<&[T]>, JaggedError> {
    match self.row_state(row)? {
      RowState::Unwritten => Err(JaggedError::NotFound { row }),
      RowState::Null => Ok(None),
      RowState::Values(values) => Ok(Some(values)),
    }
  }

  /// Iterate over `(row, state)` pairs in row order.
  pub fn iter(&self) -> impl Iterator<Item = (usize, RowState<'_, T>)> {
    (0..self.capacity()).map(move |row| (row, self.state_of(row)))
  }

  /// Mark every row that has not been inserted yet as null, in row order.
  pub fn finalize(&mut self) -> &mut Self {
    for row in 0..self.capacity() {
      if self.row_to_slot[row].is_none() {
        self.append_null(row);
      }
    }
    self
  }

  /// Flat signed offsets in slot order, null rows encoded as `-(p + 1)`.
  pub fn encoded_offsets(&self) -> Vec<i64> {
    self.offsets.iter().map(|o| o.encode()).collect()
  }

  /// Values written so far, in slot order.
  pub fn values(&self) -> &[T] {
    &self.values
  }

  fn check_row(&self, row: usize) -> Result<(), JaggedError> {
    if row >= self.capacity() {
      return Err(JaggedError::invalid(format!(
        "row {row} is out of range for capacity {}",
        self.capacity()
      )));
    }
    Ok(())
  }

  fn check_insert(&self, row: usize, len: usize) -> Result<(), JaggedError> {
    self.check_row(row)?;
    if self.row_to_slot[row].is_some() {
      return Err(JaggedError::AlreadyInserted { row });
    }
    if self.is_complete() {
      return Err(JaggedError::CapacityExceeded {
        requested: 1,
        available: 0,
      });
    }
    let available = self.max_values - self.values.len();
    if len > available {
      return Err(JaggedError::CapacityExceeded {
        requested: len,
        available,
      });
    }
    Ok(())
  }

  fn state_of(&self, row: usize) -> RowState<'_, T> {
    match self.row_to_slot[row] {
      None => RowState::Unwritten,
      Some(slot) => match self.slot_values(slot) {
        None => RowState::Null,
        Some(values) => RowState::Values(values),
      },
    }
  }

  fn slot_values(&self, slot: usize) -> Option<&[T]> {
    match self.offsets[slot] {
      Offset::NullAt(_) => None,
      Offset::Pointer(start) => {
        let end = self.offsets[slot + 1].pointer();
        Some(&self.values[start..end])
      }
    }
  }

  /// Claim the next slot for `row`; the caller has checked the preconditions.
  fn claim_slot(&mut self, row: usize) -> usize {
    let slot = self.inserted;
    self.row_to_slot[row] = Some(slot);
    self.inserted += 1;
    self.normalized = false;
    slot
  }

  fn append_null(&mut self, row: usize) {
    let slot = self.claim_slot(row);
    let ptr = self.offsets[slot].pointer();
    self.offsets[slot + 1] = Offset::Pointer(ptr);
    self.offsets[slot] = Offset::NullAt(ptr);
  }

  fn slot_map_is_identity(&self) -> bool {
    self
      .row_to_slot
      .iter()
      .enumerate()
      .all(|(row, slot)| *slot == Some(row))
  }

  /// Build an already normalized store from buffers in row order.
  pub(crate) fn from_normalized_parts(values: Vec<T>, offsets: Vec<Offset>) -> Self {
    let capacity = offsets.len() - 1;
    Self {
      max_values: values.len(),
      values,
      offsets,
      row_to_slot: (0..capacity).map(Some).collect(),
      inserted: capacity,
      normalized: true,
    }
  }

  fn into_normalized_parts(self) -> (Vec<T>, Vec<Offset>) {
    (self.values, self.offsets)
  }
}

impl<T: Clone> JaggedStore<T> {
  /// Build a complete store holding `rows` in row order, `None` being a null
  /// row. The value buffer is sized to the rows' total length.
  pub fn from_rows(rows: &[Option<Vec<T>>]) -> Result<Self, JaggedError> {
    let max_values = rows.iter().flatten().map(Vec::len).sum();
    let mut store = Self::create(rows.len(), max_values)?;
    for (row, values) in rows.iter().enumerate() {
      match values {
        Some(values) => store.set_row(row, values)?,
        None => store.set_null(row)?,
      }
    }
    Ok(store)
  }

  /// Store `payload` as the values of `row`.
  pub fn set_row(&mut self, row: usize, payload: &[T]) -> Result<(), JaggedError> {
    self.check_insert(row, payload.len())?;
    self.append_values(row, payload);
    Ok(())
  }

  fn append_values(&mut self, row: usize, payload: &[T]) {
    let slot = self.claim_slot(row);
    let ptr = self.offsets[slot].pointer();
    self.values.extend_from_slice(payload);
    self.offsets[slot + 1] = Offset::Pointer(ptr + payload.len());
  }

  /// Snapshot of all rows in row order. The outer `None` is an unwritten row,
  /// the inner `None` a null row.
  pub fn to_rows(&self) -> Vec<Option<Option<Vec<T>>>> {
    self
      .iter()
      .map(|(_, state)| match state {
        RowState::Unwritten => None,
        RowState::Null => Some(None),
        RowState::Values(values) => Some(Some(values.to_vec())),
      })
      .collect()
  }

  /// Rewrite the buffers into row order, so that slot `k` holds row `k`.
  ///
  /// Every row is read once through the slot map and appended once to fresh
  /// buffers, so the pass is O(capacity + total_len). Requires every row to
  /// be inserted.
  pub fn normalize(&mut self) -> Result<(), JaggedError> {
    if !self.is_complete() {
      return Err(JaggedError::Incomplete {
        inserted: self.inserted,
        capacity: self.capacity(),
      });
    }
    if self.normalized || self.slot_map_is_identity() {
      self.normalized = true;
      return Ok(());
    }

    let (span, t) = start_span!("normalize", rows = self.capacity());
    let _enter = span.enter();

    let mut target = Self::create(self.capacity(), self.values.len())?;
    target.values.reserve_exact(self.values.len());
    for row in 0..self.capacity() {
      match self.state_of(row) {
        RowState::Values(values) => target.append_values(row, values),
        RowState::Null => target.append_null(row),
        RowState::Unwritten => return Err(JaggedError::NotFound { row }),
      }
    }
    target.normalized = true;
    *self = target;

    info!(
      elapsed_ms = %t.elapsed().as_millis(),
      rows = self.capacity(),
      values = self.values.len(),
      "normalize"
    );
    Ok(())
  }

  /// Export the row-ordered compressed form, normalizing a copy if needed.
  pub fn to_compressed(&self) -> Result<CompressedRows<T>, JaggedError> {
    self.clone().into_compressed()
  }

  /// Normalize and export the compressed form without copying the buffers.
  pub fn into_compressed(mut self) -> Result<CompressedRows<T>, JaggedError> {
    self.normalize()?;
    let (values, offsets) = self.into_normalized_parts();
    Ok(CompressedRows::from_normalized(values, offsets))
  }
}

impl<T> From<CompressedRows<T>> for JaggedStore<T> {
  fn from(rows: CompressedRows<T>) -> Self {
    let (values, offsets) = rows.into_parts();
    Self::from_normalized_parts(values, offsets)
  }
}

impl<T: fmt::Debug> fmt::Debug for JaggedStore<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("JaggedStore")
      .field("values", &self.values)
      .field("offsets", &self.encoded_offsets())
      .field("row_to_slot", &self.row_to_slot)
      .field("normalized", &self.normalized)
      .finish()
  }
}
