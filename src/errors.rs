//! This module defines errors returned by the library.
use thiserror::Error;

/// Errors returned by jagged stores and the row-count sampler
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum JaggedError {
  /// returned if a size, row index, or sampler target is out of range, or if
  /// an externally supplied offset array is not a valid encoding
  #[error("InvalidArgument: {reason}")]
  InvalidArgument {
    /// What was wrong with the argument
    reason: String,
  },
  /// returned if a row index is written a second time
  #[error("AlreadyInserted: row {row}")]
  AlreadyInserted {
    /// The row that was already inserted
    row: usize,
  },
  /// returned if a payload does not fit into the remaining value buffer, or if
  /// every slot of the store is already taken
  #[error("CapacityExceeded: requested {requested}, available {available}")]
  CapacityExceeded {
    /// Number of values (or slots) the operation needed
    requested: usize,
    /// Number of values (or slots) still free
    available: usize,
  },
  /// returned when reading a row that was never inserted
  #[error("NotFound: row {row}")]
  NotFound {
    /// The row that was looked up
    row: usize,
  },
  /// returned when compaction is requested before every row is inserted
  #[error("Incomplete: {inserted} of {capacity} rows inserted")]
  Incomplete {
    /// Rows inserted so far
    inserted: usize,
    /// Rows the store was created for
    capacity: usize,
  },
  /// returned when encoding or decoding compressed rows fails
  #[error("Serialization: {reason}")]
  Serialization {
    /// The reason reported by the serializer
    reason: String,
  },
}

impl JaggedError {
  pub(crate) fn invalid(reason: impl Into<String>) -> Self {
    JaggedError::InvalidArgument {
      reason: reason.into(),
    }
  }
}
