//! Slot boundaries of a jagged store.
//!
//! In memory every slot boundary is an [`Offset`]. At the external boundary
//! the same information is a single signed integer: a non-negative value is a
//! plain pointer into the value buffer, while `-(p + 1)` marks a null row whose
//! running pointer is `p`.
use serde::{Deserialize, Serialize};

/// Start boundary of one slot in a compressed offset array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Offset {
  /// The row stored at this slot starts at the given value position
  Pointer(usize),
  /// The row stored at this slot is null; the running value position is carried
  NullAt(usize),
}

impl Offset {
  /// The value-buffer position carried by this boundary, null or not.
  #[inline]
  pub fn pointer(self) -> usize {
    match self {
      Offset::Pointer(p) | Offset::NullAt(p) => p,
    }
  }

  /// Whether the slot starting at this boundary holds a null row.
  #[inline]
  pub fn is_null(self) -> bool {
    matches!(self, Offset::NullAt(_))
  }

  /// Flat signed encoding. Positions must not exceed `i64::MAX - 1`, which
  /// stores enforce when they are created.
  #[inline]
  pub fn encode(self) -> i64 {
    match self {
      Offset::Pointer(p) => p as i64,
      Offset::NullAt(p) => -(p as i64) - 1,
    }
  }

  /// Inverse of [`Offset::encode`].
  #[inline]
  pub fn decode(raw: i64) -> Self {
    if raw >= 0 {
      Offset::Pointer(raw as usize)
    } else {
      Offset::NullAt((-(raw + 1)) as usize)
    }
  }
}

impl From<Offset> for i64 {
  fn from(offset: Offset) -> Self {
    offset.encode()
  }
}

impl From<i64> for Offset {
  fn from(raw: i64) -> Self {
    Offset::decode(raw)
  }
}
