//! Compressed Sparse Row (CSR) export of a normalized jagged store.
//!
//! A normalized store is the classic two-array CSR layout: `values` holds all
//! rows back-to-back and `offsets[i]..offsets[i+1]` is the range of row `i`.
//! The offsets additionally carry null markers (see [`Offset`]); consumers
//! that only need plain row pointers can use [`CompressedRows::row_pointers`].
use crate::{errors::JaggedError, offset::Offset};
use bincode::Options;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use itertools::Itertools;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{
  io::{self, Read, Write},
  ops::Index,
};

/// Row-ordered compressed storage for a jagged array with null rows.
///
/// Stores N rows in two contiguous arrays:
/// - `offsets[i]..offsets[i+1]` (as pointers) is the value range of row i
/// - `values` contains all elements back-to-back
///
/// Deserializing from any serde format runs the same offset validation as
/// [`CompressedRows::from_parts`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedRows<T>")]
pub struct CompressedRows<T> {
  offsets: Vec<Offset>,
  values: Vec<T>,
}

// wire shape of `CompressedRows` before validation
#[derive(Deserialize)]
struct UncheckedRows<T> {
  offsets: Vec<Offset>,
  values: Vec<T>,
}

impl<T> TryFrom<UncheckedRows<T>> for CompressedRows<T> {
  type Error = JaggedError;

  fn try_from(rows: UncheckedRows<T>) -> Result<Self, Self::Error> {
    validate_offsets(&rows.offsets, rows.values.len())?;
    Ok(Self {
      offsets: rows.offsets,
      values: rows.values,
    })
  }
}

fn bincode_options() -> impl Options {
  bincode::DefaultOptions::new()
    .with_little_endian()
    .with_fixint_encoding()
}

impl<T> CompressedRows<T> {
  pub(crate) fn from_normalized(values: Vec<T>, offsets: Vec<Offset>) -> Self {
    Self { offsets, values }
  }

  pub(crate) fn into_parts(self) -> (Vec<T>, Vec<Offset>) {
    (self.values, self.offsets)
  }

  /// Decode a flat value buffer and signed offset array.
  ///
  /// The offsets must hold at least one entry, start at pointer 0, never
  /// decrease, give null rows no values, and end at `values.len()` with a
  /// non-null entry.
  pub fn from_parts(values: Vec<T>, encoded: &[i64]) -> Result<Self, JaggedError> {
    let offsets: Vec<Offset> = encoded.iter().copied().map(Offset::decode).collect();
    validate_offsets(&offsets, values.len())?;
    Ok(Self { offsets, values })
  }

  /// Number of rows.
  #[inline]
  pub fn num_rows(&self) -> usize {
    self.offsets.len() - 1
  }

  /// All values, in row order.
  pub fn values(&self) -> &[T] {
    &self.values
  }

  /// Row boundaries, one more than the number of rows.
  pub fn offsets(&self) -> &[Offset] {
    &self.offsets
  }

  /// Flat signed offsets with null rows encoded as `-(p + 1)`.
  pub fn encoded_offsets(&self) -> Vec<i64> {
    self.offsets.iter().map(|o| o.encode()).collect()
  }

  /// Plain CSR row pointers: null rows become empty rows.
  pub fn row_pointers(&self) -> Vec<usize> {
    self.offsets.iter().map(|o| o.pointer()).collect()
  }

  /// Whether row `i` is null. Panics if `i` is out of range.
  #[inline]
  pub fn is_null(&self, i: usize) -> bool {
    assert!(i < self.num_rows(), "row {i} out of range");
    self.offsets[i].is_null()
  }

  /// The values of row `i`, or `None` for a null row. Panics if `i` is out of range.
  pub fn get(&self, i: usize) -> Option<&[T]> {
    if self.is_null(i) { None } else { Some(&self[i]) }
  }

  /// Iterate over all rows as (index, values) pairs.
  pub fn iter_rows(&self) -> impl Iterator<Item = (usize, Option<&[T]>)> {
    (0..self.num_rows()).map(move |i| (i, self.get(i)))
  }

  /// Write the flat signed offsets as a little-endian `u64` length followed
  /// by that many little-endian `i64` entries.
  pub fn write_offsets<W: Write>(&self, sink: &mut W) -> io::Result<()> {
    sink.write_u64::<LittleEndian>(self.offsets.len() as u64)?;
    for offset in &self.offsets {
      sink.write_i64::<LittleEndian>(offset.encode())?;
    }
    Ok(())
  }
}

impl<T: Serialize> CompressedRows<T> {
  /// Serialize with bincode (little-endian, fixed-width integers).
  pub fn to_bytes(&self) -> Result<Vec<u8>, JaggedError> {
    bincode_options()
      .serialize(self)
      .map_err(|e| JaggedError::Serialization {
        reason: e.to_string(),
      })
  }
}

impl<T: DeserializeOwned> CompressedRows<T> {
  /// Inverse of [`CompressedRows::to_bytes`]. Malformed offsets are
  /// reported as [`JaggedError::Serialization`].
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, JaggedError> {
    bincode_options()
      .deserialize(bytes)
      .map_err(|e| JaggedError::Serialization {
        reason: e.to_string(),
      })
  }
}

/// Read offsets written by [`CompressedRows::write_offsets`].
pub fn read_offsets<R: Read>(source: &mut R) -> io::Result<Vec<i64>> {
  let len = source.read_u64::<LittleEndian>()?;
  (0..len)
    .map(|_| source.read_i64::<LittleEndian>())
    .collect()
}

fn validate_offsets(offsets: &[Offset], num_values: usize) -> Result<(), JaggedError> {
  let (Some(first), Some(last)) = (offsets.first(), offsets.last()) else {
    return Err(JaggedError::invalid("offsets must hold at least one entry"));
  };
  if first.pointer() != 0 {
    return Err(JaggedError::invalid(format!(
      "first offset points at {}, expected 0",
      first.pointer()
    )));
  }
  if last.is_null() || last.pointer() != num_values {
    return Err(JaggedError::invalid(format!(
      "final offset {} does not close {num_values} values",
      last.encode()
    )));
  }
  if let Some((i, _)) = offsets
    .iter()
    .tuple_windows()
    .enumerate()
    .find(|(_, (start, end))| {
      start.pointer() > end.pointer() || (start.is_null() && start.pointer() != end.pointer())
    })
  {
    return Err(JaggedError::invalid(format!("row {i} has an invalid range")));
  }
  Ok(())
}

impl<T> Index<usize> for CompressedRows<T> {
  type Output = [T];

  /// Null rows index as empty slices.
  #[inline]
  fn index(&self, i: usize) -> &Self::Output {
    let start = self.offsets[i].pointer();
    let end = self.offsets[i + 1].pointer();
    &self.values[start..end]
  }
}
