//! Integer helpers for the row-count histogram.
//!
//! All quantities are carried as `u128` so that products of two `usize`
//! sizes never overflow.

pub(crate) trait Math {
  /// `self * (self + 1) / 2`
  fn triangular(self) -> u128;

  /// Largest `k` with `k.triangular() <= self`.
  fn triangular_root(self) -> u128;
}

impl Math for u128 {
  fn triangular(self) -> u128 {
    // one of the two factors is even
    if self % 2 == 0 {
      (self / 2) * (self + 1)
    } else {
      self * (self.div_ceil(2))
    }
  }

  fn triangular_root(self) -> u128 {
    let mut k = (2 * self).isqrt();
    if k.triangular() > self {
      k -= 1;
    }
    k
  }
}

/// Number of counts held by `width` consecutive rows filled with the
/// repeating ascending sawtooth `0, 1, ..., height, 0, 1, ...`.
///
/// Non-decreasing in both `width` and `height`; the bisections in the
/// sampler depend on that.
pub(crate) fn sawtooth_total(width: u128, height: u128) -> u128 {
  let period = height + 1;
  let partial = width % period;
  height.triangular() * (width / period) + partial.saturating_sub(1).triangular()
}

/// Integer bisection over `(lo, hi]`.
///
/// Returns the smallest candidate accepted by `accept` together with the
/// state it reported. If no candidate is accepted, `hi` is returned with state 0.
/// `accept` must be monotone: once a value is accepted, every larger value is.
pub(crate) fn bisect<F>(mut lo: u128, mut hi: u128, mut accept: F) -> (u128, u128)
where
  F: FnMut(u128) -> Option<u128>,
{
  let mut state = 0;
  while hi - lo > 1 {
    let mid = lo + (hi - lo) / 2;
    match accept(mid) {
      Some(s) => {
        hi = mid;
        state = s;
      }
      None => lo = mid,
    }
  }
  (hi, state)
}
