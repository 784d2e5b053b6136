//! A jagged store that several threads can fill at once.
//!
//! Inserting touches the slot counter, the row-to-slot map and the tail of the
//! value buffer together, so all of them sit behind one mutex.
use crate::{errors::JaggedError, store::JaggedStore};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Mutex-guarded [`JaggedStore`] with `&self` insertion.
#[derive(Debug)]
pub struct SharedJaggedStore<T> {
  inner: Mutex<JaggedStore<T>>,
}

impl<T> SharedJaggedStore<T> {
  /// See [`JaggedStore::create`].
  pub fn create(capacity: usize, max_values: usize) -> Result<Self, JaggedError> {
    Ok(Self::from(JaggedStore::create(capacity, max_values)?))
  }

  // store operations check before they mutate, so a poisoned lock still
  // guards a consistent store
  fn lock(&self) -> MutexGuard<'_, JaggedStore<T>> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// See [`JaggedStore::set_null`].
  pub fn set_null(&self, row: usize) -> Result<(), JaggedError> {
    self.lock().set_null(row)
  }

  /// Number of rows inserted so far.
  pub fn inserted_count(&self) -> usize {
    self.lock().inserted_count()
  }

  /// Give back the store once all writers are done.
  pub fn into_inner(self) -> JaggedStore<T> {
    self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
  }
}

impl<T: Clone> SharedJaggedStore<T> {
  /// See [`JaggedStore::set_row`].
  pub fn set_row(&self, row: usize, payload: &[T]) -> Result<(), JaggedError> {
    self.lock().set_row(row, payload)
  }

  /// A copy of the values of `row`, `None` if it is null. See [`JaggedStore::get_row`].
  pub fn row(&self, row: usize) -> Result<Option<Vec<T>>, JaggedError> {
    Ok(self.lock().get_row(row)?.map(<[T]>::to_vec))
  }
}

impl<T> From<JaggedStore<T>> for SharedJaggedStore<T> {
  fn from(store: JaggedStore<T>) -> Self {
    Self {
      inner: Mutex::new(store),
    }
  }
}
