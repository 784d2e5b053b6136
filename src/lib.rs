//! This library implements compressed storage for jagged arrays.
//! Rows of variable length, or null rows, can be inserted in any order with
//! O(1) work each and later compacted into a row-ordered CSR layout.
//! A row-count sampler generates structurally diverse CSR shapes for tests.
#![deny(
  unused,
  future_incompatible,
  nonstandard_style,
  rust_2018_idioms,
  missing_docs
)]
#![forbid(unsafe_code)]

// private modules
mod math;

// public modules
pub mod builder;
pub mod csr;
pub mod errors;
pub mod offset;
pub mod sampler;
pub mod shared;
pub mod store;

/// Start an info span + timer, return `(Span, Instant)`.
macro_rules! start_span {
  ($name:expr $(, $($fmt:tt)+)?) => {{
    let span = tracing::info_span!($name $(, $($fmt)+)?);
    (span, std::time::Instant::now())
  }};
}
pub(crate) use start_span;

pub use builder::{BuildConfig, build_store};
pub use csr::CompressedRows;
pub use errors::JaggedError;
pub use offset::Offset;
pub use sampler::{RowCountSampler, counts_to_row_pointers, sample_row_counts};
pub use shared::SharedJaggedStore;
pub use store::{JaggedStore, RowState};
