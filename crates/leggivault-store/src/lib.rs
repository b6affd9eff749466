//! Storage layer: in-memory index (hot path), cross-reference resolution, Parquet export.

mod error;
pub use error::{DuplicateKeyError, StoreError};

mod index;
pub use index::IndexStore;

pub mod resolve;
pub use resolve::{DanglingReferenceNotice, RecordLinks, Resolution, resolve};

pub mod export;
pub use export::edges_to_batch;
#[cfg(feature = "parquet")]
pub use export::{read_parquet, write_parquet};
