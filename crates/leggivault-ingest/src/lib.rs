//! Ingestion: walk a vault, parse its front matter in parallel, index the
//! accepted records, and resolve their cross-references.

mod error;
pub use error::{IngestError, IngestFailure};

pub mod pipeline;
pub use pipeline::{IngestReport, Pipeline};

pub mod walker;
pub use walker::{VaultScan, scan_vault};
