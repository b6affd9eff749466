//! Batch ingestion into an [`IndexStore`].
//!
//! Parsing is pure and runs on a rayon pool. Insertion is sequential and in
//! input order, so which of two duplicate blocks wins never depends on
//! thread scheduling. Links are resolved once, after the last insert.

use std::path::Path;
use std::sync::Arc;

use leggivault_core::{ConsistencyWarning, MetadataBlock, ParsedRecord, parse_block};
use leggivault_store::IndexStore;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::walker::scan_vault;
use crate::{IngestError, IngestFailure};

/// Outcome of one ingest batch. Never an error as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Markdown files visited (directory ingests only).
    pub files: usize,
    /// Blocks handed to the parser.
    pub blocks: usize,
    /// Codici inserted, in input order.
    pub inserted: Vec<String>,
    pub failures: Vec<IngestFailure>,
    pub warnings: Vec<ConsistencyWarning>,
    /// Matched links across the whole store after this batch.
    pub matched: usize,
    /// Dangling references across the whole store after this batch.
    pub dangling: usize,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parse-then-insert ingestion with an optional dedicated thread pool.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Pipeline {
    /// Pipeline running on rayon's global pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline with its own pool of `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("leggivault-parse-{i}"))
            .build()?;
        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }

    fn parse_all(&self, blocks: &[MetadataBlock]) -> Vec<Result<ParsedRecord, IngestError>> {
        let parse = || {
            blocks
                .par_iter()
                .map(|block| parse_block(block).map_err(IngestError::from))
                .collect::<Vec<_>>()
        };
        match &self.pool {
            Some(pool) => pool.install(parse),
            None => parse(),
        }
    }

    /// Parse, insert and resolve one batch of blocks.
    pub fn ingest(&self, blocks: &[MetadataBlock], store: &mut IndexStore) -> IngestReport {
        let mut report = IngestReport {
            blocks: blocks.len(),
            ..Default::default()
        };

        for (block, parsed) in blocks.iter().zip(self.parse_all(blocks)) {
            let outcome = parsed.and_then(|ParsedRecord { record, warnings }| {
                let codice = record.codice_redazionale.clone();
                store.insert(record)?;
                Ok((codice, warnings))
            });
            match outcome {
                Ok((codice, warnings)) => {
                    for warning in &warnings {
                        warn!(origin = %block.origin, "{warning}");
                    }
                    report.warnings.extend(warnings);
                    report.inserted.push(codice);
                }
                Err(error) => {
                    warn!(origin = %block.origin, error = %error, "rejected block");
                    report.failures.push(IngestFailure {
                        origin: block.origin.clone(),
                        error,
                    });
                }
            }
        }

        let links = store.refresh_links();
        report.matched = links.matched_count();
        report.dangling = links.dangling_count();

        info!(
            inserted = report.inserted.len(),
            failed = report.failures.len(),
            warnings = report.warnings.len(),
            dangling = report.dangling,
            "ingest complete"
        );
        report
    }

    /// Scan a vault directory and ingest everything found. Files that cannot
    /// be read or split are reported alongside parse and insert failures.
    pub fn ingest_dir(
        &self,
        root: &Path,
        store: &mut IndexStore,
    ) -> Result<IngestReport, IngestError> {
        let scan = scan_vault(root)?;
        let mut report = self.ingest(&scan.blocks, store);
        report.files = scan.files;
        let mut failures = scan.failures;
        failures.append(&mut report.failures);
        report.failures = failures;
        Ok(report)
    }
}
