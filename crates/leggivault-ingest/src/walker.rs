use std::path::Path;

use leggivault_core::{BlockOrigin, MetadataBlock, file_blocks};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::{IngestError, IngestFailure};

/// Raw blocks of a vault, ready for the pipeline.
#[derive(Debug, Default)]
pub struct VaultScan {
    /// Blocks in relative-path order, then block order within a file.
    pub blocks: Vec<MetadataBlock>,
    /// Unreadable files and unsplittable front matter.
    pub failures: Vec<IngestFailure>,
    /// Markdown files visited.
    pub files: usize,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Walk `root` for `*.md` files and split each one into metadata blocks.
///
/// Hidden files and directories are skipped. Block origins carry paths
/// relative to `root`. A missing root is an error; an unreadable file is
/// recorded as a failure and the walk goes on.
pub fn scan_vault(root: &Path) -> Result<VaultScan, IngestError> {
    if !root.is_dir() {
        return Err(IngestError::Read {
            message: format!("vault root is not a directory: {}", root.display()),
        });
    }

    let mut scan = VaultScan::default();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(root);
                let relative = path.strip_prefix(root).unwrap_or(path);
                scan.failures.push(IngestFailure {
                    origin: BlockOrigin::file(relative, 0),
                    error: IngestError::read(&err),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        scan.files += 1;

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                scan.failures.push(IngestFailure {
                    origin: BlockOrigin::file(relative, 0),
                    error: IngestError::read(&err),
                });
                continue;
            }
        };

        let before = scan.blocks.len();
        for block in file_blocks(relative, &text) {
            match block {
                Ok(block) => scan.blocks.push(block),
                Err((origin, err)) => scan.failures.push(IngestFailure {
                    origin,
                    error: err.into(),
                }),
            }
        }
        if scan.blocks.len() == before {
            debug!(path = %relative.display(), "no metadata blocks");
        }
    }

    // Walk order already follows file names; sort on the full relative path
    // so the result does not depend on directory nesting.
    scan.blocks.sort_by(|a, b| a.origin.cmp(&b.origin));

    info!(
        files = scan.files,
        blocks = scan.blocks.len(),
        failures = scan.failures.len(),
        "scanned vault"
    );
    Ok(scan)
}
