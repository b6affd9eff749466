//! Front-matter splitting for vault Markdown files.
//!
//! A vault file starts with one or more YAML blocks delimited by `---`
//! lines, followed by a free-text body the index never looks at:
//!
//! ```text
//! ---
//! codice-redazionale: 26G00017
//! tipo: LEGGE
//! ---
//! (body)
//! ```
//!
//! A new block may only open right after a closing delimiter (blank lines
//! allowed) and only if a closing delimiter follows; the first other line
//! starts the body. Some vault files carry
//! two blocks back to back, and each one is treated as an independent record.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::ValidationError;

/// Where a metadata block came from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BlockOrigin {
    /// Path relative to the vault root, when the block came from a file.
    pub path: Option<PathBuf>,
    /// Position of the block within its file, starting at 0.
    pub index: usize,
}

impl BlockOrigin {
    pub fn file(path: impl Into<PathBuf>, index: usize) -> Self {
        Self {
            path: Some(path.into()),
            index,
        }
    }

    pub fn inline(index: usize) -> Self {
        Self { path: None, index }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl fmt::Display for BlockOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}#{}", path.display(), self.index),
            None => write!(f, "<inline>#{}", self.index),
        }
    }
}

/// One raw front-matter block, as handed to the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataBlock {
    pub origin: BlockOrigin,
    pub yaml: String,
}

impl MetadataBlock {
    pub fn new(origin: BlockOrigin, yaml: impl Into<String>) -> Self {
        Self {
            origin,
            yaml: yaml.into(),
        }
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == "---"
}

/// Split a vault file into its front-matter blocks.
///
/// Returns one entry per block in file order. Empty blocks are skipped. A
/// file without front matter yields no entries. An unterminated first block
/// yields [`ValidationError::Unterminated`]; a `---` after a closed block
/// with no closing delimiter below it is a rule in the body, not a block.
pub fn split_blocks(text: &str) -> Vec<Result<String, ValidationError>> {
    let text = text.trim_start_matches('\u{feff}');
    let lines: Vec<&str> = text.lines().collect();
    let mut blocks = Vec::new();
    let mut pos = 0;
    let mut first = true;

    loop {
        let Some(open) = (pos..lines.len()).find(|&i| !lines[i].trim().is_empty()) else {
            break;
        };
        if !is_delimiter(lines[open]) {
            break;
        }
        let Some(close) = (open + 1..lines.len()).find(|&i| is_delimiter(lines[i])) else {
            if first {
                blocks.push(Err(ValidationError::Unterminated));
            } else {
                debug!(line = open + 1, "unclosed `---` after front matter, treating as body");
            }
            break;
        };
        first = false;
        pos = close + 1;

        let content = &lines[open + 1..close];
        if content.iter().all(|line| line.trim().is_empty()) {
            debug!("skipping empty front matter block");
            continue;
        }
        blocks.push(Ok(content.join("\n")));
    }

    blocks
}

/// Split a file and tag each block with its origin.
pub fn file_blocks(
    path: &Path,
    text: &str,
) -> Vec<Result<MetadataBlock, (BlockOrigin, ValidationError)>> {
    split_blocks(text)
        .into_iter()
        .enumerate()
        .map(|(index, block)| {
            let origin = BlockOrigin::file(path, index);
            match block {
                Ok(yaml) => Ok(MetadataBlock::new(origin, yaml)),
                Err(err) => Err((origin, err)),
            }
        })
        .collect()
}
