//! Arrow and Parquet export of the `legislation` and `law_edges` tables.

use std::sync::Arc;

use arrow::array::StringArray;
use arrow::record_batch::RecordBatch;
use leggivault_core::vault;

use crate::{Resolution, StoreError};

/// Flatten matched references into a batch matching
/// [`vault::law_edges_schema`], ordered by source then target.
pub fn edges_to_batch(resolution: &Resolution) -> Result<RecordBatch, StoreError> {
    let mut sources = Vec::new();
    let mut targets = Vec::new();
    let mut relations = Vec::new();
    for (source, target, relation) in resolution.edges() {
        sources.push(source);
        targets.push(target);
        relations.push(relation.as_str());
    }

    let batch = RecordBatch::try_new(
        Arc::new(vault::law_edges_schema()),
        vec![
            Arc::new(StringArray::from(sources)),
            Arc::new(StringArray::from(targets)),
            Arc::new(StringArray::from(relations)),
        ],
    )?;
    Ok(batch)
}

#[cfg(feature = "parquet")]
mod parquet_io {
    use std::fs::File;
    use std::path::Path;

    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tracing::info;

    use crate::StoreError;

    /// Write one batch to a Parquet file, replacing any existing file.
    pub fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<(), StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
        writer.write(batch)?;
        writer.close()?;
        info!(rows = batch.num_rows(), path = %path.display(), "wrote parquet");
        Ok(())
    }

    /// Read every batch of a Parquet file.
    pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
        if !path.exists() {
            return Err(StoreError::Other(format!(
                "parquet file not found: {}",
                path.display()
            )));
        }
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        let batches = reader.collect::<Result<Vec<_>, _>>()?;
        Ok(batches)
    }
}

#[cfg(feature = "parquet")]
pub use parquet_io::{read_parquet, write_parquet};
