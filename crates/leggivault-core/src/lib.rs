pub mod error;
pub mod frontmatter;
pub mod link;
pub mod parser;
pub mod record;
pub mod schema;

pub use error::{ConsistencyWarning, ValidationError};
pub use frontmatter::{BlockOrigin, MetadataBlock, file_blocks, split_blocks};
pub use link::{LinkKey, canonical_link, extract_codice, extract_urn, record_keys, reference_keys};
pub use parser::{FolderHint, ParsedRecord, check_consistency, file_name_date, parse_block, parse_mapping};
pub use record::{
    ActType, CameraProvenance, LegislativeRecord, Relation, SenatoProvenance, Sponsor,
};
pub use schema::vault;
