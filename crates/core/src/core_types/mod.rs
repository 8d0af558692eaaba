//! Core types and utilities

pub mod file_data;
pub mod plant;
pub mod spatial;
pub mod species;
pub mod version;

// Re-export
pub use file_data::{FileData, GridExtent, Truncation, CELL_SIZE_TOLERANCE};
pub use plant::{Cohort, Tree, COHORT_FOOTPRINT};
pub use spatial::trim_spatial;
pub use species::{code_from_bytes, code_to_bytes, SpeciesLookup, SPECIES_CODE_LEN};
pub use version::version_gteq;
