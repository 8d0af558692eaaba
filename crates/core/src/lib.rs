//! Forest Dataset Core Library
//!
//! Ingestion of per-timestep forest simulation output and height-based
//! assignment of renderable tree models.
//!
//! ## Datasets
//!
//! Each simulation timestep is a file of individually resolved trees plus
//! aggregated undergrowth cohorts on a 2×2-cell grid, in a text or a fixed
//! little-endian binary encoding:
//! - Decoding with version gating, species resolution and grid validation
//! - Encoding and text→binary conversion
//! - Ordered loading of a whole run of timestep files
//! - Clipping records to a target grid window
//!
//! ## Models
//!
//! A library of model variants, each valid for a height range, is indexed
//! once and then sampled per plant with a caller-supplied random source.

// Core types and utilities
pub mod core_types;
pub mod error;

// Dataset files
pub mod import;

// Model assignment
pub mod models;

// Re-export core types
pub use core_types::{Cohort, FileData, GridExtent, Tree, Truncation};
pub use core_types::{trim_spatial, version_gteq, SpeciesLookup};
pub use error::{ImportError, ModelSetError};

// Re-export dataset and model entry points
pub use import::{decode, DatasetFormat, DecodeOptions, TimestepSeries};
pub use models::{ModelLibrary, ModelRangeIndex, ModelSampler, TreeModel};
