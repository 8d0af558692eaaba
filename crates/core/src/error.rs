//! Error types for dataset import and model sampling
//!
//! Every variant here is fatal for the call that produced it: the partially
//! built `FileData` or `ModelRangeIndex` is dropped and never handed back.
//! Running out of cohort records early is the one exception and is reported
//! through [`crate::core_types::Truncation`] instead of an error.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading, validating or writing simulation datasets
#[derive(Debug, Error)]
pub enum ImportError {
    /// The file could not be opened, read or written
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path of the file being accessed
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to an already opened stream failed
    #[error("stream I/O error: {0}")]
    Stream(#[from] std::io::Error),

    /// The file's version string is older than the caller's minimum
    #[error("file version {found} is older than minimum version {minimum}")]
    VersionTooOld {
        /// Version stored in the file header
        found: String,
        /// Minimum version requested by the caller
        minimum: String,
    },

    /// A species code has no entry in the lookup table
    #[error("unknown species code '{code}'")]
    UnknownSpecies {
        /// The unresolved species code
        code: String,
    },

    /// A species index has no code in the lookup table (encoding only)
    #[error("no species code registered for index {index}")]
    UnknownSpeciesIndex {
        /// The unresolved species index
        index: u32,
    },

    /// A species code is not exactly four bytes long
    #[error("species code '{code}' must be exactly 4 bytes")]
    InvalidSpeciesCode {
        /// The offending code
        code: String,
    },

    /// Two cohorts in one file (or two files of one series) disagree on cell size
    #[error("inconsistent cohort cell size: expected ({}, {}), found ({}, {})", .expected.0, .expected.1, .found.0, .found.1)]
    InconsistentCellSize {
        /// Cell size established by the first cohort
        expected: (f32, f32),
        /// Cell size of the offending cohort
        found: (f32, f32),
    },

    /// A token could not be parsed as the expected value
    #[error("could not parse {what} from '{token}'")]
    Parse {
        /// Description of the field being parsed
        what: &'static str,
        /// The offending input token
        token: String,
    },

    /// The input ended before a mandatory field or record
    #[error("unexpected end of input while reading {what}")]
    UnexpectedEof {
        /// Description of the field being read
        what: &'static str,
    },

    /// Two files of one series carry the same timestep
    #[error("timestep {timestep} appears in both {} and {}", .first.display(), .second.display())]
    DuplicateTimestep {
        /// The repeated timestep
        timestep: i32,
        /// First file carrying the timestep
        first: PathBuf,
        /// Second file carrying the timestep
        second: PathBuf,
    },

    /// A JSON document could not be read or written
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ImportError {
    /// Wrap an I/O failure with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a parse error for a named field
    pub fn parse(what: &'static str, token: impl Into<String>) -> Self {
        Self::Parse {
            what,
            token: token.into(),
        }
    }
}

/// Errors raised while building or sampling a model range index
#[derive(Debug, Error)]
pub enum ModelSetError {
    /// The model library contains no models
    #[error("model library is empty")]
    EmptyLibrary,

    /// A model's height range is inverted or not finite
    #[error("model {vueid} has invalid height range [{hmin}, {hmax}]")]
    InvalidRange {
        /// Identifier of the offending model
        vueid: i32,
        /// Lower height bound
        hmin: f32,
        /// Upper height bound
        hmax: f32,
    },

    /// A model overlaps no sub-interval by more than the selection margin
    #[error("model {vueid} with height range [{hmin}, {hmax}] is too narrow to be selected")]
    UncoveredModel {
        /// Identifier of the unreachable model
        vueid: i32,
        /// Lower height bound
        hmin: f32,
        /// Upper height bound
        hmax: f32,
    },

    /// A height bin spans more than one breakpoint
    #[error("bin size {binsize} too large at bin {bin}")]
    BinsizeTooLarge {
        /// Bin index at which the walk failed
        bin: usize,
        /// Bin size in use
        binsize: f32,
    },

    /// The selection resolved for a height has no candidate models
    #[error("no models eligible for height {height} (selection {selection})")]
    EmptySelection {
        /// Index of the empty selection
        selection: usize,
        /// Queried height
        height: f32,
    },

    /// The queried height lies outside the indexed range
    #[error("height {height} outside indexed range [{min}, {max}]")]
    HeightOutOfRange {
        /// Queried height
        height: f32,
        /// Lowest indexed height
        min: f32,
        /// Highest indexed height
        max: f32,
    },

    /// A model id is not part of the index
    #[error("unknown model id {0}")]
    UnknownModel(i32),

    /// A JSON model library could not be parsed
    #[error("invalid model library: {0}")]
    Json(#[from] serde_json::Error),
}
