//! Record reader and writer trait definitions
//!
//! This module defines the `RecordReader` and `RecordWriter` traits, which
//! provide a format-agnostic view of a simulation timestep file. The text and
//! binary encodings both implement them, so the validation rules in
//! [`super::decode_records`] are written once.

use crate::error::ImportError;

/// Record sections of a timestep file, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Individually resolved trees
    Trees,
    /// Aggregated undergrowth cohorts
    Cohorts,
}

impl Section {
    /// Field name used in parse errors for this section's count
    pub(crate) fn count_name(self) -> &'static str {
        match self {
            Self::Trees => "tree count",
            Self::Cohorts => "cohort count",
        }
    }
}

/// Tree record as stored in a file, before species resolution
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRecord {
    /// Record identifier (not kept in decoded data)
    pub id: i32,
    /// 4-character species alpha code
    pub code: String,
    /// Grid x coordinate
    pub x: f32,
    /// Grid y coordinate
    pub y: f32,
    /// Height in metres
    pub height: f32,
    /// Crown radius in metres
    pub radius: f32,
    /// Diameter at breast height
    pub dbh: f32,
    /// Trailing field present in every record, carried but never interpreted
    pub unused: i32,
}

/// Cohort record as stored in a file, before species resolution
#[derive(Debug, Clone, PartialEq)]
pub struct CohortRecord {
    /// Footprint start x
    pub xs: i32,
    /// Footprint start y
    pub ys: i32,
    /// 4-character species alpha code
    pub code: String,
    /// Mean diameter at breast height
    pub dbh: f32,
    /// Mean height in metres
    pub height: f32,
    /// Estimated plant count
    pub nplants: f32,
}

/// Sequential reader over the fields of one timestep file
///
/// Callers must invoke the methods in file order: version, timestep, tree
/// count, that many trees, cohort count, then cohorts until `None`.
pub trait RecordReader {
    /// Read the version string
    ///
    /// # Errors
    ///
    /// Fails if the input ends or the field is malformed.
    fn read_version(&mut self) -> Result<String, ImportError>;

    /// Read the integer timestep
    ///
    /// # Errors
    ///
    /// Fails if the input ends or the field is malformed.
    fn read_timestep(&mut self) -> Result<i32, ImportError>;

    /// Read the declared record count of a section
    ///
    /// # Errors
    ///
    /// Fails if the input ends, the count is malformed or negative.
    fn read_count(&mut self, section: Section) -> Result<usize, ImportError>;

    /// Read the next tree record
    ///
    /// # Errors
    ///
    /// A missing tree record is fatal: running out of input yields
    /// [`ImportError::UnexpectedEof`].
    fn read_tree(&mut self) -> Result<TreeRecord, ImportError>;

    /// Read the next cohort record
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the input is exhausted, which the decoder treats as a
    /// non-fatal truncation of the cohort section.
    ///
    /// # Errors
    ///
    /// Fails if a present record is malformed.
    fn read_cohort(&mut self) -> Result<Option<CohortRecord>, ImportError>;
}

/// Sequential writer producing one timestep file
///
/// Methods must be invoked in the same order [`RecordReader`] consumes them,
/// followed by [`RecordWriter::finish`].
pub trait RecordWriter {
    /// Write the version string and timestep
    ///
    /// # Errors
    ///
    /// Fails on I/O errors or a version string the format cannot store.
    fn write_header(&mut self, version: &str, timestep: i32) -> Result<(), ImportError>;

    /// Write the record count of the section that follows
    ///
    /// # Errors
    ///
    /// Fails on I/O errors or a count the format cannot store.
    fn write_count(&mut self, section: Section, count: usize) -> Result<(), ImportError>;

    /// Write one tree record
    ///
    /// # Errors
    ///
    /// Fails on I/O errors or a species code the format cannot store.
    fn write_tree(&mut self, record: &TreeRecord) -> Result<(), ImportError>;

    /// Write one cohort record
    ///
    /// # Errors
    ///
    /// Fails on I/O errors or a species code the format cannot store.
    fn write_cohort(&mut self, record: &CohortRecord) -> Result<(), ImportError>;

    /// Flush buffered output
    ///
    /// # Errors
    ///
    /// Fails on I/O errors.
    fn finish(&mut self) -> Result<(), ImportError>;
}
