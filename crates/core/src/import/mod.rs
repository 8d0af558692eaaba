//! Simulation timestep file import and export
//!
//! A timestep file stores a version header, the timestep number, a section of
//! individually resolved trees and a section of undergrowth cohorts. Two
//! encodings exist:
//!
//! - **Text** (`.pdb` and anything else): one field or record per line.
//! - **Binary** (`.pdbb`): fixed little-endian records, see [`binary`].
//!
//! Both encodings implement [`RecordReader`] and [`RecordWriter`], so the
//! validation in [`decode_records`] and the writing in [`write_file_data`] are
//! shared. Format selection follows the file extension via
//! [`create_record_reader`] and [`create_record_writer`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ecoviz_core::import::{decode, DecodeOptions};
//! use ecoviz_core::SpeciesLookup;
//!
//! let lookup: SpeciesLookup = [("ABAL", 0), ("PIAB", 1)].into_iter().collect();
//! let data = decode("sim_0012.pdbb", &DecodeOptions::default(), &lookup)?;
//! println!("{} trees, {} cohorts", data.trees().len(), data.cohorts().len());
//! ```

pub mod binary;
mod encode;
mod series;
pub mod text;
#[allow(clippy::module_name_repetitions)]
mod r#trait;

// Re-exports
pub use binary::{BinaryRecordReader, BinaryRecordWriter};
pub use encode::{
    convert, convert_file, encode_binary, encode_file, encode_text, write_file_data,
    ConversionSummary,
};
pub use r#trait::{CohortRecord, RecordReader, RecordWriter, Section, TreeRecord};
pub use series::{scan_timesteps, TimestepSeries};
pub use text::{TextRecordReader, TextRecordWriter};

use crate::core_types::{
    version_gteq, Cohort, FileData, GridExtent, SpeciesLookup, Tree, Truncation,
};
use crate::error::ImportError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// Oldest file version accepted by default
pub const DEFAULT_MIN_VERSION: &str = "2.0";

/// Upper bound on records preallocated from a declared count
///
/// Counts come from the file and may be corrupt; vectors still grow past
/// this as records are actually read.
pub const MAX_PREALLOCATED_RECORDS: usize = 1 << 20;

/// On-disk encoding of a timestep file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    /// Line-oriented text (`.pdb`)
    Text,
    /// Fixed little-endian records (`.pdbb`)
    Binary,
}

impl DatasetFormat {
    /// Pick the format from a file extension
    ///
    /// `.pdbb` (any case) selects [`DatasetFormat::Binary`]; every other
    /// path, including one without an extension, is treated as text.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdbb") => Self::Binary,
            _ => Self::Text,
        }
    }

    /// Conventional file extension for this format
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Text => "pdb",
            Self::Binary => "pdbb",
        }
    }
}

/// Options controlling a decode call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Files whose version compares lower than this are rejected
    pub min_version: String,
    /// Stop after the header, returning only version and timestep
    pub timestep_only: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            min_version: DEFAULT_MIN_VERSION.to_string(),
            timestep_only: false,
        }
    }
}

impl DecodeOptions {
    /// Options with a custom minimum version
    #[must_use]
    pub fn with_min_version(min_version: impl Into<String>) -> Self {
        Self {
            min_version: min_version.into(),
            ..Self::default()
        }
    }

    /// Copy of these options that stops after the header
    #[must_use]
    pub fn header_only(&self) -> Self {
        Self {
            timestep_only: true,
            ..self.clone()
        }
    }

    /// Copy of these options that reads every record
    #[must_use]
    pub fn full(&self) -> Self {
        Self {
            timestep_only: false,
            ..self.clone()
        }
    }
}

/// Open a record reader for `path`, choosing the encoding by extension
///
/// # Errors
///
/// Returns [`ImportError::Io`] if the file cannot be opened.
pub fn create_record_reader(path: impl AsRef<Path>) -> Result<Box<dyn RecordReader>, ImportError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ImportError::io(path, e))?;
    let reader = BufReader::new(file);

    let format = DatasetFormat::from_path(path);
    debug!("Opening {} as {:?}", path.display(), format);
    Ok(match format {
        DatasetFormat::Text => Box::new(TextRecordReader::new(reader)),
        DatasetFormat::Binary => Box::new(BinaryRecordReader::new(reader)),
    })
}

/// Create a record writer for `path`, choosing the encoding by extension
///
/// An existing file is truncated.
///
/// # Errors
///
/// Returns [`ImportError::Io`] if the file cannot be created.
pub fn create_record_writer(path: impl AsRef<Path>) -> Result<Box<dyn RecordWriter>, ImportError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| ImportError::io(path, e))?;
    let writer = BufWriter::new(file);

    Ok(match DatasetFormat::from_path(path) {
        DatasetFormat::Text => Box::new(TextRecordWriter::new(writer)),
        DatasetFormat::Binary => Box::new(BinaryRecordWriter::new(writer)),
    })
}

/// Attach `path` to stream errors raised while reading an open file
pub(crate) fn with_path(path: &Path, err: ImportError) -> ImportError {
    match err {
        ImportError::Stream(source) => ImportError::io(path, source),
        other => other,
    }
}

/// Decode one timestep file
///
/// # Arguments
///
/// * `path` - File to read; `.pdbb` is decoded as binary, anything else as text
/// * `options` - Version gate and header-only switch
/// * `lookup` - Species code table used to resolve every record
///
/// # Errors
///
/// Any [`ImportError`] other than cohort truncation aborts the decode and the
/// partially read data is discarded.
pub fn decode(
    path: impl AsRef<Path>,
    options: &DecodeOptions,
    lookup: &SpeciesLookup,
) -> Result<FileData, ImportError> {
    let path = path.as_ref();
    info!("Decoding {}", path.display());
    let mut reader = create_record_reader(path)?;
    decode_records(reader.as_mut(), options, lookup).map_err(|e| with_path(path, e))
}

/// Decode a text-encoded timestep from any buffered reader
///
/// # Errors
///
/// See [`decode`].
pub fn decode_text<R: BufRead>(
    reader: R,
    options: &DecodeOptions,
    lookup: &SpeciesLookup,
) -> Result<FileData, ImportError> {
    decode_records(&mut TextRecordReader::new(reader), options, lookup)
}

/// Decode a binary-encoded timestep from any reader
///
/// The reader is consumed in small fixed-size reads; wrap unbuffered sources
/// in a `BufReader`.
///
/// # Errors
///
/// See [`decode`].
pub fn decode_binary<R: Read>(
    reader: R,
    options: &DecodeOptions,
    lookup: &SpeciesLookup,
) -> Result<FileData, ImportError> {
    decode_records(&mut BinaryRecordReader::new(reader), options, lookup)
}

/// Decode and validate a timestep from a record reader
///
/// Reads the header and enforces the version gate, then (unless
/// `options.timestep_only` is set) resolves every tree and cohort through
/// `lookup` and derives the cohort grid extent.
///
/// # Returns
///
/// The decoded file. If the cohort section ends before its declared count the
/// cohorts read so far are kept and [`FileData::truncation`] is set.
///
/// # Errors
///
/// - [`ImportError::VersionTooOld`] if the file version is below `options.min_version`
/// - [`ImportError::UnknownSpecies`] for a code missing from `lookup`
/// - [`ImportError::InconsistentCellSize`] if cohorts disagree on cell size
/// - [`ImportError::Parse`] / [`ImportError::UnexpectedEof`] for malformed or
///   missing fields, including a short tree section and cohort anchors whose
///   footprint overflows `i32`
pub fn decode_records<R: RecordReader + ?Sized>(
    reader: &mut R,
    options: &DecodeOptions,
    lookup: &SpeciesLookup,
) -> Result<FileData, ImportError> {
    let version = reader.read_version()?;
    if !version_gteq(&version, &options.min_version)? {
        return Err(ImportError::VersionTooOld {
            found: version,
            minimum: options.min_version.clone(),
        });
    }
    let timestep = reader.read_timestep()?;

    if options.timestep_only {
        debug!("Header only: version {}, timestep {}", version, timestep);
        return Ok(FileData::header_only(version, timestep));
    }

    // Trees: every declared record must be present
    let tree_count = reader.read_count(Section::Trees)?;
    let mut trees = Vec::with_capacity(tree_count.min(MAX_PREALLOCATED_RECORDS));
    let mut tree_species = BTreeSet::new();
    for _ in 0..tree_count {
        let record = reader.read_tree()?;
        let species = lookup.resolve(&record.code)?;
        tree_species.insert(species);
        trees.push(Tree {
            species,
            x: record.x,
            y: record.y,
            height: record.height,
            radius: record.radius,
            dbh: record.dbh,
        });
    }

    // Cohorts: running out early is tolerated
    let cohort_count = reader.read_count(Section::Cohorts)?;
    let mut cohorts = Vec::with_capacity(cohort_count.min(MAX_PREALLOCATED_RECORDS));
    let mut cohort_species = BTreeSet::new();
    let mut extent: Option<GridExtent> = None;
    while cohorts.len() < cohort_count {
        let Some(record) = reader.read_cohort()? else {
            break;
        };
        let species = lookup.resolve(&record.code)?;
        let cohort = Cohort::try_new(
            record.xs,
            record.ys,
            species,
            record.dbh,
            record.height,
            record.nplants,
        )?;
        match extent.as_mut() {
            Some(e) => e.include(&cohort)?,
            None => extent = Some(GridExtent::from_cohort(&cohort)),
        }
        cohort_species.insert(species);
        cohorts.push(cohort);
    }

    let truncation = if cohorts.len() < cohort_count {
        warn!(
            "Cohort section truncated: {} declared, {} read",
            cohort_count,
            cohorts.len()
        );
        Some(Truncation {
            declared: cohort_count,
            read: cohorts.len(),
        })
    } else {
        None
    };

    info!(
        "Decoded timestep {} (version {}): {} trees, {} cohorts",
        timestep,
        version,
        trees.len(),
        cohorts.len()
    );
    debug!("Tree species: {:?}", tree_species);
    debug!("Cohort species: {:?}", cohort_species);
    if let Some((min, max)) = value_range(trees.iter().map(|t| t.height)) {
        debug!("Tree height range: [{}, {}]", min, max);
    }
    if let Some((min, max)) = value_range(trees.iter().map(|t| t.dbh)) {
        debug!("Tree dbh range: [{}, {}]", min, max);
    }
    if let Some((min, max)) = value_range(cohorts.iter().map(|c| c.height)) {
        debug!("Cohort height range: [{}, {}]", min, max);
    }
    if let Some(e) = &extent {
        debug!(
            "Cohort extent: x [{}, {}], y [{}, {}], cell {}x{}",
            e.minx, e.maxx, e.miny, e.maxy, e.dx, e.dy
        );
    }

    Ok(FileData {
        version,
        timestep,
        trees,
        cohorts,
        extent,
        truncation,
    })
}

fn value_range(values: impl Iterator<Item = f32>) -> Option<(f32, f32)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lookup() -> SpeciesLookup {
        [("ABAL", 0), ("PIAB", 1)].into_iter().collect()
    }

    const SAMPLE: &str = "\
2.1
12
2
1 PIAB 10 20 25.5 3.1 0.42 0
2 ABAL 40 12 18.0 2.5 0.31 0
3
3 5 ABAL 0.02 1.4 37.5
5 5 PIAB 0.03 1.1 12.0
3 7 ABAL 0.01 0.8 60.25
";

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DatasetFormat::from_path("a/b/sim.pdbb"), DatasetFormat::Binary);
        assert_eq!(DatasetFormat::from_path("sim.PDBB"), DatasetFormat::Binary);
        assert_eq!(DatasetFormat::from_path("sim.pdb"), DatasetFormat::Text);
        assert_eq!(DatasetFormat::from_path("sim"), DatasetFormat::Text);
        assert_eq!(DatasetFormat::Binary.extension(), "pdbb");
    }

    #[test]
    fn test_default_options() {
        let options = DecodeOptions::default();
        assert_eq!(options.min_version, "2.0");
        assert!(!options.timestep_only);
        assert!(options.header_only().timestep_only);

        let parsed: DecodeOptions = serde_json::from_str(r#"{"timestep_only": true}"#).unwrap();
        assert_eq!(parsed.min_version, DEFAULT_MIN_VERSION);
        assert!(parsed.timestep_only);
    }

    #[test]
    fn test_decode_sample() {
        let data = decode_text(Cursor::new(SAMPLE), &DecodeOptions::default(), &lookup()).unwrap();

        assert_eq!(data.version(), "2.1");
        assert_eq!(data.timestep(), 12);
        assert_eq!(data.trees().len(), 2);
        assert_eq!(data.trees()[0].species, 1);
        assert_eq!(data.trees()[1].x, 40.0);
        assert_eq!(data.cohorts().len(), 3);
        assert_eq!(data.cohorts()[1].xe, 7);

        let extent = data.extent().unwrap();
        assert_eq!((extent.minx, extent.miny), (3.0, 5.0));
        assert_eq!((extent.maxx, extent.maxy), (7.0, 9.0));
        assert!(!data.is_truncated());
    }

    #[test]
    fn test_version_gate() {
        let options = DecodeOptions::with_min_version("2.2");
        let err = decode_text(Cursor::new(SAMPLE), &options, &lookup()).unwrap_err();
        assert!(matches!(
            err,
            ImportError::VersionTooOld { found, minimum } if found == "2.1" && minimum == "2.2"
        ));
    }

    #[test]
    fn test_timestep_only_skips_records() {
        let options = DecodeOptions::default().header_only();
        // An empty lookup would fail on any record, so nothing past the header is read
        let data = decode_text(Cursor::new(SAMPLE), &options, &SpeciesLookup::new()).unwrap();

        assert_eq!(data.timestep(), 12);
        assert!(data.trees().is_empty());
        assert!(data.cohorts().is_empty());
        assert!(data.extent().is_none());
    }

    #[test]
    fn test_blank_line_ends_cohorts() {
        let input = "2.0\n1\n0\n3\n3 5 ABAL 0.02 1.4 37.5\n\n5 5 PIAB 0.03 1.1 12.0\n";
        let data = decode_text(Cursor::new(input), &DecodeOptions::default(), &lookup()).unwrap();

        assert_eq!(data.cohorts().len(), 1);
        assert_eq!(
            data.truncation(),
            Some(Truncation {
                declared: 3,
                read: 1
            })
        );
    }

    #[test]
    fn test_unknown_tree_species_aborts() {
        let input = "2.0\n1\n1\n1 FASY 1 1 1 1 1 0\n0\n";
        let err = decode_text(Cursor::new(input), &DecodeOptions::default(), &lookup()).unwrap_err();
        assert!(matches!(err, ImportError::UnknownSpecies { code } if code == "FASY"));
    }

    #[test]
    fn test_footprint_overflow_is_parse_error() {
        let input = "2.0\n1\n0\n1\n2147483647 0 ABAL 0.1 1 1\n";
        let err = decode_text(Cursor::new(input), &DecodeOptions::default(), &lookup()).unwrap_err();
        assert!(matches!(err, ImportError::Parse { token, .. } if token == "2147483647"));

        let mut writer = BinaryRecordWriter::new(Vec::new());
        writer.write_header("2.0", 1).unwrap();
        writer.write_count(Section::Trees, 0).unwrap();
        writer.write_count(Section::Cohorts, 1).unwrap();
        writer
            .write_cohort(&CohortRecord {
                xs: 0,
                ys: i32::MAX - 1,
                code: "ABAL".to_string(),
                dbh: 0.1,
                height: 1.0,
                nplants: 1.0,
            })
            .unwrap();
        writer.finish().unwrap();
        let bytes = writer.into_inner();

        let err = decode_binary(Cursor::new(bytes), &DecodeOptions::default(), &lookup()).unwrap_err();
        assert!(matches!(err, ImportError::Parse { what: "cohort footprint y", .. }));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = decode(
            "/nonexistent/dir/sim.pdb",
            &DecodeOptions::default(),
            &lookup(),
        )
        .unwrap_err();
        assert!(matches!(err, ImportError::Io { path, .. } if path.ends_with("sim.pdb")));
    }
}
