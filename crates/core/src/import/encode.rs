//! Writing timestep files and converting between encodings

use super::r#trait::{CohortRecord, RecordReader, RecordWriter, Section, TreeRecord};
use super::{create_record_reader, create_record_writer, with_path, BinaryRecordWriter, TextRecordWriter};
use crate::core_types::{code_to_bytes, FileData, SpeciesLookup, Truncation};
use crate::error::ImportError;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Counts reported by [`convert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Tree records copied
    pub trees: usize,
    /// Cohort records copied
    pub cohorts: usize,
    /// Set when the input's cohort section was cut short
    pub truncation: Option<Truncation>,
}

fn record_id(position: usize) -> Result<i32, ImportError> {
    i32::try_from(position).map_err(|_| ImportError::parse("tree id", position.to_string()))
}

/// Write decoded data through any record writer
///
/// Species indices are mapped back to codes through `lookup`. Tree ids are
/// written as the record position and the unused trailing field as `0`.
///
/// # Errors
///
/// - [`ImportError::UnknownSpeciesIndex`] if an index has no registered code
/// - [`ImportError::InvalidSpeciesCode`] if a registered code is not 4 bytes
/// - I/O errors from the underlying writer
pub fn write_file_data<W: RecordWriter + ?Sized>(
    data: &FileData,
    lookup: &SpeciesLookup,
    writer: &mut W,
) -> Result<(), ImportError> {
    let code_for = |species: u32| -> Result<String, ImportError> {
        let code = lookup.code_for(species)?;
        code_to_bytes(code)?;
        Ok(code.to_string())
    };

    writer.write_header(data.version(), data.timestep())?;

    writer.write_count(Section::Trees, data.trees().len())?;
    for (position, tree) in data.trees().iter().enumerate() {
        writer.write_tree(&TreeRecord {
            id: record_id(position)?,
            code: code_for(tree.species)?,
            x: tree.x,
            y: tree.y,
            height: tree.height,
            radius: tree.radius,
            dbh: tree.dbh,
            unused: 0,
        })?;
    }

    writer.write_count(Section::Cohorts, data.cohorts().len())?;
    for cohort in data.cohorts() {
        writer.write_cohort(&CohortRecord {
            xs: cohort.xs,
            ys: cohort.ys,
            code: code_for(cohort.species)?,
            dbh: cohort.dbh,
            height: cohort.height,
            nplants: cohort.nplants,
        })?;
    }

    writer.finish()
}

/// Encode `data` in the text format
///
/// # Errors
///
/// See [`write_file_data`].
pub fn encode_text<W: Write>(
    data: &FileData,
    lookup: &SpeciesLookup,
    writer: W,
) -> Result<(), ImportError> {
    write_file_data(data, lookup, &mut TextRecordWriter::new(writer))
}

/// Encode `data` in the binary format
///
/// Tree coordinates are truncated to integers.
///
/// # Errors
///
/// See [`write_file_data`].
pub fn encode_binary<W: Write>(
    data: &FileData,
    lookup: &SpeciesLookup,
    writer: W,
) -> Result<(), ImportError> {
    write_file_data(data, lookup, &mut BinaryRecordWriter::new(writer))
}

/// Encode `data` to `path`, choosing the format by extension
///
/// # Errors
///
/// See [`write_file_data`]; I/O failures carry the path.
pub fn encode_file(
    path: impl AsRef<Path>,
    data: &FileData,
    lookup: &SpeciesLookup,
) -> Result<(), ImportError> {
    let path = path.as_ref();
    let mut writer = create_record_writer(path)?;
    write_file_data(data, lookup, writer.as_mut()).map_err(|e| with_path(path, e))
}

/// Copy raw records from one encoding to another
///
/// Species codes are copied verbatim, so no lookup is needed. Cohorts are
/// buffered so the written count matches the records actually present when
/// the input is truncated.
///
/// # Arguments
///
/// * `reader` - Source positioned at the start of a file
/// * `writer` - Destination
/// * `version_override` - Version string to write instead of the input's
///
/// # Errors
///
/// Fails on malformed input, I/O errors, or a code the output format cannot
/// store.
pub fn convert<R, W>(
    reader: &mut R,
    writer: &mut W,
    version_override: Option<&str>,
) -> Result<ConversionSummary, ImportError>
where
    R: RecordReader + ?Sized,
    W: RecordWriter + ?Sized,
{
    let version = reader.read_version()?;
    let timestep = reader.read_timestep()?;
    writer.write_header(version_override.unwrap_or(&version), timestep)?;

    let trees = reader.read_count(Section::Trees)?;
    writer.write_count(Section::Trees, trees)?;
    for _ in 0..trees {
        writer.write_tree(&reader.read_tree()?)?;
    }

    let declared = reader.read_count(Section::Cohorts)?;
    let mut cohorts = Vec::with_capacity(declared.min(super::MAX_PREALLOCATED_RECORDS));
    while cohorts.len() < declared {
        match reader.read_cohort()? {
            Some(record) => cohorts.push(record),
            None => break,
        }
    }
    let truncation = (cohorts.len() < declared).then(|| {
        warn!(
            "Input cohort section truncated: {} declared, {} read",
            declared,
            cohorts.len()
        );
        Truncation {
            declared,
            read: cohorts.len(),
        }
    });

    writer.write_count(Section::Cohorts, cohorts.len())?;
    for record in &cohorts {
        writer.write_cohort(record)?;
    }
    writer.finish()?;

    Ok(ConversionSummary {
        trees,
        cohorts: cohorts.len(),
        truncation,
    })
}

/// Convert `input` to `output`, choosing both formats by extension
///
/// # Errors
///
/// See [`convert`].
pub fn convert_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    version_override: Option<&str>,
) -> Result<ConversionSummary, ImportError> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let mut reader = create_record_reader(input)?;
    let mut writer = create_record_writer(output)?;

    let summary = convert(reader.as_mut(), writer.as_mut(), version_override)
        .map_err(|e| with_path(input, e))?;
    info!(
        "Converted {} -> {}: {} trees, {} cohorts",
        input.display(),
        output.display(),
        summary.trees,
        summary.cohorts
    );
    Ok(summary)
}
