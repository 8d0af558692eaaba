//! Ordered collection of timestep files from one simulation run

use super::{create_record_reader, decode, decode_records, with_path, DecodeOptions};
use crate::core_types::{FileData, GridExtent, SpeciesLookup};
use crate::error::ImportError;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

/// Timestep files of one run, ordered by timestep
///
/// Every file carrying cohorts shares one cohort cell size.
#[derive(Debug, Clone)]
pub struct TimestepSeries {
    paths: Vec<PathBuf>,
    files: Vec<FileData>,
}

/// Read the timestep of every file and return `(timestep, path)` sorted by timestep
///
/// Only file headers are read.
///
/// # Errors
///
/// Returns [`ImportError::DuplicateTimestep`] if two files share a timestep,
/// or any header decoding error.
pub fn scan_timesteps<P: AsRef<Path>>(
    paths: &[P],
    options: &DecodeOptions,
) -> Result<Vec<(i32, PathBuf)>, ImportError> {
    let header_options = options.header_only();
    let no_species = SpeciesLookup::new();

    let mut entries = paths
        .iter()
        .map(|p| {
            let path = p.as_ref();
            let mut reader = create_record_reader(path)?;
            let header = decode_records(reader.as_mut(), &header_options, &no_species)
                .map_err(|e| with_path(path, e))?;
            Ok((header.timestep(), path.to_path_buf()))
        })
        .collect::<Result<Vec<_>, ImportError>>()?;

    entries.sort_by_key(|(timestep, _)| *timestep);
    if let Some(pair) = entries.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(ImportError::DuplicateTimestep {
            timestep: pair[0].0,
            first: pair[0].1.clone(),
            second: pair[1].1.clone(),
        });
    }
    Ok(entries)
}

impl TimestepSeries {
    /// Decode a set of timestep files
    ///
    /// Timesteps are enumerated from the headers first, then every file is
    /// decoded in parallel.
    ///
    /// # Arguments
    ///
    /// * `paths` - Files in any order
    /// * `options` - Version gate applied to every file (`timestep_only` is ignored)
    /// * `lookup` - Species code table
    ///
    /// # Errors
    ///
    /// - [`ImportError::DuplicateTimestep`] if two files share a timestep
    /// - [`ImportError::InconsistentCellSize`] if files disagree on cohort cell size
    /// - the first decoding error of any file
    pub fn load<P: AsRef<Path>>(
        paths: &[P],
        options: &DecodeOptions,
        lookup: &SpeciesLookup,
    ) -> Result<Self, ImportError> {
        let entries = scan_timesteps(paths, options)?;
        let full_options = options.full();

        let files = entries
            .par_iter()
            .map(|(_, path)| decode(path, &full_options, lookup))
            .collect::<Result<Vec<_>, ImportError>>()?;

        let mut reference: Option<&GridExtent> = None;
        for extent in files.iter().filter_map(FileData::extent) {
            match reference {
                None => reference = Some(extent),
                Some(first) if !first.same_cell_size(extent) => {
                    return Err(ImportError::InconsistentCellSize {
                        expected: (first.dx, first.dy),
                        found: (extent.dx, extent.dy),
                    });
                }
                Some(_) => {}
            }
        }

        info!(
            "Loaded {} timesteps ({:?} .. {:?})",
            files.len(),
            files.first().map(FileData::timestep),
            files.last().map(FileData::timestep)
        );

        Ok(Self {
            paths: entries.into_iter().map(|(_, path)| path).collect(),
            files,
        })
    }

    /// Number of timesteps
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the series holds no files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Timesteps in ascending order
    pub fn timesteps(&self) -> Vec<i32> {
        self.files.iter().map(FileData::timestep).collect()
    }

    /// File data for `timestep`, if present
    pub fn get(&self, timestep: i32) -> Option<&FileData> {
        self.files
            .binary_search_by_key(&timestep, FileData::timestep)
            .ok()
            .map(|i| &self.files[i])
    }

    /// Path the data for `timestep` was read from
    pub fn path(&self, timestep: i32) -> Option<&Path> {
        self.files
            .binary_search_by_key(&timestep, FileData::timestep)
            .ok()
            .map(|i| self.paths[i].as_path())
    }

    /// Files in ascending timestep order
    pub fn iter(&self) -> impl Iterator<Item = &FileData> {
        self.files.iter()
    }

    /// Cohort cell size shared by the series, `None` if no file has cohorts
    pub fn cell_size(&self) -> Option<(f32, f32)> {
        self.files.iter().find_map(FileData::cell_size)
    }
}
