//! Decoded contents of one simulation timestep file

use crate::core_types::plant::{Cohort, Tree};
use crate::error::ImportError;
use serde::{Deserialize, Serialize};

/// Absolute tolerance when comparing cohort cell sizes
pub const CELL_SIZE_TOLERANCE: f32 = 1e-5;

/// Bounding box and cell size derived from a file's cohorts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridExtent {
    /// Smallest cohort `xs`
    pub minx: f32,
    /// Smallest cohort `ys`
    pub miny: f32,
    /// Largest cohort `xe`
    pub maxx: f32,
    /// Largest cohort `ye`
    pub maxy: f32,
    /// Cohort cell width shared by every cohort
    pub dx: f32,
    /// Cohort cell height shared by every cohort
    pub dy: f32,
}

impl GridExtent {
    /// Start an extent from a single cohort
    #[must_use]
    pub fn from_cohort(cohort: &Cohort) -> Self {
        let (dx, dy) = cohort.cell_size();
        Self {
            minx: cohort.xs as f32,
            miny: cohort.ys as f32,
            maxx: cohort.xe as f32,
            maxy: cohort.ye as f32,
            dx,
            dy,
        }
    }

    /// Grow the extent to cover `cohort`
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::InconsistentCellSize`] if the cohort's cell size
    /// differs from the established `(dx, dy)` by more than
    /// [`CELL_SIZE_TOLERANCE`].
    pub fn include(&mut self, cohort: &Cohort) -> Result<(), ImportError> {
        self.minx = self.minx.min(cohort.xs as f32);
        self.miny = self.miny.min(cohort.ys as f32);
        self.maxx = self.maxx.max(cohort.xe as f32);
        self.maxy = self.maxy.max(cohort.ye as f32);

        let (dx, dy) = cohort.cell_size();
        if (self.dx - dx).abs() > CELL_SIZE_TOLERANCE || (self.dy - dy).abs() > CELL_SIZE_TOLERANCE
        {
            return Err(ImportError::InconsistentCellSize {
                expected: (self.dx, self.dy),
                found: (dx, dy),
            });
        }
        Ok(())
    }

    /// Check whether another extent shares this extent's cell size
    #[must_use]
    pub fn same_cell_size(&self, other: &GridExtent) -> bool {
        (self.dx - other.dx).abs() <= CELL_SIZE_TOLERANCE
            && (self.dy - other.dy).abs() <= CELL_SIZE_TOLERANCE
    }
}

/// Marker for a cohort section that ended before its declared count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Truncation {
    /// Number of cohorts the file declared
    pub declared: usize,
    /// Number of cohorts actually read
    pub read: usize,
}

/// Validated record set for one simulation timestep
///
/// Built in one piece by the decoders in [`crate::import`] (or by
/// [`FileData::new`]) and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileData {
    pub(crate) version: String,
    pub(crate) timestep: i32,
    pub(crate) trees: Vec<Tree>,
    pub(crate) cohorts: Vec<Cohort>,
    pub(crate) extent: Option<GridExtent>,
    pub(crate) truncation: Option<Truncation>,
}

impl FileData {
    /// Assemble file data from already resolved trees and cohorts
    ///
    /// The grid extent is derived from the cohorts.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::InconsistentCellSize`] if the cohorts disagree
    /// on cell size.
    pub fn new(
        version: impl Into<String>,
        timestep: i32,
        trees: Vec<Tree>,
        cohorts: Vec<Cohort>,
    ) -> Result<Self, ImportError> {
        let mut extent: Option<GridExtent> = None;
        for cohort in &cohorts {
            match extent.as_mut() {
                Some(e) => e.include(cohort)?,
                None => extent = Some(GridExtent::from_cohort(cohort)),
            }
        }

        Ok(Self {
            version: version.into(),
            timestep,
            trees,
            cohorts,
            extent,
            truncation: None,
        })
    }

    /// File data carrying only the header (timestep enumeration path)
    pub(crate) fn header_only(version: String, timestep: i32) -> Self {
        Self {
            version,
            timestep,
            trees: Vec::new(),
            cohorts: Vec::new(),
            extent: None,
            truncation: None,
        }
    }

    /// Version string from the file header
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Simulation timestep
    pub fn timestep(&self) -> i32 {
        self.timestep
    }

    /// Trees in file order
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Cohorts in file order
    pub fn cohorts(&self) -> &[Cohort] {
        &self.cohorts
    }

    /// Bounding box and cell size, `None` when the file has no cohorts
    pub fn extent(&self) -> Option<&GridExtent> {
        self.extent.as_ref()
    }

    /// Cohort cell size `(dx, dy)`, `None` when the file has no cohorts
    pub fn cell_size(&self) -> Option<(f32, f32)> {
        self.extent.map(|e| (e.dx, e.dy))
    }

    /// Set when the cohort section ended before its declared count
    pub fn truncation(&self) -> Option<Truncation> {
        self.truncation
    }

    /// Whether the cohort section was cut short
    pub fn is_truncated(&self) -> bool {
        self.truncation.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_covers_all_cohorts() {
        let cohorts = vec![
            Cohort::new(1, 1, 0, 0.1, 1.0, 3.0),
            Cohort::new(5, -3, 1, 0.2, 2.0, 4.0),
            Cohort::new(-1, 7, 0, 0.3, 0.5, 1.0),
        ];
        let data = FileData::new("2.0", 4, Vec::new(), cohorts).unwrap();
        let extent = data.extent().unwrap();

        assert_eq!(extent.minx, -1.0);
        assert_eq!(extent.miny, -3.0);
        assert_eq!(extent.maxx, 7.0);
        assert_eq!(extent.maxy, 9.0);
        assert_eq!(data.cell_size(), Some((2.0, 2.0)));
        assert!(!data.is_truncated());
    }

    #[test]
    fn test_no_cohorts_means_no_extent() {
        let data = FileData::new("2.0", 0, Vec::new(), Vec::new()).unwrap();
        assert!(data.extent().is_none());
        assert!(data.cell_size().is_none());
    }

    #[test]
    fn test_include_rejects_different_cell_size() {
        let mut extent = GridExtent::from_cohort(&Cohort::new(0, 0, 0, 0.0, 0.0, 0.0));
        let mut wide = Cohort::new(2, 0, 0, 0.0, 0.0, 0.0);
        wide.xe = wide.xs + 3;

        let err = extent.include(&wide).unwrap_err();
        assert!(matches!(
            err,
            ImportError::InconsistentCellSize {
                expected: (2.0, 2.0),
                found: (3.0, 2.0)
            }
        ));
    }
}
