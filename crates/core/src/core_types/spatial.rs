//! Spatial trimming of decoded file data to a target grid window

use crate::core_types::file_data::FileData;
use crate::core_types::plant::COHORT_FOOTPRINT;

impl FileData {
    /// Drop records that fall outside a `width × height` grid window
    ///
    /// Cohorts are kept while their start lies in
    /// `(-2, width) × (-2, height)`: a footprint spans two cells, so a cohort
    /// starting just left of or below the window still overlaps it. Trees are
    /// kept when their position lies in `[0, width) × [0, height)`.
    ///
    /// Only the tree and cohort lists change; version, timestep, extent and
    /// truncation are carried over untouched.
    #[must_use]
    pub fn trim_spatial(mut self, width: i32, height: i32) -> Self {
        let before = (self.trees.len(), self.cohorts.len());

        self.cohorts.retain(|c| {
            c.xs > -COHORT_FOOTPRINT && c.xs < width && c.ys > -COHORT_FOOTPRINT && c.ys < height
        });

        let (w, h) = (width as f32, height as f32);
        self.trees
            .retain(|t| t.x >= 0.0 && t.x < w && t.y >= 0.0 && t.y < h);

        tracing::debug!(
            "Trimmed timestep {} to {}x{}: {} -> {} trees, {} -> {} cohorts",
            self.timestep,
            width,
            height,
            before.0,
            self.trees.len(),
            before.1,
            self.cohorts.len()
        );

        self
    }
}

/// Drop records that fall outside a `width × height` grid window
///
/// Free-function form of [`FileData::trim_spatial`].
#[must_use]
pub fn trim_spatial(data: FileData, width: i32, height: i32) -> FileData {
    data.trim_spatial(width, height)
}
