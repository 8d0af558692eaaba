//! Partitioned height lookup over a model library
//!
//! Model height ranges may overlap, nest or leave gaps. The index splits the
//! union of all ranges into sub-intervals at every distinct `hmin`/`hmax`
//! (the *breakpoints*), records which models are eligible in each
//! sub-interval (the *selections*), and lays a grid of equal-width height
//! *bins* over the whole span so a height resolves to its sub-interval in
//! constant time.
//!
//! The bin width is the smallest gap between breakpoints, so a bin straddles
//! at most one breakpoint; [`ModelRangeIndex::select`] resolves that case by
//! comparing the height against the breakpoint directly.

use super::library::TreeModel;
use crate::error::ModelSetError;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Two breakpoints closer than this are treated as one
pub const BREAKPOINT_EPSILON: f32 = 1e-4;

/// Margin applied to model bounds when testing overlap with a sub-interval
pub const SELECTION_MARGIN: f32 = 1e-2;

/// Immutable height→model lookup built from a model list
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRangeIndex {
    pub(crate) ranges: Vec<f32>,
    pub(crate) selections: Vec<Vec<i32>>,
    pub(crate) samplemap: Vec<usize>,
    pub(crate) binsize: f32,
    pub(crate) nbins: usize,
    pub(crate) ratios: FxHashMap<i32, f32>,
}

/// Merge one model's bounds into the sorted breakpoint list
fn add_to_ranges(ranges: &mut Vec<f32>, model: &TreeModel) {
    let mut minidx = None;
    for i in 0..ranges.len() {
        if (ranges[i] - model.hmin).abs() < BREAKPOINT_EPSILON {
            minidx = Some(i);
            break;
        }
        if model.hmin < ranges[i] {
            ranges.insert(i, model.hmin);
            minidx = Some(i);
            break;
        }
    }

    let Some(minidx) = minidx else {
        // Beyond every existing breakpoint
        ranges.push(model.hmin);
        ranges.push(model.hmax);
        return;
    };

    for i in minidx + 1..ranges.len() {
        if (ranges[i] - model.hmax).abs() < BREAKPOINT_EPSILON {
            return;
        }
        if model.hmax < ranges[i] {
            ranges.insert(i, model.hmax);
            return;
        }
    }
    ranges.push(model.hmax);
}

impl ModelRangeIndex {
    /// Build the index for a set of models
    ///
    /// Models are stably sorted by `hmin`, their bounds merged into the
    /// breakpoint list, and each sub-interval assigned every model that
    /// overlaps it by more than [`SELECTION_MARGIN`].
    ///
    /// # Arguments
    ///
    /// * `models` - Model variants in any order; every `vueid` should be unique
    ///
    /// # Errors
    ///
    /// - [`ModelSetError::EmptyLibrary`] if `models` is empty
    /// - [`ModelSetError::InvalidRange`] if a model has `hmin > hmax` or a non-finite bound
    /// - [`ModelSetError::UncoveredModel`] if a model lands in no selection; a
    ///   model must be wider than [`SELECTION_MARGIN`] to be selectable
    /// - [`ModelSetError::BinsizeTooLarge`] if a bin would span more than one breakpoint
    pub fn build(models: &[TreeModel]) -> Result<Self, ModelSetError> {
        if models.is_empty() {
            return Err(ModelSetError::EmptyLibrary);
        }
        if let Some(m) = models
            .iter()
            .find(|m| !m.hmin.is_finite() || !m.hmax.is_finite() || m.hmin > m.hmax)
        {
            return Err(ModelSetError::InvalidRange {
                vueid: m.vueid,
                hmin: m.hmin,
                hmax: m.hmax,
            });
        }

        let mut sorted = models.to_vec();
        sorted.sort_by(|a, b| a.hmin.total_cmp(&b.hmin));

        let mut ranges: Vec<f32> = Vec::with_capacity(sorted.len() * 2);
        for model in &sorted {
            add_to_ranges(&mut ranges, model);
        }

        let selections: Vec<Vec<i32>> = ranges
            .windows(2)
            .map(|pair| {
                let (min, max) = (pair[0], pair[1]);
                sorted
                    .iter()
                    .filter(|m| m.hmin + SELECTION_MARGIN < max && m.hmax - SELECTION_MARGIN > min)
                    .map(|m| m.vueid)
                    .collect()
            })
            .collect();

        if let Some(m) = sorted
            .iter()
            .find(|m| !selections.iter().any(|s| s.contains(&m.vueid)))
        {
            return Err(ModelSetError::UncoveredModel {
                vueid: m.vueid,
                hmin: m.hmin,
                hmax: m.hmax,
            });
        }

        // Smallest breakpoint gap, so no bin spans two breakpoints
        let binsize = ranges
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .fold(f32::INFINITY, f32::min);
        if binsize <= 0.0 || !binsize.is_finite() {
            return Err(ModelSetError::BinsizeTooLarge { bin: 0, binsize });
        }

        let front = ranges[0];
        let back = ranges[ranges.len() - 1];
        let nbins = (((back - front) / binsize).ceil() as usize).max(1);

        let last = selections.len() - 1;
        let mut samplemap = Vec::with_capacity(nbins);
        let mut curridx = 0;
        samplemap.push(curridx);
        for i in 1..nbins {
            let start = front + i as f32 * binsize;
            if curridx < last && start >= ranges[curridx + 1] - BREAKPOINT_EPSILON {
                curridx += 1;
                if curridx < last && start >= ranges[curridx + 1] - BREAKPOINT_EPSILON {
                    return Err(ModelSetError::BinsizeTooLarge { bin: i, binsize });
                }
            }
            samplemap.push(curridx);
        }

        let ratios = sorted
            .iter()
            .map(|m| (m.vueid, m.whratio / 2.0))
            .collect::<FxHashMap<_, _>>();

        debug!(
            "Model range index: {} models, {} breakpoints over [{}, {}], {} bins of {}",
            sorted.len(),
            ranges.len(),
            front,
            back,
            nbins,
            binsize
        );

        Ok(Self {
            ranges,
            selections,
            samplemap,
            binsize,
            nbins,
            ratios,
        })
    }

    /// Sorted breakpoints; sub-interval `i` is `[ranges[i], ranges[i + 1]]`
    pub fn ranges(&self) -> &[f32] {
        &self.ranges
    }

    /// Eligible model ids per sub-interval
    pub fn selections(&self) -> &[Vec<i32>] {
        &self.selections
    }

    /// Sub-interval index for each height bin
    pub fn samplemap(&self) -> &[usize] {
        &self.samplemap
    }

    /// Height bin width
    pub fn binsize(&self) -> f32 {
        self.binsize
    }

    /// Number of height bins
    pub fn nbins(&self) -> usize {
        self.nbins
    }

    /// Lowest and highest indexed height
    pub fn span(&self) -> (f32, f32) {
        (self.ranges[0], self.ranges[self.ranges.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(vueid: i32, hmin: f32, hmax: f32) -> TreeModel {
        TreeModel {
            vueid,
            hmin,
            hmax,
            whratio: 1.0,
        }
    }

    #[test]
    fn test_adjacent_models() {
        let index = ModelRangeIndex::build(&[model(1, 0.0, 10.0), model(2, 10.0, 20.0)]).unwrap();

        assert_eq!(index.ranges(), &[0.0, 10.0, 20.0]);
        assert_eq!(index.selections(), &[vec![1], vec![2]]);
        assert_eq!(index.binsize(), 10.0);
        assert_eq!(index.nbins(), 2);
        assert_eq!(index.samplemap(), &[0, 1]);
    }

    #[test]
    fn test_overlapping_models() {
        let index = ModelRangeIndex::build(&[model(2, 8.0, 20.0), model(1, 0.0, 10.0)]).unwrap();

        assert_eq!(index.ranges(), &[0.0, 8.0, 10.0, 20.0]);
        assert_eq!(index.selections(), &[vec![1], vec![1, 2], vec![2]]);
        assert_eq!(index.binsize(), 2.0);
        assert_eq!(index.nbins(), 10);
        assert_eq!(index.samplemap(), &[0, 0, 0, 0, 1, 2, 2, 2, 2, 2]);
    }

    #[test]
    fn test_nested_model() {
        let index = ModelRangeIndex::build(&[model(1, 0.0, 20.0), model(2, 5.0, 10.0)]).unwrap();

        assert_eq!(index.ranges(), &[0.0, 5.0, 10.0, 20.0]);
        assert_eq!(index.selections(), &[vec![1], vec![1, 2], vec![1]]);
    }

    #[test]
    fn test_gap_leaves_empty_selection() {
        let index = ModelRangeIndex::build(&[model(1, 0.0, 4.0), model(2, 6.0, 10.0)]).unwrap();

        assert_eq!(index.ranges(), &[0.0, 4.0, 6.0, 10.0]);
        assert!(index.selections()[1].is_empty());
    }

    #[test]
    fn test_nearby_breakpoints_merge() {
        let index =
            ModelRangeIndex::build(&[model(1, 0.0, 10.0), model(2, 10.00005, 20.0)]).unwrap();
        assert_eq!(index.ranges().len(), 3);
    }

    #[test]
    fn test_nonzero_start() {
        let index = ModelRangeIndex::build(&[model(1, 2.0, 6.0), model(2, 6.0, 8.0)]).unwrap();

        assert_eq!(index.span(), (2.0, 8.0));
        assert_eq!(index.binsize(), 2.0);
        assert_eq!(index.nbins(), 3);
        assert_eq!(index.samplemap(), &[0, 0, 1]);
    }

    #[test]
    fn test_build_failures() {
        assert!(matches!(
            ModelRangeIndex::build(&[]),
            Err(ModelSetError::EmptyLibrary)
        ));
        assert!(matches!(
            ModelRangeIndex::build(&[model(4, 5.0, 1.0)]),
            Err(ModelSetError::InvalidRange { vueid: 4, .. })
        ));
        assert!(matches!(
            ModelRangeIndex::build(&[model(1, 0.0, 10.0), model(2, 5.0, 5.0)]),
            Err(ModelSetError::UncoveredModel { vueid: 2, .. })
        ));
    }

    #[test]
    fn test_narrow_model_rejected() {
        let err = ModelRangeIndex::build(&[model(1, 0.0, 10.0), model(2, 5.0, 5.005)]).unwrap_err();
        assert!(matches!(err, ModelSetError::UncoveredModel { vueid: 2, .. }));

        // Just wider than the margin is still selectable
        let index = ModelRangeIndex::build(&[model(1, 0.0, 10.0), model(2, 5.0, 5.02)]).unwrap();
        assert!(index.selections().iter().any(|s| s.contains(&2)));
    }

    #[test]
    fn test_every_model_is_selectable() {
        let models = [
            model(1, 0.0, 3.0),
            model(2, 1.0, 7.5),
            model(3, 2.5, 4.0),
            model(4, 7.5, 12.0),
            model(5, 0.0, 12.0),
        ];
        let index = ModelRangeIndex::build(&models).unwrap();

        for m in &models {
            assert!(
                index.selections().iter().any(|s| s.contains(&m.vueid)),
                "model {} missing from every selection",
                m.vueid
            );
        }
    }
}
