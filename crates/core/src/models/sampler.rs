//! Random model assignment by plant height

use super::range_index::ModelRangeIndex;
use crate::error::ModelSetError;
use rand::Rng;

impl ModelRangeIndex {
    /// Index of the sub-interval a height resolves to
    ///
    /// When the height's bin straddles a breakpoint, heights strictly above
    /// the breakpoint resolve to the later sub-interval.
    ///
    /// # Errors
    ///
    /// Returns [`ModelSetError::HeightOutOfRange`] if the height lies below
    /// the first breakpoint, above the last, or past the final bin.
    pub fn selection_index(&self, height: f32) -> Result<usize, ModelSetError> {
        let (min, max) = self.span();
        let out_of_range = || ModelSetError::HeightOutOfRange { height, min, max };

        let offset = (height - min) / self.binsize;
        if offset.is_nan() || offset < 0.0 || height > max {
            return Err(out_of_range());
        }
        let idx = offset.floor() as usize;
        if idx >= self.samplemap.len() {
            return Err(out_of_range());
        }

        let here = self.samplemap[idx];
        match self.samplemap.get(idx + 1) {
            Some(&next) if next != here && height > self.ranges[next] => Ok(next),
            _ => Ok(here),
        }
    }

    /// Candidate model ids for a height
    ///
    /// # Errors
    ///
    /// - [`ModelSetError::HeightOutOfRange`] as for [`Self::selection_index`]
    /// - [`ModelSetError::EmptySelection`] if no model covers the height
    pub fn select(&self, height: f32) -> Result<&[i32], ModelSetError> {
        let selection = self.selection_index(height)?;
        let candidates = &self.selections[selection];
        if candidates.is_empty() {
            return Err(ModelSetError::EmptySelection { selection, height });
        }
        Ok(candidates)
    }

    /// Display ratio for a model: its width-to-height ratio halved
    ///
    /// # Errors
    ///
    /// Returns [`ModelSetError::UnknownModel`] if `vueid` was not indexed.
    pub fn ratio_for(&self, vueid: i32) -> Result<f32, ModelSetError> {
        self.ratios
            .get(&vueid)
            .copied()
            .ok_or(ModelSetError::UnknownModel(vueid))
    }

    /// Draw a model for a plant of the given height
    ///
    /// # Arguments
    ///
    /// * `height` - Plant height
    /// * `rng` - Random source; each caller supplies its own
    ///
    /// # Returns
    ///
    /// `(vueid, ratio)` of a model chosen uniformly among those eligible
    ///
    /// # Errors
    ///
    /// See [`Self::select`].
    pub fn sample(&self, height: f32, rng: &mut impl Rng) -> Result<(i32, f32), ModelSetError> {
        let candidates = self.select(height)?;
        let vueid = candidates[rng.random_range(0..candidates.len())];
        Ok((vueid, self.ratio_for(vueid)?))
    }
}

/// Index paired with a caller-owned random source
///
/// Convenient when one worker assigns models to many plants; create one
/// sampler per thread over a shared index.
#[derive(Debug)]
pub struct ModelSampler<'a, R> {
    index: &'a ModelRangeIndex,
    rng: R,
}

impl<'a, R: Rng> ModelSampler<'a, R> {
    /// Create a sampler drawing from `rng`
    pub fn new(index: &'a ModelRangeIndex, rng: R) -> Self {
        Self { index, rng }
    }

    /// Draw a model for a plant of the given height
    ///
    /// # Errors
    ///
    /// See [`ModelRangeIndex::sample`].
    pub fn sample(&mut self, height: f32) -> Result<(i32, f32), ModelSetError> {
        self.index.sample(height, &mut self.rng)
    }

    /// Index this sampler draws from
    pub fn index(&self) -> &ModelRangeIndex {
        self.index
    }

    /// Recover the random source
    pub fn into_rng(self) -> R {
        self.rng
    }
}
