//! Tree model libraries and height-based model assignment
//!
//! A [`ModelLibrary`] holds the renderable model variants, each valid for a
//! range of plant heights. [`ModelRangeIndex::build`] turns the library into
//! an immutable lookup structure; [`ModelRangeIndex::sample`] (or a
//! per-thread [`ModelSampler`]) then picks a model for each plant.
//!
//! # Example
//!
//! ```rust,ignore
//! use ecoviz_core::models::{ModelLibrary, TreeModel};
//! use rand::SeedableRng;
//!
//! let library: ModelLibrary = [
//!     TreeModel { vueid: 1, hmin: 0.0, hmax: 10.0, whratio: 0.6 },
//!     TreeModel { vueid: 2, hmin: 8.0, hmax: 30.0, whratio: 0.9 },
//! ]
//! .into_iter()
//! .collect();
//! let index = library.build_index()?;
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let (vueid, ratio) = index.sample(9.0, &mut rng)?;
//! ```

pub mod library;
pub mod range_index;
mod sampler;

// Re-exports
pub use library::{ModelLibrary, TreeModel};
pub use range_index::{ModelRangeIndex, BREAKPOINT_EPSILON, SELECTION_MARGIN};
pub use sampler::ModelSampler;
