//! Individually resolved trees and aggregated undergrowth cohorts
//!
//! A simulation timestep describes vegetation at two levels of detail:
//!
//! - **Trees** are large plants with an explicit position, height, crown
//!   radius and diameter at breast height (dbh).
//! - **Cohorts** summarise many small plants sharing one grid cell. Each
//!   cohort covers a fixed 2×2 cell footprint starting at `(xs, ys)` and
//!   carries mean dbh/height plus an estimated (fractional) plant count.

use crate::error::ImportError;
use serde::{Deserialize, Serialize};

/// Side length of a cohort footprint in grid cells
pub const COHORT_FOOTPRINT: i32 = 2;

/// Individually resolved tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Species index resolved from the file's species code
    pub species: u32,
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
}

/// Aggregated record of dense sub-canopy plants in one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    /// Footprint start x
    pub xs: i32,
    /// Footprint start y
    pub ys: i32,
    /// Footprint end x (always `xs + 2`)
    pub xe: i32,
    /// Footprint end y (always `ys + 2`)
    pub ye: i32,
    /// Species index resolved from the file's species code
    pub species: u32,
    /// Mean diameter at breast height
    pub dbh: f32,
    /// Mean height in metres
    pub height: f32,
    /// Estimated number of plants, not necessarily integral
    pub nplants: f32,
}

impl Cohort {
    /// Create a cohort anchored at `(xs, ys)` with the fixed 2×2 footprint
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the footprint end overflows `i32`; use
    /// [`Cohort::try_new`] for coordinates read from a file.
    #[must_use]
    pub fn new(xs: i32, ys: i32, species: u32, dbh: f32, height: f32, nplants: f32) -> Self {
        Self {
            xs,
            ys,
            xe: xs + COHORT_FOOTPRINT,
            ye: ys + COHORT_FOOTPRINT,
            species,
            dbh,
            height,
            nplants,
        }
    }

    /// Create a cohort, rejecting anchors whose footprint end overflows `i32`
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Parse`] if `xs` or `ys` lies within the
    /// footprint of `i32::MAX`.
    pub fn try_new(
        xs: i32,
        ys: i32,
        species: u32,
        dbh: f32,
        height: f32,
        nplants: f32,
    ) -> Result<Self, ImportError> {
        let xe = xs
            .checked_add(COHORT_FOOTPRINT)
            .ok_or_else(|| ImportError::parse("cohort footprint x", xs.to_string()))?;
        let ye = ys
            .checked_add(COHORT_FOOTPRINT)
            .ok_or_else(|| ImportError::parse("cohort footprint y", ys.to_string()))?;
        Ok(Self {
            xs,
            ys,
            xe,
            ye,
            species,
            dbh,
            height,
            nplants,
        })
    }

    /// Cell width and height covered by this cohort
    #[must_use]
    pub fn cell_size(&self) -> (f32, f32) {
        ((self.xe - self.xs) as f32, (self.ye - self.ys) as f32)
    }

    /// Centre of the footprint in grid coordinates
    #[must_use]
    pub fn middle(&self) -> (f32, f32) {
        (
            (self.xs + self.xe) as f32 / 2.0,
            (self.ys + self.ye) as f32 / 2.0,
        )
    }

    /// Footprint area in square cells
    #[must_use]
    pub fn area(&self) -> f32 {
        let (dx, dy) = self.cell_size();
        dx * dy
    }
}
