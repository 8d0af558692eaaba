//! Height-ranged tree model variants

use super::range_index::ModelRangeIndex;
use crate::error::ModelSetError;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// One renderable tree model, eligible for plants within a height range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeModel {
    /// Model identifier
    pub vueid: i32,
    /// Lowest plant height this model is used for
    pub hmin: f32,
    /// Highest plant height this model is used for
    pub hmax: f32,
    /// Crown width-to-height display ratio
    pub whratio: f32,
}

/// Model collection kept ordered by `hmin`
///
/// Models with equal `hmin` keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelLibrary {
    models: Vec<TreeModel>,
}

impl ModelLibrary {
    /// Create an empty library
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a model after every model whose `hmin` is not greater
    pub fn add(&mut self, model: TreeModel) {
        let pos = self.models.partition_point(|m| m.hmin <= model.hmin);
        self.models.insert(pos, model);
    }

    /// Load a library from a JSON array of `{"vueid", "hmin", "hmax", "whratio"}`
    ///
    /// # Errors
    ///
    /// Returns [`ModelSetError::Json`] if the document is not a model array.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, ModelSetError> {
        let models: Vec<TreeModel> = serde_json::from_reader(reader)?;
        Ok(models.into_iter().collect())
    }

    /// Models in ascending `hmin` order
    pub fn models(&self) -> &[TreeModel] {
        &self.models
    }

    /// Number of models
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the library is empty
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Build the height lookup index for this library
    ///
    /// # Errors
    ///
    /// See [`ModelRangeIndex::build`].
    pub fn build_index(&self) -> Result<ModelRangeIndex, ModelSetError> {
        ModelRangeIndex::build(&self.models)
    }
}

impl FromIterator<TreeModel> for ModelLibrary {
    fn from_iter<I: IntoIterator<Item = TreeModel>>(iter: I) -> Self {
        let mut library = Self::new();
        for model in iter {
            library.add(model);
        }
        library
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
    fn test_add_keeps_hmin_order() {
        let mut library = ModelLibrary::new();
        library.add(model(1, 5.0, 10.0));
        library.add(model(2, 0.0, 5.0));
        library.add(model(3, 5.0, 8.0));
        library.add(model(4, 0.0, 2.0));

        let ids: Vec<i32> = library.models().iter().map(|m| m.vueid).collect();
        assert_eq!(ids, vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_from_json() {
        let json = br#"[
            {"vueid": 7, "hmin": 10.0, "hmax": 20.0, "whratio": 0.8},
            {"vueid": 3, "hmin": 0.0, "hmax": 10.0, "whratio": 1.2}
        ]"#;
        let library = ModelLibrary::from_json_reader(&json[..]).unwrap();

        assert_eq!(library.len(), 2);
        assert_eq!(library.models()[0].vueid, 3);
        assert_eq!(library.models()[1].whratio, 0.8);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(matches!(
            ModelLibrary::from_json_reader(&b"{\"vueid\": 1}"[..]),
            Err(ModelSetError::Json(_))
        ));
    }
}
