//! Species code lookup
//!
//! Simulation files name species by a 4-character alpha code (e.g. `"PIAB"`).
//! The species metadata store lives outside this crate; it hands us a table
//! mapping each code to a small species index, which is what trees and
//! cohorts carry once decoded.

use crate::error::ImportError;
use rustc_hash::FxHashMap;
use std::io::Read;

/// Length in bytes of a species alpha code
pub const SPECIES_CODE_LEN: usize = 4;

/// Bidirectional map between species alpha codes and species indices
#[derive(Debug, Clone, Default)]
pub struct SpeciesLookup {
    by_code: FxHashMap<String, u32>,
    by_index: FxHashMap<u32, String>,
}

impl SpeciesLookup {
    /// Create an empty lookup
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `code` under `index`, replacing any previous entry for the code
    pub fn insert(&mut self, code: impl Into<String>, index: u32) {
        let code = code.into();
        if let Some(old) = self.by_code.insert(code.clone(), index) {
            // Another code may share the old index
            if self.by_index.get(&old) == Some(&code) {
                self.by_index.remove(&old);
            }
        }
        self.by_index.insert(index, code);
    }

    /// Load a lookup from a JSON object such as `{"ABAL": 0, "PIAB": 1}`
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Json`] if the document is not a code→index object.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, ImportError> {
        let table: FxHashMap<String, u32> = serde_json::from_reader(reader)?;
        Ok(table.into_iter().collect())
    }

    /// Resolve a species code to its index
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::UnknownSpecies`] if the code is not registered.
    pub fn resolve(&self, code: &str) -> Result<u32, ImportError> {
        self.by_code
            .get(code)
            .copied()
            .ok_or_else(|| ImportError::UnknownSpecies {
                code: code.to_string(),
            })
    }

    /// Find the code registered for a species index
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::UnknownSpeciesIndex`] if no code maps to `index`.
    pub fn code_for(&self, index: u32) -> Result<&str, ImportError> {
        self.by_index
            .get(&index)
            .map(String::as_str)
            .ok_or(ImportError::UnknownSpeciesIndex { index })
    }

    /// Number of registered codes
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Whether no codes are registered
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for SpeciesLookup {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        let mut lookup = Self::new();
        for (code, index) in iter {
            lookup.insert(code, index);
        }
        lookup
    }
}

/// Pack a species code into its fixed 4-byte form
///
/// # Errors
///
/// Returns [`ImportError::InvalidSpeciesCode`] unless the code is exactly
/// [`SPECIES_CODE_LEN`] bytes long.
pub fn code_to_bytes(code: &str) -> Result<[u8; SPECIES_CODE_LEN], ImportError> {
    code.as_bytes()
        .try_into()
        .map_err(|_| ImportError::InvalidSpeciesCode {
            code: code.to_string(),
        })
}

/// Unpack a fixed 4-byte species code
///
/// # Errors
///
/// Returns [`ImportError::InvalidSpeciesCode`] if the bytes are not UTF-8.
pub fn code_from_bytes(bytes: [u8; SPECIES_CODE_LEN]) -> Result<String, ImportError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| ImportError::InvalidSpeciesCode {
        code: String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_both_directions() {
        let lookup: SpeciesLookup = [("ABAL", 0), ("PIAB", 1)].into_iter().collect();

        assert_eq!(lookup.resolve("PIAB").unwrap(), 1);
        assert_eq!(lookup.code_for(0).unwrap(), "ABAL");
        assert_eq!(lookup.len(), 2);
    }

    #[test]
    fn test_unknown_code_is_error() {
        let lookup: SpeciesLookup = [("ABAL", 0)].into_iter().collect();
        assert!(matches!(
            lookup.resolve("FASY"),
            Err(ImportError::UnknownSpecies { code }) if code == "FASY"
        ));
        assert!(matches!(
            lookup.code_for(9),
            Err(ImportError::UnknownSpeciesIndex { index: 9 })
        ));
    }

    #[test]
    fn test_reinsert_replaces_reverse_entry() {
        let mut lookup = SpeciesLookup::new();
        lookup.insert("ABAL", 0);
        lookup.insert("ABAL", 3);

        assert_eq!(lookup.resolve("ABAL").unwrap(), 3);
        assert!(lookup.code_for(0).is_err());
        assert_eq!(lookup.code_for(3).unwrap(), "ABAL");
    }

    #[test]
    fn test_reinsert_keeps_shared_index() {
        let mut lookup = SpeciesLookup::new();
        lookup.insert("ABAL", 0);
        lookup.insert("PICE", 0);
        lookup.insert("ABAL", 5);

        assert_eq!(lookup.code_for(0).unwrap(), "PICE");
        assert_eq!(lookup.code_for(5).unwrap(), "ABAL");
        assert_eq!(lookup.resolve("PICE").unwrap(), 0);
    }

    #[test]
    fn test_from_json() {
        let json = br#"{"ABAL": 0, "PIAB": 1, "FASY": 2}"#;
        let lookup = SpeciesLookup::from_json_reader(&json[..]).unwrap();
        assert_eq!(lookup.len(), 3);
        assert_eq!(lookup.resolve("FASY").unwrap(), 2);

        assert!(matches!(
            SpeciesLookup::from_json_reader(&b"[1, 2]"[..]),
            Err(ImportError::Json(_))
        ));
    }

    #[test]
    fn test_code_bytes() {
        assert_eq!(code_to_bytes("PIAB").unwrap(), *b"PIAB");
        assert!(matches!(
            code_to_bytes("PIA"),
            Err(ImportError::InvalidSpeciesCode { .. })
        ));
        assert_eq!(code_from_bytes(*b"ABAL").unwrap(), "ABAL");
        assert!(code_from_bytes([0xff, 0xfe, b'A', b'B']).is_err());
    }
}
