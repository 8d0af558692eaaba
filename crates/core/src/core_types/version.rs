//! Dotted file-version comparison
//!
//! Simulation output carries a version string such as `"2.0"` or `"2.1.3"` on
//! its first line. Readers refuse files older than a caller-supplied minimum.

use crate::error::ImportError;

/// Check whether version `v1` is greater than or equal to `v2`
///
/// Both strings are split on `'.'` and compared component-wise as integers,
/// left to right. A component missing on either side counts as `0`, so
/// `"1.2.0"` and `"1.2"` compare equal.
///
/// # Errors
///
/// Returns [`ImportError::Parse`] if any present component is not an integer.
///
/// # Example
///
/// ```
/// use ecoviz_core::core_types::version_gteq;
///
/// assert!(version_gteq("1.2.0", "1.2").unwrap());
/// assert!(!version_gteq("1.1.9", "1.2.0").unwrap());
/// assert!(version_gteq("2", "1.9.9").unwrap());
/// ```
pub fn version_gteq(v1: &str, v2: &str) -> Result<bool, ImportError> {
    let lhs = parse_components(v1)?;
    let rhs = parse_components(v2)?;

    for i in 0..lhs.len().max(rhs.len()) {
        let a = lhs.get(i).copied().unwrap_or(0);
        let b = rhs.get(i).copied().unwrap_or(0);
        if a > b {
            return Ok(true);
        }
        if a < b {
            return Ok(false);
        }
    }

    Ok(true)
}

fn parse_components(version: &str) -> Result<Vec<i64>, ImportError> {
    version
        .split('.')
        .map(|token| {
            token
                .trim()
                .parse::<i64>()
                .map_err(|_| ImportError::parse("version component", token))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_zero_components_are_equal() {
        assert!(version_gteq("1.2.0", "1.2").unwrap());
        assert!(version_gteq("1.2", "1.2.0").unwrap());
        assert!(version_gteq("2.0", "2.0").unwrap());
    }

    #[test]
    fn test_ordering_decided_by_first_difference() {
        assert!(!version_gteq("1.1.9", "1.2.0").unwrap());
        assert!(version_gteq("2", "1.9.9").unwrap());
        assert!(version_gteq("2.10", "2.9").unwrap());
        assert!(!version_gteq("1.9", "2").unwrap());
    }

    #[test]
    fn test_missing_component_counts_as_zero() {
        assert!(!version_gteq("2", "2.0.1").unwrap());
        assert!(version_gteq("2.0.1", "2").unwrap());
    }

    #[test]
    fn test_invalid_component_is_parse_error() {
        assert!(matches!(
            version_gteq("2.x", "2.0"),
            Err(ImportError::Parse { .. })
        ));
        assert!(matches!(
            version_gteq("2.0", ""),
            Err(ImportError::Parse { .. })
        ));
        // Rejected even when an earlier component already decides the order
        assert!(matches!(
            version_gteq("3.x", "2"),
            Err(ImportError::Parse { .. })
        ));
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert!(version_gteq(" 2.1 ", "2.1").unwrap());
    }
}
