//! Lazily compiled regular expressions.

use std::sync::OnceLock;

use regex::Regex;

use crate::{OarssError, Result};

/// Compile `pattern` once into `cell` and return the shared instance.
pub(crate) fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> Result<&'static Regex> {
    if let Some(re) = cell.get() {
        return Ok(re);
    }
    let re = Regex::new(pattern)
        .map_err(|e| OarssError::Config(format!("invalid built-in pattern {pattern}: {e}")))?;
    Ok(cell.get_or_init(|| re))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_returns_same_instance() {
        static CELL: OnceLock<Regex> = OnceLock::new();
        let a = cached(&CELL, r"\d+").unwrap();
        let b = cached(&CELL, r"\d+").unwrap();
        assert!(std::ptr::eq(a, b));
        assert!(a.is_match("abc123"));
    }

    #[test]
    fn test_invalid_pattern() {
        static CELL: OnceLock<Regex> = OnceLock::new();
        let err = cached(&CELL, r"(unclosed").unwrap_err();
        assert!(matches!(err, OarssError::Config(_)));
        assert_eq!(err.kind(), crate::ErrorKind::PersistenceFailure);
        assert!(CELL.get().is_none());
    }
}
