//! Hierarchical check identifiers.
//!
//! An identifier is a dot-separated path such as `database.primary`. Each
//! segment names one edge of the registry tree. The empty string is the root.

use std::fmt;
use std::str::FromStr;

use crate::checks::error::CheckError;

/// Segment separator.
pub const SEPARATOR: char = '.';

/// A validated, case-sensitive path into the registry tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Identifier {
    segments: Vec<String>,
}

impl Identifier {
    /// The root identifier.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a raw identifier. The empty string yields the root; any empty
    /// segment (`"a..b"`, `".a"`, `"a."`) is rejected.
    pub fn parse(raw: &str) -> Result<Self, CheckError> {
        if raw.is_empty() {
            return Ok(Self::root());
        }

        let segments: Vec<String> = raw.split(SEPARATOR).map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(CheckError::InvalidIdentifier(raw.to_string()));
        }

        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment, i.e. the id a result node is reported under.
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// Identifier of the child `segment` below this one.
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }
}

impl FromStr for Identifier {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEPARATOR)?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_root() {
        let id = Identifier::parse("").unwrap();
        assert!(id.is_root());
        assert_eq!(id.leaf(), "");
        assert_eq!(id.to_string(), "");
    }

    #[test]
    fn test_segments_split_on_dots() {
        let id: Identifier = "database.primary".parse().unwrap();
        assert_eq!(id.segments(), &["database".to_string(), "primary".to_string()]);
        assert_eq!(id.leaf(), "primary");
        assert_eq!(id.to_string(), "database.primary");
    }

    #[test]
    fn test_empty_segments_rejected() {
        for raw in ["a..b", ".a", "a.", "."] {
            assert_eq!(
                Identifier::parse(raw),
                Err(CheckError::InvalidIdentifier(raw.to_string())),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_case_sensitive() {
        assert_ne!(Identifier::parse("DB").unwrap(), Identifier::parse("db").unwrap());
    }

    #[test]
    fn test_child() {
        let id = Identifier::root().child("db").child("replica");
        assert_eq!(id.to_string(), "db.replica");
    }
}
