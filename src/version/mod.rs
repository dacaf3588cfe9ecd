// src/version/mod.rs

//! Version handling and range satisfaction for installable units
//!
//! This module provides version parsing and comparison for dotted numeric
//! versions with an optional trailing qualifier (`major.minor.micro[.qualifier]`),
//! and version ranges used by update descriptors and requirements.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A parsed component version: dotted numeric segments plus optional qualifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    /// Numeric segments, most significant first; missing segments compare as 0
    pub segments: Vec<u64>,
    /// Optional non-numeric qualifier (e.g. "beta", "20240115")
    pub qualifier: Option<String>,
}

impl Version {
    /// Create a three-segment version with no qualifier
    pub fn new(major: u64, minor: u64, micro: u64) -> Self {
        Self {
            segments: vec![major, minor, micro],
            qualifier: None,
        }
    }

    /// Parse a version string
    ///
    /// Format: dotted numeric segments with an optional trailing qualifier.
    /// Examples:
    /// - "1.2.3" → segments=[1,2,3], qualifier=None
    /// - "1.2" → segments=[1,2], qualifier=None
    /// - "1.2.3.beta" → segments=[1,2,3], qualifier=Some("beta")
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::VersionParse(s.to_string()));
        }

        let mut segments = Vec::new();
        let mut qualifier_parts = Vec::new();
        for part in s.split('.') {
            if qualifier_parts.is_empty() {
                match part.parse::<u64>() {
                    Ok(n) => {
                        segments.push(n);
                        continue;
                    }
                    Err(_) => qualifier_parts.push(part),
                }
            } else {
                qualifier_parts.push(part);
            }
        }

        if segments.is_empty() {
            return Err(Error::VersionParse(s.to_string()));
        }

        let qualifier = if qualifier_parts.is_empty() {
            None
        } else {
            Some(qualifier_parts.join("."))
        };

        Ok(Self {
            segments,
            qualifier,
        })
    }

    /// Convert the first three segments to a semver::Version for comparison
    ///
    /// Versions here may carry fewer or more than three segments, so we
    /// normalize: missing segments are treated as 0 and surplus segments are
    /// compared separately after the semver core.
    fn to_semver(&self) -> semver::Version {
        let major = self.segments.first().copied().unwrap_or(0);
        let minor = self.segments.get(1).copied().unwrap_or(0);
        let patch = self.segments.get(2).copied().unwrap_or(0);
        semver::Version::new(major, minor, patch)
    }

    /// Compare two versions
    pub fn compare(&self, other: &Version) -> Ordering {
        // Core three segments via semver
        match self.to_semver().cmp(&other.to_semver()) {
            Ordering::Equal => {}
            ord => return ord,
        }

        // Surplus segments, missing treated as 0
        let len = self.segments.len().max(other.segments.len());
        for i in 3..len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }

        // Finally the qualifier; absent sorts below present
        self.qualifier.cmp(&other.qualifier)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.segments.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", joined.join("."))?;
        if let Some(ref q) = self.qualifier {
            write!(f, ".{}", q)?;
        }
        Ok(())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A range of acceptable versions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionRange {
    /// Any version is acceptable
    Any,
    /// Exact version match
    Exact(Version),
    /// Greater than or equal
    GreaterOrEqual(Version),
    /// Less than
    LessThan(Version),
    /// Bounded interval
    Between {
        lower: Version,
        lower_inclusive: bool,
        upper: Version,
        upper_inclusive: bool,
    },
}

impl VersionRange {
    /// Parse a version range string
    ///
    /// Examples:
    /// - "*" or "" → Any
    /// - "[1.0, 2.0)" → Between, lower inclusive, upper exclusive
    /// - ">= 1.2" → GreaterOrEqual(1.2)
    /// - "< 2.0" → LessThan(2.0)
    /// - "1.5" → Exact(1.5)
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "*" {
            return Ok(VersionRange::Any);
        }

        // Interval syntax: [a, b), (a, b], etc.
        if s.starts_with('[') || s.starts_with('(') {
            let lower_inclusive = s.starts_with('[');
            let upper_inclusive = s.ends_with(']');
            if !s.ends_with(']') && !s.ends_with(')') {
                return Err(Error::RangeParse(s.to_string()));
            }
            let inner = &s[1..s.len() - 1];
            let parts: Vec<&str> = inner.split(',').map(|p| p.trim()).collect();
            if parts.len() != 2 {
                return Err(Error::RangeParse(s.to_string()));
            }
            let lower = Version::parse(parts[0])?;
            let upper = Version::parse(parts[1])?;
            return Ok(VersionRange::Between {
                lower,
                lower_inclusive,
                upper,
                upper_inclusive,
            });
        }

        if let Some(rest) = s.strip_prefix(">=") {
            Ok(VersionRange::GreaterOrEqual(Version::parse(rest)?))
        } else if let Some(rest) = s.strip_prefix('<') {
            Ok(VersionRange::LessThan(Version::parse(rest)?))
        } else if let Some(rest) = s.strip_prefix('=') {
            Ok(VersionRange::Exact(Version::parse(rest)?))
        } else {
            // No operator means exact match
            Ok(VersionRange::Exact(Version::parse(s)?))
        }
    }

    /// Check if a version falls inside this range
    pub fn includes(&self, version: &Version) -> bool {
        match self {
            VersionRange::Any => true,
            VersionRange::Exact(v) => version == v,
            VersionRange::GreaterOrEqual(v) => version >= v,
            VersionRange::LessThan(v) => version < v,
            VersionRange::Between {
                lower,
                lower_inclusive,
                upper,
                upper_inclusive,
            } => {
                let above = if *lower_inclusive {
                    version >= lower
                } else {
                    version > lower
                };
                let below = if *upper_inclusive {
                    version <= upper
                } else {
                    version < upper
                };
                above && below
            }
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionRange::Any => write!(f, "*"),
            VersionRange::Exact(v) => write!(f, "= {}", v),
            VersionRange::GreaterOrEqual(v) => write!(f, ">= {}", v),
            VersionRange::LessThan(v) => write!(f, "< {}", v),
            VersionRange::Between {
                lower,
                lower_inclusive,
                upper,
                upper_inclusive,
            } => write!(
                f,
                "{}{}, {}{}",
                if *lower_inclusive { '[' } else { '(' },
                lower,
                upper,
                if *upper_inclusive { ']' } else { ')' },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse_simple() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!(v.segments, vec![1, 2, 3]);
        assert_eq!(v.qualifier, None);
    }

    #[test]
    fn test_version_parse_short() {
        let v = Version::parse("1.2").unwrap();
        assert_eq!(v.segments, vec![1, 2]);
    }

    #[test]
    fn test_version_parse_with_qualifier() {
        let v = Version::parse("1.2.3.beta.1").unwrap();
        assert_eq!(v.segments, vec![1, 2, 3]);
        assert_eq!(v.qualifier, Some("beta.1".to_string()));
    }

    #[test]
    fn test_version_parse_empty_fails() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("beta").is_err());
    }

    #[test]
    fn test_version_compare() {
        let v1 = Version::parse("1.2.3").unwrap();
        let v2 = Version::parse("1.2.4").unwrap();
        assert!(v1 < v2);
    }

    #[test]
    fn test_version_compare_missing_segments_are_zero() {
        let v1 = Version::parse("1.2").unwrap();
        let v2 = Version::parse("1.2.0").unwrap();
        assert_eq!(v1.cmp(&v2), Ordering::Equal);
    }

    #[test]
    fn test_version_compare_fourth_segment() {
        let v1 = Version::parse("1.2.3.4").unwrap();
        let v2 = Version::parse("1.2.3.5").unwrap();
        assert!(v1 < v2);
    }

    #[test]
    fn test_version_compare_qualifier() {
        let plain = Version::parse("1.2.3").unwrap();
        let tagged = Version::parse("1.2.3.beta").unwrap();
        assert!(plain < tagged);
    }

    #[test]
    fn test_version_display() {
        let v = Version::parse("1.2.3.beta").unwrap();
        assert_eq!(v.to_string(), "1.2.3.beta");
    }

    #[test]
    fn test_range_parse_any() {
        let r = VersionRange::parse("*").unwrap();
        assert!(r.includes(&Version::new(99, 0, 0)));
    }

    #[test]
    fn test_range_parse_exact() {
        let r = VersionRange::parse("1.5").unwrap();
        assert!(r.includes(&Version::parse("1.5").unwrap()));
        assert!(!r.includes(&Version::parse("1.5.1").unwrap()));
    }

    #[test]
    fn test_range_parse_greater_or_equal() {
        let r = VersionRange::parse(">= 1.2").unwrap();
        assert!(r.includes(&Version::parse("1.2").unwrap()));
        assert!(r.includes(&Version::parse("2.0").unwrap()));
        assert!(!r.includes(&Version::parse("1.1").unwrap()));
    }

    #[test]
    fn test_range_parse_interval() {
        let r = VersionRange::parse("[1.0, 2.0)").unwrap();
        assert!(r.includes(&Version::parse("1.0").unwrap()));
        assert!(r.includes(&Version::parse("1.9.9").unwrap()));
        assert!(!r.includes(&Version::parse("2.0").unwrap()));
        assert!(!r.includes(&Version::parse("0.9").unwrap()));
    }

    #[test]
    fn test_range_parse_interval_exclusive_lower() {
        let r = VersionRange::parse("(1.0, 2.0]").unwrap();
        assert!(!r.includes(&Version::parse("1.0").unwrap()));
        assert!(r.includes(&Version::parse("2.0").unwrap()));
    }

    #[test]
    fn test_range_parse_invalid() {
        assert!(VersionRange::parse("[1.0").is_err());
        assert!(VersionRange::parse("[1.0, 2.0, 3.0)").is_err());
    }

    #[test]
    fn test_range_display_roundtrip() {
        let r = VersionRange::parse("[1.0, 2.0)").unwrap();
        assert_eq!(r.to_string(), "[1.0, 2.0)");
        let r2 = VersionRange::parse(&r.to_string()).unwrap();
        assert_eq!(r, r2);
    }
}
