//! Semantic version parsing
//!
//! Provides the `Version` type used for registry release lists.

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Errors that can occur during version parsing
#[derive(Debug, Error)]
pub enum SemverError {
    /// Not a MAJOR.MINOR.PATCH version
    #[error("Invalid version: {0}")]
    InvalidVersion(String),
}

/// Semantic version (MAJOR.MINOR.PATCH with optional prerelease and build metadata)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
    pub build: Option<String>,
}

impl Version {
    /// Create a release version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version {
            major,
            minor,
            patch,
            prerelease: None,
            build: None,
        }
    }

    /// Parse a version string
    pub fn parse(s: &str) -> Result<Self, SemverError> {
        let s = s.trim();
        let s = s.strip_prefix('v').unwrap_or(s);

        // Build metadata comes after '+', prerelease after the first '-'
        let (s, build) = match s.split_once('+') {
            Some((head, tail)) => (head, Some(tail.to_string())),
            None => (s, None),
        };
        let (core, prerelease) = match s.split_once('-') {
            Some((head, tail)) => (head, Some(tail.to_string())),
            None => (s, None),
        };

        let mut numbers = core.split('.');
        let major = parse_number(&mut numbers, s)?;
        let minor = parse_number(&mut numbers, s)?;
        let patch = parse_number(&mut numbers, s)?;
        if numbers.next().is_some() {
            return Err(SemverError::InvalidVersion(s.to_string()));
        }

        Ok(Version {
            major,
            minor,
            patch,
            prerelease,
            build,
        })
    }

    /// Check if this is a prerelease version
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }
}

fn parse_number(parts: &mut std::str::Split<'_, char>, original: &str) -> Result<u64, SemverError> {
    parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(|| SemverError::InvalidVersion(original.to_string()))
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }
        if let Some(ref build) = self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                // A prerelease sorts before the release it precedes
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}
