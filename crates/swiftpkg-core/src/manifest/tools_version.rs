//! Tools version extraction
//!
//! The first line of a manifest may carry a comment of the form
//! `// swift-tools-version:5.3`. Manifests that predate the comment get a
//! documented default.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while determining a package's tools version
#[derive(Debug, Error)]
pub enum ToolsVersionError {
    /// Tools-version comment present but unparsable, or its keyword is
    /// misspelled
    #[error("malformed tools version specifier `{specifier}` (current tools version {current})")]
    MalformedToolsVersion {
        specifier: String,
        current: ToolsVersion,
    },

    /// Package directory could not be accessed
    #[error("package at {} is inaccessible: {reason}", .path.display())]
    InaccessiblePackage { path: PathBuf, reason: String },

    /// Manifest file could not be accessed
    #[error("manifest at {} is inaccessible: {reason}", .path.display())]
    InaccessibleManifest { path: PathBuf, reason: String },
}

/// Version of the toolchain a manifest requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolsVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl ToolsVersion {
    /// The version assumed for manifests without a tools-version comment
    pub const V3: ToolsVersion = ToolsVersion::new(3, 0, 0);

    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        ToolsVersion {
            major,
            minor,
            patch,
        }
    }

    /// Parse a `major.minor[.patch]` specifier
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let mut numbers = s.split('.');
        let major = numbers.next()?.parse().ok()?;
        let minor = numbers.next()?.parse().ok()?;
        let patch = match numbers.next() {
            Some(n) => n.parse().ok()?,
            None => 0,
        };
        if numbers.next().is_some() {
            return None;
        }
        Some(ToolsVersion::new(major, minor, patch))
    }
}

impl fmt::Display for ToolsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

const COMMENT_PREFIX: &str = "// swift-tools-version:";

/// First-line fragments that indicate a misspelled tools-version comment
const KNOWN_MISSPELLINGS: [&str; 2] = ["swift-tool", "tool-version"];

/// Extract the tools version declared on the first line of a manifest.
///
/// The comment is matched case-insensitively; everything between the colon
/// and an optional `;` is the version specifier. A manifest whose first
/// line does not carry the comment gets [`ToolsVersion::V3`], unless the
/// line contains a known misspelling of the keyword, which is an error.
pub fn parse_tools_version(
    contents: &[u8],
    current: ToolsVersion,
) -> Result<ToolsVersion, ToolsVersionError> {
    let first_line = contents.split(|&b| b == b'\n').next().unwrap_or(&[]);
    let decoded = String::from_utf8_lossy(first_line);
    let line: &str = decoded.strip_suffix('\r').unwrap_or(decoded.as_ref());

    match line.get(..COMMENT_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(COMMENT_PREFIX) => {
            let specifier = line[COMMENT_PREFIX.len()..].split(';').next().unwrap_or("");
            ToolsVersion::parse(specifier).ok_or_else(|| {
                ToolsVersionError::MalformedToolsVersion {
                    specifier: specifier.to_string(),
                    current,
                }
            })
        }
        _ => {
            let lowered = line.to_lowercase();
            if KNOWN_MISSPELLINGS.iter().any(|m| lowered.contains(m)) {
                Err(ToolsVersionError::MalformedToolsVersion {
                    specifier: line.to_string(),
                    current,
                })
            } else {
                Ok(ToolsVersion::V3)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT: ToolsVersion = ToolsVersion::new(5, 5, 0);

    #[test]
    fn test_parse_specifier() {
        assert_eq!(ToolsVersion::parse("5.3"), Some(ToolsVersion::new(5, 3, 0)));
        assert_eq!(ToolsVersion::parse("4.2.1"), Some(ToolsVersion::new(4, 2, 1)));
        assert_eq!(ToolsVersion::parse(" 5.3 "), Some(ToolsVersion::new(5, 3, 0)));
        assert_eq!(ToolsVersion::parse("5"), None);
        assert_eq!(ToolsVersion::parse("5.3.0.1"), None);
        assert_eq!(ToolsVersion::parse("abc"), None);
        assert_eq!(ToolsVersion::parse(""), None);
    }

    #[test]
    fn test_comment_with_minor_version() {
        let version = parse_tools_version(b"// swift-tools-version:5.3\nimport PackageDescription\n", CURRENT).unwrap();
        assert_eq!(version, ToolsVersion::new(5, 3, 0));
    }

    #[test]
    fn test_comment_is_case_insensitive_and_allows_trailing_fields() {
        let version = parse_tools_version(b"// SWIFT-TOOLS-VERSION:4.2;package-manager\n", CURRENT).unwrap();
        assert_eq!(version, ToolsVersion::new(4, 2, 0));
    }

    #[test]
    fn test_misspelled_keyword_is_an_error() {
        let err = parse_tools_version(b"// swift-tool-version:5\n", CURRENT).unwrap_err();
        assert!(matches!(err, ToolsVersionError::MalformedToolsVersion { .. }));
    }

    #[test]
    fn test_unparsable_specifier_is_an_error() {
        let err = parse_tools_version(b"// swift-tools-version:abc\n", CURRENT).unwrap_err();
        match err {
            ToolsVersionError::MalformedToolsVersion { specifier, .. } => {
                assert_eq!(specifier, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_comment_defaults_to_v3() {
        assert_eq!(parse_tools_version(b"", CURRENT).unwrap(), ToolsVersion::V3);
        assert_eq!(
            parse_tools_version(b"import PackageDescription\n", CURRENT).unwrap(),
            ToolsVersion::V3
        );
    }

    #[test]
    fn test_crlf_line_ending() {
        let version = parse_tools_version(b"// swift-tools-version:5.1\r\n...", CURRENT).unwrap();
        assert_eq!(version, ToolsVersion::new(5, 1, 0));
    }

    #[test]
    fn test_ordering() {
        assert!(ToolsVersion::new(4, 2, 0) < ToolsVersion::new(5, 0, 0));
        assert!(ToolsVersion::new(5, 0, 0) < ToolsVersion::new(5, 0, 1));
    }
}
