//! Namespace-scoped package identity
//!
//! Registry packages are addressed as `@namespace/name`. The namespace is
//! restricted to ASCII; the name admits any identifier the Unicode XID
//! properties allow. Comparison folds case, diacritics, and compatibility
//! variants so that visually equivalent spellings denote one package.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use unicode_ident::{is_xid_continue, is_xid_start};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Maximum namespace length, not counting the leading `@`
const NAMESPACE_MAX_LENGTH: usize = 40;

/// Maximum name length in code points
const NAME_MAX_LENGTH: usize = 128;

/// Registry namespace, stored with its leading `@`.
///
/// Comparison and hashing are ASCII-case-insensitive; the input spelling is
/// preserved for display.
#[derive(Debug, Clone)]
pub struct Namespace(String);

impl Namespace {
    /// Parse a namespace, returning `None` when it is not valid.
    ///
    /// Valid namespaces are `@` followed by ASCII letters or digits,
    /// optionally separated by single hyphens, at most 40 characters after
    /// the `@`.
    pub fn parse(s: &str) -> Option<Self> {
        let content = s.strip_prefix('@')?;
        if content.is_empty() || content.len() > NAMESPACE_MAX_LENGTH {
            return None;
        }
        let bytes = content.as_bytes();
        if !bytes[0].is_ascii_alphanumeric() || !bytes[bytes.len() - 1].is_ascii_alphanumeric() {
            return None;
        }
        let mut previous_hyphen = false;
        for &byte in bytes {
            if byte == b'-' {
                if previous_hyphen {
                    return None;
                }
                previous_hyphen = true;
            } else if byte.is_ascii_alphanumeric() {
                previous_hyphen = false;
            } else {
                return None;
            }
        }
        Some(Namespace(s.to_string()))
    }

    /// The namespace as written, including the leading `@`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace without its leading `@`, as it appears in registry
    /// URL paths
    pub fn unprefixed(&self) -> &str {
        &self.0[1..]
    }

    fn folded_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.bytes().map(|b| b.to_ascii_lowercase())
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Namespace {}

impl PartialOrd for Namespace {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Namespace {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded_bytes().cmp(other.folded_bytes())
    }
}

impl Hash for Namespace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.folded_bytes() {
            state.write_u8(byte);
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry package name.
///
/// Comparison and hashing use a folded key (NFKC, then case folding, then
/// diacritic removal); the input spelling is preserved for display.
#[derive(Debug, Clone)]
pub struct PackageName {
    value: String,
    key: String,
}

impl PackageName {
    /// Parse a package name, returning `None` when it is not valid.
    ///
    /// Valid names are at most 128 code points, the first satisfying
    /// `XID_Start` and the rest `XID_Continue`.
    pub fn parse(s: &str) -> Option<Self> {
        if s.chars().count() > NAME_MAX_LENGTH {
            return None;
        }
        let mut chars = s.chars();
        if !is_xid_start(chars.next()?) {
            return None;
        }
        if !chars.all(is_xid_continue) {
            return None;
        }
        Some(PackageName {
            key: fold(s),
            value: s.to_string(),
        })
    }

    /// The name as written
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

/// Fold a name for comparison: NFKC precomposition, case folding, then
/// removal of combining marks.
fn fold(name: &str) -> String {
    let compatibility: String = name.nfkc().collect();
    compatibility
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

impl PartialEq for PackageName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PackageName {}

impl PartialOrd for PackageName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl Hash for PackageName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// A namespace-scoped package identifier, `@namespace/name`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopedIdentity {
    namespace: Namespace,
    name: PackageName,
}

impl ScopedIdentity {
    /// Parse `@namespace/name`, returning `None` when either half is
    /// invalid or the shape is wrong (exactly one `/` is required).
    pub fn parse(s: &str) -> Option<Self> {
        let (namespace, name) = s.split_once('/')?;
        if name.contains('/') {
            return None;
        }
        Some(ScopedIdentity {
            namespace: Namespace::parse(namespace)?,
            name: PackageName::parse(name)?,
        })
    }

    /// Construct from already-validated parts
    pub fn new(namespace: Namespace, name: PackageName) -> Self {
        ScopedIdentity { namespace, name }
    }

    /// The registry namespace, including its leading `@`
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// The package name
    pub fn name(&self) -> &PackageName {
        &self.name
    }
}

impl fmt::Display for ScopedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
