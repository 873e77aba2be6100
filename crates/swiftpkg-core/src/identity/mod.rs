//! Package identity
//!
//! Every external package dependency gets one stable identity, independent
//! of the many spellings its source location can take. Two schemes coexist:
//! the canonical scheme performs full location normalization, the legacy
//! scheme keeps only the last path component for compatibility with
//! identities minted before canonicalization existed. A process-wide switch
//! selects the scheme used by the [`PackageIdentity`] constructors; it is
//! meant to be set once during startup.

mod canonical;
mod legacy;
mod scoped;
mod strings;

pub use scoped::{Namespace, PackageName, ScopedIdentity};

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors surfaced by identity construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The canonicalized host contains characters outside ASCII
    /// letters, digits, `-`, and `.`
    #[error("unsupported characters in host `{host}` of `{location}`")]
    UnsupportedHost { host: String, location: String },
}

/// Identity-construction scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityProvider {
    /// Full location normalization
    Canonical,
    /// Last path component only (compatibility scheme)
    Legacy,
}

const PROVIDER_LEGACY: u8 = 0;
const PROVIDER_CANONICAL: u8 = 1;

static DEFAULT_PROVIDER: AtomicU8 = AtomicU8::new(PROVIDER_LEGACY);

/// Select the scheme used by identities constructed from now on.
///
/// Identities constructed before the change are unaffected. Intended to be
/// called once during process initialization.
pub fn set_default_provider(provider: IdentityProvider) {
    let value = match provider {
        IdentityProvider::Legacy => PROVIDER_LEGACY,
        IdentityProvider::Canonical => PROVIDER_CANONICAL,
    };
    DEFAULT_PROVIDER.store(value, Ordering::Relaxed);
}

/// The scheme currently used by identity constructors
pub fn default_provider() -> IdentityProvider {
    match DEFAULT_PROVIDER.load(Ordering::Relaxed) {
        PROVIDER_CANONICAL => IdentityProvider::Canonical,
        _ => IdentityProvider::Legacy,
    }
}

/// Stable textual identity of a package.
///
/// A thin value type over the identity's canonical form; equality,
/// ordering, and hashing are all defined over that string, and
/// serialization round-trips through it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageIdentity(String);

impl PackageIdentity {
    /// Construct an identity from a source location using the active scheme
    pub fn parse(location: &str) -> Result<Self, IdentityError> {
        match default_provider() {
            IdentityProvider::Canonical => Self::canonical(location),
            IdentityProvider::Legacy => Ok(Self::legacy(location)),
        }
    }

    /// Construct an identity from an absolute file path using the active
    /// scheme
    pub fn from_path(path: &Path) -> Result<Self, IdentityError> {
        Self::parse(&path.to_string_lossy())
    }

    /// Construct a canonical identity, regardless of the active scheme
    pub fn canonical(location: &str) -> Result<Self, IdentityError> {
        canonical::canonicalize(location).map(PackageIdentity)
    }

    /// Construct a legacy identity, regardless of the active scheme
    pub fn legacy(location: &str) -> Self {
        PackageIdentity(legacy::compute(location))
    }

    /// Construct the identity of a registry package
    pub fn from_scoped(scoped: &ScopedIdentity) -> Self {
        PackageIdentity(format!(
            "{}/{}",
            scoped.namespace().as_str().to_ascii_lowercase(),
            scoped.name().as_str().to_lowercase()
        ))
    }

    /// The identity's canonical textual form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reinterpret this identity as a namespace-scoped registry identity,
    /// when its textual form is one
    pub fn as_scoped(&self) -> Option<ScopedIdentity> {
        ScopedIdentity::parse(&self.0)
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for PackageIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PackageIdentity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(PackageIdentity)
    }
}
