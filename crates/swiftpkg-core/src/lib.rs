//! Package identity and registry access for Swift packages
//!
//! This crate provides the identity and registry core of a package
//! manager, including:
//! - Canonical package identities derived from source locations (URLs,
//!   scp-style addresses, file paths)
//! - The legacy last-path-component identity scheme, kept for
//!   compatibility, behind a process-wide provider switch
//! - Namespace-scoped registry identifiers (`@namespace/name`) with
//!   Unicode-aware validation and comparison
//! - Tools-version extraction from manifests and version-specific manifest
//!   selection
//! - A registry client speaking the versioned media-type protocol, with
//!   SHA-256 archive verification

pub mod identity;
pub mod manifest;
pub mod registry;
pub mod semver;
pub mod vfs;

pub use identity::{
    default_provider, set_default_provider, IdentityError, IdentityProvider, Namespace,
    PackageIdentity, PackageName, ScopedIdentity,
};
pub use manifest::{
    load_tools_version, manifest_path, parse_tools_version, ManifestLoader, ToolsVersion,
    ToolsVersionError, MANIFEST_FILENAME,
};
pub use registry::{checksum, shared_client, Archiver, RegistryClient, RegistryError};
pub use semver::{SemverError, Version};
pub use vfs::{FileSystem, InMemoryFileSystem, LocalFileSystem};
