//! Manifest tools-version handling
//!
//! A package manifest declares the toolchain version it requires in a
//! comment on its first line. This module extracts that version, selects
//! among version-specific manifest variants in a package directory, and
//! defines the collaborator seam through which manifests are actually
//! interpreted.

mod loader;
mod selection;
mod tools_version;

pub use loader::ManifestLoader;
pub use selection::{load_tools_version, manifest_path};
pub use tools_version::{parse_tools_version, ToolsVersion, ToolsVersionError};

/// Filename of the regular package manifest
pub const MANIFEST_FILENAME: &str = "Package.swift";
