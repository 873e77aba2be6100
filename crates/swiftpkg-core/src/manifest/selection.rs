//! Version-specific manifest selection
//!
//! A package directory may carry `Package@swift-<version>.swift` variants
//! next to the regular `Package.swift`. Selection picks the best variant
//! for the running toolchain.

use std::path::{Path, PathBuf};

use crate::vfs::FileSystem;

use super::tools_version::{parse_tools_version, ToolsVersion, ToolsVersionError};
use super::MANIFEST_FILENAME;

const VERSION_SPECIFIC_PREFIX: &str = "Package@swift-";
const MANIFEST_SUFFIX: &str = ".swift";

/// Select the manifest file to use for a package directory.
///
/// Fixed-name candidates derived from the current tools version (exact
/// triple, then `major.minor`, then `major`) win outright. Otherwise the
/// greatest enumerated `Package@swift-*.swift` variant not newer than the
/// current tools version is compared against `Package.swift` by the tools
/// version each declares, and wins only when strictly greater.
pub fn manifest_path(
    package_dir: &Path,
    current: ToolsVersion,
    fs: &dyn FileSystem,
) -> Result<PathBuf, ToolsVersionError> {
    let fixed_keys = [
        format!("{}.{}.{}", current.major, current.minor, current.patch),
        format!("{}.{}", current.major, current.minor),
        format!("{}", current.major),
    ];
    for key in fixed_keys {
        let candidate = package_dir.join(format!("{VERSION_SPECIFIC_PREFIX}{key}{MANIFEST_SUFFIX}"));
        if fs.is_file(&candidate) {
            return Ok(candidate);
        }
    }

    let names = fs
        .read_directory(package_dir)
        .map_err(|e| ToolsVersionError::InaccessiblePackage {
            path: package_dir.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut best: Option<(ToolsVersion, String)> = None;
    for name in names {
        let Some(version) = version_specific_tools_version(&name) else {
            continue;
        };
        if version <= current && best.as_ref().map_or(true, |(v, _)| version > *v) {
            best = Some((version, name));
        }
    }

    let regular = package_dir.join(MANIFEST_FILENAME);
    let Some((_, name)) = best else {
        if !fs.is_file(&regular) {
            return Err(ToolsVersionError::InaccessibleManifest {
                path: regular,
                reason: "file not found".to_string(),
            });
        }
        return Ok(regular);
    };

    let candidate = package_dir.join(&name);
    let candidate_declares = declared_tools_version(&candidate, current, fs)?;
    let regular_declares = declared_tools_version(&regular, current, fs)?;
    if candidate_declares > regular_declares {
        Ok(candidate)
    } else {
        Ok(regular)
    }
}

/// Determine the tools version of the package rooted at `package_dir`
pub fn load_tools_version(
    package_dir: &Path,
    current: ToolsVersion,
    fs: &dyn FileSystem,
) -> Result<ToolsVersion, ToolsVersionError> {
    if !fs.is_directory(package_dir) {
        return Err(ToolsVersionError::InaccessiblePackage {
            path: package_dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    let manifest = manifest_path(package_dir, current, fs)?;
    declared_tools_version(&manifest, current, fs)
}

fn declared_tools_version(
    manifest: &Path,
    current: ToolsVersion,
    fs: &dyn FileSystem,
) -> Result<ToolsVersion, ToolsVersionError> {
    let contents = fs
        .read(manifest)
        .map_err(|e| ToolsVersionError::InaccessibleManifest {
            path: manifest.to_path_buf(),
            reason: e.to_string(),
        })?;
    parse_tools_version(&contents, current)
}

/// Parse the tools version in a `Package@swift-<M>[.<m>[.<p>]].swift` name
fn version_specific_tools_version(filename: &str) -> Option<ToolsVersion> {
    let specifier = filename
        .strip_prefix(VERSION_SPECIFIC_PREFIX)?
        .strip_suffix(MANIFEST_SUFFIX)?;
    let mut numbers = specifier.split('.');
    let major = numbers.next()?.parse().ok()?;
    let minor = match numbers.next() {
        Some(n) => n.parse().ok()?,
        None => 0,
    };
    let patch = match numbers.next() {
        Some(n) => n.parse().ok()?,
        None => 0,
    };
    if numbers.next().is_some() {
        return None;
    }
    Some(ToolsVersion::new(major, minor, patch))
}
