//! Manifest-loader collaborator seam

use std::error::Error;
use std::path::Path;

use url::Url;

use crate::semver::Version;
use crate::vfs::FileSystem;

/// External collaborator that interprets a manifest the core has staged on
/// a file system.
///
/// The core hands over the package root, the URL the manifest was resolved
/// against, and the package version when one is known; it never looks
/// inside the returned manifest. Loader errors are forwarded verbatim.
pub trait ManifestLoader {
    /// Loaded manifest representation
    type Manifest;

    fn load(
        &self,
        package_path: &Path,
        base_url: &Url,
        version: Option<&Version>,
        file_system: &dyn FileSystem,
    ) -> Result<Self::Manifest, Box<dyn Error + Send + Sync>>;
}
