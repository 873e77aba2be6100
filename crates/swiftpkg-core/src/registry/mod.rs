//! Registry access
//!
//! Client side of the versioned registry protocol: list the releases of a
//! package, fetch a release manifest, and download and verify a source
//! archive. The server side is not defined here.

pub mod api;
pub mod http;

mod checksum;
mod client;

pub use checksum::checksum;
pub use client::{shared_client, RegistryClient, RegistryError};

use std::error::Error;
use std::path::Path;

/// External collaborator that extracts a downloaded source archive into a
/// destination directory. Extraction errors are forwarded verbatim.
pub trait Archiver: Send + Sync {
    fn extract(&self, archive: &Path, destination: &Path) -> Result<(), Box<dyn Error + Send + Sync>>;
}
