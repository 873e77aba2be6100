//! Registry HTTP client
//!
//! Speaks the versioned media-type protocol against a configurable base
//! URL. The client holds configuration only (base URL plus transport
//! handler) and is safe to share across concurrent calls.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::identity::{PackageIdentity, ScopedIdentity};
use crate::manifest::{ManifestLoader, ToolsVersion, MANIFEST_FILENAME};
use crate::semver::Version;
use crate::vfs::{FileSystem, InMemoryFileSystem};

use super::api;
use super::api::ReleasesResponse;
use super::checksum::checksum;
use super::http::{Headers, HttpError, HttpHandler, Method, Request, ReqwestHandler, Response};
use super::Archiver;

/// Errors that can occur during registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Misuse, such as a registry call on an identity without a namespace
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Base URL cannot be combined into a request URL
    #[error("invalid registry URL: {0}")]
    InvalidUrl(String),

    /// Response violates the protocol (status, media type, version, body)
    #[error("invalid response from {url}: {reason}")]
    InvalidResponse { url: Url, reason: String },

    /// Archive bytes do not match the expected digest
    #[error("invalid checksum: expected {expected}, got {actual}")]
    InvalidChecksum { expected: String, actual: String },

    /// Transport failure, forwarded verbatim from the HTTP handler
    #[error("{0}")]
    Http(#[source] HttpError),

    /// Manifest-loader failure, forwarded verbatim
    #[error("{0}")]
    Manifest(#[source] HttpError),

    /// Archiver failure, forwarded verbatim
    #[error("{0}")]
    Archive(#[source] HttpError),

    /// File-system failure while staging or extracting an archive
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Client for one package registry
pub struct RegistryClient {
    base_url: Url,
    handler: Arc<dyn HttpHandler>,
}

impl RegistryClient {
    /// Create a client for the default registry
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_url(api::DEFAULT_REGISTRY_URL)
    }

    /// Create a client for a custom registry
    pub fn with_url(base_url: &str) -> Result<Self, RegistryError> {
        let handler = ReqwestHandler::new().map_err(RegistryError::Http)?;
        Self::with_handler(base_url, Arc::new(handler))
    }

    /// Create a client with a custom transport handler
    pub fn with_handler(
        base_url: &str,
        handler: Arc<dyn HttpHandler>,
    ) -> Result<Self, RegistryError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| RegistryError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(RegistryError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { base_url, handler })
    }

    /// The registry's base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// List the available versions of a package, newest first.
    ///
    /// Releases carrying problem details are excluded, and release keys
    /// that do not parse as versions are silently discarded.
    pub fn get_available_versions(
        &self,
        package: &PackageIdentity,
    ) -> Result<Vec<Version>, RegistryError> {
        let scoped = self.scoped(package)?;
        let url = self.endpoint(&[scoped.namespace().unprefixed(), scoped.name().as_str()])?;

        let response = self.get(url.clone(), api::MEDIA_TYPE_JSON)?;
        self.validate_response(&url, &response, api::CONTENT_TYPE_JSON)?;
        let body = require_body(&url, &response)?;

        let parsed: ReleasesResponse = serde_json::from_slice(body).map_err(|e| {
            RegistryError::InvalidResponse {
                url: url.clone(),
                reason: format!("unparsable release list: {e}"),
            }
        })?;

        let mut versions: Vec<Version> = parsed
            .releases
            .iter()
            .filter(|(_, release)| release.problem.is_none())
            .filter_map(|(candidate, _)| Version::parse(candidate).ok())
            .collect();
        versions.sort_by(|a, b| b.cmp(a));

        debug!(package = %package, count = versions.len(), "listed releases");
        Ok(versions)
    }

    /// Fetch the manifest of a package version and hand it to the manifest
    /// loader.
    ///
    /// The manifest is staged in a fresh in-memory file system under its
    /// protocol filename (`Package.swift`, or `Package@swift-<V>.swift`
    /// when a tools version is requested); the loader runs against that
    /// root with the registry's base URL.
    pub fn fetch_manifest<L: ManifestLoader>(
        &self,
        package: &PackageIdentity,
        version: &Version,
        swift_version: Option<ToolsVersion>,
        loader: &L,
    ) -> Result<L::Manifest, RegistryError> {
        let scoped = self.scoped(package)?;
        let mut url = self.endpoint(&[
            scoped.namespace().unprefixed(),
            scoped.name().as_str(),
            &version.to_string(),
            MANIFEST_FILENAME,
        ])?;
        if let Some(tools_version) = swift_version {
            url.query_pairs_mut()
                .append_pair("swift-version", &tools_version.to_string());
        }

        let response = self.get(url.clone(), api::MEDIA_TYPE_SWIFT)?;
        self.validate_response(&url, &response, api::CONTENT_TYPE_SWIFT)?;
        let body = require_body(&url, &response)?;

        let filename = match swift_version {
            Some(tools_version) => format!("Package@swift-{tools_version}.swift"),
            None => MANIFEST_FILENAME.to_string(),
        };
        let root = Path::new("/");
        let staging = InMemoryFileSystem::new();
        staging.create_dir_all(root)?;
        staging.write(&root.join(filename), body)?;

        loader
            .load(root, &self.base_url, Some(version), &staging)
            .map_err(RegistryError::Manifest)
    }

    /// Download a package's source archive, verify it, and extract it into
    /// `destination`.
    ///
    /// The computed SHA-256 of the body must match the digest advertised by
    /// the registry and, when supplied, the caller's `expected_checksum`.
    /// The verified bytes are staged at `{destination}.zip` and handed to
    /// the archiver; the staged archive is removed on every exit path, and
    /// the destination directory is removed on failure.
    pub fn download_source_archive(
        &self,
        package: &PackageIdentity,
        version: &Version,
        destination: &Path,
        expected_checksum: Option<&str>,
        archiver: &dyn Archiver,
        fs: &dyn FileSystem,
    ) -> Result<(), RegistryError> {
        let scoped = self.scoped(package)?;
        let url = self.endpoint(&[
            scoped.namespace().unprefixed(),
            scoped.name().as_str(),
            &format!("{version}.zip"),
        ])?;

        let response = self.get(url.clone(), api::MEDIA_TYPE_ZIP)?;
        self.validate_response(&url, &response, api::CONTENT_TYPE_ZIP)?;
        let body = require_body(&url, &response)?;
        let advertised = parse_digest(&url, response.headers.get(api::DIGEST_HEADER))?;

        let archive = PathBuf::from(format!("{}.zip", destination.display()));
        let result = self.verify_and_extract(
            body,
            &advertised,
            expected_checksum,
            &archive,
            destination,
            archiver,
            fs,
        );
        if result.is_err() {
            let _ = fs.remove_tree(destination);
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn verify_and_extract(
        &self,
        body: &[u8],
        advertised: &str,
        expected_checksum: Option<&str>,
        archive: &Path,
        destination: &Path,
        archiver: &dyn Archiver,
        fs: &dyn FileSystem,
    ) -> Result<(), RegistryError> {
        let actual = checksum(body);
        if let Some(expected) = expected_checksum {
            if expected != actual {
                warn!(%expected, %actual, "archive does not match the pinned checksum");
                return Err(RegistryError::InvalidChecksum {
                    expected: expected.to_string(),
                    actual,
                });
            }
        }
        if advertised != actual {
            warn!(expected = %advertised, %actual, "archive does not match the advertised digest");
            return Err(RegistryError::InvalidChecksum {
                expected: advertised.to_string(),
                actual,
            });
        }

        fs.write(archive, body)?;
        fs.create_dir_all(destination)?;
        let extracted = archiver
            .extract(archive, destination)
            .map_err(RegistryError::Archive);
        let _ = fs.remove_tree(archive);
        extracted
    }

    fn scoped(&self, package: &PackageIdentity) -> Result<ScopedIdentity, RegistryError> {
        package.as_scoped().ok_or_else(|| {
            RegistryError::InvalidOperation(format!(
                "registry operation on non-registry identity `{package}`"
            ))
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RegistryError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| RegistryError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn get(&self, url: Url, accept: &str) -> Result<Response, RegistryError> {
        let mut headers = Headers::new();
        headers.insert("Accept", accept);
        self.handler
            .execute(Request {
                method: Method::Get,
                url,
                headers,
            })
            .map_err(RegistryError::Http)
    }

    fn validate_response(
        &self,
        url: &Url,
        response: &Response,
        content_type: &str,
    ) -> Result<(), RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidResponse {
            url: url.clone(),
            reason,
        };

        if response.status != 200 {
            return Err(invalid(format!("unexpected status {}", response.status)));
        }
        match response.headers.get(api::CONTENT_VERSION_HEADER) {
            Some(api::CONTENT_VERSION) => {}
            Some(other) => {
                return Err(invalid(format!("unsupported content version {other}")));
            }
            None => return Err(invalid("missing content version".to_string())),
        }
        match response.headers.get("Content-Type") {
            Some(actual) if actual.starts_with(content_type) => Ok(()),
            Some(actual) => Err(invalid(format!(
                "unexpected content type {actual}, expected {content_type}"
            ))),
            None => Err(invalid("missing content type".to_string())),
        }
    }
}

fn require_body<'r>(url: &Url, response: &'r Response) -> Result<&'r [u8], RegistryError> {
    match response.body.as_deref() {
        Some(body) if !body.is_empty() => Ok(body),
        _ => Err(RegistryError::InvalidResponse {
            url: url.clone(),
            reason: "missing response body".to_string(),
        }),
    }
}

/// Parse a `sha-256=<hex>` digest header value
fn parse_digest(url: &Url, value: Option<&str>) -> Result<String, RegistryError> {
    let invalid = |reason: &str| RegistryError::InvalidResponse {
        url: url.clone(),
        reason: reason.to_string(),
    };

    let value = value.ok_or_else(|| invalid("missing digest header"))?;
    let (algorithm, digest) = value
        .trim()
        .split_once('=')
        .ok_or_else(|| invalid("malformed digest header"))?;
    if !algorithm.trim().eq_ignore_ascii_case("sha-256") {
        return Err(invalid("unsupported digest algorithm"));
    }
    Ok(digest.trim().to_ascii_lowercase())
}

static SHARED_CLIENTS: OnceLock<RwLock<HashMap<String, Arc<RegistryClient>>>> = OnceLock::new();

/// Shared registry client for a base URL.
///
/// Clients are memoized process-wide; concurrent lookups for the same base
/// URL get the same instance.
pub fn shared_client(base_url: &str) -> Result<Arc<RegistryClient>, RegistryError> {
    let clients = SHARED_CLIENTS.get_or_init(|| RwLock::new(HashMap::new()));
    if let Some(client) = clients.read().get(base_url) {
        return Ok(client.clone());
    }
    let client = Arc::new(RegistryClient::with_url(base_url)?);
    let mut clients = clients.write();
    Ok(clients
        .entry(base_url.to_string())
        .or_insert(client)
        .clone())
}
