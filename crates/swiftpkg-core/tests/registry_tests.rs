//! End-to-end registry client tests against a canned HTTP handler

use std::collections::HashMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use url::Url;

use swiftpkg_core::registry::http::{Headers, HttpError, HttpHandler, Request, Response};
use swiftpkg_core::{
    checksum, Archiver, FileSystem, InMemoryFileSystem, LocalFileSystem, ManifestLoader,
    PackageIdentity, RegistryClient, RegistryError, ScopedIdentity, ToolsVersion, Version,
};

const BASE_URL: &str = "https://registry.example.com/";

/// Handler serving canned responses keyed by request URL
#[derive(Default)]
struct MockHandler {
    responses: HashMap<String, Response>,
    requests: Mutex<Vec<Request>>,
}

impl MockHandler {
    fn with(mut self, url: &str, response: Response) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    fn accept_header_of_last_request(&self) -> Option<String> {
        let requests = self.requests.lock();
        requests
            .last()
            .and_then(|r| r.headers.get("Accept").map(String::from))
    }
}

impl HttpHandler for MockHandler {
    fn execute(&self, request: Request) -> Result<Response, HttpError> {
        let response = self.responses.get(request.url.as_str()).cloned();
        self.requests.lock().push(request.clone());
        response.ok_or_else(|| format!("no canned response for {}", request.url).into())
    }
}

/// Archiver that records calls and can be told to fail
#[derive(Default)]
struct RecordingArchiver {
    calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    fail: bool,
}

impl Archiver for RecordingArchiver {
    fn extract(
        &self,
        archive: &Path,
        destination: &Path,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.calls
            .lock()
            .push((archive.to_path_buf(), destination.to_path_buf()));
        if self.fail {
            return Err("extraction failed".into());
        }
        Ok(())
    }
}

/// What the manifest loader observed on the staged file system
#[derive(Debug)]
struct ManifestProbe {
    base_url: String,
    version: Option<Version>,
    root_entries: Vec<String>,
    contents: String,
}

struct CapturingLoader;

impl ManifestLoader for CapturingLoader {
    type Manifest = ManifestProbe;

    fn load(
        &self,
        package_path: &Path,
        base_url: &Url,
        version: Option<&Version>,
        file_system: &dyn FileSystem,
    ) -> Result<Self::Manifest, Box<dyn Error + Send + Sync>> {
        let root_entries = file_system.read_directory(package_path)?;
        let manifest = package_path.join(&root_entries[0]);
        let contents = String::from_utf8(file_system.read(&manifest)?)?;
        Ok(ManifestProbe {
            base_url: base_url.to_string(),
            version: version.cloned(),
            root_entries,
            contents,
        })
    }
}

fn ok_response(content_type: &str, body: &[u8]) -> Response {
    let mut headers = Headers::new();
    headers.insert("Content-Type", content_type);
    headers.insert("Content-Version", "1");
    Response {
        status: 200,
        headers,
        body: Some(body.to_vec()),
    }
}

fn archive_response(body: &[u8], digest: &str) -> Response {
    let mut response = ok_response("application/zip", body);
    response.headers.insert("Digest", &format!("sha-256={digest}"));
    response
}

fn make_client(handler: MockHandler) -> (RegistryClient, Arc<MockHandler>) {
    let handler = Arc::new(handler);
    let client = RegistryClient::with_handler(BASE_URL, handler.clone()).unwrap();
    (client, handler)
}

fn linked_list() -> PackageIdentity {
    PackageIdentity::from_scoped(&ScopedIdentity::parse("@mona/LinkedList").unwrap())
}

#[test]
fn test_list_releases_filters_problems_and_sorts_descending() {
    let body = br#"{
        "releases": {
            "1.0.0": {},
            "1.1.1": {"url": "https://registry.example.com/mona/linkedlist/1.1.1"},
            "1.1.0": {"problem": {"status": 410, "title": "Gone"}},
            "not-a-version": {}
        }
    }"#;
    let (client, handler) = make_client(MockHandler::default().with(
        "https://registry.example.com/mona/linkedlist",
        ok_response("application/json; charset=utf-8", body),
    ));

    let versions = client.get_available_versions(&linked_list()).unwrap();
    assert_eq!(versions, [Version::new(1, 1, 1), Version::new(1, 0, 0)]);
    assert_eq!(
        handler.accept_header_of_last_request().as_deref(),
        Some("application/vnd.swift.registry.v1+json")
    );
}

#[test]
fn test_list_releases_requires_content_version() {
    let mut response = ok_response("application/json", br#"{"releases": {}}"#);
    response.headers = {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "application/json");
        headers
    };
    let (client, _) = make_client(
        MockHandler::default().with("https://registry.example.com/mona/linkedlist", response),
    );

    let err = client.get_available_versions(&linked_list()).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidResponse { .. }));
}

#[test]
fn test_list_releases_rejects_wrong_status_and_content_type() {
    let mut not_found = ok_response("application/json", b"{}");
    not_found.status = 404;
    let (client, _) = make_client(
        MockHandler::default().with("https://registry.example.com/mona/linkedlist", not_found),
    );
    assert!(matches!(
        client.get_available_versions(&linked_list()),
        Err(RegistryError::InvalidResponse { .. })
    ));

    let (client, _) = make_client(MockHandler::default().with(
        "https://registry.example.com/mona/linkedlist",
        ok_response("text/html", b"<html>"),
    ));
    assert!(matches!(
        client.get_available_versions(&linked_list()),
        Err(RegistryError::InvalidResponse { .. })
    ));
}

#[test]
fn test_list_releases_rejects_unparsable_body() {
    let (client, _) = make_client(MockHandler::default().with(
        "https://registry.example.com/mona/linkedlist",
        ok_response("application/json", b"not json"),
    ));
    assert!(matches!(
        client.get_available_versions(&linked_list()),
        Err(RegistryError::InvalidResponse { .. })
    ));
}

#[test]
fn test_registry_call_requires_scoped_identity() {
    let (client, _) = make_client(MockHandler::default());
    let url_identity = PackageIdentity::canonical("https://example.com/mona/LinkedList").unwrap();
    assert!(matches!(
        client.get_available_versions(&url_identity),
        Err(RegistryError::InvalidOperation(_))
    ));
}

#[test]
fn test_fetch_manifest_stages_body_for_the_loader() {
    let manifest = b"// swift-tools-version:5.3\nimport PackageDescription\n";
    let (client, handler) = make_client(MockHandler::default().with(
        "https://registry.example.com/mona/linkedlist/1.0.0/Package.swift",
        ok_response("text/x-swift", manifest),
    ));

    let probe = client
        .fetch_manifest(&linked_list(), &Version::new(1, 0, 0), None, &CapturingLoader)
        .unwrap();

    assert_eq!(probe.base_url, BASE_URL);
    assert_eq!(probe.version, Some(Version::new(1, 0, 0)));
    assert_eq!(probe.root_entries, ["Package.swift"]);
    assert!(probe.contents.starts_with("// swift-tools-version:5.3"));
    assert_eq!(
        handler.accept_header_of_last_request().as_deref(),
        Some("application/vnd.swift.registry.v1+swift")
    );
}

#[test]
fn test_fetch_manifest_with_tools_version_query() {
    let manifest = b"// swift-tools-version:4.2\n";
    let (client, _) = make_client(MockHandler::default().with(
        "https://registry.example.com/mona/linkedlist/1.0.0/Package.swift?swift-version=4.2.0",
        ok_response("text/x-swift", manifest),
    ));

    let probe = client
        .fetch_manifest(
            &linked_list(),
            &Version::new(1, 0, 0),
            Some(ToolsVersion::new(4, 2, 0)),
            &CapturingLoader,
        )
        .unwrap();

    assert_eq!(probe.root_entries, ["Package@swift-4.2.0.swift"]);
}

#[test]
fn test_fetch_manifest_forwards_loader_errors() {
    struct FailingLoader;
    impl ManifestLoader for FailingLoader {
        type Manifest = ();
        fn load(
            &self,
            _package_path: &Path,
            _base_url: &Url,
            _version: Option<&Version>,
            _file_system: &dyn FileSystem,
        ) -> Result<(), Box<dyn Error + Send + Sync>> {
            Err("manifest is not loadable".into())
        }
    }

    let (client, _) = make_client(MockHandler::default().with(
        "https://registry.example.com/mona/linkedlist/1.0.0/Package.swift",
        ok_response("text/x-swift", b"// swift-tools-version:5.3\n"),
    ));

    let err = client
        .fetch_manifest(&linked_list(), &Version::new(1, 0, 0), None, &FailingLoader)
        .unwrap_err();
    assert!(matches!(err, RegistryError::Manifest(_)));
    assert_eq!(err.to_string(), "manifest is not loadable");
}

#[test]
fn test_download_verifies_extracts_and_cleans_up() {
    let body = b"zip archive bytes";
    let (client, _) = make_client(MockHandler::default().with(
        "https://registry.example.com/mona/linkedlist/1.0.0.zip",
        archive_response(body, &checksum(body)),
    ));

    let fs = InMemoryFileSystem::new();
    let archiver = RecordingArchiver::default();
    let destination = Path::new("/downloads/linkedlist-1.0.0");

    client
        .download_source_archive(
            &linked_list(),
            &Version::new(1, 0, 0),
            destination,
            None,
            &archiver,
            &fs,
        )
        .unwrap();

    let calls = archiver.calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        (
            PathBuf::from("/downloads/linkedlist-1.0.0.zip"),
            destination.to_path_buf()
        )
    );
    // The staged archive is gone, the destination directory remains
    assert!(!fs.exists(Path::new("/downloads/linkedlist-1.0.0.zip")));
    assert!(fs.is_directory(destination));
}

#[test]
fn test_download_accepts_matching_pinned_checksum() {
    let body = b"zip archive bytes";
    let digest = checksum(body);
    let (client, _) = make_client(MockHandler::default().with(
        "https://registry.example.com/mona/linkedlist/1.0.0.zip",
        archive_response(body, &digest),
    ));

    let fs = InMemoryFileSystem::new();
    let archiver = RecordingArchiver::default();
    client
        .download_source_archive(
            &linked_list(),
            &Version::new(1, 0, 0),
            Path::new("/downloads/pkg"),
            Some(&digest),
            &archiver,
            &fs,
        )
        .unwrap();
    assert_eq!(archiver.calls.lock().len(), 1);
}

#[test]
fn test_download_rejects_wrong_advertised_digest() {
    let body = b"zip archive bytes";
    let (client, _) = make_client(MockHandler::default().with(
        "https://registry.example.com/mona/linkedlist/1.0.0.zip",
        archive_response(body, &checksum(b"other bytes")),
    ));

    let fs = InMemoryFileSystem::new();
    let archiver = RecordingArchiver::default();
    let destination = Path::new("/downloads/linkedlist-1.0.0");

    let err = client
        .download_source_archive(
            &linked_list(),
            &Version::new(1, 0, 0),
            destination,
            None,
            &archiver,
            &fs,
        )
        .unwrap_err();

    match err {
        RegistryError::InvalidChecksum { expected, actual } => {
            assert_eq!(expected, checksum(b"other bytes"));
            assert_eq!(actual, checksum(body));
        }
        other => panic!("unexpected error: {other}"),
    }
    // Nothing is extracted and nothing is left behind
    assert!(archiver.calls.lock().is_empty());
    assert!(!fs.exists(destination));
    assert!(!fs.exists(Path::new("/downloads/linkedlist-1.0.0.zip")));
}

#[test]
fn test_download_rejects_wrong_pinned_checksum() {
    let body = b"zip archive bytes";
    let (client, _) = make_client(MockHandler::default().with(
        "https://registry.example.com/mona/linkedlist/1.0.0.zip",
        archive_response(body, &checksum(body)),
    ));

    let fs = InMemoryFileSystem::new();
    let archiver = RecordingArchiver::default();
    let err = client
        .download_source_archive(
            &linked_list(),
            &Version::new(1, 0, 0),
            Path::new("/downloads/pkg"),
            Some("deadbeef"),
            &archiver,
            &fs,
        )
        .unwrap_err();

    assert!(matches!(err, RegistryError::InvalidChecksum { ref expected, .. } if expected == "deadbeef"));
    assert!(archiver.calls.lock().is_empty());
}

#[test]
fn test_download_requires_digest_header() {
    let body = b"zip archive bytes";
    let (client, _) = make_client(MockHandler::default().with(
        "https://registry.example.com/mona/linkedlist/1.0.0.zip",
        ok_response("application/zip", body),
    ));

    let fs = InMemoryFileSystem::new();
    let archiver = RecordingArchiver::default();
    assert!(matches!(
        client.download_source_archive(
            &linked_list(),
            &Version::new(1, 0, 0),
            Path::new("/downloads/pkg"),
            None,
            &archiver,
            &fs,
        ),
        Err(RegistryError::InvalidResponse { .. })
    ));
}

#[test]
fn test_download_removes_destination_when_extraction_fails() {
    let body = b"zip archive bytes";
    let (client, _) = make_client(MockHandler::default().with(
        "https://registry.example.com/mona/linkedlist/1.0.0.zip",
        archive_response(body, &checksum(body)),
    ));

    let fs = InMemoryFileSystem::new();
    let archiver = RecordingArchiver {
        fail: true,
        ..RecordingArchiver::default()
    };
    let destination = Path::new("/downloads/linkedlist-1.0.0");

    let err = client
        .download_source_archive(
            &linked_list(),
            &Version::new(1, 0, 0),
            destination,
            None,
            &archiver,
            &fs,
        )
        .unwrap_err();

    assert!(matches!(err, RegistryError::Archive(_)));
    assert!(!fs.exists(destination));
    assert!(!fs.exists(Path::new("/downloads/linkedlist-1.0.0.zip")));
}

#[test]
fn test_download_on_local_file_system() {
    let body = b"zip archive bytes";
    let (client, _) = make_client(MockHandler::default().with(
        "https://registry.example.com/mona/linkedlist/1.0.0.zip",
        archive_response(body, &checksum(body)),
    ));

    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("linkedlist-1.0.0");
    let archiver = RecordingArchiver::default();

    client
        .download_source_archive(
            &linked_list(),
            &Version::new(1, 0, 0),
            &destination,
            None,
            &archiver,
            &LocalFileSystem,
        )
        .unwrap();

    assert!(destination.is_dir());
    assert!(!temp.path().join("linkedlist-1.0.0.zip").exists());
}

#[test]
fn test_transport_errors_are_forwarded() {
    let (client, _) = make_client(MockHandler::default());
    let err = client.get_available_versions(&linked_list()).unwrap_err();
    match err {
        RegistryError::Http(inner) => {
            assert!(inner.to_string().contains("no canned response"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
