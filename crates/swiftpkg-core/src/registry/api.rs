//! Registry wire types
//!
//! Response types and media-type constants for the versioned registry
//! protocol. Content negotiation is entirely via media types; every
//! successful response additionally carries `Content-Version: 1`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default registry base URL
pub const DEFAULT_REGISTRY_URL: &str = "https://packages.swift.org/";

/// Protocol version every response must advertise via `Content-Version`
pub const CONTENT_VERSION: &str = "1";

/// Name of the protocol-version response header
pub const CONTENT_VERSION_HEADER: &str = "Content-Version";

/// Name of the archive integrity response header
pub const DIGEST_HEADER: &str = "Digest";

/// Accept media type for release lists
pub const MEDIA_TYPE_JSON: &str = "application/vnd.swift.registry.v1+json";

/// Accept media type for manifests
pub const MEDIA_TYPE_SWIFT: &str = "application/vnd.swift.registry.v1+swift";

/// Accept media type for source archives
pub const MEDIA_TYPE_ZIP: &str = "application/vnd.swift.registry.v1+zip";

/// Expected content type of a release-list response
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Expected content type of a manifest response
pub const CONTENT_TYPE_SWIFT: &str = "text/x-swift";

/// Expected content type of a source-archive response
pub const CONTENT_TYPE_ZIP: &str = "application/zip";

/// Response from `GET /{namespace}/{name}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleasesResponse {
    /// Candidate version string to release entry
    pub releases: HashMap<String, Release>,
}

/// One release entry in a release list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Release {
    /// Location of the release resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Present when the release is unavailable (yanked, removed); such
    /// releases are excluded from version listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<Problem>,
}

/// Problem details attached to an unavailable release
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Problem {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_release_list() {
        let json = r#"{
            "releases": {
                "1.0.0": {},
                "1.1.0": {"url": "https://example.com/@mona/LinkedList/1.1.0"},
                "0.9.0": {"problem": {"status": 410, "title": "Gone"}}
            }
        }"#;

        let parsed: ReleasesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.releases.len(), 3);
        assert!(parsed.releases["1.0.0"].problem.is_none());
        assert!(parsed.releases["1.1.0"].url.is_some());
        let problem = parsed.releases["0.9.0"].problem.as_ref().unwrap();
        assert_eq!(problem.status, Some(410));
        assert_eq!(problem.title.as_deref(), Some("Gone"));
    }

    #[test]
    fn test_unknown_release_fields_are_tolerated() {
        let json = r#"{"releases": {"1.0.0": {"unexpected": true}}}"#;
        let parsed: ReleasesResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.releases["1.0.0"].problem.is_none());
    }
}
