//! HTTP handler seam
//!
//! The registry client describes requests with plain data and hands them
//! to an [`HttpHandler`]. The default handler is backed by a blocking
//! `reqwest` client with redirects disabled; tests substitute canned
//! responses.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use tracing::debug;
use url::Url;

/// Error type produced by HTTP handlers, forwarded verbatim by the client
pub type HttpError = Box<dyn Error + Send + Sync>;

/// Request method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
        }
    }
}

/// Header collection with case-insensitive lookup
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header
    pub fn insert(&mut self, name: &str, value: &str) {
        self.entries.push((name.to_string(), value.to_string()));
    }

    /// Look up the first header with this name, ignoring case
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// A registry request
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: Headers,
}

/// A registry response
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

/// Transport collaborator executing registry requests.
///
/// Implementations may complete on their own threads; the registry client
/// only requires that each call produce exactly one result.
pub trait HttpHandler: Send + Sync {
    fn execute(&self, request: Request) -> Result<Response, HttpError>;
}

/// Default [`HttpHandler`] backed by a blocking `reqwest` client.
///
/// Redirects are not followed: a redirected registry response is served
/// as-is and fails response validation.
pub struct ReqwestHandler {
    client: reqwest::blocking::Client,
}

impl ReqwestHandler {
    pub fn new() -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("swiftpkg/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl HttpHandler for ReqwestHandler {
    fn execute(&self, request: Request) -> Result<Response, HttpError> {
        debug!(method = %request.method, url = %request.url, "executing registry request");

        let mut builder = match request.method {
            Method::Get => self.client.get(request.url.clone()),
        };
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str(), value);
            }
        }
        let body = response.bytes()?.to_vec();

        Ok(Response {
            status,
            headers,
            body: if body.is_empty() { None } else { Some(body) },
        })
    }
}
