//! Request and response model shared by the router, the cache store and the network
//!
//! Mirrors the subset of the Fetch API the cache policy needs: a request
//! mode, a response type, and a cache key made of method and URL.

use crate::error::{SwError, SwResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// How the page issued the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level page navigation
    Navigate,
    /// Same-origin only request
    SameOrigin,
    /// Subresource request without CORS (images, stylesheets, scripts)
    NoCors,
    /// CORS request (fetch/XHR)
    Cors,
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Navigate => "navigate",
            Self::SameOrigin => "same-origin",
            Self::NoCors => "no-cors",
            Self::Cors => "cors",
        };
        write!(f, "{}", name)
    }
}

/// Response type as seen by the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response
    Basic,
    /// Cross-origin response readable through CORS
    Cors,
    /// Cross-origin no-cors response; status and body are not observable
    Opaque,
    /// Network error response
    Error,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "basic",
            Self::Cors => "cors",
            Self::Opaque => "opaque",
            Self::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// Identity of a cache entry: method plus URL without fragment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    /// Key for a GET of the given URL
    pub fn get(url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method: "GET".to_string(),
            url: url.to_string(),
        }
    }

    /// Whether this key may be stored in a cache
    pub fn is_cacheable(&self) -> bool {
        self.method == "GET"
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// An intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// A GET subresource request
    pub fn get(url: Url) -> Self {
        Self {
            method: "GET".to_string(),
            url,
            mode: RequestMode::NoCors,
            headers: Vec::new(),
            body: None,
        }
    }

    /// A top-level navigation request
    pub fn navigate(url: Url) -> Self {
        Self {
            mode: RequestMode::Navigate,
            ..Self::get(url)
        }
    }

    /// Parse an absolute URL into a GET request
    pub fn parse(url: &str) -> SwResult<Self> {
        let parsed = Url::parse(url).map_err(|e| SwError::UrlInvalid {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::get(parsed))
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into().to_ascii_uppercase();
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Cache identity of this request
    pub fn key(&self) -> RequestKey {
        let mut url = self.url.clone();
        url.set_fragment(None);
        RequestKey {
            method: self.method.clone(),
            url: url.to_string(),
        }
    }
}

/// A network or cached response snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub kind: ResponseType,
    /// Final URL after redirects
    pub url: String,
    pub redirected: bool,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// A same-origin response with the given status and body
    pub fn basic(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            kind: ResponseType::Basic,
            url: url.into(),
            redirected: false,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_kind(mut self, kind: ResponseType) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Status in the 200-299 range
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Origin of a URL serialized as `scheme://host[:port]`
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}
