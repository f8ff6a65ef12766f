//! Request Descriptor Module
//!
//! Immutable description of an intercepted request, used both as a routing
//! input and as the source of the cache lookup key.

use std::fmt;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri};

// == Request Mode ==
/// How the request was issued by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMode {
    /// Full-page load
    Navigate,
    SameOrigin,
    Cors,
    NoCors,
}

impl RequestMode {
    /// Parses a `Sec-Fetch-Mode` header value. Unknown values map to `NoCors`.
    pub fn from_header(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "navigate" => RequestMode::Navigate,
            "same-origin" => RequestMode::SameOrigin,
            "cors" | "websocket" => RequestMode::Cors,
            _ => RequestMode::NoCors,
        }
    }
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestMode::Navigate => write!(f, "navigate"),
            RequestMode::SameOrigin => write!(f, "same-origin"),
            RequestMode::Cors => write!(f, "cors"),
            RequestMode::NoCors => write!(f, "no-cors"),
        }
    }
}

// == Destination ==
/// What kind of resource the request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// No destination (fetch/XHR)
    Empty,
    Document,
    Image,
    Script,
    Style,
    Font,
    Manifest,
    Other,
}

impl Destination {
    /// Parses a `Sec-Fetch-Dest` header value.
    pub fn from_header(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "empty" => Destination::Empty,
            "document" => Destination::Document,
            "image" => Destination::Image,
            "script" => Destination::Script,
            "style" => Destination::Style,
            "font" => Destination::Font,
            "manifest" => Destination::Manifest,
            _ => Destination::Other,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Destination::Empty => "",
            Destination::Document => "document",
            Destination::Image => "image",
            Destination::Script => "script",
            Destination::Style => "style",
            Destination::Font => "font",
            Destination::Manifest => "manifest",
            Destination::Other => "other",
        };
        f.write_str(name)
    }
}

// == Cache Key ==
/// Lookup key of a cached entry within one partition.
///
/// Only method and URL participate; mode and destination are routing inputs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey {
    pub method: String,
    pub url: String,
}

impl CacheKey {
    /// Key for a plain GET of `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET.to_string(),
            url: url.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

// == Request Descriptor ==
/// Immutable record of {method, url, mode, destination}.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    method: Method,
    url: String,
    mode: RequestMode,
    destination: Destination,
}

impl RequestDescriptor {
    /// Creates a descriptor. `url` should be absolute; see [`resolve_url`].
    pub fn new(
        method: Method,
        url: impl Into<String>,
        mode: RequestMode,
        destination: Destination,
    ) -> Self {
        Self {
            method,
            url: url.into(),
            mode,
            destination,
        }
    }

    /// A sub-resource GET with no particular destination.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url, RequestMode::NoCors, Destination::Empty)
    }

    /// A full-page navigation.
    pub fn navigate(url: impl Into<String>) -> Self {
        Self::new(
            Method::GET,
            url,
            RequestMode::Navigate,
            Destination::Document,
        )
    }

    /// A GET for an image.
    pub fn image(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url, RequestMode::NoCors, Destination::Image)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    /// Returns true for full-page loads.
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Origin (scheme://authority) of the request URL, if it is absolute.
    pub fn origin(&self) -> Option<String> {
        origin_of(&self.url)
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            method: self.method.to_string(),
            url: self.url.clone(),
        }
    }
}

// == Fetch Request ==
/// A descriptor plus the headers and body forwarded to the network.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub descriptor: RequestDescriptor,
    /// Client headers, kept as raw values so non-UTF-8 bytes survive
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl FetchRequest {
    pub fn new(descriptor: RequestDescriptor) -> Self {
        Self {
            descriptor,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }
}

impl From<RequestDescriptor> for FetchRequest {
    fn from(descriptor: RequestDescriptor) -> Self {
        Self::new(descriptor)
    }
}

// == URL Helpers ==
/// Returns `scheme://authority` for an absolute URL, lowercased.
pub fn origin_of(url: &str) -> Option<String> {
    let uri: Uri = url.parse().ok()?;
    let scheme = uri.scheme_str()?;
    let authority = uri.authority()?;
    Some(format!(
        "{}://{}",
        scheme.to_ascii_lowercase(),
        authority.as_str().to_ascii_lowercase()
    ))
}

/// Resolves a manifest entry or request path against `origin`.
///
/// Absolute URLs are returned unchanged.
pub fn resolve_url(origin: &str, raw: &str) -> String {
    if origin_of(raw).is_some() {
        return raw.to_string();
    }

    let origin = origin.trim_end_matches('/');
    if raw.starts_with('/') {
        format!("{}{}", origin, raw)
    } else {
        format!("{}/{}", origin, raw)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_of_absolute_url() {
        assert_eq!(
            origin_of("https://CDN.example.com/lib.css?v=1").as_deref(),
            Some("https://cdn.example.com")
        );
        assert_eq!(
            origin_of("http://localhost:3000/index.html").as_deref(),
            Some("http://localhost:3000")
        );
    }

    #[test]
    fn test_origin_of_relative_path() {
        assert!(origin_of("/index.html").is_none());
        assert!(origin_of("not a url").is_none());
    }

    #[test]
    fn test_resolve_url() {
        let origin = "http://localhost:3000";
        assert_eq!(resolve_url(origin, "/"), "http://localhost:3000/");
        assert_eq!(
            resolve_url(origin, "css/styles.css"),
            "http://localhost:3000/css/styles.css"
        );
        assert_eq!(
            resolve_url(origin, "https://fonts.example.com/inter.css"),
            "https://fonts.example.com/inter.css"
        );
    }

    #[test]
    fn test_mode_and_destination_from_headers() {
        assert_eq!(RequestMode::from_header("navigate"), RequestMode::Navigate);
        assert_eq!(RequestMode::from_header("CORS"), RequestMode::Cors);
        assert_eq!(RequestMode::from_header("bogus"), RequestMode::NoCors);
        assert_eq!(Destination::from_header("image"), Destination::Image);
        assert_eq!(Destination::from_header("empty"), Destination::Empty);
        assert_eq!(Destination::from_header("audioworklet"), Destination::Other);
    }

    #[test]
    fn test_cache_key_ignores_mode_and_destination() {
        let nav = RequestDescriptor::navigate("http://localhost:3000/offline.html");
        let plain = RequestDescriptor::get("http://localhost:3000/offline.html");
        assert_eq!(nav.cache_key(), plain.cache_key());
        assert_eq!(
            nav.cache_key(),
            CacheKey::get("http://localhost:3000/offline.html")
        );
    }

    #[test]
    fn test_cache_key_distinguishes_methods() {
        let get = RequestDescriptor::get("http://localhost:3000/api");
        let post = RequestDescriptor::new(
            Method::POST,
            "http://localhost:3000/api",
            RequestMode::Cors,
            Destination::Empty,
        );
        assert_ne!(get.cache_key(), post.cache_key());
    }
}
