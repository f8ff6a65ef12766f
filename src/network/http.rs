//! HTTP Network
//!
//! reqwest-backed fetches. Same-origin URLs are rewritten onto the upstream
//! base URL; cross-origin URLs are fetched as-is.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::Uri;
use tracing::debug;

use super::{Network, NetworkError};
use crate::cache::{origin_of, CapturedResponse, FetchRequest};

/// Headers that describe a single connection and must not be relayed.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Fetches over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: reqwest::Client,
    /// Public origin of the shell
    origin: String,
    /// Where same-origin requests are actually served from
    upstream: String,
}

impl HttpNetwork {
    /// Builds a client with the given per-request timeout.
    ///
    /// Redirects are not followed: a 3xx goes back to the client as-is and,
    /// not being ok, is never cached under the original URL.
    pub fn new(
        origin: impl Into<String>,
        upstream: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| NetworkError::Client(e.to_string()))?;

        Ok(Self {
            client,
            origin: origin.into().trim_end_matches('/').to_ascii_lowercase(),
            upstream: upstream.into().trim_end_matches('/').to_string(),
        })
    }

    /// Maps a request URL onto the URL actually fetched.
    pub fn target_url(&self, url: &str) -> Result<String, NetworkError> {
        let origin = origin_of(url).ok_or_else(|| NetworkError::InvalidUrl(url.to_string()))?;
        if origin != self.origin {
            return Ok(url.to_string());
        }

        let uri: Uri = url
            .parse()
            .map_err(|_| NetworkError::InvalidUrl(url.to_string()))?;
        let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        Ok(format!("{}{}", self.upstream, path))
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<CapturedResponse, NetworkError> {
        let descriptor = &request.descriptor;
        let target = self.target_url(descriptor.url())?;
        debug!("Fetching {} {} via {}", descriptor.method(), descriptor.url(), target);

        let mut headers = request.headers.clone();
        for name in HOP_BY_HOP {
            headers.remove(*name);
        }
        let mut builder = self
            .client
            .request(descriptor.method().clone(), target.as_str())
            .headers(headers);
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout(target.clone())
            } else {
                NetworkError::Unreachable(e.to_string())
            }
        })?;

        let status = response.status();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| NetworkError::Body(e.to_string()))?;

        let mut captured = CapturedResponse::new(status.as_u16(), body);
        captured.headers = headers;
        Ok(captured)
    }
}
