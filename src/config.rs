//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;

/// App shell resources fetched into the precache partition at install time.
pub const DEFAULT_PRECACHE_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/offline.html",
    "/manifest.json",
    "/css/styles.css",
    "/js/app.js",
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css",
    "https://cdn.jsdelivr.net/npm/bootstrap-icons@1.11.0/font/bootstrap-icons.css",
    "https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700&display=swap",
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/js/bootstrap.bundle.min.js",
];

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Public origin the shell is served from (scheme://host[:port])
    pub origin: String,
    /// Base URL same-origin requests are forwarded to
    pub upstream_url: String,
    /// Prefix for partition names
    pub namespace: String,
    /// Cache version; bumping it invalidates every partition of the old version
    pub cache_version: String,
    /// Path of the page served to failed navigations
    pub offline_page: String,
    /// Resources fetched into the precache partition on install
    pub precache_assets: Vec<String>,
    /// Network fetch timeout in seconds
    pub fetch_timeout: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SHELL_ORIGIN` - Public origin (default: http://localhost:3000)
    /// - `UPSTREAM_URL` - Upstream base URL (default: http://localhost:8080)
    /// - `SHELL_NAMESPACE` - Partition name prefix (default: shell)
    /// - `CACHE_VERSION` - Cache version (default: v1.0.0)
    /// - `OFFLINE_PAGE` - Offline fallback path (default: /offline.html)
    /// - `PRECACHE_ASSETS` - Comma-separated precache manifest
    /// - `FETCH_TIMEOUT_SECS` - Network timeout in seconds (default: 10)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            origin: env::var("SHELL_ORIGIN")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.origin),
            upstream_url: env::var("UPSTREAM_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.upstream_url),
            namespace: env::var("SHELL_NAMESPACE").unwrap_or(defaults.namespace),
            cache_version: env::var("CACHE_VERSION").unwrap_or(defaults.cache_version),
            offline_page: env::var("OFFLINE_PAGE").unwrap_or(defaults.offline_page),
            precache_assets: env::var("PRECACHE_ASSETS")
                .map(|v| parse_asset_list(&v))
                .unwrap_or(defaults.precache_assets),
            fetch_timeout: env::var("FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.fetch_timeout),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            origin: "http://localhost:3000".to_string(),
            upstream_url: "http://localhost:8080".to_string(),
            namespace: "shell".to_string(),
            cache_version: "v1.0.0".to_string(),
            offline_page: "/offline.html".to_string(),
            precache_assets: DEFAULT_PRECACHE_ASSETS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fetch_timeout: 10,
        }
    }
}

/// Splits a comma-separated manifest, dropping blank entries.
fn parse_asset_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
