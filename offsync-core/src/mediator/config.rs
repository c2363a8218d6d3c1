//! Configuration for the network mediator

use std::time::Duration;

use url::Url;

/// Default cache generation name. Bump it whenever the precache manifest
/// changes so activation purges the old generation.
pub const DEFAULT_CACHE_NAME: &str = "offsync-cache-v1";

/// Configuration for the network mediator
#[derive(Debug, Clone)]
pub struct MediatorConfig {
    /// Origin the application is served from; same-origin responses are cacheable
    pub origin: Url,

    /// Active cache generation
    pub cache_name: String,

    /// Shell assets stored at install, as paths relative to `origin`
    pub precache: Vec<String>,

    /// Document served for failed navigations; must be in `precache`
    pub offline_page: String,

    /// Real-time channel endpoint; failed writes to it are queued
    pub realtime_endpoint: String,

    /// Path fragments that mark API and status-check requests
    pub api_patterns: Vec<String>,

    /// HTTP endpoint accepting redelivered messages
    pub outbox_url: Option<Url>,

    /// Per-request timeout; `None` keeps the client default
    pub fetch_timeout: Option<Duration>,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        let origin = Url::parse("http://localhost:3000").expect("default origin is a valid URL");
        MediatorConfig::new(origin)
    }
}

impl MediatorConfig {
    /// Default configuration for the given origin.
    pub fn new(origin: Url) -> Self {
        MediatorConfig {
            origin,
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            precache: ["/", "/index.html", "/manifest.json", "/offline.html"]
                .into_iter()
                .map(String::from)
                .collect(),
            offline_page: "/offline.html".to_string(),
            realtime_endpoint: "ws://localhost:8080".to_string(),
            api_patterns: vec!["/api/".to_string(), "/status".to_string()],
            outbox_url: None,
            fetch_timeout: None,
        }
    }

    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = name.into();
        self
    }

    pub fn with_precache(mut self, paths: Vec<String>) -> Self {
        self.precache = paths;
        self
    }

    pub fn with_realtime_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.realtime_endpoint = endpoint.into();
        self
    }

    pub fn with_outbox(mut self, url: Url) -> Self {
        self.outbox_url = Some(url);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Resolves a path against the origin.
    pub fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        self.origin.join(path)
    }

    /// True if the URL targets the real-time channel.
    pub fn is_realtime(&self, url: &Url) -> bool {
        url.as_str().starts_with(self.realtime_endpoint.as_str())
    }

    /// True if the URL path contains an API or status-check pattern.
    pub fn is_api(&self, url: &Url) -> bool {
        self.api_patterns
            .iter()
            .any(|pattern| url.path().contains(pattern.as_str()))
    }
}
