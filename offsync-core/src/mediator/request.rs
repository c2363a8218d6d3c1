//! Request and response values seen by the mediator.

use std::borrow::Cow;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

/// An outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Request {
            method,
            url,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn get(url: Url) -> Self {
        Request::new(Method::GET, url)
    }

    pub fn post(url: Url, body: impl Into<Vec<u8>>) -> Self {
        Request::new(Method::POST, url).with_body(body)
    }

    /// A navigation request: GET that accepts an HTML document.
    pub fn navigate(url: Url) -> Self {
        Request::get(url).with_header(ACCEPT, HeaderValue::from_static("text/html"))
    }

    pub fn with_header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// True if the `Accept` header admits an HTML document.
    pub fn accepts_html(&self) -> bool {
        self.headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.contains("text/html"))
    }

    /// True for methods that carry a write.
    pub fn is_write(&self) -> bool {
        matches!(
            self.method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        )
    }

    /// Identity used for cache lookups: the URL without its fragment.
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.to_string()
    }
}

/// How a response relates to the requesting origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin network response.
    Basic,
    /// Cross-origin response with readable body.
    Cors,
    /// Cross-origin response without readable body.
    Opaque,
    /// Built locally rather than fetched.
    Synthetic,
}

/// A response handed back to the requester.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub kind: ResponseType,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>, kind: ResponseType) -> Self {
        Response {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            kind,
        }
    }

    /// A synthesized JSON response.
    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        Response::new(status, value.to_string(), ResponseType::Synthetic)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
    }

    /// A synthesized plain-text response.
    pub fn text(status: StatusCode, text: &str) -> Self {
        Response::new(status, text.as_bytes(), ResponseType::Synthetic)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
    }

    pub fn with_header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Body decoded as UTF-8 (lossy).
    pub fn text_body(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Body parsed as JSON, if it is JSON.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// True for 200 responses from the requesting origin; the only kind the
    /// mediator caches.
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK && self.kind == ResponseType::Basic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_navigation_accepts_html() {
        assert!(Request::navigate(url("http://app.test/")).accepts_html());
        assert!(!Request::get(url("http://app.test/app.js")).accepts_html());
    }

    #[test]
    fn test_cache_key_ignores_fragment() {
        let a = Request::get(url("http://app.test/page?x=1#top"));
        let b = Request::get(url("http://app.test/page?x=1"));
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_only_ok_basic_is_cacheable() {
        let ok = Response::new(StatusCode::OK, "x", ResponseType::Basic);
        let cors = Response::new(StatusCode::OK, "x", ResponseType::Cors);
        let missing = Response::new(StatusCode::NOT_FOUND, "x", ResponseType::Basic);

        assert!(ok.is_cacheable());
        assert!(!cors.is_cacheable());
        assert!(!missing.is_cacheable());
    }
}
