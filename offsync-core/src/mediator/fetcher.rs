//! Network fetcher
//!
//! The [`Fetcher`] seam issues a request against the real network. The
//! production implementation uses reqwest; tests use
//! [`super::MockFetcher`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use url::{Origin, Url};

use super::config::MediatorConfig;
use super::error::FetchError;
use super::request::{Request, Response, ResponseType};

/// Issues requests against the network.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fails only when no response was obtained at all. HTTP error statuses
    /// are returned as responses.
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        (**self).fetch(request).await
    }
}

/// HTTP fetcher built on reqwest.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    origin: Origin,
}

impl HttpFetcher {
    /// Creates a fetcher for the configured origin.
    pub fn new(config: &MediatorConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder().user_agent(format!(
            "offsync/{}",
            option_env!("CARGO_PKG_VERSION").unwrap_or("0.1.0")
        ));

        if let Some(timeout) = config.fetch_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(HttpFetcher {
            client: builder.build()?,
            origin: config.origin.origin(),
        })
    }

    /// Response type for a response to `url`.
    fn response_type(&self, url: &Url) -> ResponseType {
        if url.origin() == self.origin {
            ResponseType::Basic
        } else {
            ResponseType::Cors
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        if !matches!(request.url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidRequest(format!(
                "unsupported scheme: {}",
                request.url.scheme()
            )));
        }

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await?;

        let kind = self.response_type(response.url());
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        tracing::trace!(url = %request.url, status = status.as_u16(), "fetched");
        Ok(Response {
            status,
            headers,
            body,
            kind,
        })
    }
}
