//! HTTP redelivery
//!
//! Posts each queued payload as JSON to an outbox endpoint. Used when the
//! drain runs somewhere without a live socket.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use url::Url;

use super::Redeliver;
use crate::mediator::{Fetcher, Request};
use crate::network::NetworkError;
use crate::storage::PendingMessage;

/// Redelivers through a [`Fetcher`] to an outbox URL.
pub struct FetchRedelivery<F: Fetcher> {
    fetcher: F,
    outbox: Url,
}

impl<F: Fetcher> FetchRedelivery<F> {
    pub fn new(fetcher: F, outbox: Url) -> Self {
        FetchRedelivery { fetcher, outbox }
    }

    pub fn outbox(&self) -> &Url {
        &self.outbox
    }
}

#[async_trait]
impl<F: Fetcher> Redeliver for FetchRedelivery<F> {
    async fn redeliver(&self, message: &PendingMessage) -> Result<(), NetworkError> {
        let body = message.payload.to_json()?;
        let request = Request::post(self.outbox.clone(), body)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(|e| NetworkError::SendFailed(e.to_string()))?;

        if response.status.is_success() {
            Ok(())
        } else {
            Err(NetworkError::Rejected(format!(
                "outbox answered {}",
                response.status.as_u16()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mediator::{MockFetcher, Response, ResponseType, StatusCode};
    use crate::network::MessagePayload;

    const OUTBOX: &str = "http://app.test/api/outbox";

    #[tokio::test]
    async fn test_success_status_delivers() {
        let fetcher = MockFetcher::new();
        fetcher.route(
            OUTBOX,
            Response::new(StatusCode::CREATED, "", ResponseType::Basic),
        );
        let redelivery = FetchRedelivery::new(fetcher.clone(), Url::parse(OUTBOX).unwrap());

        let message = PendingMessage::new(MessagePayload::chat("hi"));
        assert!(redelivery.redeliver(&message).await.is_ok());
        assert_eq!(fetcher.calls(), vec![("POST".to_string(), OUTBOX.to_string())]);
    }

    #[tokio::test]
    async fn test_error_status_is_rejected() {
        let fetcher = MockFetcher::new();
        let redelivery = FetchRedelivery::new(fetcher, Url::parse(OUTBOX).unwrap());

        let message = PendingMessage::new(MessagePayload::chat("hi"));
        assert!(matches!(
            redelivery.redeliver(&message).await,
            Err(NetworkError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_outbox_fails() {
        let fetcher = MockFetcher::new();
        fetcher.set_offline(true);
        let redelivery = FetchRedelivery::new(fetcher, Url::parse(OUTBOX).unwrap());

        let message = PendingMessage::new(MessagePayload::chat("hi"));
        assert!(matches!(
            redelivery.redeliver(&message).await,
            Err(NetworkError::SendFailed(_))
        ));
    }
}
