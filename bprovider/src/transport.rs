//! Chat transport trait and reqwest-based HTTP implementation.
//!
//! The transport performs exactly one HTTP exchange and hands the body back
//! either whole or as a chunk stream; it never parses success payloads. A
//! non-2xx status is classified into a [`ProviderError`] carrying the
//! upstream status code and the error message extracted from the body, and
//! the body is never treated as success data.

use std::pin::Pin;
use std::time::Duration;

use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{Client, Response};
use serde_json::Value;

use crate::{ProviderError, ProviderFuture, SecretString};

pub type ByteChunkStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ProviderError>> + Send>>;

/// Response body in the two shapes the engine consumes.
pub enum TransportBody {
    /// Complete body of a non-streamed response.
    Full(String),
    /// Incrementally-read body of a streamed response, one item per
    /// network read.
    Chunked(ByteChunkStream),
}

pub trait ChatTransport: Send + Sync {
    fn post_chat<'a>(
        &'a self,
        url: &'a str,
        bearer: Option<&'a SecretString>,
        body: &'a Value,
        streaming: bool,
    ) -> ProviderFuture<'a, Result<TransportBody, ProviderError>>;

    fn get_models<'a>(
        &'a self,
        url: &'a str,
        bearer: Option<&'a SecretString>,
    ) -> ProviderFuture<'a, Result<String, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct HttpChatTransport {
    client: Client,
    request_timeout: Option<Duration>,
}

impl HttpChatTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            request_timeout: None,
        }
    }

    /// Bounds the time until response headers arrive; body reads are not
    /// covered, streamed bodies legitimately stay open for a long time.
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = Some(request_timeout);
        self
    }

    fn apply_auth(
        builder: reqwest::RequestBuilder,
        bearer: Option<&SecretString>,
    ) -> reqwest::RequestBuilder {
        match bearer {
            Some(key) => builder.bearer_auth(key.expose()),
            None => builder,
        }
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<Response, ProviderError> {
        let send = builder.send();

        let outcome = match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, send)
                .await
                .map_err(|_| ProviderError::timeout("request timed out awaiting headers"))?,
            None => send.await,
        };

        outcome.map_err(|err| {
            if err.is_timeout() {
                ProviderError::timeout(err.to_string())
            } else {
                ProviderError::transport(err.to_string())
            }
        })
    }

    async fn error_for_response(response: Response) -> ProviderError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let trimmed = body.trim();
        let message = extract_error_message(&body)
            .or_else(|| (!trimmed.is_empty()).then(|| trimmed.to_string()))
            .unwrap_or_else(|| format!("request failed with status {status}"));

        ProviderError::from_status(status, message)
    }
}

impl ChatTransport for HttpChatTransport {
    fn post_chat<'a>(
        &'a self,
        url: &'a str,
        bearer: Option<&'a SecretString>,
        body: &'a Value,
        streaming: bool,
    ) -> ProviderFuture<'a, Result<TransportBody, ProviderError>> {
        Box::pin(async move {
            let builder = Self::apply_auth(self.client.post(url).json(body), bearer);
            let response = self.send(builder).await?;

            if !response.status().is_success() {
                return Err(Self::error_for_response(response).await);
            }

            if streaming {
                let chunks = response.bytes_stream().map(|item| {
                    item.map(|bytes| bytes.to_vec()).map_err(|err| {
                        if err.is_timeout() {
                            ProviderError::timeout(err.to_string())
                        } else {
                            ProviderError::transport(err.to_string())
                        }
                    })
                });

                Ok(TransportBody::Chunked(Box::pin(chunks)))
            } else {
                let text = response
                    .text()
                    .await
                    .map_err(|err| ProviderError::transport(err.to_string()))?;
                Ok(TransportBody::Full(text))
            }
        })
    }

    fn get_models<'a>(
        &'a self,
        url: &'a str,
        bearer: Option<&'a SecretString>,
    ) -> ProviderFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let builder = Self::apply_auth(self.client.get(url), bearer);
            let response = self.send(builder).await?;

            if !response.status().is_success() {
                return Err(Self::error_for_response(response).await);
            }

            response
                .text()
                .await
                .map_err(|err| ProviderError::transport(err.to_string()))
        })
    }
}

/// Pulls a human-readable message out of a JSON error body.
///
/// Understands both `{"error":{"message":"..."}}` and `{"error":"..."}`
/// envelopes; non-JSON bodies are surfaced verbatim by the caller.
fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<Value>(body).ok()?;
    match parsed.get("error")? {
        Value::String(message) => Some(message.clone()),
        Value::Object(envelope) => envelope
            .get("message")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        _ => None,
    }
}
