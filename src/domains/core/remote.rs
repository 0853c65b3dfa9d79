use crate::domains::core::cancellation::CancellationToken;
use crate::errors::{DomainError, DomainResult, RemoteError};
use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Thin wrapper over the HTTP client shared by the activity and condominium APIs
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// `request_timeout` of `None` keeps the client's default (no overall timeout).
    pub fn new(base_url: &str, request_timeout: Option<Duration>) -> Self {
        let mut builder = Client::builder().connect_timeout(Duration::from_secs(10));
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.client.patch(self.url(path))
    }

    /// Send and decode a JSON body. With a token, cancellation wins over a pending response
    /// and yields `DomainError::Aborted`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        cancel: Option<&CancellationToken>,
    ) -> DomainResult<T> {
        match cancel {
            Some(token) => {
                if token.is_cancelled() {
                    return Err(DomainError::Aborted);
                }
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("Request aborted before completion");
                        Err(DomainError::Aborted)
                    }
                    result = Self::execute(request) => result,
                }
            }
            None => Self::execute(request).await,
        }
    }

    async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> DomainResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| DomainError::Remote(RemoteError::InvalidResponse(e.to_string())))
        } else {
            let body = response.text().await.unwrap_or_default();
            debug!("Server returned error {}: {}", status, body);
            Err(DomainError::Remote(RemoteError::Rejected {
                status: status.as_u16(),
                message: error_message_from_body(status.as_u16(), &body),
            }))
        }
    }
}

/// Pull the `{error: string}` message out of an error body, else a generic message.
pub fn error_message_from_body(status: u16, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error: Some(message) }) if !message.trim().is_empty() => message,
        _ => RemoteError::generic_message(status),
    }
}

/// Percent-encode a single path segment (ids are opaque).
pub fn path_segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}
