use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::observability::CLIENT_REQUEST_DURATION;
use crate::types::{ChatRequest, ChatResponse, HistoryResponse};

/// Header carrying the shared secret.
pub const AUTH_HEADER: &str = "x-auth";

/// The two calls the chat service exposes.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// `GET /history/{session_id}`.
    async fn fetch_history(&self, session_id: &str) -> Result<HistoryResponse>;

    /// `POST /chat`.
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

#[async_trait::async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn fetch_history(&self, session_id: &str) -> Result<HistoryResponse> {
        (**self).fetch_history(session_id).await
    }

    async fn send_message(&self, request: &ChatRequest) -> Result<ChatResponse> {
        (**self).send_message(request).await
    }
}

/// HTTP client for the chat service.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: ReqwestClient,
    base_url: Url,
    auth_secret: Option<HeaderValue>,
    timeout: Option<Duration>,
}

impl ChatClient {
    /// Create a client from a resolved configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = config.resolved_base_url()?;
        Self::with_options(base_url, config.auth_secret.clone(), config.request_timeout)
    }

    /// Create a client with explicit settings.
    ///
    /// Without a timeout a request that never settles is awaited forever.
    pub fn with_options(
        base_url: Url,
        auth_secret: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(Error::validation(
                format!("{base_url} cannot be used as an API base"),
                Some("api_base".to_string()),
            ));
        }
        let auth_secret = auth_secret
            .map(|secret| {
                HeaderValue::from_str(&secret).map_err(|_| {
                    Error::validation(
                        "auth secret is not a valid header value",
                        Some("auth".to_string()),
                    )
                })
            })
            .transpose()?;

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            base_url,
            auth_secret,
            timeout,
        })
    }

    /// The base every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the URL for an endpoint below the base.
    ///
    /// Each segment is percent-encoded on its own, so a session id can never
    /// escape its path segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::url(format!("{} cannot be a base", self.base_url), None))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(secret) = &self.auth_secret {
            headers.insert(AUTH_HEADER, secret.clone());
        }
        headers
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                self.timeout.map(|t| t.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Turn a non-success response into an API error carrying its body.
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();
        match response.text().await {
            Ok(body) => Error::api(status_code, body),
            Err(e) => Error::api(status_code, format!("<unreadable body: {e}>")),
        }
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }
        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

#[async_trait::async_trait]
impl ChatTransport for ChatClient {
    async fn fetch_history(&self, session_id: &str) -> Result<HistoryResponse> {
        let url = self.endpoint(&["history", session_id])?;
        log::debug!("GET {url}");
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .headers(self.default_headers())
            .send()
            .await
            .map_err(|e| self.map_send_error(e));
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        Self::parse(response?).await
    }

    async fn send_message(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = self.endpoint(&["chat"])?;
        log::debug!(
            "POST {url} (message: {} chars, image: {})",
            request.message.chars().count(),
            request.image_base64.is_some()
        );
        let mut headers = self.default_headers();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        let start = Instant::now();
        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e));
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        Self::parse(response?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str, secret: Option<&str>) -> ChatClient {
        ChatClient::with_options(
            Url::parse(base).unwrap(),
            secret.map(String::from),
            None,
        )
        .unwrap()
    }

    #[test]
    fn endpoints_join_below_root() {
        let client = client("http://localhost:8000", None);
        assert_eq!(
            client.endpoint(&["chat"]).unwrap().as_str(),
            "http://localhost:8000/chat"
        );
        assert_eq!(
            client.endpoint(&["history", "abc-123"]).unwrap().as_str(),
            "http://localhost:8000/history/abc-123"
        );
    }

    #[test]
    fn endpoints_join_below_prefix() {
        let with_slash = client("https://example.trycloudflare.com/api/", None);
        let without_slash = client("https://example.trycloudflare.com/api", None);
        for client in [with_slash, without_slash] {
            assert_eq!(
                client.endpoint(&["chat"]).unwrap().as_str(),
                "https://example.trycloudflare.com/api/chat"
            );
        }
    }

    #[test]
    fn session_id_stays_in_one_segment() {
        let client = client("http://localhost:8000/", None);
        assert_eq!(
            client.endpoint(&["history", "a/b c"]).unwrap().as_str(),
            "http://localhost:8000/history/a%2Fb%20c"
        );
    }

    #[test]
    fn relative_bases_resolve_like_a_browser() {
        let origin = "http://chat.local:8000/static/index.html";
        for (base, chat, history) in [
            (
                "",
                "http://chat.local:8000/chat",
                "http://chat.local:8000/history/abc-123",
            ),
            (
                "/api",
                "http://chat.local:8000/api/chat",
                "http://chat.local:8000/api/history/abc-123",
            ),
            (
                ".",
                "http://chat.local:8000/static/chat",
                "http://chat.local:8000/static/history/abc-123",
            ),
        ] {
            let config = ClientConfig::new()
                .with_api_base(base)
                .with_origin(Some(origin.to_string()));
            let client = ChatClient::new(&config).unwrap();
            assert_eq!(client.endpoint(&["chat"]).unwrap().as_str(), chat, "{base:?}");
            assert_eq!(
                client.endpoint(&["history", "abc-123"]).unwrap().as_str(),
                history,
                "{base:?}"
            );
        }
    }

    #[test]
    fn auth_header_only_when_configured() {
        let anonymous = client("http://localhost:8000", None);
        assert!(anonymous.default_headers().get(AUTH_HEADER).is_none());

        let authed = client("http://localhost:8000", Some("my-secret-key"));
        assert_eq!(
            authed.default_headers().get(AUTH_HEADER).unwrap(),
            "my-secret-key"
        );
    }

    #[test]
    fn invalid_secret_is_rejected() {
        let err = ChatClient::with_options(
            Url::parse("http://localhost:8000").unwrap(),
            Some("bad\nsecret".to_string()),
            None,
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn non_base_url_is_rejected() {
        let err =
            ChatClient::with_options(Url::parse("mailto:someone@example.com").unwrap(), None, None)
                .unwrap_err();
        assert!(err.is_validation());
    }
}
