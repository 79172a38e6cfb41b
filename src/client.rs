use std::pin::Pin;
use std::time::{Duration, Instant};

use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::sse::process_sse;
use crate::types::{ChatCompletion, ChatCompletionChunk, ChatCompletionRequest, Model};

/// Default endpoint; any OpenAI-compatible `/chat/completions` host works.
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A stream of completion chunks.  Finite, single consumer, not restartable.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk>> + Send>>;

/// A stream of non-empty text fragments, in the order the server produced them.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Something that can run a chat completion.
///
/// [`ChatClient`] talks to a real server; sessions are generic over this trait so they
/// can be driven by a scripted implementation.
#[async_trait::async_trait]
pub trait Completer: Send + Sync {
    /// Run the request and return the whole reply at once.
    async fn complete(&self, request: ChatCompletionRequest) -> Result<ChatCompletion>;

    /// Run the request and return the reply as it is generated.
    async fn stream(&self, request: ChatCompletionRequest) -> Result<ChunkStream>;
}

/// Reduce a chunk stream to its text fragments, dropping chunks that carry no text.
pub fn text_fragments(chunks: ChunkStream) -> TokenStream {
    Box::pin(chunks.filter_map(|chunk| async move {
        match chunk {
            Ok(chunk) => chunk.text().map(|text| Ok(text.to_string())),
            Err(err) => Some(Err(err)),
        }
    }))
}

/// Client for an OpenAI-compatible chat-completion API.
#[derive(Debug, Clone)]
pub struct ChatClient {
    api_key: String,
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
}

impl ChatClient {
    /// Create a new client with the default endpoint and timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// A `base_url` without a trailing slash gets one.
    pub fn with_options(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::configuration("API key is empty"));
        }
        HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| Error::configuration("API key contains invalid header characters"))?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        let mut base_url = base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        url::Url::parse(&base_url)?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
        })
    }

    /// The endpoint requests are sent to.
    pub fn completions_url(&self) -> String {
        format!("{}chat/completions", self.base_url)
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| Error::configuration("API key contains invalid header characters"))?;
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type.
    async fn process_error_response(response: Response, model: &Model) -> Error {
        let status_code = response.status().as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        match response.text().await {
            Ok(body) => error_for_status(status_code, &body, retry_after, model),
            Err(e) => Error::http_client(
                format!("Failed to read error response: {e}"),
                Some(Box::new(e)),
            ),
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        }
    }

    /// POST the request and return the successful response.
    async fn post(&self, request: &ChatCompletionRequest, accept: &'static str) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            stream = request.stream,
            "sending chat completion request"
        );

        let mut headers = self.default_headers()?;
        headers.insert(header::ACCEPT, HeaderValue::from_static(accept));

        let result = self
            .client
            .post(self.completions_url())
            .headers(headers)
            .json(request)
            .send()
            .await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                CLIENT_REQUEST_ERRORS.click();
                let err = self.transport_error(e);
                tracing::warn!(error = %err, "chat completion request failed");
                return Err(err);
            }
        };

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            let err = Self::process_error_response(response, &request.model).await;
            tracing::warn!(error = %err, kind = ?err.kind(), "chat completion rejected");
            return Err(err);
        }
        Ok(response)
    }

    /// Send a request and get a non-streaming response.
    pub async fn send(&self, mut request: ChatCompletionRequest) -> Result<ChatCompletion> {
        request.stream = false;
        let response = self.post(&request, "application/json").await?;
        response.json::<ChatCompletion>().await.map_err(|e| {
            Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
        })
    }

    /// Send a request and get a streaming response.
    pub async fn send_streaming(&self, mut request: ChatCompletionRequest) -> Result<ChunkStream> {
        request.stream = true;
        let response = self.post(&request, "text/event-stream").await?;
        Ok(Box::pin(process_sse(response.bytes_stream())))
    }
}

/// Map a non-success status and its body to an [`Error`].
///
/// The body's `{"error": {...}}` object supplies the message when it parses; otherwise the
/// raw body is the message.
fn error_for_status(status_code: u16, body: &str, retry_after: Option<u64>, model: &Model) -> Error {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: Option<ErrorDetail>,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(rename = "type")]
        error_type: Option<String>,
        message: Option<String>,
        param: Option<String>,
    }

    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error);
    let error_type = detail.as_ref().and_then(|e| e.error_type.clone());
    let error_param = detail.as_ref().and_then(|e| e.param.clone());
    let error_message = detail
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.to_string());

    match status_code {
        400 => Error::bad_request(error_message, error_param),
        401 => Error::authentication(error_message),
        403 => Error::permission(error_message),
        404 => Error::not_found(error_message, Some(model.to_string())),
        408 => Error::timeout(error_message, None),
        429 => Error::rate_limit(error_message, retry_after),
        500 => Error::internal_server(error_message),
        502..=504 => Error::service_unavailable(error_message, retry_after),
        _ => Error::api(status_code, error_type, error_message),
    }
}

#[async_trait::async_trait]
impl Completer for ChatClient {
    async fn complete(&self, request: ChatCompletionRequest) -> Result<ChatCompletion> {
        self.send(request).await
    }

    async fn stream(&self, request: ChatCompletionRequest) -> Result<ChunkStream> {
        self.send_streaming(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use futures::stream;

    #[test]
    fn client_creation() {
        let client = ChatClient::new("test-key").unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url, DEFAULT_API_URL);
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);
        assert_eq!(
            client.completions_url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );

        let client = ChatClient::with_options(
            "test-key",
            Some("http://localhost:11434/v1".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:11434/v1/");
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn empty_key_is_configuration_error() {
        let err = ChatClient::new("  ").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn bad_base_url_rejected() {
        assert!(ChatClient::with_options("k", Some("not a url".to_string()), None).is_err());
    }

    #[test]
    fn headers_carry_bearer_token() {
        let client = ChatClient::new("secret").unwrap();
        let headers = client.default_headers().unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer secret");
    }

    fn llama() -> Model {
        Model::from("llama-3.1-8b-instant")
    }

    fn body(error_type: &str, message: &str) -> String {
        format!(r#"{{"error":{{"type":"{error_type}","message":"{message}","param":"messages"}}}}"#)
    }

    #[test]
    fn status_400_is_payload_rejected() {
        let err = error_for_status(400, &body("invalid_request_error", "too big"), None, &llama());
        match &err {
            Error::BadRequest { message, param } => {
                assert_eq!(message, "too big");
                assert_eq!(param.as_deref(), Some("messages"));
            }
            other => panic!("expected BadRequest, got {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::PayloadRejected);
        assert!(err.hint().is_some());
    }

    #[test]
    fn status_401_and_403_are_auth() {
        let err = error_for_status(401, &body("invalid_api_key", "bad key"), None, &llama());
        assert!(err.is_authentication());
        assert_eq!(err.kind(), ErrorKind::Auth);
        let err = error_for_status(403, &body("permission_denied", "nope"), None, &llama());
        assert!(matches!(err, Error::Permission { .. }));
        assert_eq!(err.kind(), ErrorKind::Auth);
    }

    #[test]
    fn status_404_names_the_model() {
        let err = error_for_status(404, &body("not_found", "no such model"), None, &llama());
        match &err {
            Error::NotFound { message, model } => {
                assert_eq!(message, "no such model");
                assert_eq!(model.as_deref(), Some("llama-3.1-8b-instant"));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::ModelNotFound);
        assert!(err.hint().unwrap().contains("/model"));
    }

    #[test]
    fn status_413_and_422_are_payload_rejected() {
        for status in [413, 422] {
            let err = error_for_status(status, &body("request_too_large", "x"), None, &llama());
            match &err {
                Error::Api {
                    status_code,
                    error_type,
                    ..
                } => {
                    assert_eq!(*status_code, status);
                    assert_eq!(error_type.as_deref(), Some("request_too_large"));
                }
                other => panic!("expected Api, got {other:?}"),
            }
            assert_eq!(err.kind(), ErrorKind::PayloadRejected);
        }
    }

    #[test]
    fn status_429_keeps_retry_after() {
        let err = error_for_status(429, &body("rate_limit_exceeded", "slow"), Some(7), &llama());
        match &err {
            Error::RateLimit { retry_after, .. } => assert_eq!(*retry_after, Some(7)),
            other => panic!("expected RateLimit, got {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::RateLimited);
    }

    #[test]
    fn status_5xx_is_server() {
        let err = error_for_status(500, &body("server_error", "boom"), None, &llama());
        assert!(matches!(err, Error::InternalServer { .. }));
        let err = error_for_status(503, &body("overloaded", "busy"), Some(3), &llama());
        match &err {
            Error::ServiceUnavailable { retry_after, .. } => assert_eq!(*retry_after, Some(3)),
            other => panic!("expected ServiceUnavailable, got {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::Server);
        let err = error_for_status(599, "", None, &llama());
        assert_eq!(err.kind(), ErrorKind::Server);
    }

    #[test]
    fn status_408_is_timeout() {
        let err = error_for_status(408, "timed out", None, &llama());
        assert!(matches!(err, Error::Timeout { .. }));
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn non_json_body_becomes_message() {
        let err = error_for_status(502, "<html>Bad Gateway</html>", None, &llama());
        assert!(err.to_string().contains("<html>Bad Gateway</html>"));
        let err = error_for_status(418, "teapot", None, &llama());
        match &err {
            Error::Api {
                status_code,
                error_type,
                message,
            } => {
                assert_eq!(*status_code, 418);
                assert!(error_type.is_none());
                assert_eq!(message, "teapot");
            }
            other => panic!("expected Api, got {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[tokio::test]
    async fn fragments_skip_empty_chunks() {
        let chunks: ChunkStream = Box::pin(stream::iter(vec![
            Ok(ChatCompletionChunk::default()),
            Ok(ChatCompletionChunk::from_text("Hi")),
            Ok(ChatCompletionChunk::from_text("")),
            Ok(ChatCompletionChunk::from_text(" there!")),
        ]));
        let fragments: Vec<String> = text_fragments(chunks)
            .map(|f| f.unwrap())
            .collect()
            .await;
        assert_eq!(fragments, vec!["Hi".to_string(), " there!".to_string()]);
    }

    #[tokio::test]
    async fn fragments_pass_errors_through() {
        let chunks: ChunkStream = Box::pin(stream::iter(vec![
            Ok(ChatCompletionChunk::from_text("Hi")),
            Err(Error::streaming("reset", None)),
        ]));
        let fragments: Vec<Result<String>> = text_fragments(chunks).collect().await;
        assert!(fragments[0].is_ok());
        assert!(fragments[1].is_err());
    }
}
