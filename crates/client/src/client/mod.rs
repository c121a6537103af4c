//! NeerOrbit HTTP client

pub mod auth;
pub mod error;
pub mod flood;
mod refresh;

use crate::token_store::{MemoryTokenStore, TokenStore};
use error::ClientError;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const DEFAULT_USER_AGENT: &str = concat!("neerorbit-client/", env!("CARGO_PKG_VERSION"));

/// Per-call request description. Borrowed by [`ApiClient::request`], never mutated.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// Extra headers, merged over the JSON content-type default
    pub headers: BTreeMap<String, String>,
    /// Pre-serialized request body
    pub body: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: BTreeMap::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self::method(Method::POST)
    }

    pub fn method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `payload` as the request body
    pub fn json<T: Serialize + ?Sized>(self, payload: &T) -> Result<Self, ClientError> {
        Ok(self.body(serde_json::to_string(payload)?))
    }
}

/// Where an authenticated call is in its single refresh-and-retry cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initial,
    Refreshing,
    Retrying,
}

/// NeerOrbit API client
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new client with an in-memory token store
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Merge headers for one attempt: JSON content type, then caller
    /// headers, then the bearer token if one is stored.
    fn headers(&self, options: &RequestOptions) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::Configuration(format!("header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::Configuration(format!("header {name}: {e}")))?;
            headers.insert(name, value);
        }

        if let Some(token) = self.tokens.access_token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ClientError::Configuration(format!("access token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        Ok(headers)
    }

    async fn send(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<Response, ClientError> {
        let mut request = self
            .client
            .request(options.method.clone(), self.url(endpoint))
            .headers(self.headers(options)?);
        if let Some(body) = &options.body {
            request = request.body(body.clone());
        }

        let response = request.send().await?;
        debug!(
            method = %options.method,
            endpoint,
            status = response.status().as_u16(),
            "API response"
        );
        Ok(response)
    }

    /// Issue an authenticated request and decode its JSON body.
    ///
    /// A 401 triggers one token refresh followed by one retry of the same
    /// request. A second 401, or any other failure on the retry, is returned
    /// as [`ClientError::Api`]; a failed refresh is [`ClientError::SessionExpired`].
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<T, ClientError> {
        let mut phase = Phase::Initial;
        loop {
            match phase {
                Phase::Initial => {
                    let response = self.send(endpoint, options).await?;
                    let status = response.status();
                    if status == StatusCode::UNAUTHORIZED {
                        phase = Phase::Refreshing;
                    } else if status.is_success() {
                        return decode_json(response).await;
                    } else {
                        return Err(error_from_response(response).await);
                    }
                }
                Phase::Refreshing => {
                    debug!(endpoint, "Access token rejected, refreshing");
                    if !self.refresh_access_token().await {
                        return Err(ClientError::SessionExpired);
                    }
                    phase = Phase::Retrying;
                }
                Phase::Retrying => {
                    let response = self.send(endpoint, options).await?;
                    let status = response.status();
                    if !status.is_success() {
                        return Err(ClientError::api(status, None));
                    }
                    return decode_json(response).await;
                }
            }
        }
    }

    /// Issue a request without a bearer token or refresh handling
    async fn public_post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &B,
    ) -> Result<Response, ClientError> {
        let response = self
            .client
            .post(self.url(endpoint))
            .json(payload)
            .send()
            .await?;
        debug!(endpoint, status = response.status().as_u16(), "API response");
        Ok(response)
    }
}

/// Decode a success body. An empty body decodes as JSON `null`.
async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Non-empty `message` field of a JSON error body
fn server_message(body: &[u8]) -> Option<String> {
    let body: Value = serde_json::from_slice(body).ok()?;
    body.get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(str::to_owned)
}

async fn error_from_response(response: Response) -> ClientError {
    let status = response.status();
    let body = response.bytes().await.unwrap_or_default();
    ClientError::api(status, server_message(&body))
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    tokens: Option<Arc<dyn TokenStore>>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ApiClientBuilder {
    /// Set the base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Persist session tokens in `store` instead of memory
    #[must_use]
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.tokens = Some(store);
        self
    }

    /// Set the request timeout. Ignored on WASM.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        url::Url::parse(&base_url).map_err(|e| {
            ClientError::Configuration(format!("invalid base_url {base_url:?}: {e}"))
        })?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new()
            .user_agent(self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT));

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        #[cfg(target_arch = "wasm32")]
        let _ = self.timeout; // Timeouts not supported on WASM

        let client = client_builder.build()?;

        Ok(ApiClient {
            client,
            base_url,
            tokens: self
                .tokens
                .unwrap_or_else(|| Arc::new(MemoryTokenStore::new())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_token(token: Option<&str>) -> ApiClient {
        let store = token.map_or_else(MemoryTokenStore::new, |token| {
            MemoryTokenStore::with_tokens(token, "refresh")
        });
        ApiClient::builder()
            .base_url("http://localhost:8000/")
            .token_store(Arc::new(store))
            .build()
            .unwrap()
    }

    #[test]
    fn builder_requires_base_url() {
        let result = ApiClient::builder().build();
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn builder_rejects_invalid_base_url() {
        let result = ApiClient::new("not a url");
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let client = client_with_token(None);
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(
            client.url("/api/user/profile/"),
            "http://localhost:8000/api/user/profile/"
        );
    }

    #[test]
    fn headers_default_to_json() {
        let headers = client_with_token(None)
            .headers(&RequestOptions::get())
            .unwrap();
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert!(!headers.contains_key(header::AUTHORIZATION));
    }

    #[test]
    fn caller_headers_override_defaults_but_not_bearer() {
        let options = RequestOptions::post()
            .header("content-type", "text/plain")
            .header("Authorization", "Bearer caller")
            .header("X-Request-Source", "cli");
        let headers = client_with_token(Some("stored")).headers(&options).unwrap();

        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
        assert_eq!(headers[header::AUTHORIZATION], "Bearer stored");
        assert_eq!(headers["x-request-source"], "cli");
        assert_eq!(headers.get_all(header::AUTHORIZATION).iter().count(), 1);
    }

    #[test]
    fn caller_authorization_kept_without_stored_token() {
        let options = RequestOptions::get().header("Authorization", "Bearer caller");
        let headers = client_with_token(None).headers(&options).unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer caller");
    }

    #[test]
    fn invalid_header_name_is_configuration_error() {
        let options = RequestOptions::get().header("bad header", "x");
        let result = client_with_token(None).headers(&options);
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn server_message_reads_message_field_only() {
        assert_eq!(
            server_message(br#"{"message":"X","detail":"Y"}"#).as_deref(),
            Some("X")
        );
        assert_eq!(server_message(br#"{"detail":"Y"}"#), None);
        assert_eq!(server_message(br#"{"message":42}"#), None);
        assert_eq!(server_message(br#"{"message":""}"#), None);
        assert_eq!(server_message(b"<html>oops</html>"), None);
        assert_eq!(server_message(b""), None);
    }

    #[test]
    fn json_options_serialize_body() {
        let options = RequestOptions::post()
            .json(&serde_json::json!({"email": "a@b.c"}))
            .unwrap();
        assert_eq!(options.method, Method::POST);
        assert_eq!(options.body.as_deref(), Some(r#"{"email":"a@b.c"}"#));
    }
}
