// Request pipeline
//
// Typed HTTP client over reqwest: reads the bearer credential per request
// (never a baked-in header copy), unwraps the server's response envelope,
// and classifies every failure into the AppError taxonomy. Holds no
// per-call state of its own.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config;
use crate::credentials::CredentialStore;
use crate::error::AppError;
use crate::global;

/// Mutable view of an outbound request, handed to request interceptors
/// before emission.
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    pub timeout: Duration,
}

/// Read-only view of an inbound response, handed to response interceptors
/// before the result resolves.
pub struct ResponseContext {
    pub url: String,
    pub status: u16,
    pub body: Value,
}

/// Extension hook around the pipeline. Implementations must either succeed
/// or return an AppError; there is no way to swallow a failure silently.
pub trait Interceptor: Send + Sync {
    fn on_request(&self, _ctx: &mut RequestContext) -> Result<(), AppError> {
        Ok(())
    }

    fn on_response(&self, _ctx: &ResponseContext) -> Result<(), AppError> {
        Ok(())
    }
}

/// Per-call overrides
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
}

/// The nominal wire shape is `{ data, message, success }`, but several
/// endpoints return the payload bare. Decoding models that as a sum type;
/// the envelope arm wins whenever a `data` key is present.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WirePayload {
    Envelope {
        data: Value,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        success: Option<bool>,
    },
    Bare(Value),
}

/// Unwrap a 2xx body: envelope yields its `data`, a bare object or array
/// passes through, anything else is a classification failure.
pub fn unwrap_payload(body: Value) -> Result<Value, AppError> {
    match serde_json::from_value::<WirePayload>(body) {
        Ok(WirePayload::Envelope { data, .. }) => Ok(data),
        Ok(WirePayload::Bare(value)) if value.is_object() || value.is_array() => Ok(value),
        _ => Err(AppError::unexpected(
            "response body is neither a server envelope nor a JSON collection",
        )),
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    default_timeout: Duration,
    credentials: Arc<CredentialStore>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    on_unauthorized: RwLock<Option<Arc<dyn Fn() + Send + Sync>>>,
}

impl ApiClient {
    /// Build a client from the global configuration
    pub fn new(credentials: Arc<CredentialStore>) -> Result<Self, AppError> {
        let cfg = config::config();
        Self::with_base_url(credentials, &cfg.base_url, cfg.request_timeout_ms)
    }

    pub fn with_base_url(
        credentials: Arc<CredentialStore>,
        base_url: &str,
        timeout_ms: u64,
    ) -> Result<Self, AppError> {
        let parsed = Url::parse(base_url).map_err(|e| {
            AppError::validation(format!("invalid base url '{}': {}", base_url, e))
        })?;
        let base_url = parsed.as_str().trim_end_matches('/').to_string();

        let http = reqwest::Client::builder()
            .gzip(true)
            .build()
            .map_err(|e| AppError::unexpected(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            default_timeout: Duration::from_millis(timeout_ms),
            credentials,
            interceptors: Vec::new(),
            on_unauthorized: RwLock::new(None),
        })
    }

    pub fn add_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    /// Hook fired once per 401, after the credential has been cleared.
    /// The session layer uses it to schedule the login redirect.
    pub fn set_on_unauthorized(&self, hook: Arc<dyn Fn() + Send + Sync>) {
        *self
            .on_unauthorized
            .write()
            .unwrap_or_else(|e| e.into_inner()) = Some(hook);
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        self.request(Method::GET, path, None, RequestOptions::default())
            .await
            .and_then(decode)
    }

    /// GET returning the unwrapped but untyped payload, for responses that
    /// must pass through the normalizer before deserialization.
    pub async fn get_value(&self, path: &str) -> Result<Value, AppError> {
        self.request(Method::GET, path, None, RequestOptions::default())
            .await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, AppError> {
        let body = encode(body)?;
        self.request(Method::POST, path, Some(body), RequestOptions::default())
            .await
            .and_then(decode)
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, AppError> {
        let body = encode(body)?;
        self.request(Method::PUT, path, Some(body), RequestOptions::default())
            .await
            .and_then(decode)
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        self.request(Method::DELETE, path, None, RequestOptions::default())
            .await
            .and_then(decode)
    }

    /// The full pipeline: interceptors, auth injection, emission, envelope
    /// unwrapping, taxonomy classification.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<Value, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let mut ctx = RequestContext {
            method: method.clone(),
            path: path.to_string(),
            url: url.clone(),
            headers: self.preflight_headers(body.is_some()),
            body,
            timeout: options.timeout.unwrap_or(self.default_timeout),
        };

        for interceptor in &self.interceptors {
            if let Err(err) = interceptor.on_request(&mut ctx) {
                return Err(self.capture(err.with_url(&url)));
            }
        }

        tracing::debug!(method = %ctx.method, url = %ctx.url, "issuing request");

        let mut builder = self
            .http
            .request(ctx.method.clone(), &ctx.url)
            .headers(ctx.headers.clone())
            .timeout(ctx.timeout);
        if let Some(body) = &ctx.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = if e.is_timeout() {
                    AppError::timeout(format!("request to {} exceeded deadline", url))
                } else {
                    AppError::network(format!("request to {} failed: {}", url, e))
                };
                return Err(self.capture(err.with_original(e).with_url(&url)));
            }
        };

        let status = response.status().as_u16();
        let body_text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                let err =
                    AppError::network(format!("failed to read response from {}: {}", url, e));
                return Err(self.capture(err.with_original(e).with_url(&url)));
            }
        };
        let body_value: Value = if body_text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body_text).unwrap_or(Value::String(body_text))
        };

        let response_ctx = ResponseContext {
            url: url.clone(),
            status,
            body: body_value,
        };
        for interceptor in &self.interceptors {
            if let Err(err) = interceptor.on_response(&response_ctx) {
                return Err(self.capture(err.with_url(&url)));
            }
        }

        if !(200..300).contains(&status) {
            return Err(self.classify_failure(&response_ctx));
        }

        match unwrap_payload(response_ctx.body) {
            Ok(data) => Ok(data),
            Err(err) => Err(self.capture(err.with_url(&url))),
        }
    }

    fn preflight_headers(&self, has_body: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.credentials.get_token() {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        if has_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        headers
    }

    fn classify_failure(&self, ctx: &ResponseContext) -> AppError {
        let message = server_message(&ctx.body)
            .unwrap_or_else(|| format!("request to {} failed with status {}", ctx.url, ctx.status));

        if ctx.status == 401 {
            // Expired or revoked session: drop the credential before anyone
            // else observes the error, then let the host redirect.
            self.credentials.clear();
            let hook = self
                .on_unauthorized
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .clone();
            if let Some(hook) = hook {
                hook();
            }
        }

        let err = AppError::from_status(ctx.status, message).with_url(&ctx.url);
        self.capture(err)
    }

    /// Record the failure with the error subsystem, then hand it back to the
    /// caller for slice updates and boundary propagation.
    fn capture(&self, err: AppError) -> AppError {
        global::capture(&err);
        err
    }
}

fn encode(body: &impl Serialize) -> Result<Value, AppError> {
    serde_json::to_value(body)
        .map_err(|e| AppError::unexpected(format!("failed to serialize request body: {}", e)))
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| {
        AppError::unexpected(format!("response payload has unexpected shape: {}", e))
    })
}

/// Pull the server's own `message` (or `error`) string out of a failure body
fn server_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .or_else(|| body.get("error").and_then(Value::as_str))
        .map(str::to_string)
}
