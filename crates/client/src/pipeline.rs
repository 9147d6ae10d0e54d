//! The request pipeline: one entry point for every outbound call.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use weknora_core::{ApiResult, ErrorEnvelope, RequestId};
use weknora_session::SessionStore;

use crate::config::{ClientConfig, ConfigError};
use crate::context::{ContextResolver, REQUEST_ID_HEADER, TENANT_HEADER};
use crate::guard::{Navigator, SessionGuard};
use crate::normalize::{self, is_success, parse_body, transport_failure};
use crate::stream::EventStream;
use crate::upload::{ProgressCallback, UploadForm};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream;charset=utf-8";

/// How the caller wants the success payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Json,
    /// Raw bytes (file downloads).
    Blob,
    /// Live response handed over unread.
    EventStream,
}

/// Per-call overrides for [`HttpClient::post_with`].
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extra header. `Authorization`, `X-Tenant-ID` and `X-Request-ID` always
    /// come from the session context; caller values for them are dropped.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Shorter timeout for this call. Never exceeds the client's ceiling.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn header_map(&self) -> ApiResult<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ErrorEnvelope::encode(format!("invalid header name {name:?}: {e}")))?;
            if is_context_header(&name) {
                tracing::warn!(header = %name, "ignoring caller value for context header");
                continue;
            }
            let value = HeaderValue::from_str(value)
                .map_err(|e| ErrorEnvelope::encode(format!("invalid value for header {name}: {e}")))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

/// Headers owned by the context resolver.
fn is_context_header(name: &HeaderName) -> bool {
    *name == AUTHORIZATION
        || name.as_str().eq_ignore_ascii_case(TENANT_HEADER)
        || name.as_str().eq_ignore_ascii_case(REQUEST_ID_HEADER)
}

enum Payload {
    Empty,
    Json(Value),
    Multipart(Form),
}

/// A single outgoing request. Consumed by dispatch, so it cannot change after
/// it has been sent.
struct OutgoingRequest<'a> {
    method: Method,
    path: &'a str,
    query: Vec<(String, String)>,
    payload: Payload,
    kind: ResponseKind,
    options: RequestOptions,
}

impl<'a> OutgoingRequest<'a> {
    fn new(method: Method, path: &'a str) -> Self {
        Self {
            method,
            path,
            query: Vec::new(),
            payload: Payload::Empty,
            kind: ResponseKind::Json,
            options: RequestOptions::default(),
        }
    }

    fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ErrorEnvelope::encode(format!("failed to serialize request body: {e}")))?;
        self.payload = Payload::Json(value);
        Ok(self)
    }

    fn query<Q: Serialize + ?Sized>(mut self, query: &Q) -> ApiResult<Self> {
        let value = serde_json::to_value(query)
            .map_err(|e| ErrorEnvelope::encode(format!("failed to serialize query: {e}")))?;
        self.query = query_pairs(value)?;
        Ok(self)
    }

    fn kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

/// Flatten a serialized query object into pairs; `null` entries are skipped.
fn query_pairs(value: Value) -> ApiResult<Vec<(String, String)>> {
    let Value::Object(map) = value else {
        return Err(ErrorEnvelope::encode("query parameters must serialize to an object"));
    };

    Ok(map
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect())
}

/// HTTP client for the backend API.
///
/// Cheap to clone; clones share the connection pool, the session store and
/// the session guard.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    config: Arc<ClientConfig>,
    resolver: ContextResolver,
    guard: Arc<SessionGuard>,
}

impl HttpClient {
    /// Build a client with its own session guard.
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ConfigError> {
        let guard = Arc::new(SessionGuard::new(&config, store, navigator));
        Self::with_guard(config, guard)
    }

    /// Build a client around an existing guard (and the guard's store).
    pub fn with_guard(config: ClientConfig, guard: Arc<SessionGuard>) -> Result<Self, ConfigError> {
        // The per-request id set at dispatch replaces this one.
        let base_request_id = RequestId::generate();
        let mut defaults = HeaderMap::new();
        defaults.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        defaults.insert(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_str(base_request_id.as_str()).map_err(|e| ConfigError::Invalid {
                var: "X-Request-ID",
                reason: e.to_string(),
            })?,
        );

        let inner = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(defaults)
            .build()?;

        tracing::debug!(base_url = config.base_url(), timeout = ?config.timeout(), "http client ready");

        Ok(Self {
            inner,
            resolver: ContextResolver::new(guard.store().clone()),
            config: Arc::new(config),
            guard,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn guard(&self) -> &Arc<SessionGuard> {
        &self.guard
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        self.guard.store()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send_json(OutgoingRequest::new(Method::GET, path)).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> ApiResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send_json(OutgoingRequest::new(Method::GET, path).query(query)?)
            .await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.post_with(path, body, RequestOptions::default()).await
    }

    pub async fn post_with<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = OutgoingRequest::new(Method::POST, path)
            .json(body)?
            .options(options);
        self.send_json(request).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(OutgoingRequest::new(Method::PUT, path).json(body)?)
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send_json(OutgoingRequest::new(Method::DELETE, path)).await
    }

    pub async fn delete_with_body<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(OutgoingRequest::new(Method::DELETE, path).json(body)?)
            .await
    }

    /// Multipart upload. `on_progress` sees non-decreasing byte counts as the
    /// file contents are sent.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        form: UploadForm,
        on_progress: Option<ProgressCallback>,
    ) -> ApiResult<T> {
        let mut request = OutgoingRequest::new(Method::POST, path);
        request.payload = Payload::Multipart(form.into_multipart(on_progress)?);
        self.send_json(request).await
    }

    /// POST expecting server-sent events; the live response is returned unread.
    pub async fn stream<B>(&self, path: &str, body: &B) -> ApiResult<EventStream>
    where
        B: Serialize + ?Sized,
    {
        let request = OutgoingRequest::new(Method::POST, path)
            .json(body)?
            .kind(ResponseKind::EventStream);
        let (response, request_id) = self.dispatch(request).await?;
        Ok(EventStream::new(response, request_id))
    }

    /// GET returning the raw body bytes.
    pub async fn download(&self, path: &str) -> ApiResult<Vec<u8>> {
        let request = OutgoingRequest::new(Method::GET, path).kind(ResponseKind::Blob);
        let (response, _) = self.dispatch(request).await?;
        let bytes = response.bytes().await.map_err(|e| transport_failure(&e))?;
        Ok(bytes.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(&self, request: OutgoingRequest<'_>) -> ApiResult<T> {
        let (response, request_id) = self.dispatch(request).await?;
        let bytes = response.bytes().await.map_err(|e| transport_failure(&e))?;

        serde_json::from_value(parse_body(&bytes)).map_err(|e| {
            tracing::warn!(request_id = %request_id, error = %e, "unexpected response payload");
            ErrorEnvelope::decode(format!("unexpected response payload: {e}"))
        })
    }

    /// Attach context, send, and sort the outcome into success or envelope.
    async fn dispatch(&self, request: OutgoingRequest<'_>) -> ApiResult<(Response, RequestId)> {
        let OutgoingRequest {
            method,
            path,
            query,
            payload,
            kind,
            options,
        } = request;

        // Resolved now, never earlier: the session may have changed since the
        // request was built.
        let context = self.resolver.resolve();
        let request_id = context.request_id.clone();

        let mut builder = self.inner.request(method.clone(), self.config.url_for(path));
        if !options.headers.is_empty() {
            builder = builder.headers(options.header_map()?);
        }
        builder = context.apply(builder);

        if kind == ResponseKind::EventStream {
            builder = builder
                .header(CONTENT_TYPE, EVENT_STREAM_CONTENT_TYPE)
                .header(ACCEPT, "text/event-stream");
        }
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout.min(self.config.timeout()));
        }

        builder = match payload {
            Payload::Empty => builder,
            Payload::Json(body) => builder.json(&body),
            Payload::Multipart(form) => builder.multipart(form),
        };

        tracing::debug!(
            %method,
            path,
            request_id = %request_id,
            tenant = context.tenant_id.as_ref().map(|t| t.as_str()),
            kind = ?kind,
            "dispatching request"
        );

        let response = builder.send().await.map_err(|e| transport_failure(&e))?;
        let status = response.status().as_u16();

        if is_success(status) {
            return Ok((response, request_id));
        }

        let body = match response.bytes().await {
            Ok(bytes) => parse_body(&bytes),
            Err(err) => {
                tracing::warn!(status, request_id = %request_id, error = %err, "failed to read error body");
                Value::Null
            }
        };

        if status == 401 {
            return Err(self.guard.on_unauthorized(path, &body));
        }

        tracing::debug!(status, path, request_id = %request_id, "request failed");
        Err(normalize::failure(status, body))
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("guard", &self.guard)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;
    use serde_json::json;

    use super::*;

    #[derive(Serialize)]
    struct Params {
        department_id: Option<u32>,
        query_depth: u32,
        name: &'static str,
    }

    #[test]
    fn query_pairs_skip_nulls_and_stringify_scalars() {
        let value = serde_json::to_value(Params {
            department_id: None,
            query_depth: 2,
            name: "ops",
        })
        .unwrap();

        let mut pairs = query_pairs(value).unwrap();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), "ops".to_string()),
                ("query_depth".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn non_object_query_is_rejected() {
        assert!(query_pairs(json!([1, 2])).is_err());
    }

    #[test]
    fn context_headers_cannot_be_set_per_call() {
        let options = RequestOptions::new()
            .header("Authorization", "Bearer other")
            .header("x-tenant-id", "T9")
            .header("X-Request-ID", "pinned")
            .header("X-Client", "cli");

        let map = options.header_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("x-client").unwrap(), "cli");
    }

    #[test]
    fn invalid_option_header_is_an_encode_error() {
        let options = RequestOptions::new().header("bad header", "x");
        assert!(options.header_map().is_err());
    }
}
