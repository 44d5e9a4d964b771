//! Minimal HTTP client with structured logging and optional retries.
//!
//! - Request options: headers, query params, timeout, retries
//! - Text (`get_text`) and JSON (`get_json`) helpers over one request core
//! - Retries 429/5xx/network failures with exponential backoff and `Retry-After`
//!   support, but only when a retry budget is configured (the default is none)
//! - Optional *raw* response logging via `JAMKICK_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), jamkick_http::HttpError> {
//! use std::borrow::Cow;
//!
//! let client = jamkick_http::HttpClient::new("http://localhost:5000")?;
//! let html = client
//!     .get_text(
//!         "/results",
//!         jamkick_http::RequestOpts {
//!             query: Some(vec![("page", Cow::Borrowed("1"))]),
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//! # let _ = html;
//! # Ok(()) }
//! ```
//!
//! Observability: `tracing` events are emitted for request start, response
//! headers, body snippets (truncated), retries and final errors. Raw bodies go
//! to the `http.raw` target when `JAMKICK_HTTP_RAW=1`.

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "JAMKICK_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn next_request_id() -> String {
    format!("r{:06}", REQUEST_SEQ.fetch_add(1, Ordering::Relaxed))
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// HTTP status for server-side failures, `None` for transport/local errors.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ==============================
// Request Options
// ==============================

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use jamkick_http::RequestOpts;
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     retries: Some(0),
///     query: Some(vec![("username", Cow::Borrowed("alice"))]),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(opts.headers.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
}

// ==============================
// Client
// ==============================

#[derive(Clone, Debug)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    /// Applied when a request does not carry its own timeout. `None` leaves
    /// requests unbounded.
    pub default_timeout: Option<Duration>,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use jamkick_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new("http://localhost:5000")?;
    /// assert_eq!(client.default_timeout, None);
    /// assert_eq!(client.max_retries, 0);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: None,
            max_retries: 0,
        })
    }

    /// Set a default per-request timeout.
    ///
    /// ```no_run
    /// use jamkick_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("http://localhost:5000")?
    ///     .with_timeout(Duration::from_secs(2));
    /// assert_eq!(client.default_timeout, Some(Duration::from_secs(2)));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = Some(dur);
        self
    }

    /// Override the default retry budget (zero unless set here).
    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    /// Resolve `path` against the base URL.
    pub fn url_for(&self, path: &str) -> Result<Url, HttpError> {
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    /// GET and return the body as text.
    ///
    /// The body is decoded with the `charset` named in `Content-Type`,
    /// falling back to UTF-8 when the header carries none.
    pub async fn get_text(&self, path: &str, opts: RequestOpts<'_>) -> Result<String, HttpError> {
        let (req_id, resp) = self.send(Method::GET, path, opts).await?;
        let text = resp
            .text()
            .await
            .map_err(|e| HttpError::Network(e.to_string()))?;
        log_body(&req_id, text.as_bytes());
        Ok(text)
    }

    /// GET and decode a JSON body.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let (req_id, resp) = self.send(Method::GET, path, opts).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| HttpError::Network(e.to_string()))?;
        log_body(&req_id, &bytes);
        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            let snippet = snip_body(&bytes);
            tracing::warn!(
                req_id=%req_id,
                serde_line=%e.line(),
                serde_col=%e.column(),
                serde_err=%e.to_string(),
                body_snippet=%snippet,
                "http.response.decode_error"
            );
            HttpError::Decode(e.to_string(), snippet)
        })
    }

    // ==============================
    // Core request implementation
    // ==============================

    /// Send with retries and hand back the first successful response with its
    /// body still unread, together with the local request id.
    async fn send(
        &self,
        method: Method,
        path: &str,
        opts: RequestOpts<'_>,
    ) -> Result<(String, Response), HttpError> {
        let url = self.url_for(path)?;

        let mut attempt = 0usize;
        let max_retries = opts.retries.unwrap_or(self.max_retries);
        let timeout = opts.timeout.or(self.default_timeout);
        let pairs: Vec<(&str, &str)> = opts
            .query
            .as_ref()
            .map(|q| q.iter().map(|(k, v)| (*k, v.as_ref())).collect())
            .unwrap_or_default();

        loop {
            // ----- Build request -----
            let mut rb = self.inner.request(method.clone(), url.clone());
            if let Some(timeout) = timeout {
                rb = rb.timeout(timeout);
            }
            if !pairs.is_empty() {
                rb = rb.query(&pairs);
            }
            if let Some(hdrs) = &opts.headers {
                rb = rb.headers(hdrs.clone());
            }

            let req_id = next_request_id();
            tracing::debug!(
                req_id=%req_id,
                attempt=attempt + 1,
                max_retries,
                method=%method,
                host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
                query=?pairs,
                timeout_ms=?timeout.map(|t| t.as_millis() as u64),
                "http.request.start"
            );

            // ----- Send -----
            let t0 = Instant::now();
            let resp = match rb.send().await {
                Ok(resp) => resp,
                Err(err) => {
                    let message = err.to_string();
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff(attempt);
                        tracing::warn!(
                            req_id=%req_id,
                            attempt,
                            max_retries,
                            backoff_ms=delay.as_millis() as u64,
                            message=%message,
                            "http.retrying.network"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(
                        req_id=%req_id,
                        attempt,
                        max_retries,
                        message=%message,
                        "http.network_error"
                    );
                    return Err(HttpError::Network(message));
                }
            };
            let dur_ms = t0.elapsed().as_millis() as u64;
            let status = resp.status();
            let headers = resp.headers().clone();

            let server_req_id = headers
                .get("x-request-id")
                .or_else(|| headers.get("x-correlation-id"))
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();

            tracing::debug!(
                req_id=%req_id,
                %status,
                duration_ms=dur_ms,
                content_length=?resp.content_length(),
                x_request_id=%server_req_id,
                "http.response.headers"
            );

            // ----- Success path -----
            if status.is_success() {
                return Ok((req_id, resp));
            }

            // ----- Non-success: maybe retry -----
            let bytes = resp.bytes().await.unwrap_or_default();
            log_body(&req_id, &bytes);
            let message = extract_error_message(&bytes);
            let is_429 = status == StatusCode::TOO_MANY_REQUESTS;
            let is_5xx = status.is_server_error();

            if (is_429 || is_5xx) && attempt < max_retries {
                attempt += 1;
                let delay = match retry_after_delay_secs(&headers) {
                    Some(secs) => Duration::from_secs(secs),
                    None if is_429 => backoff(attempt).max(Duration::from_millis(1100)),
                    None => backoff(attempt),
                };
                tracing::warn!(
                    req_id=%req_id,
                    %status,
                    attempt,
                    max_retries,
                    backoff_ms=delay.as_millis() as u64,
                    message=%message,
                    "http.retrying"
                );
                sleep(delay).await;
                continue;
            }

            tracing::warn!(
                req_id=%req_id,
                %status,
                message=%message,
                x_request_id=%server_req_id,
                body_snippet=%snip_body(&bytes),
                "http.error"
            );
            return Err(HttpError::Api {
                status,
                message,
                request_id: server_req_id,
            });
        }
    }
}

// ==============================
// Helpers
// ==============================

/// Body snippet at trace level, plus the full body on `http.raw` when enabled.
fn log_body(req_id: &str, body: &[u8]) {
    if raw_enabled() {
        let end = body.len().min(RAW_MAX_BODY);
        let text = String::from_utf8_lossy(&body[..end]);
        tracing::info!(
            target: "http.raw",
            %req_id,
            body_len=body.len(),
            body=%text,
            truncated=body.len() > RAW_MAX_BODY
        );
    }
    tracing::trace!(req_id=%req_id, body_snippet=%snip_body(body), "http.response.body_snippet");
}

fn backoff(attempt: usize) -> Duration {
    let shift = attempt.saturating_sub(1).min(16) as u32;
    Duration::from_millis(200u64.saturating_mul(1 << shift))
}

fn extract_error_message(body: &[u8]) -> String {
    // {"message":"..."} or {"error":"..."}
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        if !m.message.is_empty() {
            return m.message;
        }
        if !m.error.is_empty() {
            return m.error;
        }
    }
    snip_body(body)
}

fn retry_after_delay_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_MAX {
        let mut cut = SNIPPET_MAX;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}
