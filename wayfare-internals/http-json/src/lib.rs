//! Wayfare HTTP JSON
//! Copyright (c) 2026 Mamy Ratsimbazafy
//! Licensed and distributed under either of
//!   * MIT license (license terms at the root of the package or at http://opensource.org/licenses/MIT).
//!   * Apache v2 license (license terms at the root of the package or at http://www.apache.org/licenses/LICENSE-2.0).
//! at your option. This file may not be copied, modified, or distributed except according to those terms.

//! wayfare-internals/http-json
//! Single-shot JSON calls to upstream REST APIs: one request, one deadline, no retries.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::time;

const REDACTED: &str = "***";

/// Status codes accepted from APIs that answer exactly 200.
pub const OK: &[u16] = &[200];
/// Status codes accepted from APIs that answer 201 on creation.
pub const OK_OR_CREATED: &[u16] = &[200, 201];

/// Failure of a single upstream call
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// `message` is the transport error text with secrets masked
    #[error("request to {url} failed: {message}")]
    Transport {
        url: String,
        message: String,
        #[source]
        source: wreq::Error,
    },
    #[error("request to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },
    #[error("{status} {reason} for url: {url}")]
    Status {
        status: u16,
        reason: String,
        url: String,
        body: String,
    },
    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl UpstreamError {
    /// HTTP status code, when the upstream answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body of a non-success answer
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Provider-supplied error payload: parsed JSON when the body is JSON,
    /// the body text otherwise, `null` when there is no body.
    pub fn details(&self) -> Value {
        match self.body() {
            Some(body) => serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string())),
            None => Value::Null,
        }
    }
}

/// Ordered query string parameters.
///
/// Secret parameters are sent as-is but rendered as `***` by [`Query::encode_redacted`],
/// which is what ends up in logs and error messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pairs: Vec<(String, String, bool)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.pairs.push((key.to_string(), value.to_string(), false));
        self
    }

    pub fn param_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    pub fn secret(mut self, key: &str, value: impl ToString) -> Self {
        self.pairs.push((key.to_string(), value.to_string(), true));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _, _)| k == key)
            .map(|(_, v, _)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn encode(&self) -> String {
        self.render(false)
    }

    pub fn encode_redacted(&self) -> String {
        self.render(true)
    }

    fn render(&self, redact: bool) -> String {
        self.pairs
            .iter()
            .map(|(k, v, secret)| {
                let value = if redact && *secret {
                    REDACTED.into()
                } else {
                    urlencoding::encode(v)
                };
                format!("{}={}", urlencoding::encode(k), value)
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// A fully built upstream URL and its loggable form.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    url: String,
    display: String,
}

impl Endpoint {
    /// Joins `base` and `path` with exactly one slash and appends the query, if any.
    pub fn new(base: &str, path: &str, query: &Query) -> Self {
        let joined = format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        if query.is_empty() {
            return Self {
                url: joined.clone(),
                display: joined,
            };
        }
        Self {
            url: format!("{}?{}", joined, query.encode()),
            display: format!("{}?{}", joined, query.encode_redacted()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// URL with secret parameters redacted
    pub fn display(&self) -> &str {
        &self.display
    }
}

/// Shared HTTP client issuing one JSON request per call.
#[derive(Clone)]
pub struct JsonHttp {
    client: Arc<wreq::Client>,
}

impl JsonHttp {
    pub fn new() -> Result<Self, wreq::Error> {
        let client = wreq::Client::builder().build()?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Any status outside `accepted` is an [`UpstreamError::Status`].
    pub async fn get(
        &self,
        endpoint: &Endpoint,
        headers: &[(&'static str, String)],
        accepted: &[u16],
        timeout: Duration,
    ) -> Result<Value, UpstreamError> {
        let mut request = self.client.get(endpoint.url());
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }
        self.execute("GET", request, endpoint, accepted, timeout).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &Endpoint,
        headers: &[(&'static str, String)],
        body: &B,
        accepted: &[u16],
        timeout: Duration,
    ) -> Result<Value, UpstreamError> {
        let mut request = self.client.post(endpoint.url()).json(body);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }
        self.execute("POST", request, endpoint, accepted, timeout).await
    }

    async fn execute(
        &self,
        method: &'static str,
        request: wreq::RequestBuilder,
        endpoint: &Endpoint,
        accepted: &[u16],
        timeout: Duration,
    ) -> Result<Value, UpstreamError> {
        let start = Instant::now();
        tracing::debug!("[{}] {}", method, endpoint.display());

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, wreq::Error>((status, body))
        };

        let (status, body) = match time::timeout(timeout, exchange).await {
            Err(_) => {
                tracing::warn!("[{}] {} timed out after {:?}", method, endpoint.display(), timeout);
                return Err(UpstreamError::Timeout {
                    url: endpoint.display().to_string(),
                    after: timeout,
                });
            }
            Ok(Err(source)) => {
                tracing::warn!("[{}] {} failed to connect", method, endpoint.display());
                return Err(UpstreamError::Transport {
                    url: endpoint.display().to_string(),
                    message: source.to_string().replace(endpoint.url(), endpoint.display()),
                    source,
                });
            }
            Ok(Ok(exchanged)) => exchanged,
        };

        tracing::debug!(
            "[{}] HTTP {} in {:?}, {} KB",
            method,
            status.as_u16(),
            start.elapsed(),
            body.len() / 1024
        );

        if !accepted.contains(&status.as_u16()) {
            tracing::warn!(
                "[{}] {} answered {}",
                method,
                endpoint.display(),
                status.as_u16()
            );
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                url: endpoint.display().to_string(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| UpstreamError::Decode {
            url: endpoint.display().to_string(),
            source,
        })
    }
}
