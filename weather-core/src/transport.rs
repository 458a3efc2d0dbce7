use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt::Debug;

use crate::error::TransportError;

/// Status and raw body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound HTTP seam shared by the name resolver and the weather fetcher.
///
/// Implementations must URL-encode the query values. Non-2xx statuses are
/// returned as responses, not errors; only connection-level problems are
/// reported as [`TransportError`].
#[async_trait]
pub trait HttpTransport: Send + Sync + Debug {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError>;
}

/// Read a status code embedded in a JSON body. Providers send these either
/// as numbers (`200`) or as strings (`"404"`).
pub(crate) fn status_code(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        let res = self.http.get(url).query(query).send().await?;

        let status = res.status().as_u16();
        let body = res.text().await?;

        Ok(HttpResponse { status, body })
    }
}
