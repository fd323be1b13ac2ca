// Check endpoint HTTP client
//
// Wraps `reqwest::Client` with check-specific URL construction, status
// handling, and response decoding. Knows nothing about caching, signatures
// or kill switches; those live in `checkpoint-core`.

use std::time::Duration;

use reqwest::header::ACCEPT;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{CheckQuery, CheckResponse};
use crate::transport::TransportConfig;

/// Production check endpoint.
pub const DEFAULT_BASE_URL: &str = "https://checkpoint-api.hashicorp.com";

/// Raw HTTP client for the check endpoint.
///
/// Cheap to clone: `reqwest::Client` is reference counted internally.
#[derive(Debug, Clone)]
pub struct CheckClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CheckClient {
    /// Create a client for `base_url` from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// Use this to inject a client with custom middleware, proxies, or a
    /// test-specific timeout.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// Create a client from a base URL string (e.g. a mock server URI).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The endpoint base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/v1/check/{product}?version=..&arch=..&os=..&signature=..`.
    ///
    /// The product is pushed as a single path segment, so any `/` or other
    /// reserved characters in it are percent-encoded.
    pub fn check_url(&self, product: &str, query: &CheckQuery) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["v1", "check", product]);
        url.query_pairs_mut()
            .append_pair("version", &query.version)
            .append_pair("arch", &query.arch)
            .append_pair("os", &query.os)
            .append_pair("signature", &query.signature);
        Ok(url)
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Perform one check request.
    ///
    /// `timeout`, when set, replaces the client's own timeout for this
    /// request only.
    pub async fn check(
        &self,
        product: &str,
        query: &CheckQuery,
        timeout: Option<Duration>,
    ) -> Result<CheckResponse, Error> {
        let url = self.check_url(product, query)?;
        debug!("GET {}", url);

        let mut request = self.http.get(url).header(ACCEPT, "application/json");
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let resp = request.send().await.map_err(Error::Transport)?;
        Self::parse_response(resp).await
    }

    /// Reject non-200 statuses, then decode the body.
    async fn parse_response(resp: reqwest::Response) -> Result<CheckResponse, Error> {
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}
