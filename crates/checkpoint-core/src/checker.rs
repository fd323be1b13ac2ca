// ── Checker ──
//
// One check, start to finish: kill switches, cache lookup, signature
// resolution, the request itself, and the cache write. Makes exactly one
// attempt; retrying is the scheduler's job.

use tracing::debug;
use url::Url;

use checkpoint_api::{CheckClient, CheckQuery, CheckResponse, DEFAULT_BASE_URL, TransportConfig};

use crate::cache::{CacheKey, ResponseCache};
use crate::error::CoreError;
use crate::overrides::OverrideSource;
use crate::params::CheckParams;
use crate::signature::SignatureStore;

/// Performs checks against a check endpoint.
///
/// Cheaply cloneable; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Checker {
    client: CheckClient,
    overrides: OverrideSource,
}

impl Checker {
    /// Checker for the production endpoint.
    pub fn new(transport: &TransportConfig) -> Result<Self, CoreError> {
        let base_url = Url::parse(DEFAULT_BASE_URL).map_err(checkpoint_api::Error::from)?;
        Self::with_base_url(base_url, transport)
    }

    /// Checker for an arbitrary endpoint (a mirror, or a local fixture).
    pub fn with_base_url(base_url: Url, transport: &TransportConfig) -> Result<Self, CoreError> {
        Ok(Self::from_client(CheckClient::new(base_url, transport)?))
    }

    /// Checker around an already-built endpoint client.
    pub fn from_client(client: CheckClient) -> Self {
        Self {
            client,
            overrides: OverrideSource::Environment,
        }
    }

    /// Take kill switches from `source` instead of the process environment.
    pub fn with_overrides(mut self, source: OverrideSource) -> Self {
        self.overrides = source;
        self
    }

    pub fn overrides(&self) -> &OverrideSource {
        &self.overrides
    }

    pub fn base_url(&self) -> &Url {
        self.client.base_url()
    }

    /// Check `params.product` for a newer version and applicable alerts.
    ///
    /// Returns `CheckResponse::default()` without touching the network or
    /// the filesystem when checks are disabled. Otherwise a fresh cached
    /// response is returned if one exists; if not, the endpoint is queried
    /// and the answer cached.
    pub async fn check(&self, params: &CheckParams) -> Result<CheckResponse, CoreError> {
        let overrides = self.overrides.resolve();
        if overrides.disabled {
            debug!(product = %params.product, "checks disabled, skipping");
            return Ok(CheckResponse::default());
        }

        if params.product.is_empty() {
            return Err(CoreError::Config {
                message: "product must not be empty".into(),
            });
        }

        let key = CacheKey {
            product: params.product.clone(),
            version: params.version.clone(),
            arch: params.resolved_arch().to_owned(),
            os: params.resolved_os().to_owned(),
        };

        let cache = params.cache_path().map(|path| {
            let cache = ResponseCache::new(path);
            match params.cache_duration {
                Some(window) => cache.with_freshness(window),
                None => cache,
            }
        });

        if let Some(cache) = &cache {
            let (cache, lookup) = (cache.clone(), key.clone());
            if let Some(entry) = blocking(move || cache.get(&lookup)).await? {
                debug!(product = %key.product, fetched_at = entry.fetched_at, "using cached check response");
                return Ok(entry.response);
            }
        }

        let signature = match (&params.signature, &params.signature_file) {
            (Some(signature), _) => signature.clone(),
            (None, Some(path)) => {
                let path = path.clone();
                blocking(move || SignatureStore::resolve(&path)).await?
            }
            (None, None) => String::new(),
        };

        let query = CheckQuery {
            version: key.version.clone(),
            arch: key.arch.clone(),
            os: key.os.clone(),
            signature,
        };

        let injected;
        let client = match &params.http_client {
            Some(http) => {
                injected = CheckClient::with_client(http.clone(), self.client.base_url().clone());
                &injected
            }
            None => &self.client,
        };

        let response = client
            .check(&key.product, &query, overrides.timeout)
            .await?;
        debug!(
            product = %key.product,
            current_version = %response.current_version,
            outdated = response.outdated,
            alerts = response.alerts.len(),
            "check completed"
        );

        if let Some(cache) = cache {
            let written = response.clone();
            blocking(move || cache.put(&key, &written)).await?;
        }

        Ok(response)
    }
}

/// Cache and signature file I/O runs on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, CoreError>
where
    F: FnOnce() -> Result<T, CoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CoreError::Internal(format!("blocking file task failed: {e}")))?
}
