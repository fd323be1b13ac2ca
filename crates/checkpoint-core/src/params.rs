use std::path::{Path, PathBuf};
use std::time::Duration;

/// Parameters for one check.
///
/// Only `product` is required:
///
/// ```
/// use checkpoint_core::CheckParams;
///
/// let params = CheckParams::new("terraform", "1.9.0")
///     .with_signature_file("/var/lib/terraform/checkpoint.sig");
/// assert_eq!(params.product, "terraform");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CheckParams {
    /// Product to look up. Must not be empty.
    pub product: String,
    /// Version to compare against the latest release. May be empty.
    pub version: String,

    /// Alerts may be filtered by platform. Empty means "this machine".
    pub arch: String,
    pub os: String,

    /// Random, non-identifying token that lets the endpoint avoid sending
    /// the same alert twice. Takes priority over `signature_file`.
    pub signature: Option<String>,
    /// File holding the signature; created with a fresh one if missing.
    pub signature_file: Option<PathBuf>,

    /// File used to memoize the response. `None` or an empty path disables
    /// caching.
    pub cache_file: Option<PathBuf>,
    /// Replaces the default cache freshness window.
    pub cache_duration: Option<Duration>,

    /// Client to send the request with instead of the checker's default.
    pub http_client: Option<reqwest::Client>,
}

impl CheckParams {
    pub fn new(product: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn with_platform(mut self, arch: impl Into<String>, os: impl Into<String>) -> Self {
        self.arch = arch.into();
        self.os = os.into();
        self
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_signature_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.signature_file = Some(path.into());
        self
    }

    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_file = Some(path.into());
        self
    }

    pub fn with_cache_duration(mut self, duration: Duration) -> Self {
        self.cache_duration = Some(duration);
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// `arch`, or the architecture of the running binary.
    pub(crate) fn resolved_arch(&self) -> &str {
        non_empty_or(&self.arch, std::env::consts::ARCH)
    }

    /// `os`, or the operating system of the running binary.
    pub(crate) fn resolved_os(&self) -> &str {
        non_empty_or(&self.os, std::env::consts::OS)
    }

    pub(crate) fn cache_path(&self) -> Option<&Path> {
        self.cache_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}
