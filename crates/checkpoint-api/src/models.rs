// Check endpoint wire types
//
// Fields use `#[serde(default)]` so that a response missing optional keys
// (most commonly `alerts`) still decodes into the zero value for that field.
// An explicit `null` decodes the same way.

use serde::{Deserialize, Deserializer, Serialize};

// ── Request ──────────────────────────────────────────────────────────

/// Query parameters sent with every check request.
///
/// All four are always sent, even when empty, so the endpoint sees a
/// stable set of keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckQuery {
    pub version: String,
    pub arch: String,
    pub os: String,
    pub signature: String,
}

// ── Response ─────────────────────────────────────────────────────────

/// Version and alert information for one product.
///
/// `CheckResponse::default()` is the "nothing to report" value returned
/// when checks are disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub product: String,
    #[serde(deserialize_with = "null_as_default")]
    pub current_version: String,
    /// Unix epoch seconds.
    #[serde(deserialize_with = "null_as_default")]
    pub current_release_date: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub current_download_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub current_changelog_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub project_website: String,
    #[serde(deserialize_with = "null_as_default")]
    pub outdated: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub alerts: Vec<CheckAlert>,
}

impl CheckResponse {
    /// `true` if the response carries no information at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A single operator-published alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckAlert {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    /// Unix epoch seconds.
    #[serde(deserialize_with = "null_as_default")]
    pub date: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    /// Free-form severity, e.g. `"info"`, `"warn"`, `"crit"`.
    #[serde(deserialize_with = "null_as_default")]
    pub level: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
