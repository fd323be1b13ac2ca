// checkpoint-core: version/alert checks with caching, signatures and scheduling.

pub mod cache;
pub mod checker;
pub mod error;
pub mod overrides;
pub mod params;
pub mod scheduler;
pub mod signature;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{CacheEntry, CacheKey, FRESHNESS_WINDOW, ResponseCache};
pub use checker::Checker;
pub use error::CoreError;
pub use overrides::{OverrideSource, Overrides};
pub use params::CheckParams;
pub use scheduler::{CheckOutcome, ScheduleHandle, Scheduler, random_stagger};
pub use signature::SignatureStore;

// Wire types callers handle directly.
pub use checkpoint_api::{CheckAlert, CheckResponse, TransportConfig};
