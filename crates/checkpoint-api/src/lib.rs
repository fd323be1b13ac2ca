// checkpoint-api: Async Rust client for the checkpoint version/alert check endpoint

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::{CheckClient, DEFAULT_BASE_URL};
pub use error::Error;
pub use models::{CheckAlert, CheckQuery, CheckResponse};
pub use transport::TransportConfig;
