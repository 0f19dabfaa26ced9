//! client-core: Shared infrastructure for the club-app client crates.
pub mod config;
pub mod error;
pub mod observability;
pub mod storage;

pub use async_trait;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
