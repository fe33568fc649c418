//! Abandoned-cart synchronization
//!
//! # Components
//!
//! - [`retry`]: Retry manager with exponential backoff for throttled calls
//! - [`http_client`]: Rate-limited HTTP client for the marketing platform
//! - [`orchestrator`]: Per-record resolve, tag, and write pipeline
//!
//! # Example
//!
//! ```ignore
//! use cart_sync::config::Config;
//! use cart_sync::models::InputRecord;
//! use cart_sync::sync::SyncOrchestrator;
//!
//! let config = Config::from_file("config.yaml")?;
//! let orchestrator = SyncOrchestrator::from_config(&config)?;
//!
//! let summary = orchestrator
//!     .run(vec![InputRecord::new("A123", "49.99")])
//!     .await;
//! ```

pub mod http_client;
pub mod orchestrator;
pub mod retry;

// Re-export main types for convenience
pub use http_client::RateLimitedClient;
pub use orchestrator::{RecordOutcome, RecordStage, SyncOrchestrator, SyncSummary};
pub use retry::{RetryManager, RetryState, Sleeper, TokioSleeper};
