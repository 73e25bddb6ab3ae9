// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod classify;
pub mod config;
pub mod metrics;
pub mod scamlog;
pub mod verdict;
pub mod watchlist;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::classify::{AnalysisRecord, BatchStats, Pipeline};
pub use crate::verdict::{
    AlertLevel, Classification, ClassificationResult, ConfidenceLevel, DetectionMethod,
    FallbackError,
};
