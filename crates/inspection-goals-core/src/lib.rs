pub mod aggregation;
pub mod calendar;
pub mod config;
pub mod error;
pub mod targets;
pub mod types;

#[cfg(feature = "ingest")]
pub mod ingest;

#[cfg(feature = "pacing")]
pub mod pacing;

#[cfg(feature = "ranking")]
pub mod ranking;

#[cfg(feature = "heatmap")]
pub mod heatmap;

#[cfg(feature = "dashboard")]
pub mod dashboard;

pub use error::GoalsError;
pub use types::*;

/// Standard result type for all goal-tracking operations
pub type GoalsResult<T> = Result<T, GoalsError>;
