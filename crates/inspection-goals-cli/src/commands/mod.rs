pub mod heatmap;
pub mod pacing;
pub mod ranking;
pub mod snapshot;
pub mod targets;
