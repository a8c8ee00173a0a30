pub mod grid;

pub use grid::{build_heatmap, HeatmapCell, HeatmapInput, HeatmapMetric, HEATMAP_MAX_PCT};
