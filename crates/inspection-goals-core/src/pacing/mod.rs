pub mod daily;
pub mod summary;
pub mod units;

pub use crate::config::WorkdayConfig;
pub use daily::{
    build_daily_pacing, catch_up_target, DailyPacingInput, DailyPacingRow, PacingStatus,
    PacingStrategy,
};
pub use summary::{compute_pacing, PacingInput, PacingSummary, ViewMode};
pub use units::{unit_indicators, UnitIndicator, UnitIndicatorRequest};
