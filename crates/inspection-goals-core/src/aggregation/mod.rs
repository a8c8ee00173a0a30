pub mod daily;
pub mod unit_summary;

pub use daily::{daily_net_series, month_to_date_net_by_unit, unit_daily_net, ProductionTotals};
pub use unit_summary::{mix_badge, summarize_units, ticket_badge, weighted_ticket, Badge, UnitSummary};
