pub mod view;

pub use view::{build_dashboard, DashboardRequest, DashboardView};
