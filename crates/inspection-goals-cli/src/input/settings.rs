use inspection_goals_core::config::DashboardSettings;

use super::file;

/// Dashboard settings from a YAML/JSON file, or the defaults, with
/// command-line workday overrides applied and validated.
pub fn load_settings(
    path: Option<&str>,
    workdays_total: Option<u32>,
    workdays_elapsed: Option<u32>,
) -> Result<DashboardSettings, Box<dyn std::error::Error>> {
    let mut settings: DashboardSettings = match path {
        Some(p) => file::read_yaml(p)?,
        None => DashboardSettings::default(),
    };
    if let Some(total) = workdays_total {
        settings.workdays.total = total;
    }
    if let Some(elapsed) = workdays_elapsed {
        settings.workdays.elapsed = elapsed;
    }
    settings.validate()?;
    tracing::debug!(scope = ?settings.brand_scope, workdays = ?settings.workdays, "settings loaded");
    Ok(settings)
}
