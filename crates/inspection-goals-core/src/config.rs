use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::GoalsError;
use crate::targets::TargetReference;
use crate::GoalsResult;

/// Canonical workday count the base target table is expressed in.
pub const REFERENCE_WORKDAYS: u32 = 21;

/// Which brands a deployment shows: all of them, or one fixed brand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BrandScope {
    #[default]
    All,
    Brand(String),
}

impl BrandScope {
    pub fn admits(&self, brand: &str) -> bool {
        match self {
            BrandScope::All => true,
            BrandScope::Brand(b) => b == brand,
        }
    }
}

impl From<String> for BrandScope {
    fn from(value: String) -> Self {
        let v = value.trim().to_uppercase();
        if v.is_empty() || v == "ALL" {
            BrandScope::All
        } else {
            BrandScope::Brand(v)
        }
    }
}

impl From<BrandScope> for String {
    fn from(value: BrandScope) -> Self {
        match value {
            BrandScope::All => "ALL".to_string(),
            BrandScope::Brand(b) => b,
        }
    }
}

/// Operator-entered workday counts for the month being viewed.
///
/// These are deliberately not derived from the calendar: the operator sets the
/// month's total and how many have already passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkdayConfig {
    pub total: u32,
    pub elapsed: u32,
}

impl Default for WorkdayConfig {
    fn default() -> Self {
        WorkdayConfig {
            total: REFERENCE_WORKDAYS,
            elapsed: 16,
        }
    }
}

impl WorkdayConfig {
    pub fn validate(&self) -> GoalsResult<()> {
        if !(1..=31).contains(&self.total) {
            return Err(GoalsError::InvalidInput {
                field: "workdays.total".into(),
                reason: "must be between 1 and 31".into(),
            });
        }
        if self.elapsed > 31 {
            return Err(GoalsError::InvalidInput {
                field: "workdays.elapsed".into(),
                reason: "must be between 0 and 31".into(),
            });
        }
        Ok(())
    }

    pub fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.elapsed)
    }

    pub fn month_closed(&self) -> bool {
        self.remaining() == 0
    }
}

fn default_unit_aliases() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("RIACHÃO".to_string(), "BALSAS".to_string()),
        ("RIACHAO".to_string(), "BALSAS".to_string()),
    ])
}

fn default_heatmap_min_pct() -> u32 {
    60
}

/// Deployment settings for a dashboard instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSettings {
    #[serde(default)]
    pub brand_scope: BrandScope,
    #[serde(default)]
    pub workdays: WorkdayConfig,
    /// Raw unit name → canonical unit name, applied once at ingestion
    #[serde(default = "default_unit_aliases")]
    pub unit_aliases: BTreeMap<String, String>,
    /// Lower bound of the heatmap colour scale, in percent of the daily target
    #[serde(default = "default_heatmap_min_pct")]
    pub heatmap_min_pct: u32,
    /// Replaces the builtin base-target table when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<BTreeMap<String, BTreeMap<String, i64>>>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        DashboardSettings {
            brand_scope: BrandScope::default(),
            workdays: WorkdayConfig::default(),
            unit_aliases: default_unit_aliases(),
            heatmap_min_pct: default_heatmap_min_pct(),
            reference: None,
        }
    }
}

impl DashboardSettings {
    pub fn validate(&self) -> GoalsResult<()> {
        self.workdays.validate()?;
        if self.heatmap_min_pct >= 120 {
            return Err(GoalsError::InvalidInput {
                field: "heatmap_min_pct".into(),
                reason: "must be below the 120% upper bound of the colour scale".into(),
            });
        }
        Ok(())
    }

    /// The configured base-target table, or the builtin one.
    pub fn target_reference(&self) -> TargetReference {
        self.reference
            .clone()
            .map(TargetReference::from)
            .unwrap_or_else(TargetReference::builtin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_saturates_at_zero() {
        let w = WorkdayConfig {
            total: 20,
            elapsed: 22,
        };
        assert_eq!(w.remaining(), 0);
        assert!(w.month_closed());
    }

    #[test]
    fn test_workday_bounds_are_enforced() {
        assert!(WorkdayConfig { total: 0, elapsed: 0 }.validate().is_err());
        assert!(WorkdayConfig { total: 32, elapsed: 0 }.validate().is_err());
        assert!(WorkdayConfig { total: 21, elapsed: 32 }.validate().is_err());
        assert!(WorkdayConfig::default().validate().is_ok());
    }

    #[test]
    fn test_brand_scope_from_string() {
        assert_eq!(BrandScope::from(" all ".to_string()), BrandScope::All);
        assert_eq!(
            BrandScope::from("tokyo".to_string()),
            BrandScope::Brand("TOKYO".into())
        );
        assert!(BrandScope::Brand("LOG".into()).admits("LOG"));
        assert!(!BrandScope::Brand("LOG".into()).admits("VELOX"));
    }

    #[test]
    fn test_settings_defaults_fill_missing_fields() {
        let s: DashboardSettings = serde_json::from_str(r#"{"brand_scope": "velox"}"#).unwrap();
        assert_eq!(s.brand_scope, BrandScope::Brand("VELOX".into()));
        assert_eq!(s.workdays, WorkdayConfig::default());
        assert_eq!(s.unit_aliases.get("RIACHAO").map(String::as_str), Some("BALSAS"));
        assert_eq!(s.heatmap_min_pct, 60);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_reference_override_replaces_builtin() {
        let s: DashboardSettings = serde_json::from_str(
            r#"{"reference": {"acme": {"centro": 420}}}"#,
        )
        .unwrap();
        let reference = s.target_reference();
        assert_eq!(reference.base_target("ACME", "CENTRO"), 420);
        assert_eq!(reference.base_target("TOKYO", "CHAPADINHA"), 0);
        assert!(DashboardSettings::default()
            .target_reference()
            .contains_brand("TOKYO"));
    }
}
