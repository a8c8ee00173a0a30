use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::reference::TargetReference;
use super::resolver::{TargetOverride, TargetResolver};
use crate::types::{normalize_label, with_metadata, ComputationOutput, YearMonth};
use crate::GoalsResult;

/// A one-off target lookup, with its own overrides and optional table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetQuery {
    pub brand: String,
    /// Brand-level lookup when absent
    #[serde(default)]
    pub unit: Option<String>,
    pub year_month: YearMonth,
    #[serde(default)]
    pub overrides: Vec<TargetOverride>,
    /// Builtin table when absent
    #[serde(default)]
    pub reference: Option<TargetReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub brand: String,
    pub unit: Option<String>,
    pub year_month: YearMonth,
    /// 21-workday base of the unit
    pub base_target: Option<i64>,
    pub workdays: Option<u32>,
    /// The unit's target, or the brand's when no unit was asked for
    pub monthly_target: i64,
    pub brand_monthly_target: i64,
    pub overall_monthly_target: i64,
}

/// Resolve the monthly target for a brand or one of its units.
pub fn resolve_target(query: &TargetQuery) -> GoalsResult<ComputationOutput<ResolvedTarget>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let reference = query
        .reference
        .clone()
        .unwrap_or_else(TargetReference::builtin);
    let resolver = TargetResolver::new(reference, query.overrides.iter().cloned());

    let brand = normalize_label(&query.brand);
    let unit = query
        .unit
        .as_deref()
        .map(normalize_label)
        .filter(|u| !u.is_empty());
    let ym = query.year_month;

    if !resolver.reference().contains_brand(&brand) {
        warnings.push(format!("Brand {brand} is not in the reference table; target is 0"));
    }

    let brand_target = resolver.brand_monthly_target(&brand, ym);
    let resolved = match &unit {
        Some(u) => {
            let base = resolver.reference().base_target(&brand, u);
            let target = resolver.monthly_target(&brand, u, ym);
            if base == 0 && target == 0 {
                warnings.push(format!("Unit {u} has no base target or override for {ym}"));
            }
            ResolvedTarget {
                brand: brand.clone(),
                unit: Some(u.clone()),
                year_month: ym,
                base_target: Some(base),
                workdays: Some(resolver.workdays(&brand, u, ym)),
                monthly_target: target,
                brand_monthly_target: brand_target,
                overall_monthly_target: resolver.overall_monthly_target(ym),
            }
        }
        None => ResolvedTarget {
            brand: brand.clone(),
            unit: None,
            year_month: ym,
            base_target: None,
            workdays: None,
            monthly_target: brand_target,
            brand_monthly_target: brand_target,
            overall_monthly_target: resolver.overall_monthly_target(ym),
        },
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Explicit target, else round(base * workdays / 21)",
        &serde_json::json!({
            "reference_workdays": crate::config::REFERENCE_WORKDAYS,
            "overrides": query.overrides.len(),
            "custom_reference": query.reference.is_some(),
        }),
        warnings,
        elapsed,
        resolved,
    ))
}
