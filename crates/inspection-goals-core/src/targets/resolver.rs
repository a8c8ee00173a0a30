use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::reference::TargetReference;
use crate::config::REFERENCE_WORKDAYS;
use crate::types::{normalize_label, YearMonth};

/// An explicit per-month target row (the METAS index tab).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOverride {
    pub year_month: YearMonth,
    pub brand: String,
    pub unit: String,
    /// Workdays in the period for this unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workdays: Option<u32>,
    /// Authoritative monthly target; when absent the base target is scaled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_target: Option<i64>,
}

type OverrideKey = (YearMonth, String, String);

/// Resolves monthly targets from the base table and explicit overrides.
#[derive(Debug, Clone, Default)]
pub struct TargetResolver {
    reference: TargetReference,
    overrides: HashMap<OverrideKey, (Option<u32>, Option<i64>)>,
}

impl TargetResolver {
    /// Override labels are normalized. Later overrides for the same
    /// (month, brand, unit) replace earlier ones.
    pub fn new(
        reference: TargetReference,
        overrides: impl IntoIterator<Item = TargetOverride>,
    ) -> Self {
        let overrides = overrides
            .into_iter()
            .map(|o| {
                (
                    (o.year_month, normalize_label(&o.brand), normalize_label(&o.unit)),
                    (o.workdays, o.monthly_target),
                )
            })
            .collect();
        TargetResolver {
            reference,
            overrides,
        }
    }

    pub fn reference(&self) -> &TargetReference {
        &self.reference
    }

    fn lookup(&self, brand: &str, unit: &str, ym: YearMonth) -> (Option<u32>, Option<i64>) {
        self.overrides
            .get(&(ym, brand.to_string(), unit.to_string()))
            .copied()
            .unwrap_or((None, None))
    }

    /// Monthly target for one unit.
    ///
    /// An explicit override target wins. Otherwise the 21-workday base target
    /// is scaled linearly: `round(base * workdays / 21)`, with banker's
    /// rounding. A zero workday override falls back to 21.
    pub fn monthly_target(&self, brand: &str, unit: &str, ym: YearMonth) -> i64 {
        let (workdays, explicit) = self.lookup(brand, unit, ym);
        if let Some(target) = explicit {
            return target;
        }
        let base = self.reference.base_target(brand, unit);
        let workdays = workdays.filter(|w| *w > 0).unwrap_or(REFERENCE_WORKDAYS);
        scale_base_target(base, workdays)
    }

    /// Workdays for a unit: the override when present and non-zero, else 21.
    pub fn workdays(&self, brand: &str, unit: &str, ym: YearMonth) -> u32 {
        self.lookup(brand, unit, ym)
            .0
            .filter(|w| *w > 0)
            .unwrap_or(REFERENCE_WORKDAYS)
    }

    /// Sum of unit targets over every unit of the brand in the reference
    /// table. Units seen only in the data do not contribute.
    pub fn brand_monthly_target(&self, brand: &str, ym: YearMonth) -> i64 {
        self.reference
            .units(brand)
            .map(|unit| self.monthly_target(brand, unit, ym))
            .sum()
    }

    /// Sum of brand targets over every reference brand.
    pub fn overall_monthly_target(&self, ym: YearMonth) -> i64 {
        self.reference
            .brands()
            .map(|brand| self.brand_monthly_target(brand, ym))
            .sum()
    }
}

fn scale_base_target(base: i64, workdays: u32) -> i64 {
    if workdays == REFERENCE_WORKDAYS {
        return base;
    }
    let scaled = Decimal::from(base) * Decimal::from(workdays) / Decimal::from(REFERENCE_WORKDAYS);
    scaled.round().to_i64().unwrap_or(0)
}
