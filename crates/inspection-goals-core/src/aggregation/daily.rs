use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Count, ProductionRecord, YearMonth};

/// Gross, re-inspection and net totals over a set of records.
///
/// Deserializing derives `net`; a supplied `net` must agree with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TotalsInput")]
pub struct ProductionTotals {
    pub gross: Count,
    pub reinspections: Count,
    pub net: Count,
}

#[derive(Deserialize)]
struct TotalsInput {
    gross: Count,
    #[serde(default)]
    reinspections: Count,
    #[serde(default)]
    net: Option<Count>,
}

impl TryFrom<TotalsInput> for ProductionTotals {
    type Error = String;

    fn try_from(value: TotalsInput) -> Result<Self, Self::Error> {
        let derived = value
            .gross
            .checked_sub(value.reinspections)
            .ok_or_else(|| "gross minus reinspections is out of range".to_string())?;
        match value.net {
            Some(net) if net != derived => Err(format!(
                "net {net} does not equal gross {} minus reinspections {}",
                value.gross, value.reinspections
            )),
            _ => Ok(ProductionTotals {
                gross: value.gross,
                reinspections: value.reinspections,
                net: derived,
            }),
        }
    }
}

impl ProductionTotals {
    pub fn new(gross: Count, reinspections: Count) -> Self {
        ProductionTotals {
            gross,
            reinspections,
            net: gross - reinspections,
        }
    }

    /// Whether `net` is gross minus re-inspections.
    pub fn is_consistent(&self) -> bool {
        self.gross.checked_sub(self.reinspections) == Some(self.net)
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ProductionRecord>) -> Self {
        let mut totals = ProductionTotals::default();
        for r in records {
            totals.gross += r.gross_count;
            totals.reinspections += r.reinspection_count;
        }
        totals.net = totals.gross - totals.reinspections;
        totals
    }
}

/// Net production per calendar day. Undated records are ignored.
pub fn daily_net_series<'a>(
    records: impl IntoIterator<Item = &'a ProductionRecord>,
) -> BTreeMap<NaiveDate, Count> {
    let mut series = BTreeMap::new();
    for r in records {
        if let Some(date) = r.date {
            *series.entry(date).or_default() += r.net();
        }
    }
    series
}

/// Net production per (unit, day). Undated records are ignored.
pub fn unit_daily_net<'a>(
    records: impl IntoIterator<Item = &'a ProductionRecord>,
) -> BTreeMap<String, BTreeMap<NaiveDate, Count>> {
    let mut out: BTreeMap<String, BTreeMap<NaiveDate, Count>> = BTreeMap::new();
    for r in records {
        if let Some(date) = r.date {
            *out.entry(r.unit.clone())
                .or_default()
                .entry(date)
                .or_default() += r.net();
        }
    }
    out
}

/// Net per unit from the first of `day`'s month through `day` inclusive.
pub fn month_to_date_net_by_unit<'a>(
    records: impl IntoIterator<Item = &'a ProductionRecord>,
    day: NaiveDate,
) -> BTreeMap<String, Count> {
    let ym = YearMonth::of(day);
    let mut out: BTreeMap<String, Count> = BTreeMap::new();
    for r in records {
        match r.date {
            Some(d) if ym.contains(d) && d <= day => {
                *out.entry(r.unit.clone()).or_default() += r.net();
            }
            _ => {}
        }
    }
    out
}
