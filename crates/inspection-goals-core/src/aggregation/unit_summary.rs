use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Count, Percent, Price, ProductionRecord};

// ---------------------------------------------------------------------------
// Fee tiers and badge thresholds
// ---------------------------------------------------------------------------

const LOW_TIER_PRICE: Price = dec!(152);
const HIGH_TIER_PRICE: Price = dec!(190);
const TICKET_PASS: Price = dec!(161.50);
const MIX_PASS: Percent = dec!(25);
const MIX_WARN: Percent = dec!(20);

/// Traffic-light badge for a business threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    Pass,
    Warn,
    Fail,
}

/// Per-unit production summary for a brand/period scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSummary {
    pub unit: String,
    pub gross: Count,
    pub reinspections: Count,
    /// gross - reinspections
    pub net: Count,
    pub qty_152: Count,
    pub qty_190: Count,
    /// Price-weighted mean of the two fee tiers; `None` when no tiered volume
    pub ticket: Option<Price>,
    pub ticket_badge: Option<Badge>,
    /// Mean of the per-row "% at or above R$190" column
    pub pct_190: Percent,
    pub pct_190_badge: Badge,
    /// Number of source rows aggregated
    pub rows: usize,
}

/// `(q152 * 152 + q190 * 190) / (q152 + q190)`, or `None` without volume
/// or when the quantities overflow.
pub fn weighted_ticket(qty_152: Count, qty_190: Count) -> Option<Price> {
    let denom = qty_152.checked_add(qty_190)?;
    if denom <= Decimal::ZERO {
        return None;
    }
    let revenue = qty_152
        .checked_mul(LOW_TIER_PRICE)?
        .checked_add(qty_190.checked_mul(HIGH_TIER_PRICE)?)?;
    revenue.checked_div(denom)
}

pub fn ticket_badge(ticket: Price) -> Badge {
    if ticket >= TICKET_PASS {
        Badge::Pass
    } else {
        Badge::Fail
    }
}

pub fn mix_badge(pct_190: Percent) -> Badge {
    if pct_190 >= MIX_PASS {
        Badge::Pass
    } else if pct_190 >= MIX_WARN {
        Badge::Warn
    } else {
        Badge::Fail
    }
}

#[derive(Default)]
struct Accumulator {
    gross: Count,
    reinspections: Count,
    qty_152: Count,
    qty_190: Count,
    pct_190_sum: Percent,
    rows: usize,
}

/// Group records by unit and summarize each group. Output is in unit order.
///
/// Callers restrict `records` to the brand/period scope first.
pub fn summarize_units<'a>(
    records: impl IntoIterator<Item = &'a ProductionRecord>,
) -> Vec<UnitSummary> {
    let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for r in records {
        let acc = groups.entry(r.unit.as_str()).or_default();
        acc.gross += r.gross_count;
        acc.reinspections += r.reinspection_count;
        acc.qty_152 += r.qty_at_price_152;
        acc.qty_190 += r.qty_at_price_190;
        acc.pct_190_sum += r.pct_at_or_above_190;
        acc.rows += 1;
    }

    groups
        .into_iter()
        .map(|(unit, acc)| {
            let ticket = weighted_ticket(acc.qty_152, acc.qty_190);
            let pct_190 = if acc.rows == 0 {
                Decimal::ZERO
            } else {
                acc.pct_190_sum / Decimal::from(acc.rows as u64)
            };
            UnitSummary {
                unit: unit.to_string(),
                gross: acc.gross,
                reinspections: acc.reinspections,
                net: acc.gross - acc.reinspections,
                qty_152: acc.qty_152,
                qty_190: acc.qty_190,
                ticket,
                ticket_badge: ticket.map(ticket_badge),
                pct_190,
                pct_190_badge: mix_badge(pct_190),
                rows: acc.rows,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rec(unit: &str, gross: Decimal, rev: Decimal, q152: Decimal, q190: Decimal, pct: Decimal) -> ProductionRecord {
        ProductionRecord {
            brand: "LOG".into(),
            unit: unit.into(),
            gross_count: gross,
            reinspection_count: rev,
            qty_at_price_152: q152,
            qty_at_price_190: q190,
            pct_at_or_above_190: pct,
            ..Default::default()
        }
    }

    #[test]
    fn test_ticket_is_convex_combination() {
        assert_eq!(weighted_ticket(dec!(10), dec!(0)), Some(dec!(152)));
        assert_eq!(weighted_ticket(dec!(0), dec!(10)), Some(dec!(190)));
        assert_eq!(weighted_ticket(dec!(10), dec!(10)), Some(dec!(171)));
    }

    #[test]
    fn test_ticket_without_volume_is_none() {
        assert_eq!(weighted_ticket(dec!(0), dec!(0)), None);
    }

    #[test]
    fn test_ticket_overflow_is_none() {
        let huge = Decimal::from_scientific("1e27").unwrap();
        assert_eq!(weighted_ticket(huge, huge), None);
    }

    #[test]
    fn test_ticket_badge_threshold() {
        assert_eq!(ticket_badge(dec!(161.50)), Badge::Pass);
        assert_eq!(ticket_badge(dec!(161.49)), Badge::Fail);
    }

    #[test]
    fn test_mix_badge_bands() {
        assert_eq!(mix_badge(dec!(25)), Badge::Pass);
        assert_eq!(mix_badge(dec!(24.9)), Badge::Warn);
        assert_eq!(mix_badge(dec!(20)), Badge::Warn);
        assert_eq!(mix_badge(dec!(19.99)), Badge::Fail);
    }

    #[test]
    fn test_summaries_group_by_unit_in_name_order() {
        let records = vec![
            rec("TIMON", dec!(50), dec!(5), dec!(30), dec!(20), dec!(40)),
            rec("CAROLINA", dec!(10), dec!(0), dec!(10), dec!(0), dec!(0)),
            rec("TIMON", dec!(30), dec!(5), dec!(10), dec!(20), dec!(20)),
        ];
        let out = summarize_units(&records);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].unit, "CAROLINA");
        assert_eq!(out[0].ticket, Some(dec!(152)));
        assert_eq!(out[0].ticket_badge, Some(Badge::Fail));

        let timon = &out[1];
        assert_eq!(timon.gross, dec!(80));
        assert_eq!(timon.reinspections, dec!(10));
        assert_eq!(timon.net, dec!(70));
        // (40 * 152 + 40 * 190) / 80 = 171
        assert_eq!(timon.ticket, Some(dec!(171)));
        assert_eq!(timon.pct_190, dec!(30));
        assert_eq!(timon.pct_190_badge, Badge::Pass);
        assert_eq!(timon.rows, 2);
    }

    #[test]
    fn test_empty_input_gives_no_rows() {
        let out = summarize_units(&Vec::<ProductionRecord>::new());
        assert!(out.is_empty());
    }
}
