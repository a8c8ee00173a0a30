use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeMap;

use crate::types::YearMonth;

/// Monday through Friday. No holiday calendar.
pub fn is_workday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// First and last calendar day of the month.
pub fn month_bounds(ym: YearMonth) -> (NaiveDate, NaiveDate) {
    let first = NaiveDate::from_ymd_opt(ym.year(), ym.month(), 1).unwrap_or_default();
    let next_first = if ym.month() == 12 {
        NaiveDate::from_ymd_opt(ym.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(ym.year(), ym.month() + 1, 1)
    };
    let last = next_first
        .and_then(|d| d.pred_opt())
        .unwrap_or(first);
    (first, last)
}

/// Every calendar day of the month, in order.
pub fn days_in_month(ym: YearMonth) -> Vec<NaiveDate> {
    let (first, last) = month_bounds(ym);
    first.iter_days().take_while(|d| *d <= last).collect()
}

pub fn workdays_in_month(ym: YearMonth) -> Vec<NaiveDate> {
    days_in_month(ym).into_iter().filter(|d| is_workday(*d)).collect()
}

/// Workday → number of workdays from that day through month end, inclusive.
pub fn remaining_workdays_map(ym: YearMonth) -> BTreeMap<NaiveDate, u32> {
    let workdays = workdays_in_month(ym);
    let n = workdays.len() as u32;
    workdays
        .into_iter()
        .enumerate()
        .map(|(i, d)| (d, n - i as u32))
        .collect()
}
