use chrono::{Days, Months, NaiveDate};

use crate::models::Recurrence;

/// Hard cap on rule iteration. Guarantees termination even when an until
/// date is missing or far beyond the window; it also bounds how far into
/// the future a series can be displayed in one call.
pub const MAX_STEPS: u32 = 1000;

/// A display window over calendar dates, half-open: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

/// Produces the ordered candidate occurrence dates for one template.
///
/// A `none` rule yields the anchor date alone, regardless of the window:
/// the caller window-filters non-recurring items itself, since their one
/// instance is matched against the stored date rather than regenerated.
///
/// For real rules, iteration starts at the anchor and advances by the
/// rule's step, stopping once a candidate passes the until date (inclusive
/// bound: a candidate exactly on it is kept) or the window end. Candidates
/// before the window start are computed to keep the stepping correct but
/// not emitted.
pub fn occurrence_dates(
    anchor: NaiveDate,
    rule: Recurrence,
    until: Option<NaiveDate>,
    window: DateWindow,
) -> Vec<NaiveDate> {
    if !rule.is_recurring() {
        return vec![anchor];
    }

    let mut dates = Vec::new();
    for step in 0..MAX_STEPS {
        let Some(candidate) = nth_candidate(anchor, rule, step) else {
            break;
        };
        if let Some(until) = until {
            if candidate > until {
                break;
            }
        }
        if candidate >= window.end {
            break;
        }
        if candidate >= window.start {
            dates.push(candidate);
        }
    }
    dates
}

/// The n-th candidate of a series. Monthly steps are computed from the
/// anchor rather than the previous candidate, so the anchor's day-of-month
/// is preserved wherever the target month supports it and clamps to the
/// month's last day only where it does not (Jan 31 -> Feb 28 -> Mar 31).
fn nth_candidate(anchor: NaiveDate, rule: Recurrence, step: u32) -> Option<NaiveDate> {
    match rule {
        Recurrence::None => Some(anchor),
        Recurrence::Daily => anchor.checked_add_days(Days::new(step as u64)),
        Recurrence::Weekly => anchor.checked_add_days(Days::new(7 * step as u64)),
        Recurrence::Biweekly => anchor.checked_add_days(Days::new(14 * step as u64)),
        Recurrence::Monthly => anchor.checked_add_months(Months::new(step)),
    }
}
