//! Day-indexed absence ledger.
//!
//! Trips and the pre-entry gap are merged into non-overlapping day ranges,
//! then laid out as a prefix sum so that the absence inside any window is a
//! single subtraction. Overlapping trips are therefore counted once.

use chrono::{Days, NaiveDate};

use crate::trip::inclusive_days;

/// An inclusive range of calendar days.
pub type DayRange = (NaiveDate, NaiveDate);

/// Merge overlapping or adjacent day ranges.
///
/// Inverted ranges (end before start) are discarded. Returns a sorted,
/// non-overlapping list.
pub fn merge_day_ranges(ranges: impl IntoIterator<Item = DayRange>) -> Vec<DayRange> {
    let mut ranges: Vec<DayRange> = ranges
        .into_iter()
        .filter(|(start, end)| start <= end)
        .collect();

    ranges.sort_unstable();

    let mut merged: Vec<DayRange> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        if let Some(last) = merged.last_mut() {
            // Touching ranges merge too: the day after `last.1` is `start`.
            if last.1.succ_opt().map_or(true, |next| start <= next) {
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }

    merged
}

/// Total days covered by the union of `ranges`.
pub fn covered_days(ranges: impl IntoIterator<Item = DayRange>) -> i64 {
    merge_day_ranges(ranges)
        .into_iter()
        .map(|(start, end)| inclusive_days(start, end))
        .sum()
}

/// Absence counts over a fixed span of days `[origin, last]`.
#[derive(Debug, Clone)]
pub struct AbsenceLedger {
    origin: NaiveDate,
    last: NaiveDate,
    /// `prefix[i]` = absent days in `[origin, origin + i)`.
    prefix: Vec<i64>,
}

impl AbsenceLedger {
    /// Lay out `ranges` over `[origin, last]`. Anything outside the span is
    /// ignored.
    pub fn build(origin: NaiveDate, last: NaiveDate, ranges: impl IntoIterator<Item = DayRange>) -> Self {
        let span = usize::try_from(inclusive_days(origin, last)).unwrap_or(0);

        let clipped = ranges
            .into_iter()
            .filter(|(start, end)| *start <= last && *end >= origin)
            .map(|(start, end)| (start.max(origin), end.min(last)));

        let mut absent = vec![false; span];
        for (start, end) in merge_day_ranges(clipped) {
            let from = offset(origin, start);
            let to = offset(origin, end);
            absent[from..=to].iter_mut().for_each(|day| *day = true);
        }

        let mut prefix = Vec::with_capacity(span + 1);
        prefix.push(0);
        let mut running = 0;
        for is_absent in absent {
            running += i64::from(is_absent);
            prefix.push(running);
        }

        Self {
            origin,
            last,
            prefix,
        }
    }

    pub fn origin(&self) -> NaiveDate {
        self.origin
    }

    pub fn last(&self) -> NaiveDate {
        self.last
    }

    /// Absent days within `[start, end]`, inclusive. Days outside the ledger
    /// span count as present.
    pub fn absent_days(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        match self.clip(start, end) {
            Some((from, to)) => self.prefix[to + 1] - self.prefix[from],
            None => 0,
        }
    }

    /// Absent days within `[start, end]` if `extra` were also an absence.
    ///
    /// Days of `extra` that are already absent are not counted twice.
    pub fn absent_days_with(&self, start: NaiveDate, end: NaiveDate, extra: DayRange) -> i64 {
        let base = self.absent_days(start, end);
        let overlap_start = start.max(extra.0);
        let overlap_end = end.min(extra.1);
        if overlap_start > overlap_end {
            return base;
        }
        let added = inclusive_days(overlap_start, overlap_end);
        base + added - self.absent_days(overlap_start, overlap_end)
    }

    fn clip(&self, start: NaiveDate, end: NaiveDate) -> Option<(usize, usize)> {
        let start = start.max(self.origin);
        let end = end.min(self.last);
        (start <= end)
            .then(|| (offset(self.origin, start), offset(self.origin, end)))
    }
}

/// Day offset of `day` from `origin`; callers guarantee `day >= origin`.
fn offset(origin: NaiveDate, day: NaiveDate) -> usize {
    usize::try_from((day - origin).num_days()).unwrap_or(0)
}

/// `day + n` days, or `None` past chrono's maximum date.
pub(crate) fn add_days(day: NaiveDate, n: u64) -> Option<NaiveDate> {
    day.checked_add_days(Days::new(n))
}
