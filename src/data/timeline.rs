use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};

use super::model::EventDataset;

/// Label shown when the window spans the whole timeline.
pub const ALL_EVENTS: &str = "All Events";

// ---------------------------------------------------------------------------
// IndexRange – a two-handle selection over the timeline
// ---------------------------------------------------------------------------

/// Inclusive `(start, end)` positions into a [`Timeline`]. The range selector
/// may hand these over in either order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub start: usize,
    pub end: usize,
}

impl IndexRange {
    pub fn new(start: usize, end: usize) -> Self {
        IndexRange { start, end }
    }

    /// Swap the handles if they crossed.
    pub fn normalized(self) -> Self {
        if self.start > self.end {
            IndexRange { start: self.end, end: self.start }
        } else {
            self
        }
    }

    /// Normalize and pin both handles to `0..len`. `None` when `len == 0`.
    pub fn clamped(self, len: usize) -> Option<Self> {
        let last = len.checked_sub(1)?;
        let r = self.normalized();
        Some(IndexRange {
            start: r.start.min(last),
            end: r.end.min(last),
        })
    }
}

// ---------------------------------------------------------------------------
// Timeline – sorted instants of every dated event
// ---------------------------------------------------------------------------

/// Every parseable event instant, ascending, duplicates kept. Positions, not
/// distinct instants, are what the range selector addresses.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    instants: Vec<DateTime<Utc>>,
}

impl Timeline {
    pub fn from_dataset(dataset: &EventDataset) -> Self {
        let mut instants: Vec<DateTime<Utc>> =
            dataset.events.iter().filter_map(|e| e.occurred_at).collect();
        instants.sort();
        Timeline { instants }
    }

    pub fn len(&self) -> usize {
        self.instants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }

    pub fn first(&self) -> Option<DateTime<Utc>> {
        self.instants.first().copied()
    }

    pub fn last(&self) -> Option<DateTime<Utc>> {
        self.instants.last().copied()
    }

    /// `0..=len-1`, or `None` for an empty timeline.
    pub fn full_range(&self) -> Option<IndexRange> {
        self.len().checked_sub(1).map(|last| IndexRange::new(0, last))
    }

    /// Instants at both handles after normalizing, inclusive.
    pub fn window(&self, range: IndexRange) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let r = range.clamped(self.len())?;
        Some((self.instants[r.start], self.instants[r.end]))
    }

    pub fn is_full(&self, range: IndexRange) -> bool {
        range.clamped(self.len()) == self.full_range()
    }

    /// Display text for a selection, e.g. `5 Jan 2024 — 10 Mar 2024`.
    pub fn label(&self, range: IndexRange) -> String {
        match self.window(range) {
            None => "No dated events".to_string(),
            Some(_) if self.is_full(range) => ALL_EVENTS.to_string(),
            Some((start, end)) => format!("{} — {}", format_day(start), format_day(end)),
        }
    }
}

pub fn format_day(t: DateTime<Utc>) -> String {
    t.format("%-d %b %Y").to_string()
}

// ---------------------------------------------------------------------------
// MonthlyHistogram – per-month counts for the timeline bar chart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthBucket {
    pub month_start: NaiveDate,
    pub count: usize,
}

/// One bucket per calendar month (UTC) from the first to the last timeline
/// month inclusive; empty months are present with a zero count.
#[derive(Debug, Clone, Default)]
pub struct MonthlyHistogram {
    pub buckets: Vec<MonthBucket>,
}

fn month_ordinal(year: i32, month: u32) -> i64 {
    year as i64 * 12 + (month as i64 - 1)
}

fn month_ordinal_of(t: DateTime<Utc>) -> i64 {
    month_ordinal(t.year(), t.month())
}

impl MonthlyHistogram {
    pub fn build(dataset: &EventDataset, timeline: &Timeline) -> Self {
        let (Some(first), Some(last)) = (timeline.first(), timeline.last()) else {
            return MonthlyHistogram::default();
        };
        let Some(first_month) = NaiveDate::from_ymd_opt(first.year(), first.month(), 1) else {
            return MonthlyHistogram::default();
        };

        let n_months = (month_ordinal_of(last) - month_ordinal_of(first) + 1) as u32;
        let mut buckets: Vec<MonthBucket> = (0..n_months)
            .filter_map(|i| first_month.checked_add_months(Months::new(i)))
            .map(|month_start| MonthBucket { month_start, count: 0 })
            .collect();

        let base = month_ordinal_of(first);
        for t in dataset.events.iter().filter_map(|e| e.occurred_at) {
            let idx = month_ordinal_of(t) - base;
            if let Some(bucket) = usize::try_from(idx).ok().and_then(|i| buckets.get_mut(i)) {
                bucket.count += 1;
            }
        }

        MonthlyHistogram { buckets }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn max_count(&self) -> usize {
        self.buckets.iter().map(|b| b.count).max().unwrap_or(0)
    }

    /// Bucket holding instant `t`, if it is inside the covered months.
    pub fn bucket_index(&self, t: DateTime<Utc>) -> Option<usize> {
        let first = self.buckets.first()?.month_start;
        let idx = month_ordinal_of(t) - month_ordinal(first.year(), first.month());
        usize::try_from(idx).ok().filter(|&i| i < self.buckets.len())
    }

    /// Buckets touched by a timeline selection, for highlighting.
    pub fn selected_buckets(
        &self,
        timeline: &Timeline,
        range: IndexRange,
    ) -> Option<RangeInclusive<usize>> {
        let (start, end) = timeline.window(range)?;
        Some(self.bucket_index(start)?..=self.bucket_index(end)?)
    }

    /// Up to `n` evenly spaced `(bucket index, year)` axis labels.
    pub fn axis_labels(&self, n: usize) -> Vec<(usize, String)> {
        let Some(last) = self.buckets.len().checked_sub(1) else {
            return Vec::new();
        };
        let steps = n.max(2) - 1;
        let mut labels: Vec<(usize, String)> = (0..=steps)
            .map(|i| last * i / steps)
            .map(|idx| (idx, self.buckets[idx].month_start.year().to_string()))
            .collect();
        labels.dedup_by_key(|(idx, _)| *idx);
        labels
    }
}
