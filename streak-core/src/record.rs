//! Interval records as the remote store reports them, and the whole-day
//! spans the streak is made of.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{StreakError, StreakResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The day after `day`.
pub fn day_after(day: NaiveDate) -> StreakResult<NaiveDate> {
    day.checked_add_days(Days::new(1))
        .ok_or(StreakError::InvalidDay(day))
}

/// Parse a `YYYY-MM-DD` string.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// A half-open range of whole days, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DaySpan {
    pub start: NaiveDate,
    /// First day *not* covered.
    pub end: NaiveDate,
}

impl DaySpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DaySpan { start, end }
    }

    pub fn single(day: NaiveDate) -> StreakResult<Self> {
        Ok(DaySpan::new(day, day_after(day)?))
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }

    /// Length in whole days.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl std::fmt::Display for DaySpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// One side of a remote record's time range.
///
/// Whole-day records carry `date`; timed records carry `date_time`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBound {
    pub date: Option<String>,
    pub date_time: Option<String>,
}

impl RecordBound {
    pub fn date(day: NaiveDate) -> Self {
        RecordBound {
            date: Some(day.format(DATE_FORMAT).to_string()),
            date_time: None,
        }
    }

    pub fn date_time(value: impl Into<String>) -> Self {
        RecordBound {
            date: None,
            date_time: Some(value.into()),
        }
    }

    /// The whole-day date string, if this bound has one.
    pub fn whole_day(&self) -> Option<&str> {
        self.date.as_deref().filter(|d| !d.is_empty())
    }

    /// Key the store orders records by.
    pub fn sort_key(&self) -> &str {
        self.whole_day()
            .or(self.date_time.as_deref())
            .unwrap_or_default()
    }
}

/// A record exactly as listed by the remote store, before any filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: String,
    pub label: String,
    pub start: RecordBound,
    pub end: RecordBound,
}

impl RemoteRecord {
    pub fn whole_day(id: impl Into<String>, label: impl Into<String>, span: DaySpan) -> Self {
        RemoteRecord {
            id: id.into(),
            label: label.into(),
            start: RecordBound::date(span.start),
            end: RecordBound::date(span.end),
        }
    }

    /// Convert to a streak record if this record belongs to the streak labelled `label`.
    ///
    /// Timed records and records with another label are `Ok(None)`. A matching
    /// whole-day record with unparseable or inverted dates is an error.
    pub fn to_streak_record(&self, label: &str) -> StreakResult<Option<StreakRecord>> {
        let (Some(start), Some(end)) = (self.start.whole_day(), self.end.whole_day()) else {
            return Ok(None);
        };
        if self.label != label {
            return Ok(None);
        }

        let invalid = |reason: String| StreakError::InvalidRecord {
            id: self.id.clone(),
            reason,
        };

        let start = parse_date(start).ok_or_else(|| invalid(format!("bad start date '{start}'")))?;
        let end = parse_date(end).ok_or_else(|| invalid(format!("bad end date '{end}'")))?;
        if end <= start {
            return Err(invalid(format!("end {end} is not after start {start}")));
        }

        Ok(Some(StreakRecord {
            id: self.id.clone(),
            span: DaySpan::new(start, end),
        }))
    }
}

/// A whole-day record carrying the streak label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakRecord {
    pub id: String,
    pub span: DaySpan,
}
