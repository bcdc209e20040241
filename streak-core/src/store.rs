//! The remote calendar capability the streak is maintained against.
//!
//! Implementations own transport and authentication; the core only sees
//! these operations. Every call is a single request/response.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StreakResult;
use crate::record::{DaySpan, RemoteRecord};

/// A top-level calendar as listed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordOrder {
    /// Whatever order the store prefers.
    #[default]
    Unspecified,
    /// Ascending by start.
    StartTime,
}

/// Parameters for one page of [`CalendarStore::list_records`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    /// Continuation token from the previous page, `None` for the first page.
    pub page_token: Option<String>,
    /// Expand recurring records into their single occurrences.
    pub single_events: bool,
    pub order_by: RecordOrder,
}

/// One page of listed records.
#[derive(Debug, Clone, Default)]
pub struct RecordPage {
    pub records: Vec<RemoteRecord>,
    /// Present when more pages remain.
    pub next_page_token: Option<String>,
}

#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn list_calendars(&self) -> StreakResult<Vec<CalendarEntry>>;

    /// Create a calendar and return its id.
    async fn create_calendar(&self, name: &str) -> StreakResult<String>;

    async fn list_records(&self, calendar_id: &str, query: &RecordQuery)
    -> StreakResult<RecordPage>;

    /// Create a whole-day record and return its id.
    async fn create_record(&self, calendar_id: &str, span: DaySpan, label: &str)
    -> StreakResult<String>;

    async fn update_record(
        &self,
        calendar_id: &str,
        record_id: &str,
        span: DaySpan,
        label: &str,
    ) -> StreakResult<()>;

    async fn delete_record(&self, calendar_id: &str, record_id: &str) -> StreakResult<()>;
}
