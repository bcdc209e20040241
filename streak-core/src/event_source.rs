//! Lazy, paginated iteration over a calendar's streak records.

use std::collections::VecDeque;

use tracing::debug;

use crate::error::StreakResult;
use crate::record::{RemoteRecord, StreakRecord};
use crate::store::{CalendarStore, RecordOrder, RecordQuery};

/// Streak records of one calendar, ascending by start.
///
/// Pages are fetched only when the buffered page runs out, so a consumer
/// that stops calling [`EventSource::next`] stops pagination too. Records
/// that are timed or carry another label are skipped. Create a new source
/// to read from the beginning again.
pub struct EventSource<'a, S: CalendarStore + ?Sized> {
    store: &'a S,
    calendar_id: &'a str,
    label: &'a str,
    buffer: VecDeque<RemoteRecord>,
    next_page: Option<String>,
    exhausted: bool,
}

impl<'a, S: CalendarStore + ?Sized> EventSource<'a, S> {
    pub fn new(store: &'a S, calendar_id: &'a str, label: &'a str) -> Self {
        EventSource {
            store,
            calendar_id,
            label,
            buffer: VecDeque::new(),
            next_page: None,
            exhausted: false,
        }
    }

    pub async fn next(&mut self) -> StreakResult<Option<StreakRecord>> {
        loop {
            if let Some(raw) = self.buffer.pop_front() {
                match raw.to_streak_record(self.label)? {
                    Some(record) => {
                        debug!(id = %record.id, span = %record.span, "streak record");
                        return Ok(Some(record));
                    }
                    None => {
                        debug!(id = %raw.id, label = %raw.label, "skipping non-streak record");
                        continue;
                    }
                }
            }

            if self.exhausted {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    async fn fetch_page(&mut self) -> StreakResult<()> {
        let query = RecordQuery {
            page_token: self.next_page.take(),
            single_events: true,
            order_by: RecordOrder::StartTime,
        };

        let page = self.store.list_records(self.calendar_id, &query).await?;
        debug!(
            calendar = self.calendar_id,
            records = page.records.len(),
            more = page.next_page_token.is_some(),
            "fetched record page"
        );

        self.buffer.extend(page.records);
        match page.next_page_token {
            Some(token) if !token.is_empty() => self.next_page = Some(token),
            _ => self.exhausted = true,
        }
        Ok(())
    }

    /// Drain the rest of the sequence through `f`.
    pub async fn fold<B>(mut self, init: B, mut f: impl FnMut(B, &StreakRecord) -> B) -> StreakResult<B> {
        let mut acc = init;
        while let Some(record) = self.next().await? {
            acc = f(acc, &record);
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreakError;
    use crate::memory::{MemoryStore, StoreOp};
    use crate::record::{parse_date, DaySpan, RecordBound};

    fn span(start: &str, end: &str) -> DaySpan {
        DaySpan::new(parse_date(start).unwrap(), parse_date(end).unwrap())
    }

    async fn collect(source: &mut EventSource<'_, MemoryStore>) -> Vec<DaySpan> {
        let mut spans = Vec::new();
        while let Some(record) = source.next().await.unwrap() {
            spans.push(record.span);
        }
        spans
    }

    #[tokio::test]
    async fn test_yields_streak_records_in_start_order() {
        let store = MemoryStore::new();
        let cal = store.add_calendar("Streaks");
        store.insert_span(&cal, "Streak", span("2024-03-01", "2024-03-04"));
        store.insert_span(&cal, "Streak", span("2024-01-01", "2024-01-02"));
        store.insert_span(&cal, "Streak", span("2024-02-10", "2024-02-12"));

        let mut source = EventSource::new(&store, &cal, "Streak");
        let spans = collect(&mut source).await;

        assert_eq!(
            spans,
            vec![
                span("2024-01-01", "2024-01-02"),
                span("2024-02-10", "2024-02-12"),
                span("2024-03-01", "2024-03-04"),
            ]
        );

        let query = store.last_query().unwrap();
        assert!(query.single_events);
        assert_eq!(query.order_by, RecordOrder::StartTime);
    }

    #[tokio::test]
    async fn test_skips_timed_and_foreign_records() {
        let store = MemoryStore::new();
        let cal = store.add_calendar("Streaks");
        store.insert_span(&cal, "Gym", span("2024-01-01", "2024-01-05"));
        store.insert(
            &cal,
            RemoteRecord {
                id: "timed".into(),
                label: "Streak".into(),
                start: RecordBound::date_time("2024-01-02T09:00:00Z"),
                end: RecordBound::date_time("2024-01-02T10:00:00Z"),
            },
        );
        store.insert_span(&cal, "Streak", span("2024-01-03", "2024-01-04"));

        let mut source = EventSource::new(&store, &cal, "Streak");
        assert_eq!(collect(&mut source).await, vec![span("2024-01-03", "2024-01-04")]);
    }

    #[tokio::test]
    async fn test_follows_pagination() {
        let store = MemoryStore::with_page_size(2);
        let cal = store.add_calendar("Streaks");
        for day in 1..=5 {
            let start = format!("2024-01-{:02}", day * 2);
            let end = format!("2024-01-{:02}", day * 2 + 1);
            store.insert_span(&cal, "Streak", span(&start, &end));
        }

        let mut source = EventSource::new(&store, &cal, "Streak");
        assert_eq!(collect(&mut source).await.len(), 5);
        assert_eq!(store.calls(StoreOp::ListRecords), 3);
    }

    #[tokio::test]
    async fn test_pages_are_fetched_on_demand() {
        let store = MemoryStore::with_page_size(2);
        let cal = store.add_calendar("Streaks");
        for day in 1..=6 {
            let start = format!("2024-01-{:02}", day * 2);
            let end = format!("2024-01-{:02}", day * 2 + 1);
            store.insert_span(&cal, "Streak", span(&start, &end));
        }

        let mut source = EventSource::new(&store, &cal, "Streak");
        assert!(source.next().await.unwrap().is_some());
        assert!(source.next().await.unwrap().is_some());
        assert_eq!(store.calls(StoreOp::ListRecords), 1);

        assert!(source.next().await.unwrap().is_some());
        assert_eq!(store.calls(StoreOp::ListRecords), 2);

        drop(source);
        assert_eq!(store.calls(StoreOp::ListRecords), 2);
    }

    #[tokio::test]
    async fn test_fresh_source_restarts_from_beginning() {
        let store = MemoryStore::new();
        let cal = store.add_calendar("Streaks");
        store.insert_span(&cal, "Streak", span("2024-01-01", "2024-01-02"));

        let mut first = EventSource::new(&store, &cal, "Streak");
        assert_eq!(collect(&mut first).await.len(), 1);
        let mut second = EventSource::new(&store, &cal, "Streak");
        assert_eq!(collect(&mut second).await.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_streak_record_fails() {
        let store = MemoryStore::new();
        let cal = store.add_calendar("Streaks");
        store.insert(
            &cal,
            RemoteRecord {
                id: "broken".into(),
                label: "Streak".into(),
                start: RecordBound {
                    date: Some("01/02/2024".into()),
                    date_time: None,
                },
                end: RecordBound::date(parse_date("2024-01-03").unwrap()),
            },
        );

        let mut source = EventSource::new(&store, &cal, "Streak");
        let err = source.next().await.unwrap_err();
        assert!(matches!(err, StreakError::InvalidRecord { .. }));
    }

    #[tokio::test]
    async fn test_list_failure_is_surfaced() {
        let store = MemoryStore::new();
        let cal = store.add_calendar("Streaks");
        store.fail_next(StoreOp::ListRecords);

        let mut source = EventSource::new(&store, &cal, "Streak");
        assert!(matches!(
            source.next().await,
            Err(StreakError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_fold_sums_days() {
        let store = MemoryStore::new();
        let cal = store.add_calendar("Streaks");
        store.insert_span(&cal, "Streak", span("2024-01-01", "2024-01-03"));
        store.insert_span(&cal, "Streak", span("2024-01-10", "2024-01-14"));

        let total = EventSource::new(&store, &cal, "Streak")
            .fold(0, |acc, r| acc + r.span.days())
            .await
            .unwrap();
        assert_eq!(total, 6);
    }
}
