//! In-memory [`CalendarStore`] for tests. Other crates get it through the
//! `memory` feature.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{StreakError, StreakResult};
use crate::record::{DaySpan, RecordBound, RemoteRecord};
use crate::store::{CalendarEntry, CalendarStore, RecordOrder, RecordPage, RecordQuery};

const DEFAULT_PAGE_SIZE: usize = 250;

/// Store operations, for counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListCalendars,
    CreateCalendar,
    ListRecords,
    CreateRecord,
    UpdateRecord,
    DeleteRecord,
}

impl StoreOp {
    fn is_mutation(self) -> bool {
        matches!(
            self,
            StoreOp::CreateRecord | StoreOp::UpdateRecord | StoreOp::DeleteRecord
        )
    }
}

#[derive(Default)]
struct State {
    calendars: Vec<CalendarEntry>,
    records: HashMap<String, Vec<RemoteRecord>>,
    next_id: u64,
    calls: HashMap<StoreOp, usize>,
    fail_next: Vec<StoreOp>,
    last_query: Option<RecordQuery>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    /// Count the call and fail it if a failure was injected.
    fn enter(&mut self, op: StoreOp) -> StreakResult<()> {
        *self.calls.entry(op).or_default() += 1;
        if let Some(pos) = self.fail_next.iter().position(|o| *o == op) {
            self.fail_next.remove(pos);
            return Err(StreakError::Transport(format!("injected {:?} failure", op)));
        }
        Ok(())
    }

    fn calendar_records(&mut self, calendar_id: &str) -> StreakResult<&mut Vec<RemoteRecord>> {
        self.records
            .get_mut(calendar_id)
            .ok_or_else(|| StreakError::Transport(format!("no calendar with id {}", calendar_id)))
    }

    fn record_mut(&mut self, calendar_id: &str, record_id: &str) -> StreakResult<&mut RemoteRecord> {
        self.calendar_records(calendar_id)?
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| StreakError::Transport(format!("404 Not Found: {}", record_id)))
    }
}

pub struct MemoryStore {
    page_size: usize,
    state: Mutex<State>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        MemoryStore {
            page_size: page_size.max(1),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock only happens inside a failing test.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a calendar and return its id.
    pub fn add_calendar(&self, name: &str) -> String {
        let mut state = self.state();
        let id = state.next_id("cal");
        state.calendars.push(CalendarEntry {
            id: id.clone(),
            name: name.to_string(),
        });
        state.records.insert(id.clone(), Vec::new());
        id
    }

    /// Insert a record as-is, bypassing call counting.
    pub fn insert(&self, calendar_id: &str, record: RemoteRecord) {
        self.state()
            .records
            .entry(calendar_id.to_string())
            .or_default()
            .push(record);
    }

    /// Insert a whole-day record and return its generated id.
    pub fn insert_span(&self, calendar_id: &str, label: &str, span: DaySpan) -> String {
        let id = self.state().next_id("rec");
        self.insert(calendar_id, RemoteRecord::whole_day(id.clone(), label, span));
        id
    }

    pub fn records(&self, calendar_id: &str) -> Vec<RemoteRecord> {
        self.state()
            .records
            .get(calendar_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Whole-day spans labelled `label`, sorted by start.
    pub fn spans(&self, calendar_id: &str, label: &str) -> Vec<DaySpan> {
        let mut spans: Vec<DaySpan> = self
            .records(calendar_id)
            .iter()
            .filter_map(|r| r.to_streak_record(label).ok().flatten())
            .map(|r| r.span)
            .collect();
        spans.sort_by_key(|s| s.start);
        spans
    }

    pub fn calls(&self, op: StoreOp) -> usize {
        self.state().calls.get(&op).copied().unwrap_or(0)
    }

    /// Number of create/update/delete record calls issued so far.
    pub fn mutations(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|(op, _)| op.is_mutation())
            .map(|(_, n)| n)
            .sum()
    }

    pub fn last_query(&self) -> Option<RecordQuery> {
        self.state().last_query.clone()
    }

    /// Make the next call of `op` fail with a transport error.
    pub fn fail_next(&self, op: StoreOp) {
        self.state().fail_next.push(op);
    }
}

#[async_trait]
impl CalendarStore for MemoryStore {
    async fn list_calendars(&self) -> StreakResult<Vec<CalendarEntry>> {
        let mut state = self.state();
        state.enter(StoreOp::ListCalendars)?;
        Ok(state.calendars.clone())
    }

    async fn create_calendar(&self, name: &str) -> StreakResult<String> {
        self.state().enter(StoreOp::CreateCalendar)?;
        Ok(self.add_calendar(name))
    }

    async fn list_records(
        &self,
        calendar_id: &str,
        query: &RecordQuery,
    ) -> StreakResult<RecordPage> {
        let page_size = self.page_size;
        let mut state = self.state();
        state.enter(StoreOp::ListRecords)?;
        state.last_query = Some(query.clone());

        let mut records = state.calendar_records(calendar_id)?.clone();
        if query.order_by == RecordOrder::StartTime {
            records.sort_by(|a, b| a.start.sort_key().cmp(b.start.sort_key()));
        }

        let offset = match &query.page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| StreakError::Transport(format!("bad page token {}", token)))?,
            None => 0,
        };

        let end = (offset + page_size).min(records.len());
        let next_page_token = (end < records.len()).then(|| end.to_string());
        let records = records.get(offset..end).map(<[_]>::to_vec).unwrap_or_default();

        Ok(RecordPage {
            records,
            next_page_token,
        })
    }

    async fn create_record(
        &self,
        calendar_id: &str,
        span: DaySpan,
        label: &str,
    ) -> StreakResult<String> {
        let mut state = self.state();
        state.enter(StoreOp::CreateRecord)?;
        let id = state.next_id("rec");
        state
            .calendar_records(calendar_id)?
            .push(RemoteRecord::whole_day(id.clone(), label, span));
        Ok(id)
    }

    async fn update_record(
        &self,
        calendar_id: &str,
        record_id: &str,
        span: DaySpan,
        label: &str,
    ) -> StreakResult<()> {
        let mut state = self.state();
        state.enter(StoreOp::UpdateRecord)?;
        let record = state.record_mut(calendar_id, record_id)?;
        record.label = label.to_string();
        record.start = RecordBound::date(span.start);
        record.end = RecordBound::date(span.end);
        Ok(())
    }

    async fn delete_record(&self, calendar_id: &str, record_id: &str) -> StreakResult<()> {
        let mut state = self.state();
        state.enter(StoreOp::DeleteRecord)?;
        let records = state.calendar_records(calendar_id)?;
        let before = records.len();
        records.retain(|r| r.id != record_id);
        if records.len() == before {
            return Err(StreakError::Transport(format!("404 Not Found: {}", record_id)));
        }
        Ok(())
    }
}
