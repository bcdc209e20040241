//! Adding and removing days on a streak stored in a remote calendar.
//!
//! Every operation re-reads the calendar from the start and mutates it in
//! place. Mutations are issued one at a time; when a two-step change
//! (merge then delete, shrink then create) fails half way, the first step
//! stays applied.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StreakResult;
use crate::event_source::EventSource;
use crate::resolver::resolve_calendar;
use crate::scan::{AddOutcome, AddScan, Flow, Mutation, RemoveOutcome, RemoveScan, ScanResult, Visit};
use crate::store::CalendarStore;

pub const DEFAULT_CALENDAR_NAME: &str = "Streaks";
pub const DEFAULT_LABEL: &str = "Streak";

/// Which calendar and records make up a streak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakConfig {
    /// Title every streak record carries.
    pub label: String,
    /// Display name of the calendar holding the records.
    pub calendar_name: String,
    pub create_if_missing: bool,
}

impl Default for StreakConfig {
    fn default() -> Self {
        StreakConfig {
            label: DEFAULT_LABEL.to_string(),
            calendar_name: DEFAULT_CALENDAR_NAME.to_string(),
            create_if_missing: false,
        }
    }
}

/// A streak bound to one calendar of a store.
pub struct Streak<'a, S: CalendarStore + ?Sized> {
    store: &'a S,
    calendar_id: String,
    label: String,
}

impl<'a, S: CalendarStore + ?Sized> Streak<'a, S> {
    /// Resolve the streak calendar named in `config`.
    pub async fn open(store: &'a S, config: &StreakConfig) -> StreakResult<Self> {
        let calendar_id =
            resolve_calendar(store, &config.calendar_name, config.create_if_missing).await?;
        Ok(Streak::new(store, calendar_id, &config.label))
    }

    pub fn new(store: &'a S, calendar_id: impl Into<String>, label: &str) -> Self {
        Streak {
            store,
            calendar_id: calendar_id.into(),
            label: label.to_string(),
        }
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    fn records(&self) -> EventSource<'_, S> {
        EventSource::new(self.store, &self.calendar_id, &self.label)
    }

    /// Make sure `day` is covered, merging with neighbouring records.
    pub async fn add_day(&self, day: NaiveDate) -> StreakResult<AddOutcome> {
        let mut scan = AddScan::new(day)?;
        let mut records = self.records();

        while let Some(record) = records.next().await? {
            let visit = scan.visit(&record);
            match self.apply(visit).await {
                ScanResult::Continue => continue,
                ScanResult::StopSuccess => break,
                ScanResult::StopFailure(err) => return Err(err),
            }
        }

        let (outcome, remaining) = scan.finish();
        for mutation in remaining {
            self.mutate(mutation).await?;
        }

        info!(%day, ?outcome, "added day to streak");
        Ok(outcome)
    }

    /// Make sure `day` is not covered, shrinking or splitting its record.
    pub async fn remove_day(&self, day: NaiveDate) -> StreakResult<RemoveOutcome> {
        let mut scan = RemoveScan::new(day)?;
        let mut records = self.records();

        while let Some(record) = records.next().await? {
            let visit = scan.visit(&record);
            match self.apply(visit).await {
                ScanResult::Continue => continue,
                ScanResult::StopSuccess => break,
                ScanResult::StopFailure(err) => return Err(err),
            }
        }

        let outcome = scan.finish();
        info!(%day, ?outcome, "removed day from streak");
        Ok(outcome)
    }

    /// Length in days of the longest record, 0 when there are none.
    pub async fn longest_streak(&self) -> StreakResult<i64> {
        self.records()
            .fold(0, |longest, record| longest.max(record.span.days()))
            .await
    }

    async fn apply(&self, visit: Visit) -> ScanResult {
        for mutation in visit.mutations {
            if let Err(err) = self.mutate(mutation).await {
                return ScanResult::StopFailure(err);
            }
        }
        match visit.flow {
            Flow::Continue => ScanResult::Continue,
            Flow::Stop => ScanResult::StopSuccess,
        }
    }

    async fn mutate(&self, mutation: Mutation) -> StreakResult<()> {
        debug!(?mutation, calendar = %self.calendar_id, "applying");
        match mutation {
            Mutation::Create { span } => {
                let id = self
                    .store
                    .create_record(&self.calendar_id, span, &self.label)
                    .await?;
                debug!(%id, %span, "created record");
            }
            Mutation::Update { id, span } => {
                self.store
                    .update_record(&self.calendar_id, &id, span, &self.label)
                    .await?;
            }
            Mutation::Delete { id } => {
                self.store.delete_record(&self.calendar_id, &id).await?;
            }
        }
        Ok(())
    }
}
