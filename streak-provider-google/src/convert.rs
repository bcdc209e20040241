//! Conversions between `google_calendar` types and streak records.

use chrono::NaiveDate;
use google_calendar::types::{Calendar, Event, EventDateTime, Events, Reminders};
use streak_core::{DaySpan, RecordBound, RecordPage, RemoteRecord};

/// Convert from Google API types to streak types
pub trait FromGoogle<T> {
    fn from_google(value: T) -> Self;
}

/// Convert to Google API types from streak types
pub trait ToGoogle<T> {
    fn to_google(&self) -> T;
}

impl FromGoogle<Option<EventDateTime>> for RecordBound {
    fn from_google(time: Option<EventDateTime>) -> Self {
        match time {
            Some(EventDateTime { date: Some(d), .. }) => RecordBound::date(d),
            Some(EventDateTime {
                date_time: Some(dt),
                ..
            }) => RecordBound::date_time(dt.to_rfc3339()),
            _ => RecordBound::default(),
        }
    }
}

impl FromGoogle<Event> for RemoteRecord {
    fn from_google(event: Event) -> Self {
        RemoteRecord {
            id: event.id,
            label: event.summary,
            start: RecordBound::from_google(event.start),
            end: RecordBound::from_google(event.end),
        }
    }
}

impl FromGoogle<Events> for RecordPage {
    fn from_google(page: Events) -> Self {
        RecordPage {
            records: page
                .items
                .into_iter()
                .filter(|e| e.status != "cancelled" && !e.id.is_empty())
                .map(RemoteRecord::from_google)
                .collect(),
            next_page_token: Some(page.next_page_token).filter(|t| !t.is_empty()),
        }
    }
}

impl ToGoogle<EventDateTime> for NaiveDate {
    fn to_google(&self) -> EventDateTime {
        EventDateTime {
            date: Some(*self),
            date_time: None,
            time_zone: String::new(),
        }
    }
}

/// Event body carrying only a title and whole-day bounds.
pub fn whole_day_event(span: DaySpan, label: &str) -> Event {
    Event {
        summary: label.to_string(),
        start: Some(span.start.to_google()),
        end: Some(span.end.to_google()),
        ..Default::default()
    }
}

/// Like [`whole_day_event`], with the calendar's default reminders switched off.
pub fn new_whole_day_event(span: DaySpan, label: &str) -> Event {
    Event {
        reminders: Some(Reminders {
            overrides: Vec::new(),
            use_default: false,
        }),
        ..whole_day_event(span, label)
    }
}

pub fn named_calendar(name: &str) -> Calendar {
    Calendar {
        conference_properties: None,
        description: String::new(),
        etag: String::new(),
        id: String::new(),
        kind: String::new(),
        location: String::new(),
        summary: name.to_string(),
        time_zone: String::new(),
    }
}
