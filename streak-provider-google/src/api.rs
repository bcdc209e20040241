//! [`CalendarStore`] backed by the Google Calendar v3 API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use google_calendar::types::{Events, MinAccessRole, SendUpdates};
use google_calendar::{Client, ClientError, StatusCode};
use std::time::Duration;
use streak_core::{
    CalendarEntry, CalendarStore, DaySpan, RecordOrder, RecordPage, RecordQuery, StreakError,
    StreakResult,
};
use tracing::debug;
use url::Url;

use crate::convert::{FromGoogle, named_calendar, new_whole_day_event, whole_day_event};
use crate::session::Session;

const API_BASE: &str = "https://www.googleapis.com/calendar/v3/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GoogleCalendarStore {
    client: Client,
    // `Client::events().list` keeps only the items of a page, so event pages
    // are fetched directly to get at `nextPageToken`.
    http: reqwest::Client,
    access_token: String,
}

impl GoogleCalendarStore {
    pub fn new(session: &Session) -> Result<Self> {
        Self::with_client(session.client()?, session.access_token())
    }

    pub fn with_client(client: Client, access_token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(GoogleCalendarStore {
            client,
            http,
            access_token: access_token.to_string(),
        })
    }

    async fn fetch_calendars(&self) -> Result<Vec<CalendarEntry>> {
        let response = self
            .client
            .calendar_list()
            .list_all(MinAccessRole::default(), false, false)
            .await
            .context("Failed to fetch calendars")?;

        Ok(response
            .body
            .into_iter()
            .filter(|c| !c.id.is_empty())
            .map(|c| CalendarEntry {
                id: c.id,
                name: c.summary,
            })
            .collect())
    }

    async fn insert_calendar(&self, name: &str) -> Result<String> {
        let response = self
            .client
            .calendars()
            .insert(&named_calendar(name))
            .await
            .with_context(|| format!("Failed to create calendar: {}", name))?;
        Ok(response.body.id)
    }

    async fn fetch_events(&self, calendar_id: &str, query: &RecordQuery) -> Result<RecordPage> {
        let url = events_url(calendar_id, query)?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .context("Failed to fetch events")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to fetch events: {}: {}", status, body);
        }

        let page: Events = response
            .json()
            .await
            .context("Failed to decode events page")?;

        debug!(calendar = calendar_id, events = page.items.len(), "fetched events page");
        Ok(RecordPage::from_google(page))
    }

    async fn insert_event(&self, calendar_id: &str, span: DaySpan, label: &str) -> Result<String> {
        let response = self
            .client
            .events()
            .insert(
                calendar_id,
                0,
                0,
                false,
                SendUpdates::None,
                false,
                &new_whole_day_event(span, label),
            )
            .await
            .with_context(|| format!("Failed to create event {} {}", label, span))?;
        Ok(response.body.id)
    }

    async fn patch_event(
        &self,
        calendar_id: &str,
        record_id: &str,
        span: DaySpan,
        label: &str,
    ) -> Result<()> {
        self.client
            .events()
            .patch(
                calendar_id,
                record_id,
                0,
                0,
                false,
                SendUpdates::None,
                false,
                &whole_day_event(span, label),
            )
            .await
            .with_context(|| format!("Failed to update event {}", record_id))?;
        Ok(())
    }

    async fn remove_event(&self, calendar_id: &str, record_id: &str) -> Result<()> {
        let result = self
            .client
            .events()
            .delete(calendar_id, record_id, false, SendUpdates::None)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_gone(&e) => {
                debug!(id = record_id, "event already deleted");
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to delete event {}", record_id)),
        }
    }
}

/// Events list URL for one page of `query`.
fn events_url(calendar_id: &str, query: &RecordQuery) -> Result<Url> {
    let mut url = Url::parse(API_BASE)?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("API base URL cannot have a path"))?
        .pop_if_empty()
        .extend(["calendars", calendar_id, "events"]);

    let mut pairs = Vec::new();
    if query.single_events {
        pairs.push(("singleEvents", "true"));
    }
    if query.order_by == RecordOrder::StartTime {
        pairs.push(("orderBy", "startTime"));
    }
    if let Some(token) = &query.page_token {
        pairs.push(("pageToken", token.as_str()));
    }
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }

    Ok(url)
}

/// 410 Gone: the event was deleted already.
fn is_gone(err: &ClientError) -> bool {
    matches!(err, ClientError::HttpError { status, .. } if *status == StatusCode::GONE)
}

fn transport(err: anyhow::Error) -> StreakError {
    StreakError::transport(format!("{:#}", err))
}

#[async_trait]
impl CalendarStore for GoogleCalendarStore {
    async fn list_calendars(&self) -> StreakResult<Vec<CalendarEntry>> {
        self.fetch_calendars().await.map_err(transport)
    }

    async fn create_calendar(&self, name: &str) -> StreakResult<String> {
        self.insert_calendar(name).await.map_err(transport)
    }

    async fn list_records(
        &self,
        calendar_id: &str,
        query: &RecordQuery,
    ) -> StreakResult<RecordPage> {
        self.fetch_events(calendar_id, query)
            .await
            .map_err(transport)
    }

    async fn create_record(
        &self,
        calendar_id: &str,
        span: DaySpan,
        label: &str,
    ) -> StreakResult<String> {
        self.insert_event(calendar_id, span, label)
            .await
            .map_err(transport)
    }

    async fn update_record(
        &self,
        calendar_id: &str,
        record_id: &str,
        span: DaySpan,
        label: &str,
    ) -> StreakResult<()> {
        self.patch_event(calendar_id, record_id, span, label)
            .await
            .map_err(transport)
    }

    async fn delete_record(&self, calendar_id: &str, record_id: &str) -> StreakResult<()> {
        self.remove_event(calendar_id, record_id)
            .await
            .map_err(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use google_calendar::HeaderMap;

    fn first_page() -> RecordQuery {
        RecordQuery {
            page_token: None,
            single_events: true,
            order_by: RecordOrder::StartTime,
        }
    }

    fn http_error(status: StatusCode) -> ClientError {
        ClientError::HttpError {
            status,
            headers: HeaderMap::new(),
            error: status.to_string(),
        }
    }

    #[test]
    fn test_first_page_query() {
        let url = events_url("primary", &first_page()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/primary/events?singleEvents=true&orderBy=startTime"
        );
    }

    #[test]
    fn test_continuation_page_query() {
        let query = RecordQuery {
            page_token: Some("CiAK+Gj/BwM=".into()),
            ..first_page()
        };
        let url = events_url("primary", &query).unwrap();

        assert_eq!(
            url.query(),
            Some("singleEvents=true&orderBy=startTime&pageToken=CiAK%2BGj%2FBwM%3D")
        );
        let token = url.query_pairs().find(|(k, _)| k == "pageToken").unwrap().1;
        assert_eq!(token, "CiAK+Gj/BwM=");
    }

    #[test]
    fn test_unordered_query_has_no_parameters() {
        let url = events_url("primary", &RecordQuery::default()).unwrap();
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_calendar_ids_are_percent_encoded() {
        let url = events_url("abc#holiday@group.v.calendar.google.com", &first_page()).unwrap();
        assert_eq!(
            url.path(),
            "/calendar/v3/calendars/abc%23holiday@group.v.calendar.google.com/events"
        );
    }

    #[test]
    fn test_only_gone_counts_as_deleted() {
        assert!(is_gone(&http_error(StatusCode::GONE)));
        assert!(!is_gone(&http_error(StatusCode::NOT_FOUND)));
        assert!(!is_gone(&http_error(StatusCode::FORBIDDEN)));
        assert!(!is_gone(&ClientError::EmptyRefreshToken));
    }

    #[test]
    fn test_transport_keeps_context_chain() {
        let err = anyhow::Error::new(http_error(StatusCode::FORBIDDEN))
            .context("Failed to delete event e1");
        let StreakError::Transport(message) = transport(err) else {
            panic!("expected a transport error");
        };
        assert!(message.starts_with("Failed to delete event e1: "));
        assert!(message.contains("403"));
    }
}
