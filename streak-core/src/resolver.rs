//! Finds the calendar holding streak records.

use tracing::info;

use crate::error::{StreakError, StreakResult};
use crate::store::CalendarStore;

/// Id of the first calendar named exactly `name`, in store order.
///
/// When no calendar matches, one is created if `create_if_missing` is set,
/// otherwise this fails with [`StreakError::NotFound`].
pub async fn resolve_calendar<S: CalendarStore + ?Sized>(
    store: &S,
    name: &str,
    create_if_missing: bool,
) -> StreakResult<String> {
    let calendars = store.list_calendars().await?;

    if let Some(calendar) = calendars.into_iter().find(|c| c.name == name) {
        return Ok(calendar.id);
    }

    if !create_if_missing {
        return Err(StreakError::NotFound(format!(
            "couldn't find calendar named '{}'",
            name
        )));
    }

    let id = store.create_calendar(name).await?;
    info!(calendar = name, id = %id, "created calendar");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryStore, StoreOp};

    #[tokio::test]
    async fn test_finds_calendar_by_exact_name() {
        let store = MemoryStore::new();
        store.add_calendar("Work");
        let id = store.add_calendar("Streaks");

        assert_eq!(resolve_calendar(&store, "Streaks", false).await.unwrap(), id);
        assert_eq!(store.calls(StoreOp::CreateCalendar), 0);
    }

    #[tokio::test]
    async fn test_first_duplicate_wins() {
        let store = MemoryStore::new();
        let first = store.add_calendar("Streaks");
        store.add_calendar("Streaks");

        assert_eq!(resolve_calendar(&store, "Streaks", true).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_missing_calendar_is_not_found() {
        let store = MemoryStore::new();
        store.add_calendar("streaks");

        let err = resolve_calendar(&store, "Streaks", false).await.unwrap_err();
        assert!(matches!(err, StreakError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_calendar_is_created_on_request() {
        let store = MemoryStore::new();

        let id = resolve_calendar(&store, "Streaks", true).await.unwrap();
        assert_eq!(store.calls(StoreOp::CreateCalendar), 1);

        // Now it exists, so no second calendar is made.
        assert_eq!(resolve_calendar(&store, "Streaks", true).await.unwrap(), id);
        assert_eq!(store.calls(StoreOp::CreateCalendar), 1);
    }
}
