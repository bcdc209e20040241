pub mod auth;
pub mod longest;
pub mod mark;

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use streak_core::Streak;
use streak_provider_google::GoogleCalendarStore;

use crate::config::Settings;

/// The day to act on: `date` if given, otherwise `today` shifted by `offset` days.
pub fn target_day(date: Option<NaiveDate>, offset: i64, today: NaiveDate) -> Result<NaiveDate> {
    if let Some(date) = date {
        return Ok(date);
    }

    let shifted = if offset >= 0 {
        today.checked_add_days(Days::new(offset.unsigned_abs()))
    } else {
        today.checked_sub_days(Days::new(offset.unsigned_abs()))
    };
    shifted.with_context(|| format!("Offset of {} days from {} is out of range", offset, today))
}

/// Authorized Google store for the configured session.
pub async fn connect(settings: &Settings) -> Result<GoogleCalendarStore> {
    streak_provider_google::connect(&settings.session_path).await
}

pub async fn print_longest(streak: &Streak<'_, GoogleCalendarStore>) -> Result<()> {
    let longest = streak
        .longest_streak()
        .await
        .context("Failed to compute longest streak")?;
    println!("Longest streak: {} days", longest);
    Ok(())
}
