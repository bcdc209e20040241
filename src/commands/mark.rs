use anyhow::{Context, Result};
use chrono::NaiveDate;
use owo_colors::OwoColorize;
use streak_core::{AddOutcome, RemoveOutcome, Streak};
use tracing::debug;

use crate::config::Settings;

use super::{connect, print_longest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Remove,
}

pub async fn run(settings: &Settings, action: Action, day: NaiveDate) -> Result<()> {
    let store = connect(settings).await?;
    let streak = Streak::open(&store, &settings.streak)
        .await
        .with_context(|| format!("Failed to open calendar '{}'", settings.streak.calendar_name))?;
    debug!(?action, %day, calendar = streak.calendar_id(), "resolved streak calendar");

    let message = match action {
        Action::Add => {
            let outcome = streak
                .add_day(day)
                .await
                .with_context(|| format!("Failed to add {} to streak", day))?;
            describe_add(outcome, day)
        }
        Action::Remove => {
            let outcome = streak
                .remove_day(day)
                .await
                .with_context(|| format!("Failed to remove {} from streak", day))?;
            describe_remove(outcome, day)
        }
    };

    println!("{}", message);
    print_longest(&streak).await
}

fn describe_add(outcome: AddOutcome, day: NaiveDate) -> String {
    let text = match outcome {
        AddOutcome::AlreadyCovered => {
            return format!("{} is already in the streak", day).dimmed().to_string();
        }
        AddOutcome::ExtendedStart | AddOutcome::ExtendedEnd => {
            format!("Extended streak to {}", day)
        }
        AddOutcome::Merged => format!("Added {}, joining two streaks", day),
        AddOutcome::Created => format!("Started a new streak on {}", day),
    };
    text.green().to_string()
}

fn describe_remove(outcome: RemoveOutcome, day: NaiveDate) -> String {
    let text = match outcome {
        RemoveOutcome::NotCovered => {
            return format!("{} is not in the streak", day).dimmed().to_string();
        }
        RemoveOutcome::Deleted => format!("Removed {}, ending a one-day streak", day),
        RemoveOutcome::ShrunkStart | RemoveOutcome::ShrunkEnd => {
            format!("Removed {} from the streak", day)
        }
        RemoveOutcome::Split => format!("Removed {}, splitting the streak in two", day),
    };
    text.red().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_day() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert!(describe_add(AddOutcome::Merged, day).contains("2024-01-03"));
        assert!(describe_remove(RemoveOutcome::Split, day).contains("splitting"));
        assert!(describe_remove(RemoveOutcome::NotCovered, day).contains("not in the streak"));
    }
}
