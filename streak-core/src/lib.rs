//! Core of the streak tool.
//!
//! A streak is a set of days kept in a remote calendar as whole-day records,
//! one record per run of consecutive days. This crate provides:
//! - `store`: the calendar operations a backend must offer
//! - `event_source`: lazy, filtered, paginated reading of streak records
//! - `resolver`: finding (or creating) the streak calendar
//! - `streak`: adding and removing days while keeping records disjoint and non-adjacent

pub mod error;
pub mod event_source;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod record;
pub mod resolver;
pub mod scan;
pub mod store;
pub mod streak;

pub use error::{StreakError, StreakResult};
pub use record::{DaySpan, RecordBound, RemoteRecord, StreakRecord};
pub use scan::{AddOutcome, RemoveOutcome};
pub use store::{CalendarEntry, CalendarStore, RecordOrder, RecordPage, RecordQuery};
pub use streak::{Streak, StreakConfig};
