//! streak-provider-google - Google Calendar backend for streak
//!
//! The backend manages its own credentials and tokens:
//!   ~/.config/streak/google/credentials.toml (OAuth client, user-provided)
//!   ~/.config/streak/google/session.toml     (cached tokens, default location)

pub mod api;
pub mod auth;
mod convert;
pub mod session;

use anyhow::Result;
use std::path::Path;

pub use api::GoogleCalendarStore;
pub use session::Session;

/// An authorized store, running the consent flow if no session is cached yet.
pub async fn connect(session_path: &Path) -> Result<GoogleCalendarStore> {
    let session = auth::load_or_authorize(session_path).await?;
    GoogleCalendarStore::new(&session)
}
