use anyhow::Result;
use streak_core::Streak;

use crate::config::Settings;

use super::{connect, print_longest};

pub async fn run(settings: &Settings) -> Result<()> {
    let store = connect(settings).await?;
    let streak = Streak::open(&store, &settings.streak).await?;

    print_longest(&streak).await
}
