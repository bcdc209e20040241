use anyhow::Result;

use crate::config::Settings;

pub async fn run(settings: &Settings) -> Result<()> {
    println!("Authenticating with Google...");

    streak_provider_google::auth::authorize(&settings.session_path).await?;

    println!("\nSession saved to {}", settings.session_path.display());
    println!("Now run `streak add` to mark today.");

    Ok(())
}
