//! Show session and connection details

use anyhow::Result;
use marq_core::{Config, RemoteStore};

use crate::output::Output;

pub async fn run(store: &dyn RemoteStore, config: &Config, output: &Output) -> Result<()> {
    let user = store.current_user().await?;

    if output.is_json() {
        println!(
            "{}",
            serde_json::json!({
                "api_url": config.api_url,
                "feed_url": config.feed_url,
                "signed_in": user.is_some(),
                "user": user,
            })
        );
        return Ok(());
    }

    println!("API:  {}", config.api_url);
    println!("Feed: {}", config.feed_url);
    match user {
        Some(user) => {
            let who = user.email.unwrap_or_else(|| user.id.to_string());
            println!("Signed in as {}", who);
        }
        None => {
            println!("Not signed in.");
        }
    }
    Ok(())
}
