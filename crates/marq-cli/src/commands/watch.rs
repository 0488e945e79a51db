//! Watch the collection update live
//!
//! Starts a full session, prints the collection whenever a feed event
//! changes it, and tears the session down on Ctrl-C.

use std::sync::Arc;

use anyhow::Result;
use marq_core::feed::FeedStatus;
use marq_core::{ApiClient, Config, Session};

use crate::output::Output;

pub async fn run(client: Arc<ApiClient>, config: &Config, output: &Output) -> Result<()> {
    let session = Session::start(client, config.feed_config()).await?;
    let mut updates = session.subscribe();

    if !output.is_quiet() && !output.is_json() {
        let who = session
            .identity()
            .email
            .clone()
            .unwrap_or_else(|| session.identity().id.to_string());
        println!("Watching bookmarks for {} (Ctrl-C to stop)", who);
    }
    output.print_bookmarks(&session.bookmarks().await);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    // Feed task is gone; nothing more will arrive
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if !output.is_quiet() && !output.is_json() {
                    let marker = match session.feed_status() {
                        FeedStatus::Subscribed => "live",
                        FeedStatus::Connecting => "reconnecting",
                        FeedStatus::Disconnected => "offline",
                    };
                    println!("\n── update ({marker}) ──");
                }
                output.print_bookmarks(&snapshot);
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    session.stop().await;
    Ok(())
}
