//! Save a new bookmark

use anyhow::Result;
use marq_core::session::submit;
use marq_core::RemoteStore;

use crate::output::Output;

pub async fn run(store: &dyn RemoteStore, url: &str, title: &str, output: &Output) -> Result<()> {
    match submit(store, url, title).await {
        Ok(bookmark) => {
            output.success(&format!("Saved {}", bookmark.url));
            output.print_bookmark(&bookmark);
            if !output.is_json() {
                output.message("It appears in lists once the change feed confirms it.");
            }
            Ok(())
        }
        Err(e) => {
            output.message(e.recovery_suggestion());
            Err(e.into())
        }
    }
}
