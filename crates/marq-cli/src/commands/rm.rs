//! Request deletion of a bookmark
//!
//! Deletion is best-effort: a store failure is logged, not surfaced,
//! and the entry disappears from views only once the change feed
//! confirms the removal.

use anyhow::Result;
use tracing::warn;
use uuid::Uuid;

use marq_core::RemoteStore;

use crate::output::Output;

pub async fn run(store: &dyn RemoteStore, id: Uuid, output: &Output) -> Result<()> {
    if let Err(e) = store.delete_bookmark(id).await {
        warn!("delete request for {} failed: {}", id, e);
    }

    output.success(&format!("Delete requested for {}", id));
    Ok(())
}
