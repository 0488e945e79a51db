//! List saved bookmarks

use anyhow::{bail, Result};
use marq_core::RemoteStore;

use crate::output::Output;

pub async fn run(store: &dyn RemoteStore, output: &Output) -> Result<()> {
    let Some(user) = store.current_user().await? else {
        bail!("Not signed in. Set a session token with `marq config set token <token>`.");
    };

    let bookmarks = store.list_bookmarks(user.id).await?;
    output.print_bookmarks(&bookmarks);
    Ok(())
}
