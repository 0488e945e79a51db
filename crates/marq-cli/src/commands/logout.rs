//! Sign out of the current session

use anyhow::Result;
use marq_core::RemoteStore;

use crate::output::Output;

pub async fn run(store: &dyn RemoteStore, output: &Output) -> Result<()> {
    store.sign_out().await?;
    output.success("Signed out");
    output.message("Remove the stored token with `marq config set token \"\"` if you saved one.");
    Ok(())
}
