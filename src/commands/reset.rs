//! Reset command: operator path for links stranded in processing.

use std::path::Path;

use anyhow::Result;
use pansaver_core::{Database, LinkQueue};
use tracing::info;

pub async fn run(db_path: &Path) -> Result<()> {
    let db = Database::new(db_path).await?;
    let queue = LinkQueue::new(db);

    let reset = queue.reset_processing().await?;
    info!(reset, "stranded links returned to pending");
    println!("Returned {reset} processing link(s) to pending");
    Ok(())
}
