//! Status command: queue aggregates for a quick health read.

use std::path::Path;

use anyhow::Result;
use pansaver_core::{Database, LinkQueue, LinkStatus};

/// Window for the "recently extracted" count.
const RECENT_WINDOW_SECS: i64 = 24 * 60 * 60;

pub async fn run(db_path: &Path) -> Result<()> {
    let db = Database::new(db_path).await?;
    let queue = LinkQueue::new(db);

    let status_counts = queue.status_counts().await?;
    let platform_counts = queue.platform_counts().await?;

    println!("By status:");
    for status in LinkStatus::ALL {
        let count = status_counts
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, c)| *c);
        println!("  {:<12} {count}", status.as_str());
    }

    println!("By platform:");
    for (platform, count) in &platform_counts {
        println!("  {:<12} {count}", platform.as_str());
    }

    let cutoff = unix_now() - RECENT_WINDOW_SECS;
    let recent = queue.extracted_since(cutoff).await?;
    println!("Extracted in the last 24h: {recent}");

    Ok(())
}

fn unix_now() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
