//! Transfer command: drive the engine over pending links with a progress
//! ticker and a top-level interrupt handler.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use pansaver_core::{
    AdapterRegistry, AuditLog, BrowserAdapter, BrowserSession, BrowserSteps, Database, LinkQueue,
    LinkStatus, Pacer, Platform, QuarkAdapter, TransferEngine, TransferStats,
};
use tracing::{info, warn};

use crate::cli::TransferArgs;

pub async fn run(db_path: &Path, args: &TransferArgs) -> Result<()> {
    let session = BrowserSession::load(&args.cookies)
        .context("failed to load the cached session; run the login tool first")?;
    session.require_fresh(unix_now())?;

    let registry = build_registry(&session, args).await?;
    info!(platforms = ?registry.platforms(), "adapters registered");

    let db = Database::new(db_path).await?;
    let queue = LinkQueue::new(db);

    let pacer = if args.delay_ms == 0 {
        Pacer::disabled()
    } else {
        Pacer::new(
            Duration::from_millis(args.delay_ms),
            args.rest_every,
            Duration::from_secs(args.rest_secs),
        )
    };

    let audit = AuditLog::open(&args.audit_log)?;
    let engine = TransferEngine::new(registry, pacer, args.limit, args.dest.clone());
    let stats = Arc::new(TransferStats::new());

    let pending = queue.count_by_status(LinkStatus::Pending).await?;
    let planned = pending.min(args.limit).max(0);
    let bar = progress_bar(u64::try_from(planned).unwrap_or_default())?;

    // Periodic statistics ticker; transfers themselves stay sequential
    let ticker = tokio::spawn({
        let stats = Arc::clone(&stats);
        let bar = bar.clone();
        async move {
            let mut interval = tokio::time::interval(Duration::from_millis(200));
            loop {
                interval.tick().await;
                bar.set_position(u64::try_from(stats.total()).unwrap_or(u64::MAX));
            }
        }
    });

    // The interrupt is only caught here, at the top level: a link mid-
    // transfer at that moment stays in processing (see `pansaver reset`)
    let interrupted = tokio::select! {
        result = engine.process_pending(&queue, &audit, &stats) => {
            result?;
            false
        }
        _ = tokio::signal::ctrl_c() => true,
    };

    ticker.abort();
    bar.finish_and_clear();

    if interrupted {
        warn!("interrupted; links mid-transfer remain in processing");
    }
    info!(
        succeeded = stats.succeeded(),
        failed = stats.failed(),
        skipped = stats.skipped(),
        audit_log = %audit.path().display(),
        "transfer run finished"
    );
    println!(
        "Saved: {}  Failed: {}  Skipped: {}",
        stats.succeeded(),
        stats.failed(),
        stats.skipped()
    );
    Ok(())
}

async fn build_registry(
    session: &BrowserSession,
    args: &TransferArgs,
) -> Result<AdapterRegistry> {
    let mut registry = AdapterRegistry::new();

    let quark_cookie = session.cookie_header("pan.quark.cn");
    registry.register(Box::new(QuarkAdapter::new(quark_cookie.as_deref())?));

    if let Some(webdriver) = &args.webdriver {
        match BrowserAdapter::connect(
            webdriver,
            Platform::Baidu,
            BrowserSteps::baidu(),
            session.clone(),
        )
        .await
        {
            Ok(adapter) => registry.register(Box::new(adapter)),
            Err(error) => warn!(
                %error,
                "browser adapter unavailable; its platforms will be skipped"
            ),
        }
    }

    Ok(registry)
}

fn progress_bar(planned: u64) -> Result<ProgressBar> {
    let bar = ProgressBar::new(planned);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos}/{len} links")?,
    );
    Ok(bar)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
