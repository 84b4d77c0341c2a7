//! Integration tests for the transfer engine: status walk, single-item
//! failure isolation, skip handling, pacing, and the audit trail.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use pansaver_core::{
    AdapterRegistry, AuditEntry, AuditLog, AuditOutcome, Database, FileDescriptor, LinkOrigin,
    LinkQueue, LinkStatus, NewLink, Pacer, Platform, ProviderAdapter, ProviderError, ShareLink,
    ShareListing, ShareSession, TransferEngine, TransferStats,
};

/// Test adapter that records what it saw and fails on request.
///
/// During `resolve_share` it checks, through its own queue handle, that the
/// record being transferred is in `processing` - proving the engine always
/// claims before acting.
struct FakeAdapter {
    platform: Platform,
    queue: LinkQueue,
    fail_urls: HashSet<String>,
    seen_urls: Mutex<Vec<String>>,
    claim_checks: Mutex<Vec<bool>>,
}

impl FakeAdapter {
    fn new(platform: Platform, queue: LinkQueue, fail_urls: &[&str]) -> Self {
        Self {
            platform,
            queue,
            fail_urls: fail_urls.iter().map(|s| (*s).to_string()).collect(),
            seen_urls: Mutex::new(Vec::new()),
            claim_checks: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<String> {
        self.seen_urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderAdapter for FakeAdapter {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    async fn resolve_share(&self, share: &ShareLink) -> Result<ShareSession, ProviderError> {
        self.seen_urls.lock().unwrap().push(share.url.clone());

        let processing = self
            .queue
            .list_by_status(LinkStatus::Processing)
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        let claimed = processing.iter().any(|r| r.url == share.url);
        self.claim_checks.lock().unwrap().push(claimed);

        if self.fail_urls.contains(&share.url) {
            return Err(ProviderError::Protocol {
                status: 500,
                message: "deterministic test failure".to_string(),
            });
        }

        Ok(ShareSession {
            url: share.url.clone(),
            pwd_id: "pwd".to_string(),
            passcode: String::new(),
            stoken: "stoken".to_string(),
        })
    }

    async fn list_contents(&self, _session: &ShareSession) -> Result<ShareListing, ProviderError> {
        Ok(ShareListing {
            title: "fake share".to_string(),
            files: vec![FileDescriptor {
                fid: "f1".to_string(),
                share_fid_token: "t1".to_string(),
                file_type: 1,
            }],
        })
    }

    async fn copy_to_account(
        &self,
        _session: &ShareSession,
        _files: &[FileDescriptor],
        _destination: &str,
    ) -> Result<(), ProviderError> {
        Ok(())
    }
}

fn chat_link(url: &str, platform: Platform) -> NewLink {
    NewLink {
        platform,
        url: url.to_string(),
        password: None,
        title: "unknown".to_string(),
        size_hint: None,
        origin: LinkOrigin::ChatMessage {
            channel_id: 1,
            message_id: 1,
            sender_id: 1,
            sender_name: None,
        },
        extracted_at: 1_700_000_000,
    }
}

async fn test_queue() -> LinkQueue {
    let db = Database::new_in_memory().await.expect("in-memory db");
    LinkQueue::new(db)
}

fn audit_in(dir: &tempfile::TempDir) -> AuditLog {
    AuditLog::open(&dir.path().join("audit.jsonl")).expect("audit log")
}

#[tokio::test]
async fn test_failed_item_is_isolated_from_batch() {
    let queue = test_queue().await;
    queue
        .insert(&[
            chat_link("https://pan.quark.cn/s/ok1", Platform::Quark),
            chat_link("https://pan.quark.cn/s/bad", Platform::Quark),
            chat_link("https://pan.quark.cn/s/ok2", Platform::Quark),
        ])
        .await
        .unwrap();

    let adapter = Box::new(FakeAdapter::new(
        Platform::Quark,
        queue.clone(),
        &["https://pan.quark.cn/s/bad"],
    ));
    let mut registry = AdapterRegistry::new();
    registry.register(adapter);

    let dir = tempfile::tempdir().unwrap();
    let audit = audit_in(&dir);
    let engine = TransferEngine::new(registry, Pacer::disabled(), 10, "0".to_string());
    let stats = TransferStats::new();

    engine.process_pending(&queue, &audit, &stats).await.unwrap();

    assert_eq!(stats.succeeded(), 2);
    assert_eq!(stats.failed(), 1);
    assert_eq!(stats.skipped(), 0);

    // Every item was attempted and holds its own terminal status
    for record in queue.list_by_status(LinkStatus::Failed).await.unwrap() {
        assert_eq!(record.url, "https://pan.quark.cn/s/bad");
        assert!(record.last_error.unwrap().contains("deterministic test failure"));
    }
    assert_eq!(queue.count_by_status(LinkStatus::Completed).await.unwrap(), 2);
    assert_eq!(queue.count_by_status(LinkStatus::Pending).await.unwrap(), 0);
}

#[tokio::test]
async fn test_processing_is_always_the_intermediate_state() {
    let queue = test_queue().await;
    queue
        .insert(&[
            chat_link("https://pan.quark.cn/s/one", Platform::Quark),
            chat_link("https://pan.quark.cn/s/two", Platform::Quark),
        ])
        .await
        .unwrap();

    let adapter = FakeAdapter::new(Platform::Quark, queue.clone(), &[]);
    let claim_checks_handle = std::sync::Arc::new(adapter);

    // The registry needs ownership; keep a second handle for assertions
    struct Forward(std::sync::Arc<FakeAdapter>);
    #[async_trait]
    impl ProviderAdapter for Forward {
        fn name(&self) -> &'static str {
            self.0.name()
        }
        fn platform(&self) -> Platform {
            self.0.platform()
        }
        async fn resolve_share(&self, share: &ShareLink) -> Result<ShareSession, ProviderError> {
            self.0.resolve_share(share).await
        }
        async fn list_contents(
            &self,
            session: &ShareSession,
        ) -> Result<ShareListing, ProviderError> {
            self.0.list_contents(session).await
        }
        async fn copy_to_account(
            &self,
            session: &ShareSession,
            files: &[FileDescriptor],
            destination: &str,
        ) -> Result<(), ProviderError> {
            self.0.copy_to_account(session, files, destination).await
        }
    }

    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(Forward(std::sync::Arc::clone(&claim_checks_handle))));

    let dir = tempfile::tempdir().unwrap();
    let audit = audit_in(&dir);
    let engine = TransferEngine::new(registry, Pacer::disabled(), 10, "0".to_string());
    let stats = TransferStats::new();

    engine.process_pending(&queue, &audit, &stats).await.unwrap();

    let checks = claim_checks_handle.claim_checks.lock().unwrap().clone();
    assert_eq!(checks.len(), 2);
    assert!(
        checks.iter().all(|claimed| *claimed),
        "every record must be in processing while its adapter runs"
    );
}

#[tokio::test]
async fn test_unregistered_platform_is_skipped_and_stays_pending() {
    let queue = test_queue().await;
    queue
        .insert(&[
            chat_link("https://pan.quark.cn/s/ok1", Platform::Quark),
            chat_link("https://pan.baidu.com/s/1abc", Platform::Baidu),
        ])
        .await
        .unwrap();

    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(FakeAdapter::new(Platform::Quark, queue.clone(), &[])));

    let dir = tempfile::tempdir().unwrap();
    let audit = audit_in(&dir);
    let engine = TransferEngine::new(registry, Pacer::disabled(), 10, "0".to_string());
    let stats = TransferStats::new();

    engine.process_pending(&queue, &audit, &stats).await.unwrap();

    assert_eq!(stats.succeeded(), 1);
    assert_eq!(stats.skipped(), 1);
    assert_eq!(stats.failed(), 0);

    // The skipped record was never claimed: a later run with the adapter
    // registered will pick it up
    let pending = queue.list_by_status(LinkStatus::Pending).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].url, "https://pan.baidu.com/s/1abc");
}

#[tokio::test]
async fn test_batch_processed_most_recent_first() {
    let queue = test_queue().await;
    for name in ["first", "second", "third"] {
        queue
            .insert(&[chat_link(
                &format!("https://pan.quark.cn/s/{name}"),
                Platform::Quark,
            )])
            .await
            .unwrap();
    }

    let adapter = std::sync::Arc::new(FakeAdapter::new(Platform::Quark, queue.clone(), &[]));

    struct Forward(std::sync::Arc<FakeAdapter>);
    #[async_trait]
    impl ProviderAdapter for Forward {
        fn name(&self) -> &'static str {
            self.0.name()
        }
        fn platform(&self) -> Platform {
            self.0.platform()
        }
        async fn resolve_share(&self, share: &ShareLink) -> Result<ShareSession, ProviderError> {
            self.0.resolve_share(share).await
        }
        async fn list_contents(
            &self,
            session: &ShareSession,
        ) -> Result<ShareListing, ProviderError> {
            self.0.list_contents(session).await
        }
        async fn copy_to_account(
            &self,
            session: &ShareSession,
            files: &[FileDescriptor],
            destination: &str,
        ) -> Result<(), ProviderError> {
            self.0.copy_to_account(session, files, destination).await
        }
    }

    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(Forward(std::sync::Arc::clone(&adapter))));

    let dir = tempfile::tempdir().unwrap();
    let audit = audit_in(&dir);
    let engine = TransferEngine::new(registry, Pacer::disabled(), 10, "0".to_string());
    let stats = TransferStats::new();

    engine.process_pending(&queue, &audit, &stats).await.unwrap();

    assert_eq!(
        adapter.seen(),
        vec![
            "https://pan.quark.cn/s/third",
            "https://pan.quark.cn/s/second",
            "https://pan.quark.cn/s/first",
        ]
    );
}

#[tokio::test]
async fn test_pacing_lower_bound_holds() {
    let queue = test_queue().await;
    for i in 0..4 {
        queue
            .insert(&[chat_link(
                &format!("https://pan.quark.cn/s/link{i}"),
                Platform::Quark,
            )])
            .await
            .unwrap();
    }

    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(FakeAdapter::new(Platform::Quark, queue.clone(), &[])));

    let item_delay = Duration::from_millis(30);
    let rest_delay = Duration::from_millis(80);
    let pacer = Pacer::new(item_delay, 2, rest_delay);

    let dir = tempfile::tempdir().unwrap();
    let audit = audit_in(&dir);
    let engine = TransferEngine::new(registry, pacer, 10, "0".to_string());
    let stats = TransferStats::new();

    let start = Instant::now();
    engine.process_pending(&queue, &audit, &stats).await.unwrap();
    let elapsed = start.elapsed();

    // N items, delay D, rest R every K: elapsed >= N*D + floor(N/K)*R
    let expected = item_delay * 4 + rest_delay * 2;
    assert!(
        elapsed >= expected,
        "elapsed {elapsed:?} must be at least {expected:?}"
    );
}

#[tokio::test]
async fn test_audit_log_records_every_outcome() {
    let queue = test_queue().await;
    queue
        .insert(&[
            chat_link("https://pan.quark.cn/s/ok1", Platform::Quark),
            chat_link("https://pan.quark.cn/s/bad", Platform::Quark),
            chat_link("https://pan.baidu.com/s/1abc", Platform::Baidu),
        ])
        .await
        .unwrap();

    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(FakeAdapter::new(
        Platform::Quark,
        queue.clone(),
        &["https://pan.quark.cn/s/bad"],
    )));

    let dir = tempfile::tempdir().unwrap();
    let audit_path = dir.path().join("audit.jsonl");
    let audit = AuditLog::open(&audit_path).unwrap();
    let engine = TransferEngine::new(registry, Pacer::disabled(), 10, "0".to_string());
    let stats = TransferStats::new();

    engine.process_pending(&queue, &audit, &stats).await.unwrap();

    let content = std::fs::read_to_string(&audit_path).unwrap();
    let entries: Vec<AuditEntry> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(entries.len(), 3);

    let outcome_for = |url: &str| {
        entries
            .iter()
            .find(|e| e.url == url)
            .map(|e| e.outcome)
            .unwrap()
    };
    assert_eq!(outcome_for("https://pan.quark.cn/s/ok1"), AuditOutcome::Success);
    assert_eq!(outcome_for("https://pan.quark.cn/s/bad"), AuditOutcome::Failed);
    assert_eq!(outcome_for("https://pan.baidu.com/s/1abc"), AuditOutcome::Skipped);

    let failed = entries
        .iter()
        .find(|e| e.outcome == AuditOutcome::Failed)
        .unwrap();
    assert!(failed.error.as_deref().unwrap().contains("deterministic test failure"));
}

#[tokio::test]
async fn test_empty_queue_is_a_quiet_no_op() {
    let queue = test_queue().await;
    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(FakeAdapter::new(Platform::Quark, queue.clone(), &[])));

    let dir = tempfile::tempdir().unwrap();
    let audit = audit_in(&dir);
    let engine = TransferEngine::new(registry, Pacer::disabled(), 10, "0".to_string());
    let stats = TransferStats::new();

    engine.process_pending(&queue, &audit, &stats).await.unwrap();
    assert_eq!(stats.total(), 0);
}

#[tokio::test]
async fn test_batch_limit_respected() {
    let queue = test_queue().await;
    for i in 0..5 {
        queue
            .insert(&[chat_link(
                &format!("https://pan.quark.cn/s/link{i}"),
                Platform::Quark,
            )])
            .await
            .unwrap();
    }

    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(FakeAdapter::new(Platform::Quark, queue.clone(), &[])));

    let dir = tempfile::tempdir().unwrap();
    let audit = audit_in(&dir);
    let engine = TransferEngine::new(registry, Pacer::disabled(), 2, "0".to_string());
    let stats = TransferStats::new();

    engine.process_pending(&queue, &audit, &stats).await.unwrap();

    assert_eq!(stats.total(), 2);
    assert_eq!(queue.count_by_status(LinkStatus::Pending).await.unwrap(), 3);
}
