// 🔄 Sync Reconciler - Best-effort pull/push against a sheet endpoint
// Last-write-wins, no merge: a successful pull replaces whole local
// collections, a push sends the whole snapshot and never learns whether
// the write landed. Every failure degrades to local-only operation.

use crate::engine::{PointsEngine, PushSink};
use crate::ledger::{now_ms, Account, Transaction};
use crate::persistence::{Snapshot, SnapshotStore};
use crate::requests::PurchaseRequest;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How often the periodic task asks the remote for changes.
pub const DEFAULT_PULL_INTERVAL: Duration = Duration::from_secs(30);

/// UI indicator only - carries no other semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    Syncing,
}

// ============================================================================
// REMOTE PAYLOAD
// ============================================================================

/// A validated pull response.
///
/// The remote body is partially-trusted input: it is accepted only if it
/// deserializes cleanly end to end. A body with a malformed entry anywhere
/// is rejected whole - nothing is ever partially applied.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemotePayload {
    #[serde(default)]
    pub kids: Option<Vec<Account>>,

    #[serde(default)]
    pub requests: Option<Vec<PurchaseRequest>>,

    #[serde(default)]
    pub transactions: Option<Vec<Transaction>>,
}

impl RemotePayload {
    /// True when the remote had nothing for any collection.
    pub fn is_empty(&self) -> bool {
        self.kids.is_none() && self.requests.is_none() && self.transactions.is_none()
    }
}

/// Validate a pull response body. Malformed input is logged and ignored,
/// exactly like a network failure.
pub fn parse_remote_payload(body: &str) -> Option<RemotePayload> {
    match serde_json::from_str(body) {
        Ok(payload) => Some(payload),
        Err(e) => {
            log::warn!("ignoring malformed sync payload: {}", e);
            None
        }
    }
}

/// Push body: the three collections plus the pairing code.
#[derive(Serialize)]
struct PushBody<'a> {
    #[serde(rename = "familyId")]
    family_id: &'a str,
    kids: &'a [Account],
    requests: &'a [PurchaseRequest],
    transactions: &'a [Transaction],
}

// ============================================================================
// RECONCILER
// ============================================================================

/// HTTP client side of the sync protocol.
///
/// With an empty endpoint every operation is a no-op, so the reconciler
/// can always be wired and the app still runs purely local.
pub struct SyncReconciler {
    client: reqwest::Client,
    endpoint: String,
    family_id: String,
    pulling: AtomicBool,
    status: watch::Sender<SyncStatus>,
}

impl SyncReconciler {
    pub fn new(endpoint: impl Into<String>, family_id: impl Into<String>) -> Self {
        let (status, _) = watch::channel(SyncStatus::Idle);
        SyncReconciler {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            family_id: family_id.into(),
            pulling: AtomicBool::new(false),
            status,
        }
    }

    /// Subscribe to the Idle/Syncing indicator.
    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Fetch the remote copy, best-effort.
    ///
    /// Returns `None` without touching anything on: missing endpoint, a
    /// pull already in flight, network failure, or a malformed body. At
    /// most one pull runs at a time.
    pub async fn pull(&self) -> Option<RemotePayload> {
        if self.endpoint.is_empty() {
            return None;
        }
        if self
            .pulling
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("pull already in flight, skipping");
            return None;
        }

        self.status.send_replace(SyncStatus::Syncing);
        let result = self.fetch_remote().await;
        self.status.send_replace(SyncStatus::Idle);
        self.pulling.store(false, Ordering::SeqCst);

        match result {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("sync pull failed, keeping local state: {:#}", e);
                None
            }
        }
    }

    async fn fetch_remote(&self) -> Result<Option<RemotePayload>> {
        let cache_bust = now_ms().to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("familyId", self.family_id.as_str()),
                ("t", cache_bust.as_str()),
            ])
            .send()
            .await
            .context("sync pull request failed")?;

        let body = response
            .text()
            .await
            .context("sync pull body unreadable")?;

        Ok(parse_remote_payload(&body))
    }

    /// Send the whole snapshot, fire-and-forget.
    ///
    /// The endpoint's response is opaque - a completed push means
    /// "attempted", never that the remote actually stored it. Convergence
    /// comes from the periodic pull, not from here.
    pub async fn push(&self, snapshot: &Snapshot) {
        if self.endpoint.is_empty() {
            return;
        }

        let body = PushBody {
            family_id: &self.family_id,
            kids: &snapshot.accounts,
            requests: &snapshot.requests,
            transactions: &snapshot.transactions,
        };

        self.status.send_replace(SyncStatus::Syncing);
        match self.client.post(&self.endpoint).json(&body).send().await {
            Ok(_) => log::debug!(
                "push attempted: {} accounts, {} requests, {} transactions",
                snapshot.accounts.len(),
                snapshot.requests.len(),
                snapshot.transactions.len()
            ),
            Err(e) => log::debug!("push attempt failed: {}", e),
        }
        self.status.send_replace(SyncStatus::Idle);
    }
}

/// Engine-side push sink that spawns a detached push task per snapshot.
///
/// Must be used inside a tokio runtime.
pub struct DetachedPush {
    reconciler: Arc<SyncReconciler>,
}

impl DetachedPush {
    pub fn new(reconciler: Arc<SyncReconciler>) -> Self {
        DetachedPush { reconciler }
    }
}

impl PushSink for DetachedPush {
    fn push(&self, snapshot: Snapshot) {
        let reconciler = Arc::clone(&self.reconciler);
        tokio::spawn(async move {
            reconciler.push(&snapshot).await;
        });
    }
}

// ============================================================================
// PERIODIC PULL
// ============================================================================

/// Handle for the background pull loop.
pub struct SyncService {
    handle: JoinHandle<()>,
}

impl SyncService {
    /// Stop the periodic timer. The only background activity this crate
    /// owns, so this is the whole shutdown story.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

/// Start the pull loop: one pull immediately, then one per `period`.
///
/// Each successful pull is applied under the engine lock as a single
/// wholesale replace, so an in-flight local command never observes a
/// half-applied remote state.
pub fn spawn_periodic_pull<S>(
    engine: Arc<Mutex<PointsEngine<S>>>,
    reconciler: Arc<SyncReconciler>,
    period: Duration,
) -> SyncService
where
    S: SnapshotStore + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            if let Some(payload) = reconciler.pull().await {
                match engine.lock() {
                    Ok(mut engine) => engine.apply_remote(payload),
                    Err(_) => {
                        log::error!("engine lock poisoned, stopping periodic sync");
                        break;
                    }
                }
            }
        }
    });

    SyncService { handle }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::RequestStatus;

    #[test]
    fn test_parse_full_payload() {
        let body = r#"{
            "kids": [{"id":"1","name":"Bryson","avatar":"","totalPoints":25}],
            "requests": [{"id":"r1","kidId":"1","itemName":"Movie Night",
                          "pointCost":40,"status":"SUBMITTED","timestamp":1700000000000}],
            "transactions": [{"id":"t1","kidId":"1","description":"Make Bed",
                              "amount":5,"timestamp":1700000000000,"type":"gain"}]
        }"#;

        let payload = parse_remote_payload(body).expect("well-formed payload");
        assert_eq!(payload.kids.as_ref().unwrap()[0].total_points, 25);
        assert_eq!(
            payload.requests.as_ref().unwrap()[0].status,
            RequestStatus::Submitted
        );
        assert_eq!(payload.transactions.as_ref().unwrap()[0].amount, 5);
        assert!(!payload.is_empty());
    }

    #[test]
    fn test_parse_partial_payload() {
        // Only some collections present is fine - the rest stay local
        let payload = parse_remote_payload(r#"{"kids": []}"#).unwrap();
        assert_eq!(payload.kids, Some(Vec::new()));
        assert!(payload.requests.is_none());
        assert!(payload.transactions.is_none());
    }

    #[test]
    fn test_parse_empty_object_is_empty_payload() {
        let payload = parse_remote_payload("{}").unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed_bodies() {
        // Not JSON at all
        assert!(parse_remote_payload("<!doctype html>").is_none());

        // Wrong container type
        assert!(parse_remote_payload(r#"{"kids": 42}"#).is_none());

        // One bad entry poisons the whole body - never partially applied
        let body = r#"{
            "kids": [{"id":"1","name":"Bryson","avatar":"","totalPoints":25}],
            "transactions": [{"id":"t1","amount":"five"}]
        }"#;
        assert!(parse_remote_payload(body).is_none());
    }

    #[test]
    fn test_push_body_wire_shape() {
        let snapshot = Snapshot::seed();
        let body = PushBody {
            family_id: &snapshot.sync.family_id,
            kids: &snapshot.accounts,
            requests: &snapshot.requests,
            transactions: &snapshot.transactions,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["familyId"], snapshot.sync.family_id);
        assert_eq!(json["kids"].as_array().unwrap().len(), 2);
        assert!(json["requests"].as_array().unwrap().is_empty());
        assert!(json["transactions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pull_without_endpoint_is_noop() {
        let reconciler = SyncReconciler::new("", "fam-1");
        assert!(reconciler.pull().await.is_none());
        assert_eq!(*reconciler.status().borrow(), SyncStatus::Idle);
    }

    #[tokio::test]
    async fn test_push_without_endpoint_is_noop() {
        let reconciler = SyncReconciler::new("", "fam-1");
        // Nothing to assert beyond "does not panic or hang"
        reconciler.push(&Snapshot::seed()).await;
        assert_eq!(*reconciler.status().borrow(), SyncStatus::Idle);
    }
}
