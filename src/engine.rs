// ⚙️ Points Engine - The command façade
// One engine per process, constructed over an injected snapshot store and
// an optional push sink. Every command is a single synchronous state
// transition: ledger mutation and transaction append happen together or
// not at all, then the post-mutation snapshot is persisted and handed to
// the push sink.

use crate::ledger::{now_ms, Account, Ledger, Transaction};
use crate::persistence::{Snapshot, SnapshotStore, SyncSettings};
use crate::requests::{DecideOutcome, Decision, PurchaseRequest, RequestBook, RequestStatus};
use crate::sync::RemotePayload;
use std::sync::Arc;

/// Outbound side of sync, as seen from a command: "attempt a push of this
/// snapshot", nothing more. Never a durability guarantee.
pub trait PushSink: Send + Sync {
    fn push(&self, snapshot: Snapshot);
}

// ============================================================================
// ENGINE
// ============================================================================

/// Owns all state for the process lifetime. The persistence store and the
/// push sink only ever see full snapshots.
pub struct PointsEngine<S: SnapshotStore> {
    ledger: Ledger,
    requests: RequestBook,
    settings: SyncSettings,
    store: S,
    push_sink: Option<Arc<dyn PushSink>>,
}

impl<S: SnapshotStore> PointsEngine<S> {
    /// Load the persisted snapshot, or fall back to the seed state.
    ///
    /// The seed is persisted immediately so the freshly generated family
    /// identifier survives a restart before the first command.
    pub fn init(store: S) -> Self {
        let snapshot = match store.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                log::info!("no usable snapshot found, starting from seed");
                Snapshot::seed()
            }
            Err(e) => {
                log::warn!("snapshot load failed, starting from seed: {:#}", e);
                Snapshot::seed()
            }
        };

        let mut engine = PointsEngine {
            ledger: Ledger::new(snapshot.accounts, snapshot.transactions),
            requests: RequestBook::new(snapshot.requests),
            settings: snapshot.sync,
            store,
            push_sink: None,
        };
        engine.persist();
        engine
    }

    /// Wire the outbound sync port. Commands push through it from then on.
    pub fn with_push_sink(mut self, sink: Arc<dyn PushSink>) -> Self {
        self.push_sink = Some(sink);
        self
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    /// Apply a signed point change with a reason.
    ///
    /// Balance adjustment (clamped at zero) and the log entry are one
    /// atomic operation. Unknown accounts are a no-op returning `None` -
    /// no transaction is recorded either.
    pub fn award(&mut self, account_id: &str, amount: i64, reason: &str) -> Option<Transaction> {
        let tx = self.charge(account_id, amount, reason)?;
        self.after_mutation();
        Some(tx)
    }

    /// Take points away. The sign is forced: `deduct(.., 15, ..)` and
    /// `deduct(.., -15, ..)` both remove 15 points.
    pub fn deduct(&mut self, account_id: &str, amount: i64, reason: &str) -> Option<Transaction> {
        self.award(account_id, -amount.abs(), reason)
    }

    /// File a new goal request; always succeeds, starts SUBMITTED.
    pub fn submit_request(
        &mut self,
        account_id: &str,
        item_name: &str,
        point_cost: i64,
    ) -> PurchaseRequest {
        let request = self.requests.submit(account_id, item_name, point_cost);
        self.after_mutation();
        request
    }

    /// Rule on a submitted request.
    ///
    /// First approval charges `point_cost` and logs a "Goal Met" entry in
    /// the same operation; rejection only flips the status. A request
    /// that is already terminal is returned as-is with no ledger effect,
    /// so repeating a decision can never double-charge. Unknown ids
    /// return `None`.
    pub fn decide_request(
        &mut self,
        request_id: &str,
        decision: Decision,
    ) -> Option<PurchaseRequest> {
        match self.requests.decide(request_id, decision) {
            DecideOutcome::Applied(request) => {
                if request.status == RequestStatus::Approved {
                    let description = format!("Goal Met: {}", request.item_name);
                    if self.charge(&request.kid_id, -request.point_cost, &description).is_none() {
                        log::warn!(
                            "approved request {} references unknown account {}",
                            request.id,
                            request.kid_id
                        );
                    }
                }
                self.after_mutation();
                Some(request)
            }
            DecideOutcome::AlreadyDecided(request) => {
                log::debug!("request {} already decided, ignoring", request.id);
                Some(request)
            }
            DecideOutcome::NotFound => None,
        }
    }

    /// The one place ledger mutation and log append meet. Not public:
    /// exposing either half separately is how balances and history drift.
    fn charge(&mut self, account_id: &str, amount: i64, description: &str) -> Option<Transaction> {
        self.ledger.adjust_balance(account_id, amount)?;
        Some(self.ledger.append_transaction(account_id, description, amount))
    }

    // ========================================================================
    // SYNC INTEGRATION
    // ========================================================================

    /// Replace local collections with a validated remote payload.
    ///
    /// Wholesale, last-write-wins: each collection the payload carries
    /// replaces the local one completely; absent collections stay local.
    /// Stamps `last_synced` and persists, but never pushes back (a pull
    /// must not echo).
    pub fn apply_remote(&mut self, payload: RemotePayload) {
        if let Some(kids) = payload.kids {
            self.ledger.replace_accounts(kids);
        }
        if let Some(requests) = payload.requests {
            self.requests.replace(requests);
        }
        if let Some(transactions) = payload.transactions {
            self.ledger.replace_transactions(transactions);
        }
        self.settings.last_synced = Some(now_ms());
        self.persist();
    }

    /// Point the engine at a (new) remote sheet. The family identifier is
    /// read-only and survives reconfiguration.
    pub fn set_sheet_url(&mut self, url: &str) {
        self.settings.sheet_url = url.to_string();
        self.persist();
    }

    // ========================================================================
    // READ SIDE
    // ========================================================================

    pub fn accounts(&self) -> &[Account] {
        self.ledger.accounts()
    }

    pub fn balance(&self, account_id: &str) -> Option<i64> {
        self.ledger.account(account_id).map(|a| a.total_points)
    }

    /// Full history, newest first.
    pub fn transactions(&self) -> &[Transaction] {
        self.ledger.transactions()
    }

    pub fn transactions_for(&self, kid_id: &str) -> Vec<&Transaction> {
        self.ledger.transactions_for(kid_id)
    }

    pub fn requests(&self) -> &[PurchaseRequest] {
        self.requests.requests()
    }

    pub fn pending_requests(&self) -> Vec<&PurchaseRequest> {
        self.requests.pending()
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Clone of the full current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            accounts: self.ledger.accounts().to_vec(),
            requests: self.requests.requests().to_vec(),
            transactions: self.ledger.transactions().to_vec(),
            sync: self.settings.clone(),
        }
    }

    // ========================================================================
    // SIDE EFFECTS
    // ========================================================================

    fn after_mutation(&mut self) {
        self.persist();
        if let Some(sink) = &self.push_sink {
            sink.push(self.snapshot());
        }
    }

    /// Persistence failures never surface to the caller: log and keep the
    /// in-memory state authoritative for the rest of the session.
    fn persist(&mut self) {
        let snapshot = self.snapshot();
        if let Err(e) = self.store.save(&snapshot) {
            log::warn!("snapshot save failed, continuing in memory: {:#}", e);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
