// KidPoint - Household points ledger & sync engine
// Exposes the engine core for UI shells and the headless binary

pub mod catalog;
pub mod engine;
pub mod ledger;
pub mod persistence;
pub mod requests;
pub mod sync;

// Re-export commonly used types
pub use catalog::{
    chores_in_category, reward_cost, seed_accounts, verify_passcode, Chore, GoalPreset,
    CATEGORIES, CHORE_LIBRARY, GOAL_PRESETS, PARENT_PASSCODE,
};
pub use engine::{PointsEngine, PushSink};
pub use ledger::{Account, Ledger, Transaction, TransactionKind};
pub use persistence::{Snapshot, SnapshotStore, SqliteStore, SyncSettings};
pub use requests::{DecideOutcome, Decision, PurchaseRequest, RequestBook, RequestStatus};
pub use sync::{
    parse_remote_payload, spawn_periodic_pull, DetachedPush, RemotePayload, SyncReconciler,
    SyncService, SyncStatus, DEFAULT_PULL_INTERVAL,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
