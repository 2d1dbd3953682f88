// 💾 Persistence Adapter - Whole-snapshot save/load over SQLite
// Four logical keys, each holding one JSON-serialized collection, written
// together in a single SQLite transaction on every mutating command.
//
// Load is forgiving: absence or any parse failure yields None and the
// engine falls back to the seed snapshot. A failed save is logged and the
// engine keeps operating in memory.

use crate::catalog::seed_accounts;
use crate::ledger::{Account, Transaction};
use crate::requests::PurchaseRequest;
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

pub const KEY_KIDS: &str = "kp_kids";
pub const KEY_REQUESTS: &str = "kp_requests";
pub const KEY_TRANSACTIONS: &str = "kp_transactions";
pub const KEY_SYNC: &str = "kp_sync";

// ============================================================================
// SYNC SETTINGS
// ============================================================================

/// Remote pairing configuration.
///
/// `family_id` is generated once at first run and never changes, even
/// across sync operations - it is the opaque code binding devices to the
/// same remote sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(rename = "googleSheetUrl")]
    pub sheet_url: String,

    /// Epoch milliseconds of the last successful pull, if any.
    #[serde(rename = "lastSynced")]
    pub last_synced: Option<i64>,

    #[serde(rename = "familyId")]
    pub family_id: String,
}

impl SyncSettings {
    /// Fresh settings with a newly generated family identifier.
    pub fn generate() -> Self {
        SyncSettings {
            sheet_url: String::new(),
            last_synced: None,
            family_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.sheet_url.is_empty()
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// The full serializable state at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub accounts: Vec<Account>,
    pub requests: Vec<PurchaseRequest>,
    pub transactions: Vec<Transaction>,
    pub sync: SyncSettings,
}

impl Snapshot {
    /// First-run state: seeded accounts, empty history, fresh family id.
    pub fn seed() -> Self {
        Snapshot {
            accounts: seed_accounts(),
            requests: Vec::new(),
            transactions: Vec::new(),
            sync: SyncSettings::generate(),
        }
    }
}

// ============================================================================
// SNAPSHOT STORE PORT
// ============================================================================

/// Injected persistence port: whole-snapshot overwrite, never incremental.
pub trait SnapshotStore {
    fn save(&self, snapshot: &Snapshot) -> Result<()>;

    /// `Ok(None)` means "nothing usable on disk" - absence and parse
    /// failure look the same to the engine.
    fn load(&self) -> Result<Option<Snapshot>>;
}

// ============================================================================
// SQLITE STORE
// ============================================================================

/// Key-value snapshot store over a single SQLite table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open snapshot database")?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("failed to enable WAL mode")?;
        Self::from_connection(conn)
    }

    /// Private per-instance store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS snapshot (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .context("failed to create snapshot table")?;

        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn read_key(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM snapshot WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("failed to read snapshot key {}", key))
    }
}

/// Parse one stored collection; on failure log and bail to the seed path.
fn parse_key<T: DeserializeOwned>(key: &str, json: &str) -> Option<T> {
    match serde_json::from_str(json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("stored snapshot key {} is unreadable: {}", key, e);
            None
        }
    }
}

impl SnapshotStore for SqliteStore {
    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let entries = [
            (KEY_KIDS, serde_json::to_string(&snapshot.accounts)?),
            (KEY_REQUESTS, serde_json::to_string(&snapshot.requests)?),
            (
                KEY_TRANSACTIONS,
                serde_json::to_string(&snapshot.transactions)?,
            ),
            (KEY_SYNC, serde_json::to_string(&snapshot.sync)?),
        ];

        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("snapshot connection lock poisoned"))?;

        // All four keys land together or not at all
        let tx = conn.transaction()?;
        for (key, value) in &entries {
            tx.execute(
                "INSERT INTO snapshot (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
        }
        tx.commit().context("failed to commit snapshot")?;

        Ok(())
    }

    fn load(&self) -> Result<Option<Snapshot>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("snapshot connection lock poisoned"))?;

        let (Some(kids), Some(requests), Some(transactions), Some(sync)) = (
            Self::read_key(&conn, KEY_KIDS)?,
            Self::read_key(&conn, KEY_REQUESTS)?,
            Self::read_key(&conn, KEY_TRANSACTIONS)?,
            Self::read_key(&conn, KEY_SYNC)?,
        ) else {
            return Ok(None); // first run
        };

        let snapshot = (|| {
            Some(Snapshot {
                accounts: parse_key(KEY_KIDS, &kids)?,
                requests: parse_key(KEY_REQUESTS, &requests)?,
                transactions: parse_key(KEY_TRANSACTIONS, &transactions)?,
                sync: parse_key(KEY_SYNC, &sync)?,
            })
        })();

        Ok(snapshot)
    }
}

// ============================================================================
// TESTS
// ============================================================================
