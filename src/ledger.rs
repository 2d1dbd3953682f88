// 🪙 Ledger Store - Balances + append-only history
// Holds the child accounts and the transaction log.
//
// Two rules hold at all times:
// - A balance never goes below zero (mutations clamp, they don't error)
// - Transactions are append-only: no edits, no deletes, no compaction

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Current instant as epoch milliseconds (the wire/timestamp unit everywhere).
pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// ============================================================================
// ACCOUNT
// ============================================================================

/// A child's point balance record.
///
/// Identity: `id` (never changes, seeded at first run).
/// `total_points` is only mutated through the Points Engine and is
/// always >= 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,

    pub name: String,

    /// Opaque avatar reference, rendered by the UI shell only.
    pub avatar: String,

    #[serde(rename = "totalPoints")]
    pub total_points: i64,
}

// ============================================================================
// TRANSACTION
// ============================================================================

/// Direction of a point change, derived from the signed amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Gain,
    Loss,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Gain => "gain",
            TransactionKind::Loss => "loss",
        }
    }

    /// `Gain` iff the amount is non-negative.
    pub fn from_amount(amount: i64) -> Self {
        if amount >= 0 {
            TransactionKind::Gain
        } else {
            TransactionKind::Loss
        }
    }
}

/// An immutable, timestamped log entry for a single point change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,

    #[serde(rename = "kidId")]
    pub kid_id: String,

    /// Human-readable reason (given for manual entries, derived for
    /// chore/request-driven ones, e.g. "Goal Met: Movie Night").
    pub description: String,

    /// Signed delta: positive = gain, negative = loss.
    pub amount: i64,

    /// Epoch milliseconds at creation.
    pub timestamp: i64,

    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

impl Transaction {
    pub fn new(kid_id: &str, description: &str, amount: i64) -> Self {
        Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            kid_id: kid_id.to_string(),
            description: description.to_string(),
            amount,
            timestamp: now_ms(),
            kind: TransactionKind::from_amount(amount),
        }
    }

    pub fn is_gain(&self) -> bool {
        self.kind == TransactionKind::Gain
    }
}

// ============================================================================
// LEDGER
// ============================================================================

/// Accounts + transaction log, with invariant enforcement.
///
/// Collections are kept newest-first (the presentation order); insertion
/// order is the only ordering guarantee.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new(accounts: Vec<Account>, transactions: Vec<Transaction>) -> Self {
        Ledger {
            accounts,
            transactions,
        }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn account(&self, account_id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == account_id)
    }

    /// Full log, newest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Log entries for one child, newest first.
    pub fn transactions_for(&self, kid_id: &str) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|tx| tx.kid_id == kid_id)
            .collect()
    }

    /// Apply a signed delta to an account's balance, clamping at zero.
    ///
    /// Clamping is per-step: deducting 50 from a balance of 30 leaves 0,
    /// and a later award of 10 leaves 10 (no debt is remembered).
    /// Unknown ids are a no-op and return `None` - the seeded account set
    /// is closed, so callers normally can't miss.
    pub fn adjust_balance(&mut self, account_id: &str, delta: i64) -> Option<&Account> {
        let account = self.accounts.iter_mut().find(|a| a.id == account_id)?;
        account.total_points = (account.total_points + delta).max(0);
        Some(account)
    }

    /// Append a log entry. Does not touch any balance - the Points Engine
    /// always pairs this with `adjust_balance` in one atomic operation.
    pub fn append_transaction(
        &mut self,
        account_id: &str,
        description: &str,
        amount: i64,
    ) -> Transaction {
        let tx = Transaction::new(account_id, description, amount);
        self.transactions.insert(0, tx.clone());
        tx
    }

    /// Wholesale replacement from a sync pull. Complete collection only,
    /// never a partial update.
    pub fn replace_accounts(&mut self, accounts: Vec<Account>) {
        self.accounts = accounts;
    }

    /// Wholesale replacement from a sync pull.
    pub fn replace_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_ledger() -> Ledger {
        Ledger::new(
            vec![Account {
                id: "1".to_string(),
                name: "Bryson".to_string(),
                avatar: String::new(),
                total_points: 30,
            }],
            Vec::new(),
        )
    }

    #[test]
    fn test_adjust_balance_clamps_per_step() {
        let mut ledger = create_test_ledger();

        // Deduct more than available: clamps to zero, silently
        let account = ledger.adjust_balance("1", -50).unwrap();
        assert_eq!(account.total_points, 0);

        // The clamp does not remember debt: next award lands in full
        let account = ledger.adjust_balance("1", 10).unwrap();
        assert_eq!(account.total_points, 10);
    }

    #[test]
    fn test_adjust_balance_unknown_account_is_noop() {
        let mut ledger = create_test_ledger();

        assert!(ledger.adjust_balance("nope", 100).is_none());
        assert_eq!(ledger.account("1").unwrap().total_points, 30);
    }

    #[test]
    fn test_append_transaction_derives_kind() {
        let mut ledger = create_test_ledger();

        let gain = ledger.append_transaction("1", "Make Bed", 5);
        assert_eq!(gain.kind, TransactionKind::Gain);
        assert!(gain.is_gain());

        let loss = ledger.append_transaction("1", "Goal Met: Movie Night", -40);
        assert_eq!(loss.kind, TransactionKind::Loss);
        assert_eq!(loss.amount, -40);

        // Zero counts as a gain
        assert_eq!(TransactionKind::from_amount(0), TransactionKind::Gain);
    }

    #[test]
    fn test_append_transaction_does_not_touch_balance() {
        let mut ledger = create_test_ledger();

        ledger.append_transaction("1", "manual note", -100);
        assert_eq!(ledger.account("1").unwrap().total_points, 30);
    }

    #[test]
    fn test_transactions_newest_first() {
        let mut ledger = create_test_ledger();

        let first = ledger.append_transaction("1", "first", 5);
        let second = ledger.append_transaction("1", "second", 10);

        let log = ledger.transactions();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].id, second.id);
        assert_eq!(log[1].id, first.id);
    }

    #[test]
    fn test_transactions_for_filters_by_kid() {
        let mut ledger = Ledger::new(
            vec![
                Account {
                    id: "1".to_string(),
                    name: "Bryson".to_string(),
                    avatar: String::new(),
                    total_points: 0,
                },
                Account {
                    id: "2".to_string(),
                    name: "Remy".to_string(),
                    avatar: String::new(),
                    total_points: 0,
                },
            ],
            Vec::new(),
        );

        ledger.append_transaction("1", "chore", 5);
        ledger.append_transaction("2", "chore", 10);
        ledger.append_transaction("1", "chore", 15);

        assert_eq!(ledger.transactions_for("1").len(), 2);
        assert_eq!(ledger.transactions_for("2").len(), 1);
    }

    #[test]
    fn test_transaction_wire_shape() {
        let tx = Transaction::new("1", "Make Bed", 5);
        let json = serde_json::to_value(&tx).unwrap();

        assert_eq!(json["kidId"], "1");
        assert_eq!(json["type"], "gain");
        assert_eq!(json["amount"], 5);
        assert!(json["timestamp"].as_i64().unwrap() > 0);
    }
}
