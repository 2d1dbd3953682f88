// 🎯 Request Lifecycle Manager - Goal proposals awaiting a decision
// Three states: SUBMITTED (initial) -> APPROVED | REJECTED (terminal).
//
// A request transitions exactly once. Re-deciding a terminal request is a
// no-op here, which is what keeps the engine from double-charging on a
// repeated approval.

use crate::ledger::now_ms;
use serde::{Deserialize, Serialize};

// ============================================================================
// STATUS & DECISION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Submitted,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Submitted => "SUBMITTED",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Submitted)
    }
}

/// A parent's ruling on a submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn status(&self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Reject => RequestStatus::Rejected,
        }
    }
}

// ============================================================================
// PURCHASE REQUEST
// ============================================================================

/// A child-initiated goal/reward proposal.
///
/// `point_cost` is immutable after creation; only `status` ever changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub id: String,

    #[serde(rename = "kidId")]
    pub kid_id: String,

    #[serde(rename = "itemName")]
    pub item_name: String,

    #[serde(rename = "pointCost")]
    pub point_cost: i64,

    pub status: RequestStatus,

    /// Epoch milliseconds at submission.
    pub timestamp: i64,
}

impl PurchaseRequest {
    pub fn new(kid_id: &str, item_name: &str, point_cost: i64) -> Self {
        PurchaseRequest {
            id: uuid::Uuid::new_v4().to_string(),
            kid_id: kid_id.to_string(),
            item_name: item_name.to_string(),
            point_cost,
            status: RequestStatus::Submitted,
            timestamp: now_ms(),
        }
    }
}

/// Result of a decide call, so the engine knows whether to charge.
#[derive(Debug, Clone, PartialEq)]
pub enum DecideOutcome {
    /// The transition happened now - ledger effects (if any) are due.
    Applied(PurchaseRequest),
    /// Already terminal - must not be applied a second time.
    AlreadyDecided(PurchaseRequest),
    NotFound,
}

// ============================================================================
// REQUEST BOOK
// ============================================================================

/// All requests, newest first.
#[derive(Debug, Clone, Default)]
pub struct RequestBook {
    requests: Vec<PurchaseRequest>,
}

impl RequestBook {
    pub fn new(requests: Vec<PurchaseRequest>) -> Self {
        RequestBook { requests }
    }

    pub fn requests(&self) -> &[PurchaseRequest] {
        &self.requests
    }

    pub fn request(&self, request_id: &str) -> Option<&PurchaseRequest> {
        self.requests.iter().find(|r| r.id == request_id)
    }

    pub fn pending(&self) -> Vec<&PurchaseRequest> {
        self.requests
            .iter()
            .filter(|r| r.status == RequestStatus::Submitted)
            .collect()
    }

    /// Always succeeds; the new request starts in SUBMITTED.
    pub fn submit(&mut self, kid_id: &str, item_name: &str, point_cost: i64) -> PurchaseRequest {
        let request = PurchaseRequest::new(kid_id, item_name, point_cost);
        self.requests.insert(0, request.clone());
        request
    }

    /// Transition a request out of SUBMITTED, exactly once.
    pub fn decide(&mut self, request_id: &str, decision: Decision) -> DecideOutcome {
        let Some(request) = self.requests.iter_mut().find(|r| r.id == request_id) else {
            return DecideOutcome::NotFound;
        };

        if request.status.is_terminal() {
            return DecideOutcome::AlreadyDecided(request.clone());
        }

        request.status = decision.status();
        DecideOutcome::Applied(request.clone())
    }

    /// Wholesale replacement from a sync pull.
    pub fn replace(&mut self, requests: Vec<PurchaseRequest>) {
        self.requests = requests;
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_starts_submitted() {
        let mut book = RequestBook::default();

        let request = book.submit("1", "400 Robux", 40);
        assert_eq!(request.status, RequestStatus::Submitted);
        assert_eq!(request.point_cost, 40);
        assert_eq!(book.pending().len(), 1);
    }

    #[test]
    fn test_decide_approve_then_reapprove_is_guarded() {
        let mut book = RequestBook::default();
        let request = book.submit("1", "Movie Night", 40);

        let outcome = book.decide(&request.id, Decision::Approve);
        let DecideOutcome::Applied(approved) = outcome else {
            panic!("first decision should apply");
        };
        assert_eq!(approved.status, RequestStatus::Approved);

        // Second approval must not apply again
        let outcome = book.decide(&request.id, Decision::Approve);
        assert!(matches!(outcome, DecideOutcome::AlreadyDecided(_)));
    }

    #[test]
    fn test_decide_reject_is_terminal_too() {
        let mut book = RequestBook::default();
        let request = book.submit("1", "Sleepover", 20);

        let DecideOutcome::Applied(rejected) = book.decide(&request.id, Decision::Reject) else {
            panic!("first decision should apply");
        };
        assert_eq!(rejected.status, RequestStatus::Rejected);

        // A rejected request can't be approved later
        let outcome = book.decide(&request.id, Decision::Approve);
        assert!(matches!(outcome, DecideOutcome::AlreadyDecided(r) if r.status == RequestStatus::Rejected));
    }

    #[test]
    fn test_decide_unknown_id_is_noop() {
        let mut book = RequestBook::default();
        book.submit("1", "Sleepover", 20);

        assert_eq!(book.decide("nope", Decision::Approve), DecideOutcome::NotFound);
        assert_eq!(book.pending().len(), 1);
    }

    #[test]
    fn test_requests_newest_first() {
        let mut book = RequestBook::default();
        let first = book.submit("1", "first", 10);
        let second = book.submit("1", "second", 10);

        assert_eq!(book.requests()[0].id, second.id);
        assert_eq!(book.requests()[1].id, first.id);
    }

    #[test]
    fn test_status_wire_names() {
        let request = PurchaseRequest::new("1", "400 Robux", 40);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["status"], "SUBMITTED");
        assert_eq!(json["kidId"], "1");
        assert_eq!(json["itemName"], "400 Robux");
        assert_eq!(json["pointCost"], 40);
    }
}
