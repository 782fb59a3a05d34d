//! Withdrawal requests
//!
//! Lifecycle:
//!
//! ```text
//! pending ──approve──▶ approved ──process──▶ processed
//!    │                    │
//!    └──reject──▶ rejected └──fail──▶ failed
//! ```
//!
//! `completed` is a legacy terminal synonym of `processed`. It is counted
//! as withdrawn but no transition produces it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{OperatorId, TenantId, WithdrawalId};

/// Status of a withdrawal request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
    Processed,
    /// Legacy synonym of `Processed`
    Completed,
    Failed,
}

impl WithdrawalStatus {
    /// Every status, in lifecycle order
    pub const ALL: [WithdrawalStatus; 6] = [
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::Processed,
        Self::Completed,
        Self::Failed,
    ];

    /// Statuses whose funds have left or are committed to leave
    pub const WITHDRAWN: [WithdrawalStatus; 3] = [Self::Approved, Self::Processed, Self::Completed];

    /// Statuses that reserve funds while awaiting a decision
    pub const PENDING: [WithdrawalStatus; 1] = [Self::Pending];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Processed => "processed",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Processed | Self::Completed | Self::Failed)
    }

    pub fn counts_as_withdrawn(&self) -> bool {
        Self::WITHDRAWN.contains(self)
    }

    pub fn counts_as_pending(&self) -> bool {
        Self::PENDING.contains(self)
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WithdrawalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown withdrawal status: {}", s))
    }
}

/// Operator action on a withdrawal request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalAction {
    Approve,
    Reject,
    Process,
    Fail,
}

impl WithdrawalAction {
    /// The only status this action is legal from
    pub fn required_status(&self) -> WithdrawalStatus {
        match self {
            Self::Approve | Self::Reject => WithdrawalStatus::Pending,
            Self::Process | Self::Fail => WithdrawalStatus::Approved,
        }
    }

    /// The status this action moves the request to
    pub fn target_status(&self) -> WithdrawalStatus {
        match self {
            Self::Approve => WithdrawalStatus::Approved,
            Self::Reject => WithdrawalStatus::Rejected,
            Self::Process => WithdrawalStatus::Processed,
            Self::Fail => WithdrawalStatus::Failed,
        }
    }

    /// Whether the transition commits funds and must re-check the balance
    pub fn commits_funds(&self) -> bool {
        matches!(self, Self::Approve | Self::Process)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Process => "process",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for WithdrawalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WithdrawalAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "process" => Ok(Self::Process),
            "fail" => Ok(Self::Fail),
            other => Err(format!("unknown withdrawal action: {}", other)),
        }
    }
}

/// Who initiated the withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalKind {
    /// Requested by the tenant
    Request,
    /// Pushed out-of-band by an operator, born `processed`
    Direct,
}

impl WithdrawalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Direct => "direct",
        }
    }
}

impl FromStr for WithdrawalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "request" => Ok(Self::Request),
            "direct" => Ok(Self::Direct),
            other => Err(format!("unknown withdrawal kind: {}", other)),
        }
    }
}

/// Payout rail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Upi,
    Wallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BankTransfer => "bank_transfer",
            Self::Upi => "upi",
            Self::Wallet => "wallet",
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::Wallet
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bank_transfer" => Ok(Self::BankTransfer),
            "upi" => Ok(Self::Upi),
            "wallet" => Ok(Self::Wallet),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

/// Processing details recorded by every transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStamp {
    pub processed_by: OperatorId,
    pub processed_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub external_reference: Option<String>,
}

impl ProcessingStamp {
    /// Stamp by `operator` at the current time
    pub fn now(operator: OperatorId) -> Self {
        Self {
            processed_by: operator,
            processed_at: Utc::now(),
            notes: None,
            external_reference: None,
        }
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_external_reference(mut self, reference: Option<String>) -> Self {
        self.external_reference = reference;
        self
    }
}

/// A tenant's request to withdraw earnings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: WithdrawalId,
    pub tenant_id: TenantId,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub status: WithdrawalStatus,
    #[serde(rename = "type")]
    pub kind: WithdrawalKind,
    /// Balance seen when the request was created; informational only
    pub available_balance: Decimal,
    pub tenant_notes: Option<String>,
    pub processed_by: Option<OperatorId>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processing_notes: Option<String>,
    pub external_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WithdrawalRequest {
    /// A new tenant-initiated request awaiting review
    pub fn pending(
        tenant_id: TenantId,
        amount: Decimal,
        payment_method: PaymentMethod,
        available_balance: Decimal,
        tenant_notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: WithdrawalId::new(),
            tenant_id,
            amount,
            payment_method,
            status: WithdrawalStatus::Pending,
            kind: WithdrawalKind::Request,
            available_balance,
            tenant_notes,
            processed_by: None,
            processed_at: None,
            processing_notes: None,
            external_reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// An operator-initiated withdrawal, already processed at creation
    pub fn direct(
        tenant_id: TenantId,
        amount: Decimal,
        payment_method: PaymentMethod,
        available_balance: Decimal,
        tenant_notes: Option<String>,
        stamp: ProcessingStamp,
    ) -> Self {
        Self {
            id: WithdrawalId::new(),
            tenant_id,
            amount,
            payment_method,
            status: WithdrawalStatus::Processed,
            kind: WithdrawalKind::Direct,
            available_balance,
            tenant_notes,
            processed_by: Some(stamp.processed_by),
            processed_at: Some(stamp.processed_at),
            processing_notes: stamp.notes,
            external_reference: stamp.external_reference,
            created_at: stamp.processed_at,
            updated_at: stamp.processed_at,
        }
    }

    pub fn can_apply(&self, action: WithdrawalAction) -> bool {
        self.status == action.required_status()
    }

    /// Apply a transition unconditionally. Callers check `can_apply` first.
    pub fn apply(&mut self, action: WithdrawalAction, stamp: &ProcessingStamp) {
        self.status = action.target_status();
        self.processed_by = Some(stamp.processed_by);
        self.processed_at = Some(stamp.processed_at);
        if stamp.notes.is_some() {
            self.processing_notes = stamp.notes.clone();
        }
        if stamp.external_reference.is_some() {
            self.external_reference = stamp.external_reference.clone();
        }
        self.updated_at = stamp.processed_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_withdrawn_and_pending_partitions() {
        assert!(WithdrawalStatus::Approved.counts_as_withdrawn());
        assert!(WithdrawalStatus::Processed.counts_as_withdrawn());
        assert!(WithdrawalStatus::Completed.counts_as_withdrawn());
        assert!(WithdrawalStatus::Pending.counts_as_pending());

        for inert in [WithdrawalStatus::Rejected, WithdrawalStatus::Failed] {
            assert!(!inert.counts_as_withdrawn());
            assert!(!inert.counts_as_pending());
            assert!(inert.is_terminal());
        }
    }

    #[test]
    fn test_no_action_reaches_completed() {
        for action in [
            WithdrawalAction::Approve,
            WithdrawalAction::Reject,
            WithdrawalAction::Process,
            WithdrawalAction::Fail,
        ] {
            assert_ne!(action.target_status(), WithdrawalStatus::Completed);
            assert!(!action.required_status().is_terminal());
        }
    }

    #[test]
    fn test_status_from_str() {
        for status in WithdrawalStatus::ALL {
            assert_eq!(status.as_str().parse::<WithdrawalStatus>(), Ok(status));
        }
        assert!("cancelled".parse::<WithdrawalStatus>().is_err());
    }

    #[test]
    fn test_apply_stamps_processing_fields() {
        let mut request = WithdrawalRequest::pending(
            TenantId::new(),
            dec!(100),
            PaymentMethod::Wallet,
            dec!(500),
            None,
        );
        let operator = OperatorId::new();
        let stamp = ProcessingStamp::now(operator)
            .with_notes(Some("ok".to_string()))
            .with_external_reference(Some("UTR123".to_string()));

        assert!(request.can_apply(WithdrawalAction::Approve));
        assert!(!request.can_apply(WithdrawalAction::Process));

        request.apply(WithdrawalAction::Approve, &stamp);
        assert_eq!(request.status, WithdrawalStatus::Approved);
        assert_eq!(request.processed_by, Some(operator));
        assert_eq!(request.processing_notes.as_deref(), Some("ok"));
        assert_eq!(request.external_reference.as_deref(), Some("UTR123"));
    }

    #[test]
    fn test_apply_keeps_previous_notes_when_none_given() {
        let mut request = WithdrawalRequest::pending(
            TenantId::new(),
            dec!(100),
            PaymentMethod::Wallet,
            dec!(500),
            None,
        );
        let operator = OperatorId::new();
        request.apply(
            WithdrawalAction::Approve,
            &ProcessingStamp::now(operator).with_notes(Some("first".to_string())),
        );
        request.apply(WithdrawalAction::Process, &ProcessingStamp::now(operator));
        assert_eq!(request.processing_notes.as_deref(), Some("first"));
    }

    #[test]
    fn test_direct_is_born_processed() {
        let stamp = ProcessingStamp::now(OperatorId::new());
        let request = WithdrawalRequest::direct(
            TenantId::new(),
            dec!(10),
            PaymentMethod::BankTransfer,
            dec!(10),
            None,
            stamp.clone(),
        );
        assert_eq!(request.status, WithdrawalStatus::Processed);
        assert_eq!(request.kind, WithdrawalKind::Direct);
        assert_eq!(request.processed_at, Some(request.created_at));
        assert_eq!(request.processed_by, Some(stamp.processed_by));
    }

    #[test]
    fn test_kind_serializes_as_type() {
        let request = WithdrawalRequest::pending(
            TenantId::new(),
            dec!(1),
            PaymentMethod::Upi,
            dec!(1),
            None,
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "request");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["payment_method"], "upi");
    }
}
