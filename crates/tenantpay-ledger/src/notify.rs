//! Notification sink for withdrawal lifecycle events
//!
//! Informed after a transition has been committed. A failing sink is
//! logged and otherwise ignored: the ledger write stands.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

use tenantpay_types::{
    OperatorId, TenantId, WithdrawalAction, WithdrawalId, WithdrawalRequest, WithdrawalStatus,
};

/// Lifecycle events emitted after a committed write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WithdrawalEvent {
    /// A tenant submitted a request
    Requested {
        withdrawal_id: WithdrawalId,
        tenant_id: TenantId,
        amount: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// An operator moved a request to a new status
    Transitioned {
        withdrawal_id: WithdrawalId,
        tenant_id: TenantId,
        amount: Decimal,
        action: WithdrawalAction,
        from: WithdrawalStatus,
        to: WithdrawalStatus,
        processed_by: OperatorId,
        timestamp: DateTime<Utc>,
    },

    /// An operator pushed funds out directly
    DirectWithdrawal {
        withdrawal_id: WithdrawalId,
        tenant_id: TenantId,
        amount: Decimal,
        processed_by: OperatorId,
        timestamp: DateTime<Utc>,
    },
}

impl WithdrawalEvent {
    pub fn requested(request: &WithdrawalRequest) -> Self {
        Self::Requested {
            withdrawal_id: request.id,
            tenant_id: request.tenant_id,
            amount: request.amount,
            timestamp: request.created_at,
        }
    }

    pub fn transitioned(
        request: &WithdrawalRequest,
        action: WithdrawalAction,
        processed_by: OperatorId,
    ) -> Self {
        Self::Transitioned {
            withdrawal_id: request.id,
            tenant_id: request.tenant_id,
            amount: request.amount,
            action,
            from: action.required_status(),
            to: action.target_status(),
            processed_by,
            timestamp: request.updated_at,
        }
    }

    pub fn direct(request: &WithdrawalRequest, processed_by: OperatorId) -> Self {
        Self::DirectWithdrawal {
            withdrawal_id: request.id,
            tenant_id: request.tenant_id,
            amount: request.amount,
            processed_by,
            timestamp: request.created_at,
        }
    }

    pub fn withdrawal_id(&self) -> WithdrawalId {
        match self {
            Self::Requested { withdrawal_id, .. }
            | Self::Transitioned { withdrawal_id, .. }
            | Self::DirectWithdrawal { withdrawal_id, .. } => *withdrawal_id,
        }
    }
}

/// Notification delivery errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Receives withdrawal events for operator alerting and tenant notification
#[async_trait]
pub trait WithdrawalNotifier: Send + Sync {
    async fn notify(&self, event: &WithdrawalEvent) -> Result<(), NotifyError>;
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl WithdrawalNotifier for NoopNotifier {
    async fn notify(&self, _event: &WithdrawalEvent) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Fans events out to in-process subscribers
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<WithdrawalEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WithdrawalEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl WithdrawalNotifier for BroadcastNotifier {
    async fn notify(&self, event: &WithdrawalEvent) -> Result<(), NotifyError> {
        // No subscribers is not a failure
        if self.tx.send(event.clone()).is_err() {
            debug!(withdrawal = %event.withdrawal_id(), "No event subscribers");
        }
        Ok(())
    }
}
