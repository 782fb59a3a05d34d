//! Withdrawal Ledger Reader

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tenantpay_types::{LedgerResult, TenantId, WithdrawalStatus};

use crate::store::WithdrawalStore;

/// Withdrawal amounts partitioned by lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// Approved, processed and completed
    pub total_withdrawn: Decimal,
    /// Pending only
    pub total_pending: Decimal,
}

/// Sums a tenant's withdrawal requests by state.
///
/// Rejected and failed requests never contribute to either total.
#[derive(Clone)]
pub struct WithdrawalLedgerReader {
    withdrawals: Arc<dyn WithdrawalStore>,
}

impl WithdrawalLedgerReader {
    pub fn new(withdrawals: Arc<dyn WithdrawalStore>) -> Self {
        Self { withdrawals }
    }

    pub async fn ledger_totals(&self, tenant_id: &TenantId) -> LedgerResult<LedgerTotals> {
        let total_withdrawn = self
            .withdrawals
            .sum_amounts(tenant_id, &WithdrawalStatus::WITHDRAWN)
            .await?;
        let total_pending = self
            .withdrawals
            .sum_amounts(tenant_id, &WithdrawalStatus::PENDING)
            .await?;

        Ok(LedgerTotals {
            total_withdrawn,
            total_pending,
        })
    }
}
