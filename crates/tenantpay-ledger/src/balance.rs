//! Balance Calculator
//!
//! The single source of truth consulted before every balance-committing
//! transition. Stateless: each call recomputes from the stores.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tenantpay_types::{LedgerError, LedgerResult, TenantId, WithdrawalStatus};

use crate::fees::FeeResolver;
use crate::reader::{LedgerTotals, WithdrawalLedgerReader};
use crate::revenue::{sum_net_earned, NetRevenueAggregator};
use crate::store::{CommitScope, TenantDirectory, TransactionStore, WithdrawalStore};

/// A tenant's balance at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub total_net_earned: Decimal,
    pub total_withdrawn: Decimal,
    pub total_pending: Decimal,
    /// `max(0, total_net_earned - total_withdrawn - total_pending)`
    pub remaining_net_earned: Decimal,
}

impl Balance {
    pub fn compose(total_net_earned: Decimal, totals: LedgerTotals) -> Self {
        let remaining = total_net_earned - totals.total_withdrawn - totals.total_pending;
        Self {
            total_net_earned,
            total_withdrawn: totals.total_withdrawn,
            total_pending: totals.total_pending,
            remaining_net_earned: remaining.max(Decimal::ZERO),
        }
    }
}

/// Composes revenue and ledger totals into a [`Balance`]
#[derive(Clone)]
pub struct BalanceCalculator {
    revenue: NetRevenueAggregator,
    reader: WithdrawalLedgerReader,
    resolver: FeeResolver,
}

impl BalanceCalculator {
    pub fn new(
        tenants: Arc<dyn TenantDirectory>,
        transactions: Arc<dyn TransactionStore>,
        withdrawals: Arc<dyn WithdrawalStore>,
        resolver: FeeResolver,
    ) -> Self {
        Self {
            revenue: NetRevenueAggregator::new(tenants, transactions, resolver),
            reader: WithdrawalLedgerReader::new(withdrawals),
            resolver,
        }
    }

    /// Fresh balance for the tenant. Propagates `DataAccess` and `NotFound`.
    pub async fn balance(&self, tenant_id: &TenantId) -> LedgerResult<Balance> {
        let total_net_earned = self.revenue.total_net_earned(tenant_id).await?;
        let totals = self.reader.ledger_totals(tenant_id).await?;
        Ok(logged(tenant_id, Balance::compose(total_net_earned, totals)))
    }

    /// Fresh balance read through a held commit scope
    pub async fn balance_within(&self, scope: &dyn CommitScope) -> LedgerResult<Balance> {
        let tenant_id = scope.tenant_id();
        let tenant = scope
            .find_tenant()
            .await?
            .ok_or_else(|| LedgerError::not_found("Tenant", tenant_id))?;
        let transactions = scope.successful_transactions().await?;
        let total_net_earned =
            sum_net_earned(&self.resolver, &transactions, tenant.platform_fee.as_ref());

        let totals = LedgerTotals {
            total_withdrawn: scope.sum_amounts(&WithdrawalStatus::WITHDRAWN).await?,
            total_pending: scope.sum_amounts(&WithdrawalStatus::PENDING).await?,
        };
        Ok(logged(&tenant_id, Balance::compose(total_net_earned, totals)))
    }
}

fn logged(tenant_id: &TenantId, balance: Balance) -> Balance {
    debug!(
        tenant = %tenant_id,
        net_earned = %balance.total_net_earned,
        withdrawn = %balance.total_withdrawn,
        pending = %balance.total_pending,
        remaining = %balance.remaining_net_earned,
        "Computed balance"
    );
    balance
}
