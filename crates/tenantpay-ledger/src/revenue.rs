//! Net Revenue Aggregator
//!
//! Full re-scan of a tenant's successful transactions on every call. No
//! incremental ledger is kept, so late fee corrections are always honoured.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use tenantpay_types::{LedgerError, LedgerResult, PlatformFee, TenantId, Transaction};

use crate::fees::FeeResolver;
use crate::store::{TenantDirectory, TransactionStore};

/// Sums net earned across a tenant's successful transactions
#[derive(Clone)]
pub struct NetRevenueAggregator {
    tenants: Arc<dyn TenantDirectory>,
    transactions: Arc<dyn TransactionStore>,
    resolver: FeeResolver,
}

impl NetRevenueAggregator {
    pub fn new(
        tenants: Arc<dyn TenantDirectory>,
        transactions: Arc<dyn TransactionStore>,
        resolver: FeeResolver,
    ) -> Self {
        Self {
            tenants,
            transactions,
            resolver,
        }
    }

    /// Total net earned by the tenant.
    ///
    /// Fails with `NotFound` for an unknown tenant and `DataAccess` when
    /// either store is unreachable.
    pub async fn total_net_earned(&self, tenant_id: &TenantId) -> LedgerResult<Decimal> {
        let tenant = self
            .tenants
            .find_tenant(tenant_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Tenant", tenant_id))?;

        let transactions = self.transactions.successful_transactions(tenant_id).await?;
        let total = sum_net_earned(&self.resolver, &transactions, tenant.platform_fee.as_ref());

        debug!(
            tenant = %tenant_id,
            transactions = transactions.len(),
            total_net_earned = %total,
            "Aggregated net revenue"
        );

        Ok(total)
    }
}

/// Sum of resolved net over the successful transactions in `transactions`
pub fn sum_net_earned(
    resolver: &FeeResolver,
    transactions: &[Transaction],
    tenant_fee: Option<&PlatformFee>,
) -> Decimal {
    transactions
        .iter()
        .filter(|tx| tx.is_successful())
        .map(|tx| resolver.resolve_net_earned(tx, tenant_fee))
        .sum()
}
