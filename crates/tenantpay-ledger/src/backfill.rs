//! Fee back-fill
//!
//! Recomputes a transaction's platform fee and net from the tenant's fee
//! configuration and persists them onto the transaction. Stored derived
//! values are ignored while recomputing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use tenantpay_types::{
    LedgerError, LedgerResult, PlatformFee, TenantId, Transaction, TransactionId,
};

use crate::config::LedgerConfig;
use crate::fees::{FeeResolution, FeeResolver};
use crate::store::{TenantDirectory, TransactionStore};

/// A transaction the batch could not update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackfillFailure {
    pub transaction_id: TransactionId,
    pub message: String,
}

/// Outcome of a tenant back-fill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackfillReport {
    pub processed: usize,
    /// Transactions whose stored fee or net changed
    pub updated: usize,
    pub errors: Vec<BackfillFailure>,
}

/// Writes resolved fees back onto transactions
#[derive(Clone)]
pub struct FeeBackfill {
    tenants: Arc<dyn TenantDirectory>,
    transactions: Arc<dyn TransactionStore>,
    resolver: FeeResolver,
    batch_limit: usize,
}

impl FeeBackfill {
    pub fn new(
        tenants: Arc<dyn TenantDirectory>,
        transactions: Arc<dyn TransactionStore>,
        config: &LedgerConfig,
    ) -> Self {
        Self {
            tenants,
            transactions,
            resolver: FeeResolver::new(config.default_fee_rate),
            batch_limit: config.backfill_batch_limit,
        }
    }

    /// Back-fill one transaction
    #[instrument(skip(self), fields(transaction = %id))]
    pub async fn backfill_transaction(&self, id: &TransactionId) -> LedgerResult<FeeResolution> {
        let tx = self
            .transactions
            .find_transaction(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Transaction", id))?;
        if !tx.is_successful() {
            return Err(LedgerError::validation(format!(
                "Transaction {} is {}, only successful transactions carry fees",
                tx.id, tx.status
            )));
        }

        let tenant_fee = self.tenant_fee(&tx.tenant_id).await?;
        let resolution = self.resolver.resolve_from_config(&tx, tenant_fee.as_ref());
        self.transactions
            .record_fee_resolution(id, resolution.fee, resolution.net)
            .await?;

        info!(
            tenant = %tx.tenant_id,
            fee = %resolution.fee,
            net = %resolution.net,
            rule = ?resolution.rule,
            "Back-filled transaction fee"
        );
        Ok(resolution)
    }

    /// Back-fill up to the batch limit of a tenant's successful transactions.
    ///
    /// A failed write is recorded in the report and the batch carries on.
    #[instrument(skip(self), fields(tenant = %tenant_id))]
    pub async fn backfill_tenant(&self, tenant_id: &TenantId) -> LedgerResult<BackfillReport> {
        let tenant_fee = self.tenant_fee(tenant_id).await?;
        let transactions = self.transactions.successful_transactions(tenant_id).await?;

        let mut report = BackfillReport::default();
        for tx in transactions.iter().take(self.batch_limit) {
            report.processed += 1;

            let resolution = self.resolver.resolve_from_config(tx, tenant_fee.as_ref());
            if is_current(tx, &resolution) {
                continue;
            }

            match self
                .transactions
                .record_fee_resolution(&tx.id, resolution.fee, resolution.net)
                .await
            {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    warn!(transaction = %tx.id, error = %e, "Fee back-fill failed");
                    report.errors.push(BackfillFailure {
                        transaction_id: tx.id,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            processed = report.processed,
            updated = report.updated,
            failed = report.errors.len(),
            "Fee back-fill finished"
        );
        Ok(report)
    }

    async fn tenant_fee(&self, tenant_id: &TenantId) -> LedgerResult<Option<PlatformFee>> {
        let tenant = self
            .tenants
            .find_tenant(tenant_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Tenant", tenant_id))?;
        Ok(tenant.platform_fee)
    }
}

fn is_current(tx: &Transaction, resolution: &FeeResolution) -> bool {
    tx.platform_fee == Some(resolution.fee) && tx.net_amount == Some(resolution.net)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tenantpay_types::{Tenant, TransactionStatus};

    use crate::fees::FeeRule;
    use crate::memory::MemoryStore;

    async fn setup(tenant: &Tenant) -> (Arc<MemoryStore>, FeeBackfill) {
        let store = Arc::new(MemoryStore::new());
        store.add_tenant(tenant.clone()).await;
        let backfill = FeeBackfill::new(store.clone(), store.clone(), &LedgerConfig::default());
        (store, backfill)
    }

    #[tokio::test]
    async fn test_backfill_ignores_stale_stored_net() {
        let tenant = Tenant::new("a@example.com").with_platform_fee(PlatformFee::percentage(dec!(0.05)));
        let (store, backfill) = setup(&tenant).await;
        let tx = Transaction::success(tenant.id, dec!(1000)).with_net_amount(dec!(1000));
        store.add_transaction(tx.clone()).await;

        let resolution = backfill.backfill_transaction(&tx.id).await.unwrap();
        assert_eq!(resolution.rule, FeeRule::TenantConfig);
        assert_eq!(resolution.net, dec!(950));

        let stored = store.find_transaction(&tx.id).await.unwrap().unwrap();
        assert_eq!(stored.platform_fee, Some(dec!(50)));
        assert_eq!(stored.net_amount, Some(dec!(950)));
    }

    #[tokio::test]
    async fn test_backfill_rejects_unsuccessful_transaction() {
        let tenant = Tenant::new("a@example.com");
        let (store, backfill) = setup(&tenant).await;
        let tx = Transaction::new(tenant.id, dec!(100), TransactionStatus::Failed);
        store.add_transaction(tx.clone()).await;

        assert!(matches!(
            backfill.backfill_transaction(&tx.id).await,
            Err(LedgerError::Validation { .. })
        ));
        assert!(matches!(
            backfill.backfill_transaction(&TransactionId::new()).await,
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_backfill_tenant_skips_current_rows() {
        let tenant = Tenant::new("a@example.com").with_platform_fee(PlatformFee::fixed(dec!(10)));
        let (store, backfill) = setup(&tenant).await;
        store
            .add_transaction(Transaction::success(tenant.id, dec!(100)))
            .await;
        store
            .add_transaction(
                Transaction::success(tenant.id, dec!(200))
                    .with_platform_fee(dec!(10))
                    .with_net_amount(dec!(190)),
            )
            .await;

        let report = backfill.backfill_tenant(&tenant.id).await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.updated, 1);
        assert!(report.errors.is_empty());

        let again = backfill.backfill_tenant(&tenant.id).await.unwrap();
        assert_eq!(again.updated, 0);
    }

    #[tokio::test]
    async fn test_cent_rounded_rows_count_as_current() {
        let tenant = Tenant::new("a@example.com");
        let (store, backfill) = setup(&tenant).await;
        // Stored the way NUMERIC(20,2) columns hold the default 2.9% of 999.99
        store
            .add_transaction(
                Transaction::success(tenant.id, dec!(999.99))
                    .with_platform_fee(dec!(29.00))
                    .with_net_amount(dec!(970.99)),
            )
            .await;

        let report = backfill.backfill_tenant(&tenant.id).await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.updated, 0);
    }

    #[tokio::test]
    async fn test_backfill_tenant_respects_batch_limit() {
        let tenant = Tenant::new("a@example.com");
        let store = Arc::new(MemoryStore::new());
        store.add_tenant(tenant.clone()).await;
        for _ in 0..5 {
            store
                .add_transaction(Transaction::success(tenant.id, dec!(100)))
                .await;
        }
        let config = LedgerConfig {
            backfill_batch_limit: 3,
            ..LedgerConfig::default()
        };
        let backfill = FeeBackfill::new(store.clone(), store, &config);

        let report = backfill.backfill_tenant(&tenant.id).await.unwrap();
        assert_eq!(report.processed, 3);
        assert_eq!(report.updated, 3);
    }
}
