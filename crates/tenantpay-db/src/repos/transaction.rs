//! Payment transaction repository
//!
//! Transactions are written by the payment flow; this repository only
//! reads them and back-fills derived fee columns.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

use tenantpay_ledger::TransactionStore;
use tenantpay_types::{LedgerResult, TenantId, Transaction, TransactionId, TransactionStatus};

use crate::{DbError, DbResult, DbTransaction};

const TRANSACTION_COLUMNS: &str = "id, tenant_id, amount, status, net_amount, platform_fee, \
     fee_snapshot_kind, fee_snapshot_value, legacy_fee_snapshot, created_at";

#[derive(Clone)]
pub struct TransactionRepo {
    pool: PgPool,
}

impl TransactionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_by_status(
        &self,
        tenant_id: TenantId,
        status: TransactionStatus,
    ) -> DbResult<Vec<Transaction>> {
        fetch_by_status(&self.pool, tenant_id, status).await
    }

    pub async fn find_by_id(&self, id: TransactionId) -> DbResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, DbTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Transaction::try_from).transpose()
    }

    pub async fn update_fee(&self, id: TransactionId, fee: Decimal, net: Decimal) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE transactions SET platform_fee = $2, net_amount = $3 WHERE id = $1",
        )
        .bind(id.0)
        .bind(fee)
        .bind(net)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Transaction {}", id)));
        }
        Ok(())
    }
}

pub(crate) async fn fetch_by_status<'e, E>(
    executor: E,
    tenant_id: TenantId,
    status: TransactionStatus,
) -> DbResult<Vec<Transaction>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, DbTransaction>(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions \
         WHERE tenant_id = $1 AND UPPER(status) = $2 ORDER BY created_at"
    ))
    .bind(tenant_id.0)
    .bind(status.as_str())
    .fetch_all(executor)
    .await?;
    rows.into_iter().map(Transaction::try_from).collect()
}

#[async_trait]
impl TransactionStore for TransactionRepo {
    async fn successful_transactions(&self, tenant_id: &TenantId) -> LedgerResult<Vec<Transaction>> {
        Ok(self.list_by_status(*tenant_id, TransactionStatus::Success).await?)
    }

    async fn find_transaction(&self, id: &TransactionId) -> LedgerResult<Option<Transaction>> {
        Ok(self.find_by_id(*id).await?)
    }

    async fn record_fee_resolution(
        &self,
        id: &TransactionId,
        fee: Decimal,
        net: Decimal,
    ) -> LedgerResult<()> {
        Ok(self.update_fee(*id, fee, net).await?)
    }
}
