//! Commit scope over a PostgreSQL transaction
//!
//! The transaction that took the tenant's advisory lock also carries the
//! balance reads and the guarded write, so a locked scope needs exactly one
//! pooled connection.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use tokio::sync::Mutex;
use tracing::debug;

use tenantpay_ledger::CommitScope;
use tenantpay_types::{
    LedgerResult, ProcessingStamp, Tenant, TenantId, Transaction as Payment, TransactionStatus,
    WithdrawalAction, WithdrawalId, WithdrawalRequest, WithdrawalStatus,
};

use super::tenant::fetch_tenant;
use super::transaction::fetch_by_status;
use super::withdrawal::{
    fetch_withdrawal, insert_withdrawal, sum_withdrawals, update_withdrawal_status,
};
use crate::{DbError, DbResult};

/// Open transaction holding one tenant's advisory lock
pub struct PgCommitScope {
    tenant_id: TenantId,
    tx: Mutex<Option<Transaction<'static, Postgres>>>,
}

impl PgCommitScope {
    pub(crate) fn new(tenant_id: TenantId, tx: Transaction<'static, Postgres>) -> Self {
        Self {
            tenant_id,
            tx: Mutex::new(Some(tx)),
        }
    }
}

/// The live transaction, or an error once the scope has committed
fn open<T>(slot: &mut Option<T>) -> DbResult<&mut T> {
    slot.as_mut().ok_or_else(closed)
}

fn closed() -> DbError {
    DbError::Connection("commit scope already closed".to_string())
}

#[async_trait]
impl CommitScope for PgCommitScope {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    async fn find_tenant(&self) -> LedgerResult<Option<Tenant>> {
        let mut slot = self.tx.lock().await;
        let tx = open(&mut slot)?;
        Ok(fetch_tenant(&mut **tx, self.tenant_id).await?)
    }

    async fn successful_transactions(&self) -> LedgerResult<Vec<Payment>> {
        let mut slot = self.tx.lock().await;
        let tx = open(&mut slot)?;
        Ok(fetch_by_status(&mut **tx, self.tenant_id, TransactionStatus::Success).await?)
    }

    async fn sum_amounts(&self, statuses: &[WithdrawalStatus]) -> LedgerResult<Decimal> {
        let mut slot = self.tx.lock().await;
        let tx = open(&mut slot)?;
        Ok(sum_withdrawals(&mut **tx, self.tenant_id, statuses).await?)
    }

    async fn find(&self, id: &WithdrawalId) -> LedgerResult<Option<WithdrawalRequest>> {
        let mut slot = self.tx.lock().await;
        let tx = open(&mut slot)?;
        Ok(fetch_withdrawal(&mut **tx, *id).await?)
    }

    async fn insert(&self, request: &WithdrawalRequest) -> LedgerResult<()> {
        let mut slot = self.tx.lock().await;
        let tx = open(&mut slot)?;
        insert_withdrawal(&mut **tx, request).await?;
        Ok(())
    }

    async fn transition(
        &self,
        id: &WithdrawalId,
        action: WithdrawalAction,
        stamp: &ProcessingStamp,
    ) -> LedgerResult<Option<WithdrawalRequest>> {
        let mut slot = self.tx.lock().await;
        let tx = open(&mut slot)?;
        Ok(update_withdrawal_status(&mut **tx, *id, action, stamp).await?)
    }

    async fn commit(&self) -> LedgerResult<()> {
        let tx = self.tx.lock().await.take().ok_or_else(closed)?;
        tx.commit().await.map_err(DbError::from)?;
        debug!(tenant = %self.tenant_id, "Commit scope committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantpay_types::LedgerError;

    #[test]
    fn test_open_slot_is_usable() {
        let mut slot = Some(5);
        *open(&mut slot).unwrap() += 1;
        assert_eq!(slot, Some(6));
    }

    #[test]
    fn test_closed_slot_is_data_access_error() {
        let mut slot: Option<u8> = None;
        let err: LedgerError = open(&mut slot).unwrap_err().into();
        assert!(matches!(err, LedgerError::DataAccess { .. }));
    }
}
