//! Withdrawal request repository
//!
//! Balance-committing writes are serialised per tenant with a
//! transaction-scoped advisory lock. The lock's transaction lives inside
//! the returned [`PgCommitScope`], which runs the guarded reads and writes
//! on that same connection. Dropping the scope uncommitted rolls it back
//! and releases the lock. Status changes are conditional updates keyed on
//! the expected current status.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool, Row};
use uuid::Uuid;

use tenantpay_ledger::{
    CommitScope, Page, PageRequest, StatusSummary, TenantWithdrawalSummary, WithdrawalFilter,
    WithdrawalStore,
};
use tenantpay_types::{
    LedgerResult, ProcessingStamp, TenantId, WithdrawalAction, WithdrawalId, WithdrawalRequest,
    WithdrawalStatus,
};

use super::PgCommitScope;
use crate::{DbResult, DbStatusSummary, DbTenantSummary, DbWithdrawal};

const WITHDRAWAL_COLUMNS: &str = "id, tenant_id, amount, payment_method, status, type, \
     available_balance, tenant_notes, processed_by, processed_at, processing_notes, \
     external_reference, created_at, updated_at";

#[derive(Clone)]
pub struct WithdrawalRepo {
    pool: PgPool,
}

impl WithdrawalRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: &WithdrawalRequest) -> DbResult<WithdrawalRequest> {
        insert_withdrawal(&self.pool, request).await
    }

    pub async fn find_by_id(&self, id: WithdrawalId) -> DbResult<Option<WithdrawalRequest>> {
        fetch_withdrawal(&self.pool, id).await
    }

    pub async fn sum_by_statuses(
        &self,
        tenant_id: TenantId,
        statuses: &[WithdrawalStatus],
    ) -> DbResult<Decimal> {
        sum_withdrawals(&self.pool, tenant_id, statuses).await
    }

    /// Apply `action` only while the row is still in its required status
    pub async fn update_status(
        &self,
        id: WithdrawalId,
        action: WithdrawalAction,
        stamp: &ProcessingStamp,
    ) -> DbResult<Option<WithdrawalRequest>> {
        update_withdrawal_status(&self.pool, id, action, stamp).await
    }

    /// Take the tenant's advisory lock inside a fresh transaction
    pub async fn acquire_tenant_lock(&self, tenant_id: TenantId) -> DbResult<PgCommitScope> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(advisory_key(tenant_id.as_uuid()))
            .execute(&mut *tx)
            .await?;
        Ok(PgCommitScope::new(tenant_id, tx))
    }

    pub async fn list_filtered(
        &self,
        filter: &WithdrawalFilter,
        page: PageRequest,
    ) -> DbResult<Page<WithdrawalRequest>> {
        let tenant_id = filter.tenant_id.map(|t| t.0);
        let status = filter.status.map(|s| s.as_str());

        let total: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM withdrawal_requests
            WHERE ($1::uuid IS NULL OR tenant_id = $1)
              AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(tenant_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?
        .try_get("total")?;

        let rows = sqlx::query_as::<_, DbWithdrawal>(&format!(
            r#"
            SELECT {WITHDRAWAL_COLUMNS}
            FROM withdrawal_requests
            WHERE ($1::uuid IS NULL OR tenant_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(tenant_id)
        .bind(status)
        .bind(i64::from(page.limit))
        .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(WithdrawalRequest::try_from)
            .collect::<DbResult<Vec<_>>>()?;
        Ok(Page::new(items, page, u64::try_from(total).unwrap_or_default()))
    }

    pub async fn summarize_by_status(
        &self,
        tenant_id: Option<TenantId>,
    ) -> DbResult<Vec<StatusSummary>> {
        let rows = sqlx::query_as::<_, DbStatusSummary>(
            r#"
            SELECT status, COUNT(*) AS count, COALESCE(SUM(amount), 0) AS amount
            FROM withdrawal_requests
            WHERE ($1::uuid IS NULL OR tenant_id = $1)
            GROUP BY status
            "#,
        )
        .bind(tenant_id.map(|t| t.0))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(StatusSummary::try_from).collect()
    }

    pub async fn summarize_by_tenant(&self) -> DbResult<Vec<TenantWithdrawalSummary>> {
        let rows = sqlx::query_as::<_, DbTenantSummary>(
            r#"
            SELECT tenant_id,
                   COUNT(*) AS total_requests,
                   COALESCE(SUM(amount), 0) AS total_amount,
                   COALESCE(SUM(amount) FILTER (WHERE status = 'pending'), 0) AS pending_amount,
                   COALESCE(SUM(amount) FILTER (
                       WHERE status IN ('approved', 'processed', 'completed')
                   ), 0) AS completed_amount
            FROM withdrawal_requests
            GROUP BY tenant_id
            ORDER BY total_amount DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TenantWithdrawalSummary::from).collect())
    }
}

#[async_trait]
impl WithdrawalStore for WithdrawalRepo {
    async fn lock_tenant<'a>(
        &'a self,
        tenant_id: &TenantId,
    ) -> LedgerResult<Box<dyn CommitScope + 'a>> {
        Ok(Box::new(self.acquire_tenant_lock(*tenant_id).await?))
    }

    async fn insert(&self, request: &WithdrawalRequest) -> LedgerResult<()> {
        self.create(request).await?;
        Ok(())
    }

    async fn find(&self, id: &WithdrawalId) -> LedgerResult<Option<WithdrawalRequest>> {
        Ok(self.find_by_id(*id).await?)
    }

    async fn sum_amounts(
        &self,
        tenant_id: &TenantId,
        statuses: &[WithdrawalStatus],
    ) -> LedgerResult<Decimal> {
        Ok(self.sum_by_statuses(*tenant_id, statuses).await?)
    }

    async fn transition(
        &self,
        id: &WithdrawalId,
        action: WithdrawalAction,
        stamp: &ProcessingStamp,
    ) -> LedgerResult<Option<WithdrawalRequest>> {
        Ok(self.update_status(*id, action, stamp).await?)
    }

    async fn list(
        &self,
        filter: &WithdrawalFilter,
        page: PageRequest,
    ) -> LedgerResult<Page<WithdrawalRequest>> {
        Ok(self.list_filtered(filter, page).await?)
    }

    async fn status_summary(&self, tenant_id: Option<&TenantId>) -> LedgerResult<Vec<StatusSummary>> {
        Ok(self.summarize_by_status(tenant_id.copied()).await?)
    }

    async fn tenant_summaries(&self) -> LedgerResult<Vec<TenantWithdrawalSummary>> {
        Ok(self.summarize_by_tenant().await?)
    }
}

pub(crate) async fn insert_withdrawal<'e, E>(
    executor: E,
    request: &WithdrawalRequest,
) -> DbResult<WithdrawalRequest>
where
    E: PgExecutor<'e>,
{
    let row = DbWithdrawal::from_domain(request);
    let created = sqlx::query_as::<_, DbWithdrawal>(&format!(
        r#"
        INSERT INTO withdrawal_requests (
            id, tenant_id, amount, payment_method, status, type, available_balance,
            tenant_notes, processed_by, processed_at, processing_notes, external_reference,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING {WITHDRAWAL_COLUMNS}
        "#
    ))
    .bind(row.id)
    .bind(row.tenant_id)
    .bind(row.amount)
    .bind(&row.payment_method)
    .bind(&row.status)
    .bind(&row.kind)
    .bind(row.available_balance)
    .bind(&row.tenant_notes)
    .bind(row.processed_by)
    .bind(row.processed_at)
    .bind(&row.processing_notes)
    .bind(&row.external_reference)
    .bind(row.created_at)
    .bind(row.updated_at)
    .fetch_one(executor)
    .await?;
    WithdrawalRequest::try_from(created)
}

pub(crate) async fn fetch_withdrawal<'e, E>(
    executor: E,
    id: WithdrawalId,
) -> DbResult<Option<WithdrawalRequest>>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, DbWithdrawal>(&format!(
        "SELECT {WITHDRAWAL_COLUMNS} FROM withdrawal_requests WHERE id = $1"
    ))
    .bind(id.0)
    .fetch_optional(executor)
    .await?;
    row.map(WithdrawalRequest::try_from).transpose()
}

pub(crate) async fn sum_withdrawals<'e, E>(
    executor: E,
    tenant_id: TenantId,
    statuses: &[WithdrawalStatus],
) -> DbResult<Decimal>
where
    E: PgExecutor<'e>,
{
    let statuses = status_names(statuses);
    let row = sqlx::query(
        r#"
        SELECT COALESCE(SUM(amount), 0) AS total
        FROM withdrawal_requests
        WHERE tenant_id = $1 AND status = ANY($2)
        "#,
    )
    .bind(tenant_id.0)
    .bind(&statuses)
    .fetch_one(executor)
    .await?;

    let total: Decimal = row.try_get("total")?;
    Ok(total)
}

pub(crate) async fn update_withdrawal_status<'e, E>(
    executor: E,
    id: WithdrawalId,
    action: WithdrawalAction,
    stamp: &ProcessingStamp,
) -> DbResult<Option<WithdrawalRequest>>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, DbWithdrawal>(&format!(
        r#"
        UPDATE withdrawal_requests
        SET status = $3,
            processed_by = $4,
            processed_at = $5,
            processing_notes = COALESCE($6, processing_notes),
            external_reference = COALESCE($7, external_reference),
            updated_at = $5
        WHERE id = $1 AND status = $2
        RETURNING {WITHDRAWAL_COLUMNS}
        "#
    ))
    .bind(id.0)
    .bind(action.required_status().as_str())
    .bind(action.target_status().as_str())
    .bind(stamp.processed_by.0)
    .bind(stamp.processed_at)
    .bind(&stamp.notes)
    .bind(&stamp.external_reference)
    .fetch_optional(executor)
    .await?;
    row.map(WithdrawalRequest::try_from).transpose()
}

fn status_names(statuses: &[WithdrawalStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

/// Advisory lock key for a tenant: the high 64 bits of its UUID
fn advisory_key(tenant: &Uuid) -> i64 {
    let (high, _) = tenant.as_u64_pair();
    high as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advisory_key_is_stable_per_tenant() {
        let tenant = Uuid::new_v4();
        assert_eq!(advisory_key(&tenant), advisory_key(&tenant));
    }

    #[test]
    fn test_advisory_key_uses_high_bits() {
        let tenant = Uuid::from_u64_pair(0x0102_0304_0506_0708, 0xffff_ffff_ffff_ffff);
        assert_eq!(advisory_key(&tenant), 0x0102_0304_0506_0708);

        let other = Uuid::from_u64_pair(0x0102_0304_0506_0708, 0);
        assert_eq!(advisory_key(&tenant), advisory_key(&other));
    }

    #[test]
    fn test_status_names_match_stored_values() {
        assert_eq!(
            status_names(&WithdrawalStatus::WITHDRAWN),
            vec!["approved", "processed", "completed"]
        );
        assert_eq!(status_names(&WithdrawalStatus::PENDING), vec!["pending"]);
    }
}
