//! Store contracts
//!
//! The ledger owns no data. Tenants, transactions and withdrawal requests
//! live behind these traits; every failure a store reports becomes
//! [`LedgerError::DataAccess`](tenantpay_types::LedgerError::DataAccess).

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tenantpay_types::{
    LedgerError, LedgerResult, ProcessingStamp, Tenant, TenantId, Transaction, TransactionId,
    WithdrawalAction, WithdrawalId, WithdrawalRequest, WithdrawalStatus,
};

/// Read access to tenant accounts and their fee configuration
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn find_tenant(&self, id: &TenantId) -> LedgerResult<Option<Tenant>>;
}

/// Read access to payment transactions, plus the optional fee back-fill
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Every `SUCCESS` transaction of the tenant
    async fn successful_transactions(&self, tenant_id: &TenantId) -> LedgerResult<Vec<Transaction>>;

    async fn find_transaction(&self, id: &TransactionId) -> LedgerResult<Option<Transaction>>;

    /// Persist a derived fee and net amount onto a transaction
    async fn record_fee_resolution(
        &self,
        id: &TransactionId,
        fee: Decimal,
        net: Decimal,
    ) -> LedgerResult<()>;
}

/// Persistence for withdrawal requests
#[async_trait]
pub trait WithdrawalStore: Send + Sync {
    /// Take the tenant's commit lock and open a scope over it.
    ///
    /// The lock is held until the scope is dropped. Balance-committing
    /// writes for one tenant are serialised through it.
    async fn lock_tenant<'a>(
        &'a self,
        tenant_id: &TenantId,
    ) -> LedgerResult<Box<dyn CommitScope + 'a>>;

    async fn insert(&self, request: &WithdrawalRequest) -> LedgerResult<()>;

    async fn find(&self, id: &WithdrawalId) -> LedgerResult<Option<WithdrawalRequest>>;

    /// Sum of `amount` over the tenant's requests in any of `statuses`
    async fn sum_amounts(
        &self,
        tenant_id: &TenantId,
        statuses: &[WithdrawalStatus],
    ) -> LedgerResult<Decimal>;

    /// Conditional write: apply `action` only if the stored status still
    /// equals `action.required_status()`. Returns `None` when it does not.
    async fn transition(
        &self,
        id: &WithdrawalId,
        action: WithdrawalAction,
        stamp: &ProcessingStamp,
    ) -> LedgerResult<Option<WithdrawalRequest>>;

    /// Newest first
    async fn list(
        &self,
        filter: &WithdrawalFilter,
        page: PageRequest,
    ) -> LedgerResult<Page<WithdrawalRequest>>;

    /// Count and amount per status, optionally for one tenant
    async fn status_summary(&self, tenant_id: Option<&TenantId>) -> LedgerResult<Vec<StatusSummary>>;

    async fn tenant_summaries(&self) -> LedgerResult<Vec<TenantWithdrawalSummary>>;
}

/// Unit of work bound to one tenant's commit lock.
///
/// Every read and write goes through the same connection that holds the
/// lock, so a scope never waits on the pool it is blocking. Writes become
/// visible to others on [`commit`](CommitScope::commit). Dropping the
/// scope without committing releases the lock and, where the backend is
/// transactional, discards the writes.
#[async_trait]
pub trait CommitScope: Send + Sync {
    fn tenant_id(&self) -> TenantId;

    async fn find_tenant(&self) -> LedgerResult<Option<Tenant>>;

    /// Every `SUCCESS` transaction of the locked tenant
    async fn successful_transactions(&self) -> LedgerResult<Vec<Transaction>>;

    /// Sum of `amount` over the locked tenant's requests in `statuses`
    async fn sum_amounts(&self, statuses: &[WithdrawalStatus]) -> LedgerResult<Decimal>;

    async fn find(&self, id: &WithdrawalId) -> LedgerResult<Option<WithdrawalRequest>>;

    async fn insert(&self, request: &WithdrawalRequest) -> LedgerResult<()>;

    /// Same contract as [`WithdrawalStore::transition`]
    async fn transition(
        &self,
        id: &WithdrawalId,
        action: WithdrawalAction,
        stamp: &ProcessingStamp,
    ) -> LedgerResult<Option<WithdrawalRequest>>;

    /// Make the scope's writes durable. Later calls on the scope fail.
    async fn commit(&self) -> LedgerResult<()>;
}

/// Filter for listing withdrawal requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WithdrawalFilter {
    pub tenant_id: Option<TenantId>,
    pub status: Option<WithdrawalStatus>,
}

impl WithdrawalFilter {
    pub fn tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            status: None,
        }
    }

    pub fn with_status(mut self, status: Option<WithdrawalStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn matches(&self, request: &WithdrawalRequest) -> bool {
        self.tenant_id.map_or(true, |t| t == request.tenant_id)
            && self.status.map_or(true, |s| s == request.status)
    }
}

/// 1-based page selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> LedgerResult<Self> {
        if page == 0 {
            return Err(LedgerError::validation("page must be at least 1"));
        }
        if limit == 0 {
            return Err(LedgerError::validation("limit must be greater than zero"));
        }
        Ok(Self { page, limit })
    }

    /// First page of `limit` items
    pub fn first(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of results with pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        let limit = u64::from(request.limit.max(1));
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total,
            pages: total.div_ceil(limit),
        }
    }
}

/// Count and total amount of requests in one status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub status: WithdrawalStatus,
    pub count: u64,
    pub amount: Decimal,
}

/// Per-tenant withdrawal activity for the operator dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantWithdrawalSummary {
    pub tenant_id: TenantId,
    pub total_requests: u64,
    pub total_amount: Decimal,
    pub pending_amount: Decimal,
    /// Approved, processed and legacy completed
    pub completed_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_validation() {
        assert!(PageRequest::new(0, 10).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert_eq!(PageRequest::new(3, 10).unwrap().offset(), 20);
    }

    #[test]
    fn test_page_count_rounds_up() {
        let page: Page<u8> = Page::new(vec![], PageRequest::first(10), 21);
        assert_eq!(page.pages, 3);

        let empty: Page<u8> = Page::new(vec![], PageRequest::first(10), 0);
        assert_eq!(empty.pages, 0);
    }

    #[test]
    fn test_filter_matches() {
        use rust_decimal_macros::dec;
        use tenantpay_types::PaymentMethod;

        let tenant = TenantId::new();
        let request =
            WithdrawalRequest::pending(tenant, dec!(5), PaymentMethod::Wallet, dec!(5), None);

        assert!(WithdrawalFilter::default().matches(&request));
        assert!(WithdrawalFilter::tenant(tenant).matches(&request));
        assert!(!WithdrawalFilter::tenant(TenantId::new()).matches(&request));
        assert!(!WithdrawalFilter::tenant(tenant)
            .with_status(Some(WithdrawalStatus::Approved))
            .matches(&request));
    }
}
