//! In-memory store
//!
//! Implements every store trait over process-local maps. Used by tests and
//! by the CLI demo. Commit locks are per-tenant `tokio::sync::Mutex`es held
//! through an owned guard. Writes made in a commit scope apply immediately;
//! committing only closes the scope.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use tenantpay_types::{
    LedgerError, LedgerResult, ProcessingStamp, Tenant, TenantId, Transaction, TransactionId,
    WithdrawalAction, WithdrawalId, WithdrawalRequest, WithdrawalStatus,
};

use crate::store::{
    CommitScope, Page, PageRequest, StatusSummary, TenantDirectory, TenantWithdrawalSummary,
    TransactionStore, WithdrawalFilter, WithdrawalStore,
};

/// A stored request plus its insertion sequence, for stable ordering
#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    request: WithdrawalRequest,
}

/// Process-local implementation of the store traits
#[derive(Debug, Default)]
pub struct MemoryStore {
    tenants: RwLock<HashMap<TenantId, Tenant>>,
    transactions: RwLock<HashMap<TransactionId, Transaction>>,
    withdrawals: RwLock<HashMap<WithdrawalId, Entry>>,
    locks: DashMap<TenantId, Arc<Mutex<()>>>,
    sequence: AtomicU64,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_tenant(&self, tenant: Tenant) {
        self.tenants.write().await.insert(tenant.id, tenant);
    }

    pub async fn add_transaction(&self, tx: Transaction) {
        self.transactions.write().await.insert(tx.id, tx);
    }

    /// Seed a request directly, bypassing every guard
    pub async fn add_withdrawal(&self, request: WithdrawalRequest) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.withdrawals
            .write()
            .await
            .insert(request.id, Entry { seq, request });
    }

    /// Simulate an unreachable backend: every call fails with `DataAccess`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> LedgerResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LedgerError::data_access("memory store is offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl TenantDirectory for MemoryStore {
    async fn find_tenant(&self, id: &TenantId) -> LedgerResult<Option<Tenant>> {
        self.check_online()?;
        Ok(self.tenants.read().await.get(id).cloned())
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn successful_transactions(&self, tenant_id: &TenantId) -> LedgerResult<Vec<Transaction>> {
        self.check_online()?;
        let mut found: Vec<Transaction> = self
            .transactions
            .read()
            .await
            .values()
            .filter(|tx| tx.tenant_id == *tenant_id && tx.is_successful())
            .cloned()
            .collect();
        found.sort_by_key(|tx| tx.created_at);
        Ok(found)
    }

    async fn find_transaction(&self, id: &TransactionId) -> LedgerResult<Option<Transaction>> {
        self.check_online()?;
        Ok(self.transactions.read().await.get(id).cloned())
    }

    async fn record_fee_resolution(
        &self,
        id: &TransactionId,
        fee: Decimal,
        net: Decimal,
    ) -> LedgerResult<()> {
        self.check_online()?;
        let mut transactions = self.transactions.write().await;
        let tx = transactions
            .get_mut(id)
            .ok_or_else(|| LedgerError::not_found("Transaction", id))?;
        tx.platform_fee = Some(fee);
        tx.net_amount = Some(net);
        Ok(())
    }
}

#[async_trait]
impl WithdrawalStore for MemoryStore {
    async fn lock_tenant<'a>(
        &'a self,
        tenant_id: &TenantId,
    ) -> LedgerResult<Box<dyn CommitScope + 'a>> {
        self.check_online()?;
        let lock = self.locks.entry(*tenant_id).or_default().clone();
        let guard = lock.lock_owned().await;
        Ok(Box::new(MemoryScope {
            store: self,
            tenant_id: *tenant_id,
            open: AtomicBool::new(true),
            _lock: guard,
        }))
    }

    async fn insert(&self, request: &WithdrawalRequest) -> LedgerResult<()> {
        self.check_online()?;
        let mut withdrawals = self.withdrawals.write().await;
        if withdrawals.contains_key(&request.id) {
            return Err(LedgerError::data_access(format!(
                "duplicate withdrawal id {}",
                request.id
            )));
        }
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        withdrawals.insert(
            request.id,
            Entry {
                seq,
                request: request.clone(),
            },
        );
        Ok(())
    }

    async fn find(&self, id: &WithdrawalId) -> LedgerResult<Option<WithdrawalRequest>> {
        self.check_online()?;
        Ok(self
            .withdrawals
            .read()
            .await
            .get(id)
            .map(|entry| entry.request.clone()))
    }

    async fn sum_amounts(
        &self,
        tenant_id: &TenantId,
        statuses: &[WithdrawalStatus],
    ) -> LedgerResult<Decimal> {
        self.check_online()?;
        Ok(self
            .withdrawals
            .read()
            .await
            .values()
            .map(|entry| &entry.request)
            .filter(|r| r.tenant_id == *tenant_id && statuses.contains(&r.status))
            .map(|r| r.amount)
            .sum())
    }

    async fn transition(
        &self,
        id: &WithdrawalId,
        action: WithdrawalAction,
        stamp: &ProcessingStamp,
    ) -> LedgerResult<Option<WithdrawalRequest>> {
        self.check_online()?;
        let mut withdrawals = self.withdrawals.write().await;
        match withdrawals.get_mut(id) {
            Some(entry) if entry.request.can_apply(action) => {
                entry.request.apply(action, stamp);
                Ok(Some(entry.request.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list(
        &self,
        filter: &WithdrawalFilter,
        page: PageRequest,
    ) -> LedgerResult<Page<WithdrawalRequest>> {
        self.check_online()?;
        let withdrawals = self.withdrawals.read().await;
        let mut matching: Vec<&Entry> = withdrawals
            .values()
            .filter(|entry| filter.matches(&entry.request))
            .collect();
        matching.sort_by(|a, b| {
            (b.request.created_at, b.seq).cmp(&(a.request.created_at, a.seq))
        });

        let total = matching.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(page.limit as usize)
            .map(|entry| entry.request.clone())
            .collect();
        Ok(Page::new(items, page, total))
    }

    async fn status_summary(&self, tenant_id: Option<&TenantId>) -> LedgerResult<Vec<StatusSummary>> {
        self.check_online()?;
        let withdrawals = self.withdrawals.read().await;
        let mut summaries = Vec::new();
        for status in WithdrawalStatus::ALL {
            let (count, amount) = withdrawals
                .values()
                .map(|entry| &entry.request)
                .filter(|r| r.status == status && tenant_id.map_or(true, |t| *t == r.tenant_id))
                .fold((0u64, Decimal::ZERO), |(n, sum), r| (n + 1, sum + r.amount));
            if count > 0 {
                summaries.push(StatusSummary {
                    status,
                    count,
                    amount,
                });
            }
        }
        Ok(summaries)
    }

    async fn tenant_summaries(&self) -> LedgerResult<Vec<TenantWithdrawalSummary>> {
        self.check_online()?;
        let withdrawals = self.withdrawals.read().await;
        let mut by_tenant: BTreeMap<TenantId, TenantWithdrawalSummary> = BTreeMap::new();
        for request in withdrawals.values().map(|entry| &entry.request) {
            let summary = by_tenant
                .entry(request.tenant_id)
                .or_insert_with(|| TenantWithdrawalSummary {
                    tenant_id: request.tenant_id,
                    total_requests: 0,
                    total_amount: Decimal::ZERO,
                    pending_amount: Decimal::ZERO,
                    completed_amount: Decimal::ZERO,
                });
            summary.total_requests += 1;
            summary.total_amount += request.amount;
            if request.status.counts_as_pending() {
                summary.pending_amount += request.amount;
            }
            if request.status.counts_as_withdrawn() {
                summary.completed_amount += request.amount;
            }
        }
        Ok(by_tenant.into_values().collect())
    }
}

/// Commit scope holding one tenant's in-memory lock
struct MemoryScope<'a> {
    store: &'a MemoryStore,
    tenant_id: TenantId,
    open: AtomicBool,
    _lock: OwnedMutexGuard<()>,
}

impl MemoryScope<'_> {
    fn check_open(&self) -> LedgerResult<()> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(LedgerError::data_access("commit scope is closed"));
        }
        self.store.check_online()
    }
}

#[async_trait]
impl<'a> CommitScope for MemoryScope<'a> {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    async fn find_tenant(&self) -> LedgerResult<Option<Tenant>> {
        self.check_open()?;
        self.store.find_tenant(&self.tenant_id).await
    }

    async fn successful_transactions(&self) -> LedgerResult<Vec<Transaction>> {
        self.check_open()?;
        self.store.successful_transactions(&self.tenant_id).await
    }

    async fn sum_amounts(&self, statuses: &[WithdrawalStatus]) -> LedgerResult<Decimal> {
        self.check_open()?;
        self.store.sum_amounts(&self.tenant_id, statuses).await
    }

    async fn find(&self, id: &WithdrawalId) -> LedgerResult<Option<WithdrawalRequest>> {
        self.check_open()?;
        self.store.find(id).await
    }

    async fn insert(&self, request: &WithdrawalRequest) -> LedgerResult<()> {
        self.check_open()?;
        self.store.insert(request).await
    }

    async fn transition(
        &self,
        id: &WithdrawalId,
        action: WithdrawalAction,
        stamp: &ProcessingStamp,
    ) -> LedgerResult<Option<WithdrawalRequest>> {
        self.check_open()?;
        self.store.transition(id, action, stamp).await
    }

    async fn commit(&self) -> LedgerResult<()> {
        self.check_open()?;
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tenantpay_types::{OperatorId, PaymentMethod};

    fn pending(tenant_id: TenantId, amount: Decimal) -> WithdrawalRequest {
        WithdrawalRequest::pending(tenant_id, amount, PaymentMethod::Wallet, amount, None)
    }

    #[tokio::test]
    async fn test_transition_is_conditional() {
        let store = MemoryStore::new();
        let request = pending(TenantId::new(), dec!(10));
        store.insert(&request).await.unwrap();
        let stamp = ProcessingStamp::now(OperatorId::new());

        let approved = store
            .transition(&request.id, WithdrawalAction::Approve, &stamp)
            .await
            .unwrap();
        assert_eq!(approved.unwrap().status, WithdrawalStatus::Approved);

        let again = store
            .transition(&request.id, WithdrawalAction::Approve, &stamp)
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_fails() {
        let store = MemoryStore::new();
        let request = pending(TenantId::new(), dec!(10));
        store.insert(&request).await.unwrap();
        assert!(matches!(
            store.insert(&request).await,
            Err(LedgerError::DataAccess { .. })
        ));
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_call() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let tenant = TenantId::new();
        assert!(store.find_tenant(&tenant).await.unwrap_err().is_transient());
        assert!(store.lock_tenant(&tenant).await.is_err());
        assert!(store
            .sum_amounts(&tenant, &WithdrawalStatus::PENDING)
            .await
            .is_err());

        store.set_offline(false);
        assert!(store.find_tenant(&tenant).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tenant_lock_is_exclusive() {
        let store = Arc::new(MemoryStore::new());
        let tenant = TenantId::new();

        let guard = store.lock_tenant(&tenant).await.unwrap();
        let contender = {
            let store = store.clone();
            tokio::spawn(async move { store.lock_tenant(&tenant).await.map(|_| ()) })
        };
        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        // Another tenant is not blocked
        store.lock_tenant(&TenantId::new()).await.unwrap();

        drop(guard);
        contender.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_scope_reads_and_writes_for_its_tenant() {
        let store = MemoryStore::new();
        let tenant = TenantId::new();
        store.add_withdrawal(pending(tenant, dec!(40))).await;
        store.add_withdrawal(pending(TenantId::new(), dec!(99))).await;

        let scope = store.lock_tenant(&tenant).await.unwrap();
        assert_eq!(scope.tenant_id(), tenant);
        assert_eq!(
            scope.sum_amounts(&WithdrawalStatus::PENDING).await.unwrap(),
            dec!(40)
        );

        let request = pending(tenant, dec!(10));
        scope.insert(&request).await.unwrap();
        assert_eq!(
            scope.sum_amounts(&WithdrawalStatus::PENDING).await.unwrap(),
            dec!(50)
        );
        scope.commit().await.unwrap();
        drop(scope);

        assert!(store.find(&request.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_committed_scope_is_closed() {
        let store = MemoryStore::new();
        let tenant = TenantId::new();
        let scope = store.lock_tenant(&tenant).await.unwrap();
        scope.commit().await.unwrap();

        assert!(matches!(
            scope.insert(&pending(tenant, dec!(1))).await,
            Err(LedgerError::DataAccess { .. })
        ));
        assert!(scope.commit().await.is_err());
    }

    #[tokio::test]
    async fn test_status_summary_filters_by_tenant() {
        let store = MemoryStore::new();
        let a = TenantId::new();
        let b = TenantId::new();
        store.add_withdrawal(pending(a, dec!(10))).await;
        store.add_withdrawal(pending(a, dec!(15))).await;
        store.add_withdrawal(pending(b, dec!(7))).await;

        let all = store.status_summary(None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].count, 3);

        let only_a = store.status_summary(Some(&a)).await.unwrap();
        assert_eq!(only_a[0].amount, dec!(25));
    }
}
