//! Listing, statistics and the operator dashboard

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tenantpay_types::{
    LedgerError, LedgerResult, Tenant, TenantId, WithdrawalRequest, WithdrawalStatus,
};

use crate::balance::Balance;
use crate::service::WithdrawalService;
use crate::store::{Page, PageRequest, StatusSummary, TenantWithdrawalSummary, WithdrawalFilter};

/// Request totals across all tenants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalStatistics {
    pub total_count: u64,
    pub total_amount: Decimal,
    /// One entry per status, zero-filled
    pub by_status: Vec<StatusSummary>,
}

impl WithdrawalStatistics {
    pub fn status(&self, status: WithdrawalStatus) -> Option<&StatusSummary> {
        self.by_status.iter().find(|s| s.status == status)
    }
}

/// Operator overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalDashboard {
    pub pending_count: u64,
    pub recent: Vec<WithdrawalRequest>,
    pub by_status: Vec<StatusSummary>,
    pub tenants: Vec<TenantWithdrawalSummary>,
}

/// One tenant's balance and recent withdrawal history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantWithdrawalProfile {
    pub tenant: Tenant,
    pub balance: Balance,
    pub history: Vec<WithdrawalRequest>,
}

impl WithdrawalService {
    /// A tenant's own requests, newest first
    pub async fn list_for_tenant(
        &self,
        tenant_id: &TenantId,
        status: Option<WithdrawalStatus>,
        page: PageRequest,
    ) -> LedgerResult<Page<WithdrawalRequest>> {
        let filter = WithdrawalFilter::tenant(*tenant_id).with_status(status);
        self.withdrawals.list(&filter, page).await
    }

    /// Every tenant's requests, newest first
    pub async fn list_all(
        &self,
        status: Option<WithdrawalStatus>,
        page: PageRequest,
    ) -> LedgerResult<Page<WithdrawalRequest>> {
        let filter = WithdrawalFilter::default().with_status(status);
        self.withdrawals.list(&filter, page).await
    }

    pub async fn statistics(&self) -> LedgerResult<WithdrawalStatistics> {
        let by_status = zero_filled(self.withdrawals.status_summary(None).await?);
        Ok(WithdrawalStatistics {
            total_count: by_status.iter().map(|s| s.count).sum(),
            total_amount: by_status.iter().map(|s| s.amount).sum(),
            by_status,
        })
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> LedgerResult<WithdrawalDashboard> {
        let by_status = zero_filled(self.withdrawals.status_summary(None).await?);
        let pending_count = by_status
            .iter()
            .filter(|s| s.status == WithdrawalStatus::Pending)
            .map(|s| s.count)
            .sum();

        let recent = self
            .withdrawals
            .list(
                &WithdrawalFilter::default(),
                PageRequest::first(self.config.recent_limit),
            )
            .await?
            .items;

        let mut tenants = self.withdrawals.tenant_summaries().await?;
        tenants.sort_by(|a, b| b.total_amount.cmp(&a.total_amount));

        Ok(WithdrawalDashboard {
            pending_count,
            recent,
            by_status,
            tenants,
        })
    }

    /// Balance and history for one earning tenant
    #[instrument(skip(self), fields(tenant = %tenant_id))]
    pub async fn profile(&self, tenant_id: &TenantId) -> LedgerResult<TenantWithdrawalProfile> {
        let tenant = self
            .tenants
            .find_tenant(tenant_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Tenant", tenant_id))?;
        if tenant.is_operator() {
            return Err(LedgerError::validation(
                "Platform operator accounts have no withdrawal profile",
            ));
        }

        let balance = self.balances.balance(tenant_id).await?;
        let history = self
            .list_for_tenant(tenant_id, None, PageRequest::first(self.config.history_limit))
            .await?
            .items;

        Ok(TenantWithdrawalProfile {
            tenant,
            balance,
            history,
        })
    }
}

fn zero_filled(summaries: Vec<StatusSummary>) -> Vec<StatusSummary> {
    WithdrawalStatus::ALL
        .iter()
        .map(|status| {
            summaries
                .iter()
                .find(|s| s.status == *status)
                .cloned()
                .unwrap_or(StatusSummary {
                    status: *status,
                    count: 0,
                    amount: Decimal::ZERO,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rust_decimal_macros::dec;
    use tenantpay_types::{OperatorId, ProcessingStamp, Transaction};

    use crate::config::LedgerConfig;
    use crate::memory::MemoryStore;
    use crate::service::NewWithdrawal;

    async fn service_with(
        tenants: &[&Tenant],
        config: LedgerConfig,
    ) -> (Arc<MemoryStore>, WithdrawalService) {
        let store = Arc::new(MemoryStore::new());
        for tenant in tenants {
            store.add_tenant((*tenant).clone()).await;
            store
                .add_transaction(
                    Transaction::success(tenant.id, dec!(1000)).with_net_amount(dec!(1000)),
                )
                .await;
        }
        let service = WithdrawalService::new(store.clone(), store.clone(), store.clone(), config);
        (store, service)
    }

    fn stamp() -> ProcessingStamp {
        ProcessingStamp::now(OperatorId::new())
    }

    #[test]
    fn test_zero_filled_covers_every_status() {
        let filled = zero_filled(vec![StatusSummary {
            status: WithdrawalStatus::Approved,
            count: 2,
            amount: dec!(50),
        }]);
        assert_eq!(filled.len(), WithdrawalStatus::ALL.len());
        let approved = filled
            .iter()
            .find(|s| s.status == WithdrawalStatus::Approved)
            .unwrap();
        assert_eq!(approved.count, 2);
        assert!(filled
            .iter()
            .filter(|s| s.status != WithdrawalStatus::Approved)
            .all(|s| s.count == 0 && s.amount.is_zero()));
    }

    #[tokio::test]
    async fn test_list_for_tenant_paginates_newest_first() {
        let tenant = Tenant::new("a@example.com");
        let other = Tenant::new("b@example.com");
        let (_, service) = service_with(&[&tenant, &other], LedgerConfig::default()).await;

        let mut ids = Vec::new();
        for amount in [dec!(10), dec!(20), dec!(30)] {
            let request = service
                .request_withdrawal(&tenant.id, NewWithdrawal::new(amount))
                .await
                .unwrap();
            ids.push(request.id);
        }
        service
            .request_withdrawal(&other.id, NewWithdrawal::new(dec!(5)))
            .await
            .unwrap();

        let page = service
            .list_for_tenant(&tenant.id, None, PageRequest::new(1, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.pages, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, ids[2]);

        let second = service
            .list_for_tenant(&tenant.id, None, PageRequest::new(2, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].id, ids[0]);
    }

    #[tokio::test]
    async fn test_list_all_with_status_filter() {
        let tenant = Tenant::new("a@example.com");
        let (_, service) = service_with(&[&tenant], LedgerConfig::default()).await;
        let first = service
            .request_withdrawal(&tenant.id, NewWithdrawal::new(dec!(10)))
            .await
            .unwrap();
        service
            .request_withdrawal(&tenant.id, NewWithdrawal::new(dec!(20)))
            .await
            .unwrap();
        service.reject(&first.id, stamp()).await.unwrap();

        let rejected = service
            .list_all(Some(WithdrawalStatus::Rejected), PageRequest::first(10))
            .await
            .unwrap();
        assert_eq!(rejected.total, 1);
        assert_eq!(rejected.items[0].id, first.id);
    }

    #[tokio::test]
    async fn test_statistics_and_dashboard() {
        let tenant = Tenant::new("a@example.com");
        let config = LedgerConfig {
            recent_limit: 2,
            ..LedgerConfig::default()
        };
        let (_, service) = service_with(&[&tenant], config).await;

        let a = service
            .request_withdrawal(&tenant.id, NewWithdrawal::new(dec!(100)))
            .await
            .unwrap();
        let b = service
            .request_withdrawal(&tenant.id, NewWithdrawal::new(dec!(200)))
            .await
            .unwrap();
        service
            .request_withdrawal(&tenant.id, NewWithdrawal::new(dec!(50)))
            .await
            .unwrap();
        service.approve(&a.id, stamp()).await.unwrap();
        service.approve(&b.id, stamp()).await.unwrap();
        service.process(&b.id, stamp()).await.unwrap();

        let stats = service.statistics().await.unwrap();
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.total_amount, dec!(350));
        assert_eq!(stats.status(WithdrawalStatus::Approved).unwrap().amount, dec!(100));
        assert_eq!(stats.status(WithdrawalStatus::Processed).unwrap().amount, dec!(200));

        let dashboard = service.dashboard().await.unwrap();
        assert_eq!(dashboard.pending_count, 1);
        assert_eq!(dashboard.recent.len(), 2);
        assert_eq!(dashboard.tenants.len(), 1);
        let summary = &dashboard.tenants[0];
        assert_eq!(summary.total_requests, 3);
        assert_eq!(summary.pending_amount, dec!(50));
        assert_eq!(summary.completed_amount, dec!(300));
    }

    #[tokio::test]
    async fn test_profile() {
        let tenant = Tenant::new("a@example.com");
        let operator = Tenant::operator("ops@example.com");
        let (_, service) = service_with(&[&tenant, &operator], LedgerConfig::default()).await;
        service
            .request_withdrawal(&tenant.id, NewWithdrawal::new(dec!(100)))
            .await
            .unwrap();

        let profile = service.profile(&tenant.id).await.unwrap();
        assert_eq!(profile.tenant.id, tenant.id);
        assert_eq!(profile.balance.remaining_net_earned, dec!(900));
        assert_eq!(profile.history.len(), 1);

        assert!(matches!(
            service.profile(&operator.id).await,
            Err(LedgerError::Validation { .. })
        ));
        assert!(matches!(
            service.profile(&TenantId::new()).await,
            Err(LedgerError::NotFound { .. })
        ));
    }
}
