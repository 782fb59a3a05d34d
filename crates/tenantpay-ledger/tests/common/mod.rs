#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use tenantpay_ledger::{LedgerConfig, MemoryStore, WithdrawalService};
use tenantpay_types::{OperatorId, PlatformFee, ProcessingStamp, Tenant, Transaction};

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub service: WithdrawalService,
    pub tenant: Tenant,
    pub operator: Tenant,
}

impl Harness {
    pub async fn new(platform_fee: Option<PlatformFee>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let mut tenant = Tenant::new("merchant@example.com");
        tenant.platform_fee = platform_fee;
        let operator = Tenant::operator("operator@example.com");
        store.add_tenant(tenant.clone()).await;
        store.add_tenant(operator.clone()).await;

        let service = WithdrawalService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            LedgerConfig::default(),
        );
        Self {
            store,
            service,
            tenant,
            operator,
        }
    }

    /// A tenant whose net earned is exactly `net`
    pub async fn with_net_earned(net: Decimal) -> Self {
        let harness = Self::new(None).await;
        harness.earn(net).await;
        harness
    }

    pub async fn earn(&self, net: Decimal) {
        self.store
            .add_transaction(Transaction::success(self.tenant.id, net).with_net_amount(net))
            .await;
    }

    pub fn operator_id(&self) -> OperatorId {
        self.operator.id.into()
    }

    pub fn stamp(&self) -> ProcessingStamp {
        ProcessingStamp::now(self.operator_id())
    }
}
