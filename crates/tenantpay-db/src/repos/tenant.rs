//! Tenant repository

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};

use tenantpay_ledger::TenantDirectory;
use tenantpay_types::{LedgerResult, Tenant, TenantId};

use crate::{DbResult, DbTenant};

const TENANT_COLUMNS: &str = "id, email, role, is_active, platform_fee_kind, platform_fee_value, \
     legacy_platform_fee, created_at";

#[derive(Clone)]
pub struct TenantRepo {
    pool: PgPool,
}

impl TenantRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: TenantId) -> DbResult<Option<Tenant>> {
        fetch_tenant(&self.pool, id).await
    }
}

pub(crate) async fn fetch_tenant<'e, E>(executor: E, id: TenantId) -> DbResult<Option<Tenant>>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, DbTenant>(&format!(
        "SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1"
    ))
    .bind(id.0)
    .fetch_optional(executor)
    .await?;
    row.map(Tenant::try_from).transpose()
}

#[async_trait]
impl TenantDirectory for TenantRepo {
    async fn find_tenant(&self, id: &TenantId) -> LedgerResult<Option<Tenant>> {
        Ok(self.find_by_id(*id).await?)
    }
}
