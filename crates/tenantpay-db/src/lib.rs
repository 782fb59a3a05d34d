//! TenantPay Database Layer
//!
//! PostgreSQL persistence for tenants, their payment transactions and
//! withdrawal requests.
//!
//! # Repository Pattern
//!
//! Each table has its own repository with plain queries plus an
//! implementation of the matching `tenantpay-ledger` store trait, so a
//! [`Database`] can back a `WithdrawalService` directly.

pub mod config;
pub mod error;
pub mod repos;
pub mod models;

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use tenantpay_ledger::{LedgerConfig, WithdrawalService};

pub use config::DatabaseConfig;
pub use error::{DbError, DbResult};
pub use repos::*;
pub use models::*;

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    /// PostgreSQL connection pool
    pub pg: PgPool,
}

impl Database {
    /// Connect to PostgreSQL
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        info!("Connecting to PostgreSQL: {}", config.postgres_url_masked());

        let pg = PgPoolOptions::new()
            .max_connections(config.pg_max_connections)
            .min_connections(config.pg_min_connections)
            .acquire_timeout(Duration::from_secs(config.pg_acquire_timeout_secs))
            .connect(&config.postgres_url)
            .await
            .map_err(|e| DbError::Connection(format!("PostgreSQL: {}", e)))?;

        info!("Connected to PostgreSQL");
        Ok(Self { pg })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> DbResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pg)
            .await
            .map_err(|e| DbError::Migration(e.to_string()))?;
        info!("Migrations complete");
        Ok(())
    }

    /// Health check
    pub async fn health_check(&self) -> HealthStatus {
        let postgres = sqlx::query("SELECT 1").fetch_one(&self.pg).await.is_ok();
        HealthStatus {
            postgres,
            healthy: postgres,
        }
    }

    pub fn tenant_repo(&self) -> TenantRepo {
        TenantRepo::new(self.pg.clone())
    }

    pub fn transaction_repo(&self) -> TransactionRepo {
        TransactionRepo::new(self.pg.clone())
    }

    pub fn withdrawal_repo(&self) -> WithdrawalRepo {
        WithdrawalRepo::new(self.pg.clone())
    }

    /// Withdrawal service backed by this database
    pub fn withdrawal_service(&self, config: LedgerConfig) -> WithdrawalService {
        WithdrawalService::new(
            Arc::new(self.tenant_repo()),
            Arc::new(self.transaction_repo()),
            Arc::new(self.withdrawal_repo()),
            config,
        )
    }
}

/// Health status of database connections
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub postgres: bool,
    pub healthy: bool,
}
