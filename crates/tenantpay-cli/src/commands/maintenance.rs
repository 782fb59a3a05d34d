//! Database and data maintenance commands

use tenantpay_db::Database;
use tenantpay_types::{TenantId, TransactionId};

use super::Context;
use crate::display;

pub async fn migrate(db: &Database) -> anyhow::Result<()> {
    db.migrate().await?;
    display::success("Migrations applied");
    Ok(())
}

pub async fn health(db: &Database, json: bool) -> anyhow::Result<()> {
    let status = db.health_check().await;
    if json {
        println!("{}", serde_json::json!({ "postgres": status.postgres, "healthy": status.healthy }));
    } else if status.healthy {
        display::success("PostgreSQL reachable");
    } else {
        display::error("PostgreSQL unreachable");
    }
    if !status.healthy {
        anyhow::bail!("database health check failed");
    }
    Ok(())
}

pub async fn backfill_transaction(ctx: &Context, id: TransactionId) -> anyhow::Result<()> {
    let resolution = ctx.backfill.backfill_transaction(&id).await?;
    ctx.output(&resolution, || {
        display::success(&format!("Transaction {} updated", id));
        display::labeled("Gross", &display::money(resolution.gross, &ctx.currency));
        display::labeled("Fee", &display::money(resolution.fee, &ctx.currency));
        display::labeled("Net", &display::money(resolution.net, &ctx.currency));
        display::labeled("Rule", &format!("{:?}", resolution.rule));
    })
}

pub async fn backfill_tenant(ctx: &Context, tenant: TenantId) -> anyhow::Result<()> {
    let report = ctx.backfill.backfill_tenant(&tenant).await?;
    ctx.output(&report, || {
        display::section(&format!("Fee back-fill for {}", tenant));
        display::labeled("Processed", &report.processed.to_string());
        display::labeled("Updated", &report.updated.to_string());
        display::labeled("Errors", &report.errors.len().to_string());
        for failure in &report.errors {
            display::error(&format!("{}: {}", failure.transaction_id, failure.message));
        }
    })
}
