//! Listing and reporting commands

use colored::*;

use tenantpay_ledger::PageRequest;
use tenantpay_types::{TenantId, WithdrawalStatus};

use super::Context;
use crate::display;

pub async fn list(
    ctx: &Context,
    tenant: Option<TenantId>,
    status: Option<WithdrawalStatus>,
    page: u32,
    limit: u32,
) -> anyhow::Result<()> {
    let request = PageRequest::new(page, limit)?;
    let page = match tenant {
        Some(tenant) => ctx.service.list_for_tenant(&tenant, status, request).await?,
        None => ctx.service.list_all(status, request).await?,
    };
    ctx.output(&page, || {
        display::section("Withdrawal requests");
        display::withdrawal_rows(&page.items, &ctx.currency);
        display::page_footer(&page);
    })
}

pub async fn stats(ctx: &Context) -> anyhow::Result<()> {
    let stats = ctx.service.statistics().await?;
    ctx.output(&stats, || {
        display::section("Withdrawal statistics");
        display::labeled("Requests", &stats.total_count.to_string());
        display::labeled("Amount", &display::money(stats.total_amount, &ctx.currency));
        println!();
        display::status_table(&stats.by_status, &ctx.currency);
    })
}

pub async fn dashboard(ctx: &Context) -> anyhow::Result<()> {
    let dashboard = ctx.service.dashboard().await?;
    ctx.output(&dashboard, || {
        display::section("Withdrawal dashboard");
        display::labeled("Awaiting review", &dashboard.pending_count.to_string());
        println!();
        display::status_table(&dashboard.by_status, &ctx.currency);

        display::section("Recent requests");
        display::withdrawal_rows(&dashboard.recent, &ctx.currency);

        display::section("Tenants");
        if dashboard.tenants.is_empty() {
            println!("  {}", "No tenant activity".yellow());
        }
        for summary in &dashboard.tenants {
            println!("  {}", summary.tenant_id.to_string().bright_white());
            println!(
                "      requests {}  total {}  pending {}  paid {}",
                summary.total_requests,
                display::money(summary.total_amount, &ctx.currency).bright_cyan(),
                display::money(summary.pending_amount, &ctx.currency).yellow(),
                display::money(summary.completed_amount, &ctx.currency).bright_green(),
            );
        }
    })
}

pub async fn profile(ctx: &Context, tenant: TenantId) -> anyhow::Result<()> {
    let profile = ctx.service.profile(&tenant).await?;
    ctx.output(&profile, || {
        display::section(&format!("Tenant {}", profile.tenant.email));
        display::labeled("ID", &profile.tenant.id.to_string());
        display::labeled("Active", &profile.tenant.is_active.to_string());
        if let Some(fee) = profile.tenant.platform_fee {
            display::labeled("Platform fee", &format!("{} {}", fee.kind(), fee.value()));
        }
        println!();
        display::balance(&profile.balance, &ctx.currency);

        display::section("History");
        display::withdrawal_rows(&profile.history, &ctx.currency);
    })
}
