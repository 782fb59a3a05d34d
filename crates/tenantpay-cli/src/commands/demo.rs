//! Demo command - the withdrawal lifecycle end to end, in memory

use std::sync::Arc;

use colored::*;
use rust_decimal_macros::dec;
use tokio::sync::broadcast::error::TryRecvError;

use tenantpay_ledger::{
    BroadcastNotifier, DirectWithdrawal, LedgerConfig, LedgerError, MemoryStore, NewWithdrawal,
    WithdrawalEvent, WithdrawalService,
};
use tenantpay_types::{PlatformFee, ProcessingStamp, Tenant, Transaction};

use crate::display;

pub async fn run(config: LedgerConfig) -> anyhow::Result<()> {
    println!("{}", "TenantPay demo: earnings, fees and withdrawals".bright_white().bold());
    println!("{}", "Everything below runs against an in-memory store.".bright_black());

    let currency = config.currency.clone();
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(BroadcastNotifier::default());
    let mut events = notifier.subscribe();
    let service = WithdrawalService::new(store.clone(), store.clone(), store.clone(), config)
        .with_notifier(notifier);

    // Step 1: tenants and their fee configuration
    display::section("Step 1: Tenants");
    let merchant = Tenant::new("merchant@example.com").with_platform_fee(PlatformFee::fixed(dec!(50)));
    let operator = Tenant::operator("operator@example.com");
    store.add_tenant(merchant.clone()).await;
    store.add_tenant(operator.clone()).await;
    display::success(&format!("Merchant {} with a fixed fee of 50", merchant.id));
    display::success(&format!("Operator {}", operator.id));
    let stamp = || ProcessingStamp::now(operator.id.into());

    // Step 2: earnings under different fee rules
    display::section("Step 2: Earnings");
    let sales = [
        Transaction::success(merchant.id, dec!(500)),
        Transaction::success(merchant.id, dec!(2000)).with_fee_snapshot(PlatformFee::percentage(dec!(0.1))),
        Transaction::success(merchant.id, dec!(1000)).with_platform_fee(dec!(25)),
    ];
    for sale in sales {
        display::info(&format!("Sale of {}", display::money(sale.amount, &currency)));
        store.add_transaction(sale).await;
    }
    display::balance(&service.balance(&merchant.id).await?, &currency);

    // Step 3: request, review, payout
    display::section("Step 3: Withdrawal lifecycle");
    let request = service
        .request_withdrawal(&merchant.id, NewWithdrawal::new(dec!(1500)).with_notes("Monthly payout"))
        .await?;
    display::success(&format!("Requested {}", display::money(request.amount, &currency)));
    service.approve(&request.id, stamp()).await?;
    display::success("Approved");
    service
        .process(
            &request.id,
            stamp().with_external_reference(Some("UTR-000123".to_string())),
        )
        .await?;
    display::success("Processed with reference UTR-000123");
    display::balance(&service.balance(&merchant.id).await?, &currency);

    // Step 4: guards
    display::section("Step 4: Guards");
    match service
        .request_withdrawal(&merchant.id, NewWithdrawal::new(dec!(5000)))
        .await
    {
        Err(LedgerError::InsufficientBalance { available, .. }) => display::success(&format!(
            "Oversized request refused, only {} available",
            display::money(available, &currency)
        )),
        other => display::error(&format!("Unexpected outcome: {:?}", other)),
    }
    match service.process(&request.id, stamp()).await {
        Err(e @ LedgerError::InvalidStateTransition { .. }) => {
            display::success(&format!("Replayed payout refused: {}", e))
        }
        other => display::error(&format!("Unexpected outcome: {:?}", other)),
    }

    // Step 5: direct payout by the operator
    display::section("Step 5: Direct withdrawal");
    let direct = service
        .direct_withdrawal(
            operator.id.into(),
            DirectWithdrawal::new(merchant.id, dec!(200)).with_notes("Chargeback reversal"),
        )
        .await?;
    display::withdrawal(&direct, &currency);
    println!();
    display::balance(&service.balance(&merchant.id).await?, &currency);

    // Step 6: what subscribers saw
    display::section("Step 6: Notifications");
    loop {
        match events.try_recv() {
            Ok(event) => display::info(&describe(&event)),
            Err(TryRecvError::Lagged(skipped)) => {
                display::info(&format!("{} events dropped", skipped));
            }
            Err(_) => break,
        }
    }

    let dashboard = service.dashboard().await?;
    display::section("Dashboard");
    display::labeled("Awaiting review", &dashboard.pending_count.to_string());
    display::status_table(&dashboard.by_status, &currency);
    println!();

    Ok(())
}

fn describe(event: &WithdrawalEvent) -> String {
    match event {
        WithdrawalEvent::Requested { withdrawal_id, amount, .. } => {
            format!("{} requested ({})", withdrawal_id, amount)
        }
        WithdrawalEvent::Transitioned { withdrawal_id, from, to, .. } => {
            format!("{} {} → {}", withdrawal_id, from, to)
        }
        WithdrawalEvent::DirectWithdrawal { withdrawal_id, amount, .. } => {
            format!("{} paid out directly ({})", withdrawal_id, amount)
        }
    }
}
