//! Balance and withdrawal lifecycle commands

use rust_decimal::Decimal;

use tenantpay_ledger::{DirectWithdrawal, NewWithdrawal};
use tenantpay_types::{
    OperatorId, PaymentMethod, ProcessingStamp, TenantId, WithdrawalAction, WithdrawalId,
};

use super::Context;
use crate::display;

pub async fn balance(ctx: &Context, tenant: TenantId) -> anyhow::Result<()> {
    let balance = ctx.service.balance(&tenant).await?;
    ctx.output(&balance, || {
        display::section(&format!("Balance for {}", tenant));
        display::balance(&balance, &ctx.currency);
    })
}

pub async fn request(
    ctx: &Context,
    tenant: TenantId,
    amount: Decimal,
    notes: Option<String>,
) -> anyhow::Result<()> {
    let request = ctx
        .service
        .request_withdrawal(&tenant, NewWithdrawal { amount, notes })
        .await?;
    ctx.output(&request, || {
        display::success("Withdrawal request submitted");
        display::withdrawal(&request, &ctx.currency);
    })
}

pub async fn apply(
    ctx: &Context,
    action: WithdrawalAction,
    id: WithdrawalId,
    operator: OperatorId,
    notes: Option<String>,
    reference: Option<String>,
) -> anyhow::Result<()> {
    let stamp = ProcessingStamp::now(operator)
        .with_notes(notes)
        .with_external_reference(reference);
    let request = ctx.service.apply(&id, action, stamp).await?;
    ctx.output(&request, || {
        display::success(&format!("Withdrawal {} is now {}", id, request.status));
        display::withdrawal(&request, &ctx.currency);
    })
}

pub async fn direct(
    ctx: &Context,
    operator: OperatorId,
    tenant: TenantId,
    amount: Decimal,
    method: Option<PaymentMethod>,
    notes: Option<String>,
    reference: Option<String>,
) -> anyhow::Result<()> {
    let input = DirectWithdrawal {
        tenant_id: tenant,
        amount,
        payment_method: method,
        notes,
        external_reference: reference,
    };
    let request = ctx.service.direct_withdrawal(operator, input).await?;
    ctx.output(&request, || {
        display::success("Direct withdrawal recorded");
        display::withdrawal(&request, &ctx.currency);
    })
}
