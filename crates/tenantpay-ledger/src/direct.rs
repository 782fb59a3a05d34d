//! Direct Withdrawal Path
//!
//! Operator-initiated withdrawals that skip review and land in `processed`.
//! Subject to the same balance guard as approve and process.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use tenantpay_types::{
    LedgerError, LedgerResult, OperatorId, PaymentMethod, ProcessingStamp, TenantId,
    WithdrawalRequest,
};

use crate::notify::WithdrawalEvent;
use crate::service::{validate_amount, WithdrawalService};

/// Operator input for a direct withdrawal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectWithdrawal {
    pub tenant_id: TenantId,
    pub amount: Decimal,
    /// Defaults to bank transfer
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub external_reference: Option<String>,
}

impl DirectWithdrawal {
    pub fn new(tenant_id: TenantId, amount: Decimal) -> Self {
        Self {
            tenant_id,
            amount,
            payment_method: None,
            notes: None,
            external_reference: None,
        }
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_external_reference(mut self, reference: impl Into<String>) -> Self {
        self.external_reference = Some(reference.into());
        self
    }
}

impl WithdrawalService {
    /// Create an already-processed withdrawal on behalf of a tenant
    #[instrument(skip(self, input), fields(tenant = %input.tenant_id, amount = %input.amount))]
    pub async fn direct_withdrawal(
        &self,
        operator: OperatorId,
        input: DirectWithdrawal,
    ) -> LedgerResult<WithdrawalRequest> {
        validate_amount(input.amount)?;

        let tenant = self
            .tenants
            .find_tenant(&input.tenant_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Tenant", input.tenant_id))?;
        if tenant.is_operator() {
            return Err(LedgerError::validation(
                "Cannot withdraw from a platform operator account",
            ));
        }

        let scope = self.withdrawals.lock_tenant(&tenant.id).await?;
        let balance = self.covering_balance(scope.as_ref(), input.amount).await?;

        let stamp = ProcessingStamp::now(operator)
            .with_notes(input.notes)
            .with_external_reference(input.external_reference);
        let request = WithdrawalRequest::direct(
            tenant.id,
            input.amount,
            input.payment_method.unwrap_or(PaymentMethod::BankTransfer),
            balance.remaining_net_earned,
            Some(format!("Direct withdrawal by operator {}", operator)),
            stamp,
        );
        scope.insert(&request).await?;
        scope.commit().await?;
        drop(scope);

        info!(
            withdrawal = %request.id,
            processed_by = %operator,
            "Direct withdrawal committed"
        );
        self.emit(WithdrawalEvent::direct(&request, operator)).await;
        Ok(request)
    }
}
