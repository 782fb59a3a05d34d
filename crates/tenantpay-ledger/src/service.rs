//! Withdrawal Request State Machine
//!
//! Owns creation and every guarded transition of a withdrawal request.
//! Balance-committing writes (create, approve, process) run inside the
//! store's per-tenant commit scope:
//!
//! ```text
//! lock_tenant → recompute balance → amount ≤ remaining → conditional write → commit
//! ```
//!
//! Approve and process check the request's amount against the remaining
//! balance as it stands, with the request's own reservation still counted.
//! Reject and fail commit no funds and rely on the conditional write alone.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use tenantpay_types::{
    LedgerError, LedgerResult, PaymentMethod, ProcessingStamp, TenantId, WithdrawalAction,
    WithdrawalId, WithdrawalRequest,
};

use crate::balance::{Balance, BalanceCalculator};
use crate::config::LedgerConfig;
use crate::fees::{FeeResolver, CURRENCY_SCALE};
use crate::notify::{NoopNotifier, WithdrawalEvent, WithdrawalNotifier};
use crate::store::{CommitScope, TenantDirectory, TransactionStore, WithdrawalStore};

/// A tenant's withdrawal submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWithdrawal {
    pub amount: Decimal,
    pub notes: Option<String>,
}

impl NewWithdrawal {
    pub fn new(amount: Decimal) -> Self {
        Self { amount, notes: None }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Entry point for balance queries and withdrawal lifecycle operations
#[derive(Clone)]
pub struct WithdrawalService {
    pub(crate) tenants: Arc<dyn TenantDirectory>,
    pub(crate) withdrawals: Arc<dyn WithdrawalStore>,
    pub(crate) balances: BalanceCalculator,
    pub(crate) notifier: Arc<dyn WithdrawalNotifier>,
    pub(crate) config: LedgerConfig,
}

impl WithdrawalService {
    pub fn new(
        tenants: Arc<dyn TenantDirectory>,
        transactions: Arc<dyn TransactionStore>,
        withdrawals: Arc<dyn WithdrawalStore>,
        config: LedgerConfig,
    ) -> Self {
        let resolver = FeeResolver::new(config.default_fee_rate);
        Self {
            balances: BalanceCalculator::new(
                tenants.clone(),
                transactions,
                withdrawals.clone(),
                resolver,
            ),
            tenants,
            withdrawals,
            notifier: Arc::new(NoopNotifier),
            config,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn WithdrawalNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Fresh balance for the tenant
    #[instrument(skip(self), fields(tenant = %tenant_id))]
    pub async fn balance(&self, tenant_id: &TenantId) -> LedgerResult<Balance> {
        self.balances.balance(tenant_id).await
    }

    /// Look up a request, failing with `NotFound`
    pub async fn find(&self, id: &WithdrawalId) -> LedgerResult<WithdrawalRequest> {
        self.withdrawals
            .find(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Withdrawal request", id))
    }

    /// Submit a tenant withdrawal; created `pending` if the balance allows
    #[instrument(skip(self, input), fields(tenant = %tenant_id, amount = %input.amount))]
    pub async fn request_withdrawal(
        &self,
        tenant_id: &TenantId,
        input: NewWithdrawal,
    ) -> LedgerResult<WithdrawalRequest> {
        validate_amount(input.amount)?;

        let scope = self.withdrawals.lock_tenant(tenant_id).await?;
        let balance = self.covering_balance(scope.as_ref(), input.amount).await?;

        let request = WithdrawalRequest::pending(
            *tenant_id,
            input.amount,
            PaymentMethod::Wallet,
            balance.remaining_net_earned,
            input.notes,
        );
        scope.insert(&request).await?;
        scope.commit().await?;
        drop(scope);

        info!(withdrawal = %request.id, "Withdrawal request created");
        self.emit(WithdrawalEvent::requested(&request)).await;
        Ok(request)
    }

    pub async fn approve(
        &self,
        id: &WithdrawalId,
        stamp: ProcessingStamp,
    ) -> LedgerResult<WithdrawalRequest> {
        self.apply(id, WithdrawalAction::Approve, stamp).await
    }

    pub async fn reject(
        &self,
        id: &WithdrawalId,
        stamp: ProcessingStamp,
    ) -> LedgerResult<WithdrawalRequest> {
        self.apply(id, WithdrawalAction::Reject, stamp).await
    }

    pub async fn process(
        &self,
        id: &WithdrawalId,
        stamp: ProcessingStamp,
    ) -> LedgerResult<WithdrawalRequest> {
        self.apply(id, WithdrawalAction::Process, stamp).await
    }

    pub async fn fail(
        &self,
        id: &WithdrawalId,
        stamp: ProcessingStamp,
    ) -> LedgerResult<WithdrawalRequest> {
        self.apply(id, WithdrawalAction::Fail, stamp).await
    }

    /// Run one operator action through its guards.
    ///
    /// An out-of-order action fails with `InvalidStateTransition` and
    /// writes nothing. Approve and process fail with `InsufficientBalance`
    /// and leave the request untouched when the fresh balance no longer
    /// covers it.
    #[instrument(skip(self, stamp), fields(withdrawal = %id, action = %action))]
    pub async fn apply(
        &self,
        id: &WithdrawalId,
        action: WithdrawalAction,
        stamp: ProcessingStamp,
    ) -> LedgerResult<WithdrawalRequest> {
        let request = self.find(id).await?;
        ensure_legal(&request, action)?;

        let updated = if action.commits_funds() {
            let scope = self.withdrawals.lock_tenant(&request.tenant_id).await?;

            // Re-read under the lock; a concurrent action may have won
            let request = scope
                .find(id)
                .await?
                .ok_or_else(|| LedgerError::not_found("Withdrawal request", id))?;
            ensure_legal(&request, action)?;

            self.covering_balance(scope.as_ref(), request.amount).await?;
            let updated = match scope.transition(id, action, &stamp).await? {
                Some(updated) => updated,
                None => {
                    let current = scope.find(id).await?.unwrap_or(request);
                    return Err(invalid_transition(&current, action));
                }
            };
            scope.commit().await?;
            updated
        } else {
            match self.withdrawals.transition(id, action, &stamp).await? {
                Some(updated) => updated,
                None => {
                    let current = self.find(id).await?;
                    return Err(invalid_transition(&current, action));
                }
            }
        };

        info!(
            tenant = %updated.tenant_id,
            amount = %updated.amount,
            from = %action.required_status(),
            to = %updated.status,
            processed_by = %stamp.processed_by,
            "Withdrawal transition committed"
        );
        self.emit(WithdrawalEvent::transitioned(&updated, action, stamp.processed_by))
            .await;
        Ok(updated)
    }

    /// Fresh balance inside `scope`, failing with `InsufficientBalance`
    /// unless `amount ≤ remaining_net_earned`
    pub(crate) async fn covering_balance(
        &self,
        scope: &dyn CommitScope,
        amount: Decimal,
    ) -> LedgerResult<Balance> {
        let balance = self.balances.balance_within(scope).await?;
        if amount > balance.remaining_net_earned {
            warn!(
                tenant = %scope.tenant_id(),
                available = %balance.remaining_net_earned,
                requested = %amount,
                "Balance does not cover withdrawal"
            );
            return Err(LedgerError::InsufficientBalance {
                available: balance.remaining_net_earned,
                requested: amount,
            });
        }
        Ok(balance)
    }

    /// Inform the notifier; failures never undo a committed write
    pub(crate) async fn emit(&self, event: WithdrawalEvent) {
        if let Err(e) = self.notifier.notify(&event).await {
            warn!(withdrawal = %event.withdrawal_id(), error = %e, "Withdrawal notification failed");
        }
    }
}

/// Positive and expressible in the currency's minor unit
pub(crate) fn validate_amount(amount: Decimal) -> LedgerResult<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation("Withdrawal amount must be greater than zero"));
    }
    if amount.normalize().scale() > CURRENCY_SCALE {
        return Err(LedgerError::validation(format!(
            "Withdrawal amount {} has more than {} decimal places",
            amount, CURRENCY_SCALE
        )));
    }
    Ok(())
}

fn ensure_legal(request: &WithdrawalRequest, action: WithdrawalAction) -> LedgerResult<()> {
    if request.can_apply(action) {
        Ok(())
    } else {
        Err(invalid_transition(request, action))
    }
}

fn invalid_transition(request: &WithdrawalRequest, action: WithdrawalAction) -> LedgerError {
    LedgerError::InvalidStateTransition {
        withdrawal_id: request.id.to_string(),
        from: request.status,
        action,
    }
}
