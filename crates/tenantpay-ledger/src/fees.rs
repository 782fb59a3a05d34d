//! Fee Resolver
//!
//! Turns a transaction's gross amount into the amount the tenant actually
//! earned. The first matching rule wins:
//!
//! | # | Rule          | Condition                          | Net                     |
//! |---|---------------|------------------------------------|-------------------------|
//! | 1 | StoredNet     | `net_amount >= 0`                  | `net_amount` verbatim   |
//! | 2 | ExplicitFee   | `platform_fee > 0`                 | `gross - fee`           |
//! | 3 | FeeSnapshot   | snapshot fee positive              | fixed or rate of gross  |
//! | 4 | TenantConfig  | tenant's current fee positive      | fixed or rate of gross  |
//! | 5 | DefaultRate   | always                             | `gross - gross * 2.9%`  |
//!
//! Computed fees and nets are rounded to [`CURRENCY_SCALE`] places, half
//! away from zero, the way the money columns store them. The net is floored
//! at zero. The chain is total: no input shape fails.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use tenantpay_types::{PlatformFee, Transaction};

/// Fallback rate when nothing else applies (2.9%)
pub const DEFAULT_FEE_RATE: Decimal = dec!(0.029);

/// Decimal places of every stored money amount
pub const CURRENCY_SCALE: u32 = 2;

/// Round to the currency scale, half away from zero
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Which precedence rule produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeRule {
    StoredNet,
    ExplicitFee,
    FeeSnapshot,
    TenantConfig,
    DefaultRate,
}

/// Outcome of resolving one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeResolution {
    pub gross: Decimal,
    /// Fee implied by the winning rule, before flooring the net
    pub fee: Decimal,
    /// Net earned, never negative
    pub net: Decimal,
    pub rule: FeeRule,
}

impl FeeResolution {
    fn from_fee(gross: Decimal, fee: Decimal, rule: FeeRule) -> Self {
        let fee = round_currency(fee);
        Self {
            gross,
            fee,
            net: round_currency((gross - fee).max(Decimal::ZERO)),
            rule,
        }
    }
}

/// Pure fee resolution over a transaction and its tenant's current fee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeResolver {
    default_rate: Decimal,
}

impl FeeResolver {
    pub fn new(default_rate: Decimal) -> Self {
        Self { default_rate }
    }

    pub fn default_rate(&self) -> Decimal {
        self.default_rate
    }

    /// Net earned on `tx`, floored at zero
    pub fn resolve_net_earned(&self, tx: &Transaction, tenant_fee: Option<&PlatformFee>) -> Decimal {
        self.resolve(tx, tenant_fee).net
    }

    /// Run the full precedence chain
    pub fn resolve(&self, tx: &Transaction, tenant_fee: Option<&PlatformFee>) -> FeeResolution {
        let gross = tx.amount;

        if let Some(net) = tx.net_amount.filter(|net| *net >= Decimal::ZERO) {
            return FeeResolution {
                gross,
                fee: gross - net,
                net,
                rule: FeeRule::StoredNet,
            };
        }

        if let Some(fee) = tx.platform_fee.filter(|fee| *fee > Decimal::ZERO) {
            return FeeResolution::from_fee(gross, fee, FeeRule::ExplicitFee);
        }

        self.resolve_from_config(tx, tenant_fee)
    }

    /// Resolve ignoring derived values already stored on the transaction.
    ///
    /// Used when back-filling, so a stale stored net or fee cannot shadow
    /// the configuration it should be recomputed from.
    pub fn resolve_from_config(
        &self,
        tx: &Transaction,
        tenant_fee: Option<&PlatformFee>,
    ) -> FeeResolution {
        let gross = tx.amount;

        if let Some(snapshot) = tx.tenant_fee_snapshot.filter(PlatformFee::is_positive) {
            return FeeResolution::from_fee(gross, snapshot.fee_for(gross), FeeRule::FeeSnapshot);
        }

        if let Some(current) = tenant_fee.filter(|fee| fee.is_positive()) {
            return FeeResolution::from_fee(gross, current.fee_for(gross), FeeRule::TenantConfig);
        }

        FeeResolution::from_fee(gross, gross * self.default_rate, FeeRule::DefaultRate)
    }
}

impl Default for FeeResolver {
    fn default() -> Self {
        Self::new(DEFAULT_FEE_RATE)
    }
}
