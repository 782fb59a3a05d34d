//! Ledger configuration

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::fees::DEFAULT_FEE_RATE;

/// Tunables for fee resolution and operator reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Rate applied when no fee is recorded or configured (0.029 = 2.9%)
    #[serde(default = "default_fee_rate")]
    pub default_fee_rate: Decimal,

    /// Display currency code
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Recent requests shown on the operator dashboard
    #[serde(default = "default_recent_limit")]
    pub recent_limit: u32,

    /// Requests shown in a tenant withdrawal profile
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// Maximum transactions re-resolved by one bulk back-fill
    #[serde(default = "default_backfill_batch_limit")]
    pub backfill_batch_limit: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_fee_rate: default_fee_rate(),
            currency: default_currency(),
            recent_limit: default_recent_limit(),
            history_limit: default_history_limit(),
            backfill_batch_limit: default_backfill_batch_limit(),
        }
    }
}

fn default_fee_rate() -> Decimal {
    DEFAULT_FEE_RATE
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_recent_limit() -> u32 {
    10
}

fn default_history_limit() -> u32 {
    20
}

fn default_backfill_batch_limit() -> usize {
    100
}
