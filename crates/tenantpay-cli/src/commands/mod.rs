//! Command implementations

pub mod demo;
pub mod maintenance;
pub mod report;
pub mod withdrawal;

use serde::Serialize;

use tenantpay_ledger::{FeeBackfill, WithdrawalService};

/// Everything a database-backed command needs
pub struct Context {
    pub service: WithdrawalService,
    pub backfill: FeeBackfill,
    pub currency: String,
    pub json: bool,
}

impl Context {
    /// Print `value` as JSON when requested, otherwise run `human`
    pub fn output<T: Serialize>(&self, value: &T, human: impl FnOnce()) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            human();
        }
        Ok(())
    }
}
