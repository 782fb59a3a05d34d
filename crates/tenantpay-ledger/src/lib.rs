//! TenantPay Ledger - earnings balance and withdrawal lifecycle
//!
//! The ledger answers one question authoritatively: how much may a tenant
//! withdraw right now? It then moves withdrawal requests through an
//! auditable lifecycle without ever letting a commit overdraw.
//!
//! # Balance pipeline
//!
//! ```text
//! FeeResolver → NetRevenueAggregator ─┐
//!                                     ├→ BalanceCalculator
//! WithdrawalLedgerReader ─────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. `remaining = max(0, net_earned - withdrawn - pending)`, recomputed on
//!    every call; there is no running balance
//! 2. Only `SUCCESS` transactions contribute revenue
//! 3. Rejected and failed requests contribute to nothing
//! 4. Create, approve, process and direct withdrawals re-check the balance
//!    inside a per-tenant commit scope before writing
//! 5. Store failures surface as `DataAccess`, never as a zero balance

pub mod config;
pub mod fees;
pub mod store;
pub mod revenue;
pub mod reader;
pub mod balance;
pub mod notify;
pub mod service;
pub mod direct;
pub mod reports;
pub mod backfill;
pub mod memory;

pub use config::LedgerConfig;
pub use fees::{round_currency, FeeResolution, FeeResolver, FeeRule, CURRENCY_SCALE, DEFAULT_FEE_RATE};
pub use store::{
    CommitScope, Page, PageRequest, StatusSummary, TenantDirectory, TenantWithdrawalSummary,
    TransactionStore, WithdrawalFilter, WithdrawalStore,
};
pub use revenue::NetRevenueAggregator;
pub use reader::{LedgerTotals, WithdrawalLedgerReader};
pub use balance::{Balance, BalanceCalculator};
pub use notify::{BroadcastNotifier, NoopNotifier, NotifyError, WithdrawalEvent, WithdrawalNotifier};
pub use service::{NewWithdrawal, WithdrawalService};
pub use direct::DirectWithdrawal;
pub use reports::{TenantWithdrawalProfile, WithdrawalDashboard, WithdrawalStatistics};
pub use backfill::{BackfillFailure, BackfillReport, FeeBackfill};
pub use memory::MemoryStore;

pub use tenantpay_types::{LedgerError, LedgerResult};
