//! TenantPay Types - Canonical domain types for the tenant earnings ledger
//!
//! This crate contains the foundational types shared by every other
//! tenantpay crate, with zero dependencies on them:
//!
//! - Identity types (TenantId, OperatorId, TransactionId, WithdrawalId)
//! - The `PlatformFee` tagged variant and its legacy numeric translation
//! - Tenants, payment transactions and withdrawal requests
//! - The ledger error taxonomy
//!
//! # Invariants
//!
//! 1. Currency values are `Decimal`, never floating point
//! 2. A transaction counts toward revenue only when its status is `SUCCESS`
//! 3. A withdrawal request is never deleted; its status only moves forward

pub mod identity;
pub mod fee;
pub mod tenant;
pub mod transaction;
pub mod withdrawal;
pub mod error;

pub use identity::*;
pub use fee::*;
pub use tenant::*;
pub use transaction::*;
pub use withdrawal::*;
pub use error::*;
