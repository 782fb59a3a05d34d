//! Error types for the tenant ledger
//!
//! Every error carries enough structure for the caller to render a precise
//! message. None of them is ever swallowed.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{WithdrawalAction, WithdrawalStatus};

/// Result type for ledger operations
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Ledger error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// A store was unreachable or returned inconsistent data.
    /// The balance is unknown; never treat it as zero.
    #[error("Data access error: {message}")]
    DataAccess { message: String },

    /// The amount exceeds the balance computed at commit time
    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: Decimal, requested: Decimal },

    /// The action is not legal from the request's current status
    #[error("Cannot {action} withdrawal {withdrawal_id} in status {from}")]
    InvalidStateTransition {
        withdrawal_id: String,
        from: WithdrawalStatus,
        action: WithdrawalAction,
    },

    /// Tenant or withdrawal request does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Malformed input (non-positive amount, operator target, ...)
    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl LedgerError {
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess { message: message.into() }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    /// The available balance carried by `InsufficientBalance`
    pub fn available_balance(&self) -> Option<Decimal> {
        match self {
            Self::InsufficientBalance { available, .. } => Some(*available),
            _ => None,
        }
    }

    /// Whether retrying without caller correction could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::DataAccess { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_balance_message() {
        let err = LedgerError::InsufficientBalance {
            available: dec!(300),
            requested: dec!(350),
        };
        assert_eq!(err.available_balance(), Some(dec!(300)));
        assert_eq!(
            err.to_string(),
            "Insufficient balance: available 300, requested 350"
        );
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = LedgerError::InvalidStateTransition {
            withdrawal_id: "wd_1".to_string(),
            from: WithdrawalStatus::Pending,
            action: WithdrawalAction::Process,
        };
        assert_eq!(err.to_string(), "Cannot process withdrawal wd_1 in status pending");
    }

    #[test]
    fn test_only_data_access_is_transient() {
        assert!(LedgerError::data_access("down").is_transient());
        assert!(!LedgerError::validation("bad").is_transient());
        assert!(!LedgerError::not_found("Tenant", "t").is_transient());
    }
}
