//! Payment transactions
//!
//! Transactions are created by the payment processor. This crate only reads
//! them, except for back-filling derived fee fields.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{PlatformFee, TenantId, TransactionId};

/// Status of a payment transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    /// The successful-completion marker; the only status counted as revenue
    Success,
    Failed,
    Expired,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            "EXPIRED" => Ok(Self::Expired),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

/// A completed (or attempted) customer payment owned by a tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub tenant_id: TenantId,
    /// Gross amount paid by the customer
    pub amount: Decimal,
    pub status: TransactionStatus,
    /// Already-derived net amount (highest precedence when non-negative)
    pub net_amount: Option<Decimal>,
    /// Explicit fee charged on this transaction
    pub platform_fee: Option<Decimal>,
    /// Tenant fee captured when the transaction was recorded
    pub tenant_fee_snapshot: Option<PlatformFee>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a transaction with no fee fields set
    pub fn new(tenant_id: TenantId, amount: Decimal, status: TransactionStatus) -> Self {
        Self {
            id: TransactionId::new(),
            tenant_id,
            amount,
            status,
            net_amount: None,
            platform_fee: None,
            tenant_fee_snapshot: None,
            created_at: Utc::now(),
        }
    }

    /// Shorthand for a successful transaction
    pub fn success(tenant_id: TenantId, amount: Decimal) -> Self {
        Self::new(tenant_id, amount, TransactionStatus::Success)
    }

    pub fn with_net_amount(mut self, net: Decimal) -> Self {
        self.net_amount = Some(net);
        self
    }

    pub fn with_platform_fee(mut self, fee: Decimal) -> Self {
        self.platform_fee = Some(fee);
        self
    }

    pub fn with_fee_snapshot(mut self, fee: PlatformFee) -> Self {
        self.tenant_fee_snapshot = Some(fee);
        self
    }

    pub fn is_successful(&self) -> bool {
        self.status == TransactionStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_parse() {
        assert_eq!("SUCCESS".parse::<TransactionStatus>(), Ok(TransactionStatus::Success));
        assert_eq!("success".parse::<TransactionStatus>(), Ok(TransactionStatus::Success));
        assert!("DONE".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn test_only_success_is_successful() {
        let tenant = TenantId::new();
        assert!(Transaction::success(tenant, dec!(10)).is_successful());
        assert!(!Transaction::new(tenant, dec!(10), TransactionStatus::Pending).is_successful());
        assert!(!Transaction::new(tenant, dec!(10), TransactionStatus::Failed).is_successful());
    }

    #[test]
    fn test_builder_sets_fee_fields() {
        let tx = Transaction::success(TenantId::new(), dec!(100))
            .with_net_amount(dec!(90))
            .with_platform_fee(dec!(10))
            .with_fee_snapshot(PlatformFee::fixed(dec!(10)));
        assert_eq!(tx.net_amount, Some(dec!(90)));
        assert_eq!(tx.platform_fee, Some(dec!(10)));
        assert!(tx.tenant_fee_snapshot.is_some());
    }
}
