//! Database models - mapped from PostgreSQL tables

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use tenantpay_ledger::{StatusSummary, TenantWithdrawalSummary};
use tenantpay_types::{
    OperatorId, PlatformFee, Tenant, TenantRole, Transaction, TransactionStatus,
    WithdrawalRequest, WithdrawalStatus,
};

use crate::{DbError, DbResult};

// ============================================================================
// Tenant Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbTenant {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub platform_fee_kind: Option<String>,
    pub platform_fee_value: Option<Decimal>,
    pub legacy_platform_fee: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbTenant> for Tenant {
    type Error = DbError;

    fn try_from(row: DbTenant) -> DbResult<Self> {
        let role = TenantRole::parse(&row.role)
            .ok_or_else(|| DbError::Serialization(format!("unknown tenant role '{}'", row.role)))?;
        Ok(Tenant {
            id: row.id.into(),
            email: row.email,
            role,
            is_active: row.is_active,
            platform_fee: fee_from_columns(
                row.platform_fee_kind.as_deref(),
                row.platform_fee_value,
                row.legacy_platform_fee,
            )?,
            created_at: row.created_at,
        })
    }
}

// ============================================================================
// Transaction Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbTransaction {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub amount: Decimal,
    pub status: String,
    pub net_amount: Option<Decimal>,
    pub platform_fee: Option<Decimal>,
    pub fee_snapshot_kind: Option<String>,
    pub fee_snapshot_value: Option<Decimal>,
    pub legacy_fee_snapshot: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl DbTransaction {
    pub fn from_domain(tx: &Transaction) -> Self {
        Self {
            id: tx.id.0,
            tenant_id: tx.tenant_id.0,
            amount: tx.amount,
            status: tx.status.as_str().to_string(),
            net_amount: tx.net_amount,
            platform_fee: tx.platform_fee,
            fee_snapshot_kind: tx.tenant_fee_snapshot.map(|f| f.kind().to_string()),
            fee_snapshot_value: tx.tenant_fee_snapshot.map(|f| f.value()),
            legacy_fee_snapshot: None,
            created_at: tx.created_at,
        }
    }
}

impl TryFrom<DbTransaction> for Transaction {
    type Error = DbError;

    fn try_from(row: DbTransaction) -> DbResult<Self> {
        let status: TransactionStatus = row.status.parse().map_err(DbError::Serialization)?;
        Ok(Transaction {
            id: row.id.into(),
            tenant_id: row.tenant_id.into(),
            amount: row.amount,
            status,
            net_amount: row.net_amount,
            platform_fee: row.platform_fee,
            tenant_fee_snapshot: fee_from_columns(
                row.fee_snapshot_kind.as_deref(),
                row.fee_snapshot_value,
                row.legacy_fee_snapshot,
            )?,
            created_at: row.created_at,
        })
    }
}

/// Typed fee columns win; otherwise the legacy number is translated
fn fee_from_columns(
    kind: Option<&str>,
    value: Option<Decimal>,
    legacy: Option<Decimal>,
) -> DbResult<Option<PlatformFee>> {
    match (kind, value) {
        (Some(kind), Some(value)) => PlatformFee::from_parts(kind, value)
            .map(Some)
            .ok_or_else(|| DbError::Serialization(format!("unknown platform fee kind '{}'", kind))),
        (Some(kind), None) => Err(DbError::Serialization(format!(
            "platform fee kind '{}' has no value",
            kind
        ))),
        (None, _) => Ok(legacy.and_then(PlatformFee::from_legacy)),
    }
}

// ============================================================================
// Withdrawal Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbWithdrawal {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub amount: Decimal,
    pub payment_method: String,
    pub status: String,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub available_balance: Decimal,
    pub tenant_notes: Option<String>,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processing_notes: Option<String>,
    pub external_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbWithdrawal {
    pub fn from_domain(request: &WithdrawalRequest) -> Self {
        Self {
            id: request.id.0,
            tenant_id: request.tenant_id.0,
            amount: request.amount,
            payment_method: request.payment_method.as_str().to_string(),
            status: request.status.as_str().to_string(),
            kind: request.kind.as_str().to_string(),
            available_balance: request.available_balance,
            tenant_notes: request.tenant_notes.clone(),
            processed_by: request.processed_by.map(|op| op.0),
            processed_at: request.processed_at,
            processing_notes: request.processing_notes.clone(),
            external_reference: request.external_reference.clone(),
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

impl TryFrom<DbWithdrawal> for WithdrawalRequest {
    type Error = DbError;

    fn try_from(row: DbWithdrawal) -> DbResult<Self> {
        Ok(WithdrawalRequest {
            id: row.id.into(),
            tenant_id: row.tenant_id.into(),
            amount: row.amount,
            payment_method: row.payment_method.parse().map_err(DbError::Serialization)?,
            status: row.status.parse().map_err(DbError::Serialization)?,
            kind: row.kind.parse().map_err(DbError::Serialization)?,
            available_balance: row.available_balance,
            tenant_notes: row.tenant_notes,
            processed_by: row.processed_by.map(OperatorId::from),
            processed_at: row.processed_at,
            processing_notes: row.processing_notes,
            external_reference: row.external_reference,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbStatusSummary {
    pub status: String,
    pub count: i64,
    pub amount: Decimal,
}

impl TryFrom<DbStatusSummary> for StatusSummary {
    type Error = DbError;

    fn try_from(row: DbStatusSummary) -> DbResult<Self> {
        let status: WithdrawalStatus = row.status.parse().map_err(DbError::Serialization)?;
        Ok(StatusSummary {
            status,
            count: u64::try_from(row.count).unwrap_or_default(),
            amount: row.amount,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbTenantSummary {
    pub tenant_id: Uuid,
    pub total_requests: i64,
    pub total_amount: Decimal,
    pub pending_amount: Decimal,
    pub completed_amount: Decimal,
}

impl From<DbTenantSummary> for TenantWithdrawalSummary {
    fn from(row: DbTenantSummary) -> Self {
        Self {
            tenant_id: row.tenant_id.into(),
            total_requests: u64::try_from(row.total_requests).unwrap_or_default(),
            total_amount: row.total_amount,
            pending_amount: row.pending_amount,
            completed_amount: row.completed_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tenantpay_types::{
        PaymentMethod, ProcessingStamp, TenantId, WithdrawalAction, WithdrawalKind,
    };

    fn tenant_row() -> DbTenant {
        DbTenant {
            id: Uuid::new_v4(),
            email: "merchant@example.com".to_string(),
            role: "admin".to_string(),
            is_active: true,
            platform_fee_kind: None,
            platform_fee_value: None,
            legacy_platform_fee: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_legacy_fee_translated_on_read() {
        let mut row = tenant_row();
        row.legacy_platform_fee = Some(dec!(50));
        let tenant = Tenant::try_from(row).unwrap();
        assert_eq!(tenant.platform_fee, Some(PlatformFee::fixed(dec!(50))));
        assert_eq!(tenant.role, TenantRole::Tenant);

        let mut row = tenant_row();
        row.legacy_platform_fee = Some(dec!(0.1));
        let tenant = Tenant::try_from(row).unwrap();
        assert_eq!(tenant.platform_fee, Some(PlatformFee::percentage(dec!(0.1))));

        let mut row = tenant_row();
        row.legacy_platform_fee = Some(Decimal::ZERO);
        assert_eq!(Tenant::try_from(row).unwrap().platform_fee, None);
    }

    #[test]
    fn test_typed_fee_wins_over_legacy() {
        let mut row = tenant_row();
        row.platform_fee_kind = Some("percentage".to_string());
        row.platform_fee_value = Some(dec!(0.05));
        row.legacy_platform_fee = Some(dec!(100));
        let tenant = Tenant::try_from(row).unwrap();
        assert_eq!(tenant.platform_fee, Some(PlatformFee::percentage(dec!(0.05))));
    }

    #[test]
    fn test_bad_rows_are_serialization_errors() {
        let mut row = tenant_row();
        row.role = "guest".to_string();
        assert!(matches!(Tenant::try_from(row), Err(DbError::Serialization(_))));

        let mut row = tenant_row();
        row.platform_fee_kind = Some("fixed".to_string());
        assert!(matches!(Tenant::try_from(row), Err(DbError::Serialization(_))));
    }

    #[test]
    fn test_transaction_status_read() {
        let tx = Transaction::success(TenantId::new(), dec!(100))
            .with_fee_snapshot(PlatformFee::fixed(dec!(5)));
        let mut row = DbTransaction::from_domain(&tx);
        assert_eq!(row.status, "SUCCESS");

        row.status = "success".to_string();
        let read = Transaction::try_from(row).unwrap();
        assert!(read.is_successful());
        assert_eq!(read.tenant_fee_snapshot, Some(PlatformFee::fixed(dec!(5))));
    }

    #[test]
    fn test_withdrawal_row_preserves_stamp() {
        let mut request = WithdrawalRequest::pending(
            TenantId::new(),
            dec!(250),
            PaymentMethod::Upi,
            dec!(900),
            Some("monthly payout".to_string()),
        );
        let stamp = ProcessingStamp::now(OperatorId::new())
            .with_external_reference(Some("UTR-9".to_string()));
        request.apply(WithdrawalAction::Approve, &stamp);

        let row = DbWithdrawal::from_domain(&request);
        assert_eq!(row.status, "approved");
        assert_eq!(row.kind, "request");
        assert_eq!(row.payment_method, "upi");

        let read = WithdrawalRequest::try_from(row).unwrap();
        assert_eq!(read.processed_by, Some(stamp.processed_by));
        assert_eq!(read.kind, WithdrawalKind::Request);
        assert_eq!(read.external_reference.as_deref(), Some("UTR-9"));
    }

    #[test]
    fn test_status_summary_rejects_unknown_status() {
        let row = DbStatusSummary {
            status: "cancelled".to_string(),
            count: 1,
            amount: dec!(1),
        };
        assert!(StatusSummary::try_from(row).is_err());
    }
}
