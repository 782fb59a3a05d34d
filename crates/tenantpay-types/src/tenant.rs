//! Tenant accounts
//!
//! A tenant earns commission on customer transactions and withdraws it.
//! Platform operators live in the same directory with the `Operator` role
//! and can never be the target of a withdrawal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PlatformFee, TenantId};

/// Role of an account in the tenant directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantRole {
    /// Platform operator (privileged, never withdraws)
    Operator,
    /// Regular earning tenant
    Tenant,
}

impl TenantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Tenant => "tenant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "operator" | "superadmin" => Some(Self::Operator),
            "tenant" | "admin" => Some(Self::Tenant),
            _ => None,
        }
    }
}

impl Default for TenantRole {
    fn default() -> Self {
        Self::Tenant
    }
}

/// A tenant account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub email: String,
    pub role: TenantRole,
    /// Deactivated tenants are kept for the audit trail, never deleted
    pub is_active: bool,
    /// Current platform fee; `None` when unset
    pub platform_fee: Option<PlatformFee>,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    /// Create an active earning tenant with no fee configured
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: TenantId::new(),
            email: email.into(),
            role: TenantRole::Tenant,
            is_active: true,
            platform_fee: None,
            created_at: Utc::now(),
        }
    }

    /// Create a platform operator account
    pub fn operator(email: impl Into<String>) -> Self {
        Self {
            role: TenantRole::Operator,
            ..Self::new(email)
        }
    }

    pub fn with_platform_fee(mut self, fee: PlatformFee) -> Self {
        self.platform_fee = Some(fee);
        self
    }

    pub fn is_operator(&self) -> bool {
        self.role == TenantRole::Operator
    }
}
