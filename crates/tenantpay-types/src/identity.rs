//! Typed identifiers
//!
//! Every id is a UUID behind its own newtype. Rendered with a short prefix
//! (`tenant_…`, `wd_…`) and parsed with or without it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident => $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bare = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Uuid::parse_str(bare).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }
    };
}

uuid_id!(
    /// An earning account; operators are tenants with the operator role
    TenantId => "tenant"
);
uuid_id!(
    /// The operator who approved, rejected, processed or failed a request
    OperatorId => "op"
);
uuid_id!(
    /// A payment transaction
    TransactionId => "txn"
);
uuid_id!(WithdrawalId => "wd");

impl From<TenantId> for OperatorId {
    /// Operators are tenant records with the operator role.
    fn from(id: TenantId) -> Self {
        Self(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_id_display() {
        let id = TenantId::new();
        assert!(id.to_string().starts_with("tenant_"));
    }

    #[test]
    fn test_id_parsing() {
        let id = WithdrawalId::new();
        let parsed: WithdrawalId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);

        let bare: WithdrawalId = id.0.to_string().parse().unwrap();
        assert_eq!(id, bare);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("tenant_not-a-uuid".parse::<TenantId>().is_err());
    }

    #[test]
    fn test_operator_from_tenant_keeps_uuid() {
        let tenant = TenantId::new();
        let operator = OperatorId::from(tenant);
        assert_eq!(operator.as_uuid(), tenant.as_uuid());
    }
}
