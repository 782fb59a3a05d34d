//! Repository implementations

mod scope;
mod tenant;
mod transaction;
mod withdrawal;

pub use scope::PgCommitScope;
pub use tenant::TenantRepo;
pub use transaction::TransactionRepo;
pub use withdrawal::WithdrawalRepo;
