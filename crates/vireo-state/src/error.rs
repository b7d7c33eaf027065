//! State errors.

use thiserror::Error;

/// Errors produced by ledger reads and writes.
#[derive(Debug, Error)]
pub enum StateError {
    /// A debit exceeded the available balance.
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Balance arithmetic overflowed.
    #[error("amount overflow")]
    AmountOverflow,

    /// The storage backend failed or returned undecodable data.
    #[error("storage: {0}")]
    Storage(String),
}
