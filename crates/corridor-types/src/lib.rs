//! Shared domain types for the Corridor ledger orchestration layer.

pub mod error;
pub mod ids;
pub mod template;

pub use error::{ErrorKind, ValidationError};
pub use ids::{is_valid_address, AccountAddress, CurrencyCode, DecimalValue, Drops, TxHash};
pub use template::{
    IssuedAmount, Memo, SubmissionResult, TemplatePayload, TransactionKind, TransactionTemplate,
};
