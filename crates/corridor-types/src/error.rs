//! Validation errors and the closed failure taxonomy surfaced to callers.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid length for {kind}: expected {expected}, got {actual}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("invalid ledger address `{0}`")]
    InvalidAddress(String),
    #[error("invalid currency code `{0}`: expected 3 alphanumeric characters or 40 hex digits")]
    InvalidCurrency(String),
    #[error("invalid amount `{value}`: {reason}")]
    InvalidAmount { value: String, reason: &'static str },
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

/// Every failure the orchestration layer reports collapses onto one of these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    AdapterUnavailable,
    UserRejected,
    AccountNotFunded,
    SequenceOrPreparationError,
    WrongAccount,
    MalformedMemo,
    InvalidLink,
    Expired,
    NetworkError,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::AdapterUnavailable => "adapter_unavailable",
            Self::UserRejected => "user_rejected",
            Self::AccountNotFunded => "account_not_funded",
            Self::SequenceOrPreparationError => "sequence_or_preparation_error",
            Self::WrongAccount => "wrong_account",
            Self::MalformedMemo => "malformed_memo",
            Self::InvalidLink => "invalid_link",
            Self::Expired => "expired",
            Self::NetworkError => "network_error",
        }
    }

    /// User-facing next step for this kind of failure.
    pub const fn guidance(self) -> &'static str {
        match self {
            Self::InvalidInput => "correct the highlighted input and try again",
            Self::AdapterUnavailable => "install or unlock a supported wallet, then connect",
            Self::UserRejected => "the request was declined in the wallet; start it again to retry",
            Self::AccountNotFunded => {
                "fund the account with XRP (e.g. from the testnet faucet), then try again"
            }
            Self::SequenceOrPreparationError => "request a new prepared transaction",
            Self::WrongAccount => "switch the wallet to the account this transaction was prepared for",
            Self::MalformedMemo => "the transaction metadata is corrupt and was not accepted",
            Self::InvalidLink => "the link is invalid; request a new one from the agent",
            Self::Expired => "the transaction expired; request a new prepared transaction",
            Self::NetworkError => "check connectivity and retry",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
