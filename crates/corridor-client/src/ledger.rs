//! Ledger network contract consumed by the orchestrator.

use std::fmt;

use async_trait::async_trait;
use corridor_types::{AccountAddress, Drops, ErrorKind, SubmissionResult, TransactionTemplate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::{classify_engine_result, classify_message};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerNetwork {
    #[default]
    Testnet,
    Mainnet,
    Devnet,
}

impl LedgerNetwork {
    /// Unknown names fall back to testnet.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Self::Mainnet,
            "devnet" => Self::Devnet,
            _ => Self::Testnet,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet",
            Self::Devnet => "devnet",
        }
    }

    pub const fn explorer_url(self) -> &'static str {
        match self {
            Self::Testnet => "https://testnet.xrpl.org/transactions",
            Self::Mainnet => "https://xrpl.org/transactions",
            Self::Devnet => "https://devnet.xrpl.org/transactions",
        }
    }

    pub fn explorer_tx_url(self, hash: impl fmt::Display) -> String {
        format!("{}/{hash}", self.explorer_url())
    }
}

impl fmt::Display for LedgerNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub account: AccountAddress,
    pub balance: Drops,
    pub sequence: u32,
}

/// Fields the ledger fills in before a template can be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutofillFields {
    pub sequence: u32,
    pub fee: Drops,
    pub last_ledger_sequence: u32,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("account {0} not found on ledger")]
    AccountNotFound(AccountAddress),
    #[error("ledger returned {code}: {message}")]
    Engine { code: String, message: String },
    #[error("ledger request timed out")]
    Timeout,
    #[error("ledger network error: {0}")]
    Network(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountNotFound(_) => ErrorKind::AccountNotFunded,
            Self::Engine { code, message } => {
                classify_engine_result(code).unwrap_or_else(|| classify_message(message))
            }
            Self::Timeout => ErrorKind::NetworkError,
            Self::Network(message) => classify_message(message),
        }
    }
}

/// Ledger operations the orchestrator needs. Implementations talk to a real
/// ledger server or, in tests, to an in-memory ledger.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn account_info(&self, account: &AccountAddress) -> Result<AccountInfo, LedgerError>;

    async fn autofill(&self, account: &AccountAddress) -> Result<AutofillFields, LedgerError>;

    /// Submits a signed transaction and waits for it to be validated or rejected.
    async fn submit_and_wait(
        &self,
        tx: &TransactionTemplate,
    ) -> Result<SubmissionResult, LedgerError>;

    async fn validated_ledger_index(&self) -> Result<u32, LedgerError>;
}

#[cfg(test)]
mod tests {
    use corridor_types::{AccountAddress, ErrorKind};

    use super::{LedgerError, LedgerNetwork};

    #[test]
    fn network_names_and_explorer_urls() {
        assert_eq!(LedgerNetwork::from_name("MAINNET"), LedgerNetwork::Mainnet);
        assert_eq!(LedgerNetwork::from_name("devnet"), LedgerNetwork::Devnet);
        assert_eq!(LedgerNetwork::from_name("moonnet"), LedgerNetwork::Testnet);
        assert_eq!(
            LedgerNetwork::Testnet.explorer_tx_url("ABCD"),
            "https://testnet.xrpl.org/transactions/ABCD"
        );
        assert_eq!(
            LedgerNetwork::Devnet.explorer_tx_url("EF"),
            "https://devnet.xrpl.org/transactions/EF"
        );
    }

    #[test]
    fn error_kinds() {
        let addr = AccountAddress::parse("rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe").unwrap();
        assert_eq!(LedgerError::AccountNotFound(addr).kind(), ErrorKind::AccountNotFunded);
        assert_eq!(
            LedgerError::Engine {
                code: "tefPAST_SEQ".into(),
                message: "past".into()
            }
            .kind(),
            ErrorKind::SequenceOrPreparationError
        );
        assert_eq!(LedgerError::Timeout.kind(), ErrorKind::NetworkError);
        assert_eq!(
            LedgerError::Network("transaction dropped: LastLedgerSequence exceeded".into()).kind(),
            ErrorKind::Expired
        );
        assert_eq!(LedgerError::Network("connection reset".into()).kind(), ErrorKind::NetworkError);
    }
}
