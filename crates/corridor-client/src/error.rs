use corridor_codec::CodecError;
use corridor_types::{AccountAddress, ErrorKind, ValidationError};
use thiserror::Error;

use crate::{
    adapter::AdapterError, api::ApiError, ledger::LedgerError, session::SessionError,
    tx_builder::TxBuilderError,
};

/// Top-level error for orchestrated flows. Every variant projects onto the
/// closed [`ErrorKind`] taxonomy through [`CorridorError::kind`].
#[derive(Debug, Error)]
pub enum CorridorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Builder(#[from] TxBuilderError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("transaction must be signed by {expected}, but the wallet is connected as {connected}")]
    WrongAccount {
        expected: AccountAddress,
        connected: AccountAddress,
    },
    #[error("transaction expired: last ledger sequence {last_ledger_sequence}, validated ledger {validated}")]
    Expired {
        last_ledger_sequence: u32,
        validated: u32,
    },
}

impl CorridorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::InvalidInput,
            Self::Codec(err) => err.kind(),
            Self::Builder(err) => err.kind(),
            Self::Adapter(err) => err.kind(),
            Self::Session(err) => err.kind(),
            Self::Ledger(err) => err.kind(),
            Self::Api(err) => err.kind(),
            Self::WrongAccount { .. } => ErrorKind::WrongAccount,
            Self::Expired { .. } => ErrorKind::Expired,
        }
    }

    /// User-facing remedy for this failure.
    pub fn guidance(&self) -> &'static str {
        self.kind().guidance()
    }
}
