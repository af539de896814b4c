//! Corridor client library.
//!
//! This crate exposes:
//! - the wallet adapter seam (`WalletAdapter`) and the registry that selects adapters by id,
//! - the wallet session state machine (`WalletSessionManager`) with connect timeout and stale-attempt guard,
//! - transaction construction (`TxBuilder`) for trust-line grants and memo-carrying payments,
//! - immediate and deferred submission (`SubmissionOrchestrator`) against a `LedgerClient`,
//! - the credit/liquidity HTTP client (`CorridorApiClient`).

pub mod adapter;
pub mod api;
pub mod classify;
pub mod config;
pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod session;
pub mod tx_builder;

pub use adapter::{
    AdapterCapabilities, AdapterError, AdapterEvent, AdapterId, AdapterRegistry, WalletAdapter,
};
pub use api::{
    ApiError, Bank, BankRegistration, BankRegistrationResponse, CorridorApiClient, CreditFactors,
    CreditScore, CredentialIssueResponse, FinishEscrowResponse, HealthStatus, LiquidityRequest,
    LiquidityRequestResponse, MatchedBank, Payment, ProofVerificationResponse,
};
pub use classify::{classify_engine_result, classify_message, classify_submission};
pub use config::{AdapterRegistryConfig, ApiConfig, ClientConfig, SessionConfig};
pub use error::CorridorError;
pub use ledger::{AccountInfo, AutofillFields, LedgerClient, LedgerError, LedgerNetwork};
pub use orchestrator::{prepare_trust_line, prepare_value_payment, Dispatch, SubmissionOrchestrator};
pub use session::{ConnectOutcome, SessionError, SessionState, WalletSession, WalletSessionManager};
pub use tx_builder::{build_trust_line_grant, build_value_payment, TxBuilder, TxBuilderError};
