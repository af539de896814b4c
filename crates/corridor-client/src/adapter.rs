//! Wallet adapter contract and the registry of offered backends.

use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

use async_trait::async_trait;
use corridor_types::{AccountAddress, ErrorKind, SubmissionResult, TransactionTemplate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::{classify::classify_message, config::AdapterRegistryConfig, ledger::LedgerNetwork};

/// Closed set of supported wallet backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterId {
    /// Browser extension wallet.
    Crossmark,
    /// Mobile wallet, signed through a QR handoff.
    Xaman,
    /// Relay protocol for remote wallets.
    WalletConnect,
}

impl AdapterId {
    pub const ALL: [Self; 3] = [Self::Crossmark, Self::Xaman, Self::WalletConnect];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crossmark => "crossmark",
            Self::Xaman => "xaman",
            Self::WalletConnect => "walletconnect",
        }
    }
}

impl fmt::Display for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdapterId {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AdapterError::UnknownAdapter(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterCapabilities {
    pub display_name: String,
    /// Whether the backend reports a user cancelling the connect prompt. Backends
    /// that don't rely on the session manager's focus heuristic instead.
    pub reports_cancellation: bool,
}

/// Notifications pushed by an adapter after it connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    AccountChanged(AccountAddress),
    Disconnected,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("request rejected in wallet: {0}")]
    UserRejected(String),
    #[error("wallet unavailable: {0}")]
    Unavailable(String),
    #[error("wallet request failed: {0}")]
    Failed(String),
    #[error("unknown wallet adapter `{0}`")]
    UnknownAdapter(String),
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserRejected(_) => ErrorKind::UserRejected,
            Self::Unavailable(_) | Self::UnknownAdapter(_) => ErrorKind::AdapterUnavailable,
            Self::Failed(message) => classify_message(message),
        }
    }
}

/// Capability contract every wallet backend implements.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn id(&self) -> AdapterId;

    fn capabilities(&self) -> AdapterCapabilities;

    /// Prompts the user and resolves to the account they approved.
    async fn connect(&self) -> Result<AccountAddress, AdapterError>;

    /// Tears the connection down. Idempotent.
    async fn disconnect(&self);

    async fn sign_and_submit(
        &self,
        tx: &TransactionTemplate,
    ) -> Result<SubmissionResult, AdapterError>;

    /// Subscribes to account-change and disconnect notifications.
    fn subscribe(&self) -> broadcast::Receiver<AdapterEvent>;
}

/// Wallet backends keyed by id. Cheap to clone.
#[derive(Clone)]
pub struct AdapterRegistry {
    network: LedgerNetwork,
    offered: Vec<AdapterId>,
    adapters: HashMap<AdapterId, Arc<dyn WalletAdapter>>,
}

impl AdapterRegistry {
    pub fn new(config: &AdapterRegistryConfig) -> Self {
        let mut offered = vec![AdapterId::Crossmark];
        if config.xaman_api_key.is_some() {
            offered.push(AdapterId::Xaman);
        }
        if config.walletconnect_project_id.is_some() {
            offered.push(AdapterId::WalletConnect);
        }
        Self {
            network: config.network,
            offered,
            adapters: HashMap::new(),
        }
    }

    /// A testnet registry that offers every backend regardless of credentials.
    pub fn permissive() -> Self {
        Self {
            network: LedgerNetwork::default(),
            offered: AdapterId::ALL.to_vec(),
            adapters: HashMap::new(),
        }
    }

    /// Network the registered wallets are expected to sign for.
    pub fn network(&self) -> LedgerNetwork {
        self.network
    }

    /// Backends the configuration allows, in presentation order.
    pub fn offered(&self) -> &[AdapterId] {
        &self.offered
    }

    pub fn is_offered(&self, id: AdapterId) -> bool {
        self.offered.contains(&id)
    }

    /// Registers (or replaces) the adapter for its id.
    pub fn register(&mut self, adapter: Arc<dyn WalletAdapter>) -> Result<(), AdapterError> {
        let id = adapter.id();
        if !self.is_offered(id) {
            return Err(AdapterError::Unavailable(format!(
                "{id} is not configured for this deployment"
            )));
        }
        self.adapters.insert(id, adapter);
        Ok(())
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn WalletAdapter>) -> Result<Self, AdapterError> {
        self.register(adapter)?;
        Ok(self)
    }

    pub fn get(&self, id: AdapterId) -> Result<Arc<dyn WalletAdapter>, AdapterError> {
        self.adapters
            .get(&id)
            .cloned()
            .ok_or_else(|| AdapterError::Unavailable(format!("{id} is not installed")))
    }

    /// Registered adapters, sorted by id.
    pub fn registered(&self) -> Vec<AdapterId> {
        let mut ids: Vec<_> = self.adapters.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("network", &self.network)
            .field("offered", &self.offered)
            .field("registered", &self.registered())
            .finish()
    }
}
