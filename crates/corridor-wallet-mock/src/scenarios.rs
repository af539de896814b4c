use std::sync::Arc;

use corridor_client::{
    AdapterId, AdapterRegistry, SessionConfig, SubmissionOrchestrator, WalletSessionManager,
};
use corridor_types::{AccountAddress, Drops, ValidationError};

use crate::{mock_ledger::MockLedger, mock_wallet::MockWalletAdapter};

#[derive(Debug, Clone)]
pub struct DemoAccounts {
    /// Borrower that accepts the credential and repays loans.
    pub principal: AccountAddress,
    /// Credential issuer and lender.
    pub issuer: AccountAddress,
    pub lender: AccountAddress,
    /// Valid address with no ledger entry.
    pub unfunded: AccountAddress,
}

/// Funded mock ledger plus one mock wallet per demo participant.
#[derive(Debug, Clone)]
pub struct DemoScenario {
    pub accounts: DemoAccounts,
    pub ledger: MockLedger,
}

impl DemoScenario {
    pub fn new() -> Result<Self, ValidationError> {
        let accounts = DemoAccounts {
            principal: AccountAddress::parse("rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe")?,
            issuer: AccountAddress::parse("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh")?,
            lender: AccountAddress::parse("rN7n7otQDd6FczFgLdSqtcsAUxDkw6fzRH")?,
            unfunded: AccountAddress::parse("rLHzPsX6oXkzU2qL12kHCH8G8cnZv1rBJh")?,
        };
        let ledger = MockLedger::new(1_000);
        ledger.fund(&accounts.principal, Drops::new(100_000_000)?);
        ledger.fund(&accounts.issuer, Drops::new(1_000_000_000)?);
        ledger.fund(&accounts.lender, Drops::new(5_000_000_000)?);
        Ok(Self { accounts, ledger })
    }

    pub fn wallet(&self, id: AdapterId, account: &AccountAddress) -> Arc<MockWalletAdapter> {
        Arc::new(MockWalletAdapter::new(id, account.clone(), self.ledger.clone()))
    }

    /// Session manager with `wallet` registered and the given timings.
    pub fn session(&self, wallet: Arc<MockWalletAdapter>, config: SessionConfig) -> WalletSessionManager {
        let mut registry = AdapterRegistry::permissive();
        if let Err(err) = registry.register(wallet) {
            tracing::warn!(error = %err, "mock wallet not registered");
        }
        WalletSessionManager::new(registry, config)
    }

    /// Orchestrator over a fresh session, with the mock ledger attached.
    pub fn orchestrator(&self, wallet: Arc<MockWalletAdapter>) -> SubmissionOrchestrator {
        SubmissionOrchestrator::new(self.session(wallet, SessionConfig::default()))
            .with_ledger(Arc::new(self.ledger.clone()))
    }
}
