//! In-memory ledger and scripted wallet adapters for testing and demos without a network.

pub mod mock_ledger;
pub mod mock_wallet;
pub mod scenarios;

pub use mock_ledger::{signed_hash, MockAccount, MockLedger, ACCOUNT_RESERVE, BASE_FEE, LEDGER_OFFSET};
pub use mock_wallet::MockWalletAdapter;
pub use scenarios::{DemoAccounts, DemoScenario};
