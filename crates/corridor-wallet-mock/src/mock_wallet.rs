//! MockWalletAdapter: scripted wallet that signs by submitting straight to a [`MockLedger`].

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex, PoisonError,
    },
    time::Duration,
};

use async_trait::async_trait;
use corridor_client::{AdapterCapabilities, AdapterError, AdapterEvent, AdapterId, LedgerClient, WalletAdapter};
use corridor_types::{AccountAddress, SubmissionResult, TransactionTemplate};
use tokio::sync::broadcast;
use tracing::debug;

use crate::mock_ledger::MockLedger;

#[derive(Debug)]
pub struct MockWalletAdapter {
    id: AdapterId,
    account: Mutex<AccountAddress>,
    ledger: MockLedger,
    connect_delay: Duration,
    reports_cancellation: bool,
    reject_connect: AtomicBool,
    reject_signing: AtomicBool,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    sign_calls: AtomicUsize,
    events: broadcast::Sender<AdapterEvent>,
}

impl MockWalletAdapter {
    pub fn new(id: AdapterId, account: AccountAddress, ledger: MockLedger) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            id,
            account: Mutex::new(account),
            ledger,
            connect_delay: Duration::ZERO,
            reports_cancellation: matches!(id, AdapterId::Xaman),
            reject_connect: AtomicBool::new(false),
            reject_signing: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
            events,
        }
    }

    /// Delays every handshake, simulating a user who takes time to approve.
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    pub fn set_reject_connect(&self, reject: bool) {
        self.reject_connect.store(reject, Ordering::SeqCst);
    }

    pub fn set_reject_signing(&self, reject: bool) {
        self.reject_signing.store(reject, Ordering::SeqCst);
    }

    /// The user switched accounts inside the wallet.
    pub fn switch_account(&self, account: AccountAddress) {
        *self.account.lock().unwrap_or_else(PoisonError::into_inner) = account.clone();
        let _ = self.events.send(AdapterEvent::AccountChanged(account));
    }

    /// The wallet dropped the connection on its own.
    pub fn drop_connection(&self) {
        let _ = self.events.send(AdapterEvent::Disconnected);
    }

    pub fn account(&self) -> AccountAddress {
        self.account
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletAdapter for MockWalletAdapter {
    fn id(&self) -> AdapterId {
        self.id
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities {
            display_name: format!("mock {}", self.id),
            reports_cancellation: self.reports_cancellation,
        }
    }

    async fn connect(&self) -> Result<AccountAddress, AdapterError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        if self.reject_connect.load(Ordering::SeqCst) {
            return Err(AdapterError::UserRejected("user rejected the connection".into()));
        }
        let account = self.account();
        debug!(adapter = %self.id, account = %account, "mock wallet connected");
        Ok(account)
    }

    async fn disconnect(&self) {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn sign_and_submit(
        &self,
        tx: &TransactionTemplate,
    ) -> Result<SubmissionResult, AdapterError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_signing.load(Ordering::SeqCst) {
            return Err(AdapterError::UserRejected("user declined to sign".into()));
        }
        if tx.account() != &self.account() {
            return Err(AdapterError::Failed(format!(
                "wallet cannot sign for {}",
                tx.account()
            )));
        }
        self.ledger
            .submit_and_wait(tx)
            .await
            .map_err(|err| AdapterError::Failed(err.to_string()))
    }

    fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
        self.events.subscribe()
    }
}
