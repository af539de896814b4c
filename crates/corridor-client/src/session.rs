//! Wallet session manager: owns the single active adapter and the process-wide
//! connection state.
//!
//! State machine: `Disconnected -> Connecting -> Connected`. Every connect attempt
//! carries a token; results, timers and adapter events that carry an outdated
//! token are discarded, so an abandoned attempt can never overwrite a newer session.
//! The state mutex is never held across an `.await`.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use corridor_types::{AccountAddress, ErrorKind, SubmissionResult, TransactionTemplate};
use serde::Serialize;
use thiserror::Error;
use tokio::{
    sync::{broadcast, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    adapter::{AdapterError, AdapterEvent, AdapterId, AdapterRegistry, WalletAdapter},
    config::SessionConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Point-in-time view of the wallet session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletSession {
    pub is_connected: bool,
    pub address: Option<AccountAddress>,
    pub active_adapter_id: Option<AdapterId>,
}

impl WalletSession {
    pub fn is_connected_as(&self, account: &AccountAddress) -> bool {
        self.is_connected && self.address.as_ref() == Some(account)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected(AccountAddress),
    /// Another attempt is already pending; no second handshake was started.
    AlreadyInFlight,
    AlreadyConnected,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("wallet connect timed out after {0:?}")]
    Timeout(Duration),
    #[error("wallet connect was cancelled")]
    Cancelled,
    #[error("wallet not connected")]
    NotConnected,
    #[error("signing already in progress")]
    SigningInFlight,
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout(_) => ErrorKind::NetworkError,
            Self::Cancelled => ErrorKind::UserRejected,
            Self::NotConnected | Self::SigningInFlight => ErrorKind::AdapterUnavailable,
            Self::Adapter(err) => err.kind(),
        }
    }
}

struct Inner {
    state: SessionState,
    attempt: u64,
    adapter: Option<Arc<dyn WalletAdapter>>,
    address: Option<AccountAddress>,
    abort_connect: Option<oneshot::Sender<SessionError>>,
    pump: Option<JoinHandle<()>>,
    signing: bool,
}

impl Inner {
    /// Moves to `Disconnected` and invalidates every outstanding token.
    fn reset(&mut self) -> (Option<Arc<dyn WalletAdapter>>, Option<JoinHandle<()>>) {
        self.state = SessionState::Disconnected;
        self.attempt += 1;
        self.address = None;
        if let Some(abort) = self.abort_connect.take() {
            let _ = abort.send(SessionError::Cancelled);
        }
        (self.adapter.take(), self.pump.take())
    }

    fn is_current(&self, token: u64, state: SessionState) -> bool {
        self.attempt == token && self.state == state
    }

    fn transition(&mut self, event: AdapterEvent) -> bool {
        match event {
            AdapterEvent::AccountChanged(address) => {
                info!(account = %address, "wallet account changed");
                self.address = Some(address);
                true
            }
            AdapterEvent::Disconnected => {
                info!("wallet reported disconnect");
                // Dropping the pump handle detaches it; its next event fails the token check.
                let _ = self.reset();
                false
            }
        }
    }
}

struct Shared {
    registry: AdapterRegistry,
    config: SessionConfig,
    state: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_event(&self, token: u64, event: AdapterEvent) -> bool {
        let mut inner = self.lock();
        if !inner.is_current(token, SessionState::Connected) {
            debug!(attempt = token, "ignoring event from inactive wallet adapter");
            return false;
        }
        inner.transition(event)
    }

    /// Missed adapter events leave the session's view of the wallet unknown, so
    /// the session is dropped. Returns the adapter to tear down, if the session
    /// was still the one `token` belongs to.
    fn events_lost(&self, token: u64, missed: u64) -> Option<Arc<dyn WalletAdapter>> {
        let mut inner = self.lock();
        if !inner.is_current(token, SessionState::Connected) {
            return None;
        }
        warn!(missed, attempt = token, "wallet event stream lagged, dropping session");
        let (adapter, _pump) = inner.reset();
        adapter
    }

    fn abandon(&self, token: u64, reason: SessionError) -> bool {
        let mut inner = self.lock();
        if !inner.is_current(token, SessionState::Connecting) {
            return false;
        }
        if let Some(abort) = inner.abort_connect.take() {
            let _ = abort.send(reason);
        }
        let _ = inner.reset();
        true
    }
}

/// Handle to the process-wide wallet session. Clones share the same session.
#[derive(Clone)]
pub struct WalletSessionManager {
    shared: Arc<Shared>,
}

impl WalletSessionManager {
    pub fn new(registry: AdapterRegistry, config: SessionConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry,
                config,
                state: Mutex::new(Inner {
                    state: SessionState::Disconnected,
                    attempt: 0,
                    adapter: None,
                    address: None,
                    abort_connect: None,
                    pump: None,
                    signing: false,
                }),
            }),
        }
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.shared.registry
    }

    pub fn config(&self) -> SessionConfig {
        self.shared.config
    }

    pub fn state(&self) -> SessionState {
        self.shared.lock().state
    }

    pub fn session(&self) -> WalletSession {
        let inner = self.shared.lock();
        WalletSession {
            is_connected: inner.state == SessionState::Connected,
            address: inner.address.clone(),
            active_adapter_id: inner.adapter.as_ref().map(|adapter| adapter.id()),
        }
    }

    pub fn address(&self) -> Option<AccountAddress> {
        self.shared.lock().address.clone()
    }

    /// Connects through the adapter registered as `id`.
    ///
    /// Returns without starting a handshake if a session is already connecting or
    /// connected. A handshake that outlives `connect_timeout` keeps running in the
    /// background, but its result is discarded.
    pub async fn connect(&self, id: AdapterId) -> Result<ConnectOutcome, SessionError> {
        let adapter = self.shared.registry.get(id)?;
        let (token, abort_rx, events) = {
            let mut inner = self.shared.lock();
            match inner.state {
                SessionState::Connecting => {
                    debug!(adapter = %id, "connect already in flight");
                    return Ok(ConnectOutcome::AlreadyInFlight);
                }
                SessionState::Connected => return Ok(ConnectOutcome::AlreadyConnected),
                SessionState::Disconnected => {}
            }
            inner.attempt += 1;
            let (abort_tx, abort_rx) = oneshot::channel();
            inner.state = SessionState::Connecting;
            inner.adapter = Some(adapter.clone());
            inner.abort_connect = Some(abort_tx);
            (inner.attempt, abort_rx, adapter.subscribe())
        };
        info!(adapter = %id, attempt = token, "connecting wallet");

        let (result_tx, result_rx) = oneshot::channel();
        let handshake = adapter.clone();
        tokio::spawn(async move {
            let _ = result_tx.send(handshake.connect().await);
        });

        let timeout = self.shared.config.connect_timeout;
        let outcome = tokio::select! {
            result = result_rx => match result {
                Ok(result) => result.map_err(SessionError::from),
                Err(_) => Err(SessionError::Adapter(AdapterError::Unavailable(
                    "wallet connect task ended without a result".into(),
                ))),
            },
            aborted = abort_rx => Err(aborted.unwrap_or(SessionError::Cancelled)),
            _ = tokio::time::sleep(timeout) => Err(SessionError::Timeout(timeout)),
        };
        self.finish_connect(token, id, events, outcome)
    }

    fn finish_connect(
        &self,
        token: u64,
        id: AdapterId,
        events: broadcast::Receiver<AdapterEvent>,
        outcome: Result<AccountAddress, SessionError>,
    ) -> Result<ConnectOutcome, SessionError> {
        let mut inner = self.shared.lock();
        if !inner.is_current(token, SessionState::Connecting) {
            debug!(adapter = %id, attempt = token, "discarding result of abandoned connect attempt");
            return Err(outcome.err().unwrap_or(SessionError::Cancelled));
        }
        inner.abort_connect = None;
        match outcome {
            Ok(address) => {
                inner.state = SessionState::Connected;
                inner.address = Some(address.clone());
                inner.pump = Some(spawn_event_pump(Arc::downgrade(&self.shared), token, events));
                info!(adapter = %id, account = %address, attempt = token, "wallet connected");
                Ok(ConnectOutcome::Connected(address))
            }
            Err(err) => {
                let _ = inner.reset();
                warn!(adapter = %id, attempt = token, error = %err, "wallet connect failed");
                Err(err)
            }
        }
    }

    /// Signals that the host regained focus while a connect prompt may be open.
    ///
    /// For adapters that don't report cancellation themselves, an attempt still
    /// pending after `cancel_grace` is abandoned as a user cancellation. Must be
    /// called from within a tokio runtime.
    pub fn focus_regained(&self) {
        let token = {
            let inner = self.shared.lock();
            match (&inner.state, &inner.adapter) {
                (SessionState::Connecting, Some(adapter))
                    if !adapter.capabilities().reports_cancellation =>
                {
                    inner.attempt
                }
                _ => return,
            }
        };
        let grace = self.shared.config.cancel_grace;
        let shared = Arc::downgrade(&self.shared);
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            let Some(shared) = shared.upgrade() else {
                return;
            };
            if shared.abandon(token, SessionError::Cancelled) {
                info!(attempt = token, "connect still pending after focus returned, treating as cancelled");
            }
        });
    }

    /// Applies an adapter notification. Events from any adapter other than the
    /// active one are ignored. Returns whether the session is still connected.
    pub fn apply_event(&self, source: AdapterId, event: AdapterEvent) -> bool {
        let mut inner = self.shared.lock();
        let active = inner.adapter.as_ref().map(|adapter| adapter.id());
        if inner.state != SessionState::Connected || active != Some(source) {
            debug!(adapter = %source, "ignoring event from inactive wallet adapter");
            return false;
        }
        inner.transition(event)
    }

    /// Drops the session. A no-op when already disconnected.
    ///
    /// Local state is cleared first; the adapter teardown runs on its own task,
    /// so it completes even if the caller stops awaiting.
    pub async fn disconnect(&self) {
        let (adapter, pump) = {
            let mut inner = self.shared.lock();
            if inner.state == SessionState::Disconnected {
                return;
            }
            inner.reset()
        };
        if let Some(pump) = pump {
            pump.abort();
        }
        if let Some(adapter) = adapter {
            info!(adapter = %adapter.id(), "disconnecting wallet");
            let teardown = tokio::spawn(async move { adapter.disconnect().await });
            if let Err(err) = teardown.await {
                warn!(error = %err, "wallet disconnect task failed");
            }
        }
    }

    /// Signs and submits through the active adapter. At most one request is in
    /// flight per session.
    pub async fn sign_and_submit(
        &self,
        tx: &TransactionTemplate,
    ) -> Result<SubmissionResult, SessionError> {
        let adapter = {
            let mut inner = self.shared.lock();
            let adapter = match (inner.state, &inner.adapter) {
                (SessionState::Connected, Some(adapter)) => adapter.clone(),
                _ => return Err(SessionError::NotConnected),
            };
            if inner.signing {
                return Err(SessionError::SigningInFlight);
            }
            inner.signing = true;
            adapter
        };
        let _guard = SigningGuard(self.shared.as_ref());
        debug!(adapter = %adapter.id(), account = %tx.account(), "requesting signature");
        adapter.sign_and_submit(tx).await.map_err(SessionError::from)
    }
}

impl fmt::Debug for WalletSessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSessionManager")
            .field("state", &self.state())
            .field("session", &self.session())
            .finish()
    }
}

struct SigningGuard<'a>(&'a Shared);

impl Drop for SigningGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().signing = false;
    }
}

fn spawn_event_pump(
    shared: Weak<Shared>,
    token: u64,
    mut events: broadcast::Receiver<AdapterEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    let adapter = shared.upgrade().and_then(|shared| shared.events_lost(token, missed));
                    if let Some(adapter) = adapter {
                        adapter.disconnect().await;
                    }
                    break;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let Some(shared) = shared.upgrade() else {
                break;
            };
            if !shared.apply_event(token, event) {
                break;
            }
        }
    })
}
