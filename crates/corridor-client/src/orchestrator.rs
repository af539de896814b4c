//! SubmissionOrchestrator: routes a template to immediate signing or to a
//! shareable link, and prepares templates from live ledger state.

use std::{fmt, sync::Arc};

use corridor_codec::{template_digest, ShareableLink, LOAN_PAYMENT_MEMO_TYPE};
use corridor_types::{AccountAddress, Drops, SubmissionResult, TransactionTemplate};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    classify::classify_submission,
    error::CorridorError,
    ledger::{LedgerClient, LedgerError},
    session::{SessionError, WalletSessionManager},
    tx_builder::TxBuilder,
};

/// What `dispatch` did with a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The connected wallet was the signer; the template was signed and submitted.
    Submitted(SubmissionResult),
    /// Someone else must sign; hand them this link.
    Deferred(ShareableLink),
}

#[derive(Clone)]
pub struct SubmissionOrchestrator {
    session: WalletSessionManager,
    ledger: Option<Arc<dyn LedgerClient>>,
}

impl SubmissionOrchestrator {
    pub fn new(session: WalletSessionManager) -> Self {
        Self {
            session,
            ledger: None,
        }
    }

    /// Attaches a ledger client, enabling the expiry check before deferred signing.
    pub fn with_ledger(mut self, ledger: Arc<dyn LedgerClient>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn session(&self) -> &WalletSessionManager {
        &self.session
    }

    /// Encodes `tx` as a link for another party to sign. Nothing is submitted.
    pub fn share(&self, tx: &TransactionTemplate) -> ShareableLink {
        let link = ShareableLink::encode(tx);
        info!(digest = %template_digest(tx), account = %tx.account(), "deferred signing link created");
        link
    }

    /// Signs immediately when the session is connected as `tx.account`,
    /// otherwise returns a link.
    pub async fn dispatch(&self, tx: &TransactionTemplate) -> Result<Dispatch, CorridorError> {
        if self.session.session().is_connected_as(tx.account()) {
            return self.submit(tx).await.map(Dispatch::Submitted);
        }
        Ok(Dispatch::Deferred(self.share(tx)))
    }

    /// Immediate flow. The result of a submission the ledger did not accept has
    /// `failure` populated and is never retried.
    pub async fn submit(&self, tx: &TransactionTemplate) -> Result<SubmissionResult, CorridorError> {
        self.ensure_signer(tx)?;
        let digest = template_digest(tx);
        debug!(%digest, kind = ?tx.kind(), "submitting transaction");

        let mut result = self.session.sign_and_submit(tx).await?;
        match classify_submission(&result) {
            None => {
                info!(
                    %digest,
                    hash = ?result.transaction_hash,
                    explorer = self.explorer_url(&result).as_deref().unwrap_or("-"),
                    "transaction validated"
                );
            }
            Some(kind) => {
                warn!(
                    %digest,
                    engine_result = ?result.engine_result,
                    kind = %kind,
                    "submission failed"
                );
                result.failure = Some(kind);
            }
        }
        Ok(result)
    }

    /// Explorer page for a submitted transaction on the session's network.
    pub fn explorer_url(&self, result: &SubmissionResult) -> Option<String> {
        let network = self.session.registry().network();
        result.transaction_hash.map(|hash| network.explorer_tx_url(hash))
    }

    /// Decodes a link token and runs the deferred flow.
    pub async fn sign_link(&self, token: &str) -> Result<SubmissionResult, CorridorError> {
        let tx = ShareableLink::from_token(token).decode()?;
        self.sign_deferred(&tx).await
    }

    /// Deferred flow for an already-decoded template. The wallet must be
    /// connected as the template's account; a mismatch stops before the adapter
    /// is asked to sign anything.
    pub async fn sign_deferred(
        &self,
        tx: &TransactionTemplate,
    ) -> Result<SubmissionResult, CorridorError> {
        self.ensure_signer(tx)?;
        self.check_expiry(tx).await?;
        self.submit(tx).await
    }

    fn ensure_signer(&self, tx: &TransactionTemplate) -> Result<(), CorridorError> {
        let session = self.session.session();
        let connected = match session.address {
            Some(address) if session.is_connected => address,
            _ => return Err(SessionError::NotConnected.into()),
        };
        if &connected != tx.account() {
            warn!(expected = %tx.account(), connected = %connected, "wallet connected as a different account");
            return Err(CorridorError::WrongAccount {
                expected: tx.account().clone(),
                connected,
            });
        }
        Ok(())
    }

    async fn check_expiry(&self, tx: &TransactionTemplate) -> Result<(), CorridorError> {
        let (Some(ledger), Some(last_ledger_sequence)) = (&self.ledger, tx.last_ledger_sequence())
        else {
            return Ok(());
        };
        match ledger.validated_ledger_index().await {
            Ok(validated) if validated >= last_ledger_sequence => {
                warn!(last_ledger_sequence, validated, "template expired before signing");
                Err(CorridorError::Expired {
                    last_ledger_sequence,
                    validated,
                })
            }
            Ok(_) => Ok(()),
            Err(err) => {
                warn!(error = %err, "could not read validated ledger; skipping expiry check");
                Ok(())
            }
        }
    }
}

impl fmt::Debug for SubmissionOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionOrchestrator")
            .field("session", &self.session)
            .field("ledger", &self.ledger.is_some())
            .finish()
    }
}

/// Prepares a trust-line grant for `principal` from live ledger state.
pub async fn prepare_trust_line(
    ledger: &dyn LedgerClient,
    principal: &str,
    issuer: &str,
    currency: &str,
    limit: &str,
) -> Result<TransactionTemplate, CorridorError> {
    let builder = TxBuilder::new().with_trust_line(principal, issuer, currency, limit);
    let account = AccountAddress::parse(principal)?;
    prepare(ledger, &account, builder).await
}

/// Prepares a payment from `signer` carrying `metadata` as a memo of
/// `memo_type` (default `LOAN_PAYMENT`).
pub async fn prepare_value_payment(
    ledger: &dyn LedgerClient,
    signer: &str,
    destination: &str,
    amount: Drops,
    metadata: Value,
    memo_type: Option<&str>,
) -> Result<TransactionTemplate, CorridorError> {
    let builder = TxBuilder::new()
        .with_payment(signer, destination, amount, metadata)
        .with_memo_type(memo_type.unwrap_or(LOAN_PAYMENT_MEMO_TYPE));
    let account = AccountAddress::parse(signer)?;
    prepare(ledger, &account, builder).await
}

async fn prepare(
    ledger: &dyn LedgerClient,
    account: &AccountAddress,
    builder: TxBuilder,
) -> Result<TransactionTemplate, CorridorError> {
    let info = ledger.account_info(account).await.map_err(|err| match err {
        LedgerError::Engine { ref code, .. } if code == "actNotFound" => {
            LedgerError::AccountNotFound(account.clone())
        }
        other => other,
    })?;
    let fields = ledger.autofill(account).await?;
    debug!(
        account = %account,
        balance = %info.balance,
        sequence = fields.sequence,
        last_ledger_sequence = fields.last_ledger_sequence,
        "autofilled template fields"
    );
    let tx = builder
        .with_sequence(fields.sequence)
        .with_fee(fields.fee)
        .with_last_ledger_sequence(fields.last_ledger_sequence)
        .build()?;
    Ok(tx)
}
