//! MockLedger: in-memory ledger with balances, sequences, trust lines and a
//! validated-ledger counter.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use corridor_client::{AccountInfo, AutofillFields, LedgerClient, LedgerError};
use corridor_codec::transaction_id;
use corridor_types::{
    AccountAddress, Drops, IssuedAmount, SubmissionResult, TemplatePayload, TransactionTemplate,
    TxHash,
};
use tracing::debug;

/// Minimum balance a payment must deliver to create a new account.
pub const ACCOUNT_RESERVE: Drops = Drops::saturating(10_000_000);
pub const BASE_FEE: Drops = Drops::saturating(12);
/// Ledgers an autofilled template stays valid for.
pub const LEDGER_OFFSET: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockAccount {
    pub balance: Drops,
    pub sequence: u32,
}

#[derive(Debug)]
struct LedgerState {
    accounts: HashMap<AccountAddress, MockAccount>,
    trust_lines: Vec<(AccountAddress, IssuedAmount)>,
    applied: HashSet<TxHash>,
    scripted: VecDeque<String>,
    validated: u32,
    submissions: usize,
}

/// Cloning shares the underlying ledger.
#[derive(Debug, Clone)]
pub struct MockLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new(1)
    }
}

impl MockLedger {
    pub fn new(validated: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState {
                accounts: HashMap::new(),
                trust_lines: Vec::new(),
                applied: HashSet::new(),
                scripted: VecDeque::new(),
                validated,
                submissions: 0,
            })),
        }
    }

    /// Creates (or tops up) `address` with `balance`. New accounts start at sequence 1.
    pub fn fund(&self, address: &AccountAddress, balance: Drops) {
        let mut state = self.lock();
        let account = state.accounts.entry(address.clone()).or_insert(MockAccount {
            balance: Drops::ZERO,
            sequence: 1,
        });
        account.balance = Drops::saturating(account.balance.get().saturating_add(balance.get()));
    }

    pub fn account(&self, address: &AccountAddress) -> Option<MockAccount> {
        self.lock().accounts.get(address).copied()
    }

    pub fn trust_lines(&self, address: &AccountAddress) -> Vec<IssuedAmount> {
        self.lock()
            .trust_lines
            .iter()
            .filter(|(holder, _)| holder == address)
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// Forces the next submission to finish with `code` without touching state.
    pub fn script_result(&self, code: impl Into<String>) {
        self.lock().scripted.push_back(code.into());
    }

    pub fn advance(&self, ledgers: u32) {
        self.lock().validated += ledgers;
    }

    pub fn validated(&self) -> u32 {
        self.lock().validated
    }

    /// Number of submissions received, including rejected ones.
    pub fn submissions(&self) -> usize {
        self.lock().submissions
    }

    /// Applies `tx` as the ledger would and closes one ledger on success.
    pub fn apply(&self, tx: &TransactionTemplate) -> SubmissionResult {
        let mut state = self.lock();
        state.submissions += 1;
        let hash = signed_hash(tx);
        let result = match state.validate_and_apply(tx, hash) {
            Ok(()) => {
                state.validated += 1;
                SubmissionResult::confirmed(hash)
            }
            Err((code, detail)) => SubmissionResult::rejected(Some(hash), code, detail),
        };
        debug!(
            hash = %hash,
            engine_result = ?result.engine_result,
            validated = state.validated,
            "mock ledger applied transaction"
        );
        if result.success {
            state.applied.insert(hash);
        }
        result
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type Reject = (String, &'static str);

fn reject(code: &str, detail: &'static str) -> Reject {
    (code.to_string(), detail)
}

impl LedgerState {
    fn validate_and_apply(&mut self, tx: &TransactionTemplate, hash: TxHash) -> Result<(), Reject> {
        if let Some(code) = self.scripted.pop_front() {
            return Err((code, "scripted result"));
        }
        if self.applied.contains(&hash) {
            return Err(reject("tefALREADY", "transaction already applied"));
        }
        if tx
            .last_ledger_sequence()
            .is_some_and(|last| self.validated >= last)
        {
            return Err(reject("tefMAX_LEDGER", "ledger sequence too high"));
        }

        let sender = self
            .accounts
            .get(tx.account())
            .copied()
            .ok_or_else(|| reject("terNO_ACCOUNT", "the source account does not exist"))?;
        if tx.sequence() < sender.sequence {
            return Err(reject("tefPAST_SEQ", "this sequence number has already passed"));
        }
        if tx.sequence() > sender.sequence {
            return Err(reject("terPRE_SEQ", "missing/inapplicable prior transaction"));
        }
        let fee = tx.fee().get();
        if sender.balance.get() < fee {
            return Err(reject("terINSUF_FEE_B", "account balance can't pay fee"));
        }

        match tx.payload() {
            TemplatePayload::TrustLineGrant { limit_amount } => {
                if !self.accounts.contains_key(&limit_amount.issuer) {
                    return Err(reject("tecNO_DST", "destination does not exist"));
                }
                self.trust_lines.retain(|(holder, line)| {
                    !(holder == tx.account()
                        && line.issuer == limit_amount.issuer
                        && line.currency == limit_amount.currency)
                });
                self.trust_lines
                    .push((tx.account().clone(), limit_amount.clone()));
            }
            TemplatePayload::ValuePayment {
                destination,
                amount,
                ..
            } => {
                if sender.balance.get() < fee + amount.get() {
                    return Err(reject("tecUNFUNDED_PAYMENT", "insufficient XRP balance to send"));
                }
                match self.accounts.get_mut(destination) {
                    Some(account) => {
                        account.balance = Drops::saturating(account.balance.get().saturating_add(amount.get()));
                    }
                    None if *amount < ACCOUNT_RESERVE => {
                        return Err(reject(
                            "tecNO_DST_INSUF_XRP",
                            "destination does not exist; too little XRP sent to create it",
                        ));
                    }
                    None => {
                        self.accounts.insert(
                            destination.clone(),
                            MockAccount {
                                balance: *amount,
                                sequence: 1,
                            },
                        );
                    }
                }
                self.debit(tx.account(), amount.get());
            }
        }

        self.debit(tx.account(), fee);
        if let Some(account) = self.accounts.get_mut(tx.account()) {
            account.sequence += 1;
        }
        Ok(())
    }

    fn debit(&mut self, address: &AccountAddress, drops: u64) {
        if let Some(account) = self.accounts.get_mut(address) {
            account.balance = Drops::saturating(account.balance.get().saturating_sub(drops));
        }
    }
}

/// Hash of the ledger JSON the wallet signs, standing in for a signed blob.
pub fn signed_hash(tx: &TransactionTemplate) -> TxHash {
    transaction_id(tx.to_ledger_json().to_string().as_bytes())
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn account_info(&self, account: &AccountAddress) -> Result<AccountInfo, LedgerError> {
        let found = self
            .account(account)
            .ok_or_else(|| LedgerError::AccountNotFound(account.clone()))?;
        Ok(AccountInfo {
            account: account.clone(),
            balance: found.balance,
            sequence: found.sequence,
        })
    }

    async fn autofill(&self, account: &AccountAddress) -> Result<AutofillFields, LedgerError> {
        let state = self.lock();
        let found = state
            .accounts
            .get(account)
            .ok_or_else(|| LedgerError::AccountNotFound(account.clone()))?;
        Ok(AutofillFields {
            sequence: found.sequence,
            fee: BASE_FEE,
            last_ledger_sequence: state.validated + LEDGER_OFFSET,
        })
    }

    async fn submit_and_wait(
        &self,
        tx: &TransactionTemplate,
    ) -> Result<SubmissionResult, LedgerError> {
        Ok(self.apply(tx))
    }

    async fn validated_ledger_index(&self) -> Result<u32, LedgerError> {
        Ok(self.validated())
    }
}

#[cfg(test)]
mod tests {
    use corridor_client::{build_trust_line_grant, build_value_payment, LedgerClient, LedgerError};
    use corridor_types::{AccountAddress, Drops};
    use serde_json::json;

    use super::{MockLedger, BASE_FEE, LEDGER_OFFSET};

    const ALICE: &str = "rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe";
    const BOB: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
    const CAROL: &str = "rN7n7otQDd6FczFgLdSqtcsAUxDkw6fzRH";

    fn addr(s: &str) -> AccountAddress {
        AccountAddress::parse(s).unwrap()
    }

    fn funded() -> MockLedger {
        let ledger = MockLedger::new(100);
        ledger.fund(&addr(ALICE), Drops::from_xrp("50").unwrap());
        ledger.fund(&addr(BOB), Drops::from_xrp("1000").unwrap());
        ledger
    }

    #[test]
    fn applies_trust_line_and_bumps_sequence() {
        let ledger = funded();
        let tx = build_trust_line_grant(ALICE, BOB, "USD", "100", 1, BASE_FEE).unwrap();
        let result = ledger.apply(&tx);
        assert!(result.success, "{result:?}");

        let alice = ledger.account(&addr(ALICE)).unwrap();
        assert_eq!(alice.sequence, 2);
        assert_eq!(alice.balance.get(), 50_000_000 - 12);
        assert_eq!(ledger.trust_lines(&addr(ALICE)).len(), 1);
        assert_eq!(ledger.validated(), 101);
    }

    #[test]
    fn rejects_stale_and_future_sequences() {
        let ledger = funded();
        let tx = build_trust_line_grant(ALICE, BOB, "USD", "100", 1, BASE_FEE).unwrap();
        assert!(ledger.apply(&tx).success);

        let replay = build_trust_line_grant(ALICE, BOB, "EUR", "100", 1, BASE_FEE).unwrap();
        assert_eq!(ledger.apply(&replay).engine_result.as_deref(), Some("tefPAST_SEQ"));

        let ahead = build_trust_line_grant(ALICE, BOB, "EUR", "100", 5, BASE_FEE).unwrap();
        assert_eq!(ledger.apply(&ahead).engine_result.as_deref(), Some("terPRE_SEQ"));
    }

    #[test]
    fn payment_to_missing_account_needs_reserve() {
        let ledger = funded();
        let small = build_value_payment(ALICE, CAROL, Drops::from_xrp("1").unwrap(), json!({}), 1, BASE_FEE)
            .unwrap();
        let result = ledger.apply(&small);
        assert!(!result.success);
        assert_eq!(result.engine_result.as_deref(), Some("tecNO_DST_INSUF_XRP"));
        assert!(ledger.account(&addr(CAROL)).is_none());

        let large = build_value_payment(ALICE, CAROL, Drops::from_xrp("20").unwrap(), json!({}), 1, BASE_FEE)
            .unwrap();
        assert!(ledger.apply(&large).success);
        assert_eq!(ledger.account(&addr(CAROL)).unwrap().balance, Drops::from_xrp("20").unwrap());
    }

    #[test]
    fn scripted_and_expired_results() {
        let ledger = funded();
        ledger.script_result("tecINSUF_RESERVE_LINE");
        let tx = build_trust_line_grant(ALICE, BOB, "USD", "100", 1, BASE_FEE).unwrap();
        assert_eq!(
            ledger.apply(&tx).engine_result.as_deref(),
            Some("tecINSUF_RESERVE_LINE")
        );
        assert_eq!(ledger.account(&addr(ALICE)).unwrap().sequence, 1);

        let tx = corridor_client::TxBuilder::new()
            .with_trust_line(ALICE, BOB, "USD", "100")
            .with_sequence(1)
            .with_fee(BASE_FEE)
            .with_last_ledger_sequence(100)
            .build()
            .unwrap();
        assert_eq!(ledger.apply(&tx).engine_result.as_deref(), Some("tefMAX_LEDGER"));
        assert_eq!(ledger.submissions(), 2);
    }

    #[tokio::test]
    async fn ledger_client_surface() {
        let ledger = funded();
        let fields = ledger.autofill(&addr(ALICE)).await.unwrap();
        assert_eq!(fields.sequence, 1);
        assert_eq!(fields.fee, BASE_FEE);
        assert_eq!(fields.last_ledger_sequence, 100 + LEDGER_OFFSET);

        let err = ledger.account_info(&addr(CAROL)).await.unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(_)));
        assert_eq!(ledger.validated_ledger_index().await.unwrap(), 100);
    }
}
