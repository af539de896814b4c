//! Transaction templates awaiting signature, and the result of submitting one.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{
    error::{ErrorKind, ValidationError},
    ids::{AccountAddress, CurrencyCode, DecimalValue, Drops, TxHash},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    TrustLineGrant,
    ValuePayment,
}

impl TransactionKind {
    /// Name of the ledger transaction type this kind renders to.
    pub const fn ledger_name(self) -> &'static str {
        match self {
            Self::TrustLineGrant => "TrustSet",
            Self::ValuePayment => "Payment",
        }
    }

    pub fn from_ledger_name(name: &str) -> Option<Self> {
        match name {
            "TrustSet" => Some(Self::TrustLineGrant),
            "Payment" => Some(Self::ValuePayment),
            _ => None,
        }
    }
}

/// Issued-currency amount used as a trust-line limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedAmount {
    pub currency: CurrencyCode,
    pub issuer: AccountAddress,
    pub value: DecimalValue,
}

/// Ledger memo. Both fields hold canonical uppercase hex, so two memos carrying
/// the same bytes always compare and encode equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memo {
    memo_type: Option<String>,
    memo_data: String,
}

impl Memo {
    pub fn from_bytes(memo_type: Option<&[u8]>, memo_data: &[u8]) -> Self {
        Self {
            memo_type: memo_type.map(hex::encode_upper),
            memo_data: hex::encode_upper(memo_data),
        }
    }

    /// Accepts hex in either case; odd-length or non-hex input is rejected.
    pub fn from_hex(memo_type: Option<&str>, memo_data: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            memo_type: memo_type.map(canonical_hex).transpose()?,
            memo_data: canonical_hex(memo_data)?,
        })
    }

    pub fn memo_type(&self) -> Option<&str> {
        self.memo_type.as_deref()
    }

    pub fn memo_data(&self) -> &str {
        &self.memo_data
    }
}

fn canonical_hex(value: &str) -> Result<String, ValidationError> {
    hex::decode(value).map_err(|err| ValidationError::InvalidHex(err.to_string()))?;
    Ok(value.to_ascii_uppercase())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePayload {
    TrustLineGrant {
        limit_amount: IssuedAmount,
    },
    ValuePayment {
        destination: AccountAddress,
        amount: Drops,
        memos: Vec<Memo>,
    },
}

/// A ledger operation awaiting signature. Immutable once built; a re-submission
/// needs a freshly prepared template with a new sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionTemplate {
    account: AccountAddress,
    fee: Drops,
    sequence: u32,
    last_ledger_sequence: Option<u32>,
    payload: TemplatePayload,
}

impl TransactionTemplate {
    pub fn new(
        account: AccountAddress,
        fee: Drops,
        sequence: u32,
        last_ledger_sequence: Option<u32>,
        payload: TemplatePayload,
    ) -> Self {
        Self {
            account,
            fee,
            sequence,
            last_ledger_sequence,
            payload,
        }
    }

    pub fn kind(&self) -> TransactionKind {
        match self.payload {
            TemplatePayload::TrustLineGrant { .. } => TransactionKind::TrustLineGrant,
            TemplatePayload::ValuePayment { .. } => TransactionKind::ValuePayment,
        }
    }

    /// The account expected to sign this transaction.
    pub fn account(&self) -> &AccountAddress {
        &self.account
    }

    pub fn fee(&self) -> Drops {
        self.fee
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn last_ledger_sequence(&self) -> Option<u32> {
        self.last_ledger_sequence
    }

    pub fn payload(&self) -> &TemplatePayload {
        &self.payload
    }

    /// First memo attached to a value payment, if any.
    pub fn memo(&self) -> Option<&Memo> {
        match &self.payload {
            TemplatePayload::ValuePayment { memos, .. } => memos.first(),
            TemplatePayload::TrustLineGrant { .. } => None,
        }
    }

    /// Renders the ledger's JSON transaction form, which is what wallet adapters sign.
    pub fn to_ledger_json(&self) -> Value {
        let mut tx = Map::new();
        tx.insert(
            "TransactionType".into(),
            Value::from(self.kind().ledger_name()),
        );
        tx.insert("Account".into(), Value::from(self.account.as_str()));
        tx.insert("Fee".into(), Value::from(self.fee.to_string()));
        tx.insert("Sequence".into(), Value::from(self.sequence));
        if let Some(last) = self.last_ledger_sequence {
            tx.insert("LastLedgerSequence".into(), Value::from(last));
        }
        match &self.payload {
            TemplatePayload::TrustLineGrant { limit_amount } => {
                tx.insert(
                    "LimitAmount".into(),
                    json!({
                        "currency": limit_amount.currency.as_str(),
                        "issuer": limit_amount.issuer.as_str(),
                        "value": limit_amount.value.as_str(),
                    }),
                );
            }
            TemplatePayload::ValuePayment {
                destination,
                amount,
                memos,
            } => {
                tx.insert("Destination".into(), Value::from(destination.as_str()));
                tx.insert("Amount".into(), Value::from(amount.to_string()));
                if !memos.is_empty() {
                    let memos = memos
                        .iter()
                        .map(|memo| {
                            let mut inner = Map::new();
                            if let Some(memo_type) = memo.memo_type() {
                                inner.insert("MemoType".into(), Value::from(memo_type));
                            }
                            inner.insert("MemoData".into(), Value::from(memo.memo_data()));
                            json!({ "Memo": inner })
                        })
                        .collect::<Vec<_>>();
                    tx.insert("Memos".into(), Value::Array(memos));
                }
            }
        }
        Value::Object(tx)
    }
}

/// Outcome of a sign-and-submit round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<TxHash>,
    /// Ledger result code, e.g. `tesSUCCESS` or `tecNO_DST_INSUF_XRP`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SubmissionResult {
    pub const SUCCESS_CODE: &'static str = "tesSUCCESS";

    pub fn confirmed(transaction_hash: TxHash) -> Self {
        Self {
            success: true,
            transaction_hash: Some(transaction_hash),
            engine_result: Some(Self::SUCCESS_CODE.to_string()),
            failure: None,
            detail: None,
        }
    }

    /// The ledger accepted the submission but reported a non-success result code.
    pub fn rejected(
        transaction_hash: Option<TxHash>,
        engine_result: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            transaction_hash,
            engine_result: Some(engine_result.into()),
            failure: None,
            detail: Some(detail.into()),
        }
    }

    pub fn failed(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction_hash: None,
            engine_result: None,
            failure: Some(kind),
            detail: Some(detail.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{IssuedAmount, Memo, SubmissionResult, TemplatePayload, TransactionTemplate};
    use crate::{
        AccountAddress, CurrencyCode, DecimalValue, Drops, ErrorKind, TransactionKind, TxHash,
        ValidationError,
    };

    fn addr(s: &str) -> AccountAddress {
        AccountAddress::parse(s).unwrap()
    }

    #[test]
    fn trust_set_renders_ledger_json() {
        let tx = TransactionTemplate::new(
            addr("rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe"),
            Drops::new(12).unwrap(),
            7,
            Some(1_000),
            TemplatePayload::TrustLineGrant {
                limit_amount: IssuedAmount {
                    currency: CurrencyCode::parse("USD").unwrap(),
                    issuer: addr("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh"),
                    value: DecimalValue::parse("1000000").unwrap(),
                },
            },
        );
        assert_eq!(tx.kind(), TransactionKind::TrustLineGrant);
        assert_eq!(
            tx.to_ledger_json(),
            json!({
                "TransactionType": "TrustSet",
                "Account": "rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe",
                "Fee": "12",
                "Sequence": 7,
                "LastLedgerSequence": 1000,
                "LimitAmount": {
                    "currency": "USD",
                    "issuer": "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh",
                    "value": "1000000"
                }
            })
        );
    }

    #[test]
    fn payment_renders_memos_and_omits_missing_expiry() {
        let tx = TransactionTemplate::new(
            addr("rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe"),
            Drops::new(10).unwrap(),
            3,
            None,
            TemplatePayload::ValuePayment {
                destination: addr("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh"),
                amount: Drops::new(2_500_000).unwrap(),
                memos: vec![Memo::from_hex(Some("4C4F414E5F5041594D454E54"), "7B7D").unwrap()],
            },
        );
        let rendered = tx.to_ledger_json();
        assert_eq!(rendered["TransactionType"], "Payment");
        assert_eq!(rendered["Amount"], "2500000");
        assert!(rendered.get("LastLedgerSequence").is_none());
        assert_eq!(rendered["Memos"][0]["Memo"]["MemoData"], "7B7D");
        assert_eq!(tx.memo().map(Memo::memo_data), Some("7B7D"));
    }

    #[test]
    fn memo_hex_is_canonical() {
        let lower = Memo::from_hex(Some("4c4f414e"), "7b7d").unwrap();
        assert_eq!(lower.memo_type(), Some("4C4F414E"));
        assert_eq!(lower.memo_data(), "7B7D");
        assert_eq!(lower, Memo::from_bytes(Some(b"LOAN".as_slice()), b"{}"));

        assert!(matches!(Memo::from_hex(None, "7B7"), Err(ValidationError::InvalidHex(_))));
        assert!(matches!(Memo::from_hex(Some("ZZ"), "7B7D"), Err(ValidationError::InvalidHex(_))));
    }

    #[test]
    fn submission_result_serializes_compactly() {
        let ok = SubmissionResult::confirmed(TxHash::new([0x01; 32]));
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["success"], true);
        assert!(value.get("failure").is_none());

        let failed = SubmissionResult::failed(ErrorKind::WrongAccount, "mismatch");
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["failure"], "wrong_account");
        let back: SubmissionResult = serde_json::from_value(value).unwrap();
        assert_eq!(back, failed);
    }
}
