//! TxBuilder: construct trust-line grants and value payments with memo metadata.

use corridor_codec::{memo_for, LOAN_PAYMENT_MEMO_TYPE};
use corridor_types::{
    AccountAddress, CurrencyCode, DecimalValue, Drops, ErrorKind, IssuedAmount, TemplatePayload,
    TransactionKind, TransactionTemplate, ValidationError,
};
use serde_json::Value;
use thiserror::Error;

/// Transaction builder validation errors. All of them are caller input problems.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxBuilderError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("invalid `{field}`: {source}")]
    Invalid {
        field: &'static str,
        source: ValidationError,
    },
    #[error("`{0}` must differ from the signing account")]
    SameAccount(&'static str),
    #[error("payment amount must be greater than zero")]
    NonPositiveAmount,
}

impl TxBuilderError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}

/// Fluent builder for [`TransactionTemplate`].
///
/// Addresses, currency and limit are kept as raw strings until `build`, so every
/// validation failure names the offending field.
#[derive(Debug, Clone, Default)]
pub struct TxBuilder {
    kind: Option<TransactionKind>,
    account: Option<String>,
    issuer: Option<String>,
    currency: Option<String>,
    limit: Option<String>,
    destination: Option<String>,
    amount: Option<Drops>,
    metadata: Option<Value>,
    memo_type: Option<String>,
    sequence: Option<u32>,
    fee: Option<Drops>,
    last_ledger_sequence: Option<u32>,
}

impl TxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust line from `principal` to `issuer` for `currency`, bounded by `limit`.
    pub fn with_trust_line(
        mut self,
        principal: impl Into<String>,
        issuer: impl Into<String>,
        currency: impl Into<String>,
        limit: impl Into<String>,
    ) -> Self {
        self.kind = Some(TransactionKind::TrustLineGrant);
        self.account = Some(principal.into());
        self.issuer = Some(issuer.into());
        self.currency = Some(currency.into());
        self.limit = Some(limit.into());
        self
    }

    /// Payment of `amount` from `signer` to `destination`, carrying `metadata` as a memo.
    pub fn with_payment(
        mut self,
        signer: impl Into<String>,
        destination: impl Into<String>,
        amount: Drops,
        metadata: Value,
    ) -> Self {
        self.kind = Some(TransactionKind::ValuePayment);
        self.account = Some(signer.into());
        self.destination = Some(destination.into());
        self.amount = Some(amount);
        self.metadata = Some(metadata);
        self
    }

    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn with_fee(mut self, fee: Drops) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn with_last_ledger_sequence(mut self, last_ledger_sequence: u32) -> Self {
        self.last_ledger_sequence = Some(last_ledger_sequence);
        self
    }

    /// Memo type label for payments. Defaults to `LOAN_PAYMENT`.
    pub fn with_memo_type(mut self, memo_type: impl Into<String>) -> Self {
        self.memo_type = Some(memo_type.into());
        self
    }

    pub fn build(self) -> Result<TransactionTemplate, TxBuilderError> {
        let kind = self.kind.ok_or(TxBuilderError::MissingField("transaction"))?;
        let account = parse_address("account", self.account.as_deref())?;
        let sequence = self.sequence.ok_or(TxBuilderError::MissingField("sequence"))?;
        let fee = self.fee.ok_or(TxBuilderError::MissingField("fee"))?;

        let payload = match kind {
            TransactionKind::TrustLineGrant => {
                let issuer = parse_address("issuer", self.issuer.as_deref())?;
                if issuer == account {
                    return Err(TxBuilderError::SameAccount("issuer"));
                }
                let currency = self
                    .currency
                    .as_deref()
                    .ok_or(TxBuilderError::MissingField("currency"))?;
                let currency = CurrencyCode::parse(currency).map_err(invalid("currency"))?;
                let limit = self
                    .limit
                    .as_deref()
                    .ok_or(TxBuilderError::MissingField("limit"))?;
                let value = DecimalValue::parse(limit).map_err(invalid("limit"))?;
                TemplatePayload::TrustLineGrant {
                    limit_amount: IssuedAmount {
                        currency,
                        issuer,
                        value,
                    },
                }
            }
            TransactionKind::ValuePayment => {
                let destination = parse_address("destination", self.destination.as_deref())?;
                if destination == account {
                    return Err(TxBuilderError::SameAccount("destination"));
                }
                let amount = self.amount.ok_or(TxBuilderError::MissingField("amount"))?;
                if amount == Drops::ZERO {
                    return Err(TxBuilderError::NonPositiveAmount);
                }
                let metadata = self.metadata.unwrap_or(Value::Null);
                let memo_type = self.memo_type.as_deref().unwrap_or(LOAN_PAYMENT_MEMO_TYPE);
                TemplatePayload::ValuePayment {
                    destination,
                    amount,
                    memos: vec![memo_for(memo_type, &metadata)],
                }
            }
        };

        Ok(TransactionTemplate::new(
            account,
            fee,
            sequence,
            self.last_ledger_sequence,
            payload,
        ))
    }
}

pub fn build_trust_line_grant(
    principal: &str,
    issuer: &str,
    currency: &str,
    limit: &str,
    sequence: u32,
    fee: Drops,
) -> Result<TransactionTemplate, TxBuilderError> {
    TxBuilder::new()
        .with_trust_line(principal, issuer, currency, limit)
        .with_sequence(sequence)
        .with_fee(fee)
        .build()
}

pub fn build_value_payment(
    signer: &str,
    destination: &str,
    amount: Drops,
    metadata: Value,
    sequence: u32,
    fee: Drops,
) -> Result<TransactionTemplate, TxBuilderError> {
    TxBuilder::new()
        .with_payment(signer, destination, amount, metadata)
        .with_sequence(sequence)
        .with_fee(fee)
        .build()
}

fn parse_address(field: &'static str, value: Option<&str>) -> Result<AccountAddress, TxBuilderError> {
    let value = value.ok_or(TxBuilderError::MissingField(field))?;
    AccountAddress::parse(value).map_err(invalid(field))
}

fn invalid(field: &'static str) -> impl Fn(ValidationError) -> TxBuilderError {
    move |source| TxBuilderError::Invalid { field, source }
}
