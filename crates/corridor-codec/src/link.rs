//! Shareable signing links.
//!
//! A link token is the template's JSON form, base64-encoded with the standard
//! alphabet, then remapped so it survives inside a URL path segment without
//! percent-encoding: `+` becomes `-`, `/` becomes `_` and `=` becomes `.`.
//! Decoding reverses the remap and rejects any character outside that alphabet.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use corridor_types::{
    AccountAddress, CurrencyCode, DecimalValue, Drops, IssuedAmount, Memo, TemplatePayload,
    TransactionKind, TransactionTemplate,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CodecError;

/// Path segment that precedes the token in a signing URL.
pub const SIGN_CREDENTIAL_PATH: &str = "sign-credential";

/// JSON shape carried inside a link token.
///
/// `transaction_type` is omitted for trust-line grants; tokens issued without it
/// decode as trust-line grants.
#[derive(Debug, Serialize, Deserialize)]
struct LinkPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transaction_type: Option<String>,
    account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit_amount: Option<LimitAmountWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    amount: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    memos: Vec<MemoWire>,
    fee: String,
    sequence: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_ledger_sequence: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LimitAmountWire {
    currency: String,
    issuer: String,
    value: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct MemoWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    memo_type: Option<String>,
    memo_data: String,
}

impl From<&TransactionTemplate> for LinkPayload {
    fn from(tx: &TransactionTemplate) -> Self {
        let mut payload = LinkPayload {
            transaction_type: None,
            account: tx.account().to_string(),
            limit_amount: None,
            destination: None,
            amount: None,
            memos: Vec::new(),
            fee: tx.fee().to_string(),
            sequence: tx.sequence(),
            last_ledger_sequence: tx.last_ledger_sequence(),
        };
        match tx.payload() {
            TemplatePayload::TrustLineGrant { limit_amount } => {
                payload.limit_amount = Some(LimitAmountWire {
                    currency: limit_amount.currency.to_string(),
                    issuer: limit_amount.issuer.to_string(),
                    value: limit_amount.value.to_string(),
                });
            }
            TemplatePayload::ValuePayment {
                destination,
                amount,
                memos,
            } => {
                payload.transaction_type = Some(TransactionKind::ValuePayment.ledger_name().into());
                payload.destination = Some(destination.to_string());
                payload.amount = Some(amount.to_string());
                payload.memos = memos
                    .iter()
                    .map(|memo| MemoWire {
                        memo_type: memo.memo_type().map(str::to_string),
                        memo_data: memo.memo_data().to_string(),
                    })
                    .collect();
            }
        }
        payload
    }
}

impl TryFrom<LinkPayload> for TransactionTemplate {
    type Error = CodecError;

    fn try_from(payload: LinkPayload) -> Result<Self, Self::Error> {
        let kind = match payload.transaction_type.as_deref() {
            None => TransactionKind::TrustLineGrant,
            Some(name) => TransactionKind::from_ledger_name(name).ok_or_else(|| {
                CodecError::InvalidLink(format!("unsupported transaction type `{name}`"))
            })?,
        };
        let account = AccountAddress::parse(&payload.account).map_err(field("account"))?;
        let fee = Drops::from_drops_str(&payload.fee).map_err(field("fee"))?;

        let body = match kind {
            TransactionKind::TrustLineGrant => {
                let limit = payload.limit_amount.ok_or_else(|| missing("limit_amount"))?;
                TemplatePayload::TrustLineGrant {
                    limit_amount: IssuedAmount {
                        currency: CurrencyCode::parse(&limit.currency)
                            .map_err(field("limit_amount.currency"))?,
                        issuer: AccountAddress::parse(&limit.issuer)
                            .map_err(field("limit_amount.issuer"))?,
                        value: DecimalValue::parse(&limit.value)
                            .map_err(field("limit_amount.value"))?,
                    },
                }
            }
            TransactionKind::ValuePayment => {
                let destination = payload.destination.ok_or_else(|| missing("destination"))?;
                let amount = payload.amount.ok_or_else(|| missing("amount"))?;
                let memos = payload
                    .memos
                    .into_iter()
                    .map(memo_from_wire)
                    .collect::<Result<Vec<_>, _>>()?;
                TemplatePayload::ValuePayment {
                    destination: AccountAddress::parse(&destination)
                        .map_err(field("destination"))?,
                    amount: Drops::from_drops_str(&amount).map_err(field("amount"))?,
                    memos,
                }
            }
        };

        Ok(TransactionTemplate::new(
            account,
            fee,
            payload.sequence,
            payload.last_ledger_sequence,
            body,
        ))
    }
}

fn memo_from_wire(memo: MemoWire) -> Result<Memo, CodecError> {
    Memo::from_hex(memo.memo_type.as_deref(), &memo.memo_data).map_err(field("memos"))
}

fn field<E: std::fmt::Display>(name: &'static str) -> impl Fn(E) -> CodecError {
    move |err| CodecError::InvalidLink(format!("{name}: {err}"))
}

fn missing(name: &'static str) -> CodecError {
    CodecError::InvalidLink(format!("missing field `{name}`"))
}

pub fn encode_shareable_link(tx: &TransactionTemplate) -> String {
    // Serializing a plain struct of strings and integers cannot fail.
    let json = serde_json::to_vec(&LinkPayload::from(tx)).unwrap_or_default();
    STANDARD
        .encode(json)
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            '=' => '.',
            other => other,
        })
        .collect()
}

pub fn decode_shareable_link(token: &str) -> Result<TransactionTemplate, CodecError> {
    if token.is_empty() {
        return Err(CodecError::InvalidLink("empty token".into()));
    }
    let standard = token
        .chars()
        .map(|c| match c {
            '-' => Ok('+'),
            '_' => Ok('/'),
            '.' => Ok('='),
            c if c.is_ascii_alphanumeric() => Ok(c),
            other => Err(CodecError::InvalidLink(format!(
                "unexpected character `{other}` in token"
            ))),
        })
        .collect::<Result<String, _>>()?;
    let json = STANDARD
        .decode(standard)
        .map_err(|err| CodecError::InvalidLink(format!("invalid base64: {err}")))?;
    let payload: LinkPayload = serde_json::from_slice(&json)
        .map_err(|err| CodecError::InvalidLink(format!("invalid payload: {err}")))?;
    TransactionTemplate::try_from(payload)
}

/// Reads a template from the JSON object an issuer hands out for deferred
/// signing, i.e. the object a link token wraps.
pub fn template_from_link_json(value: Value) -> Result<TransactionTemplate, CodecError> {
    let payload: LinkPayload = serde_json::from_value(value)
        .map_err(|err| CodecError::InvalidLink(format!("invalid payload: {err}")))?;
    TransactionTemplate::try_from(payload)
}

/// A link token together with helpers for the `/sign-credential/<token>` URL form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareableLink {
    token: String,
}

impl ShareableLink {
    pub fn encode(tx: &TransactionTemplate) -> Self {
        Self {
            token: encode_shareable_link(tx),
        }
    }

    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn decode(&self) -> Result<TransactionTemplate, CodecError> {
        decode_shareable_link(&self.token)
    }

    /// `host` is either a bare host (`app.example.com`) or a base URL with scheme.
    pub fn url(&self, host: &str) -> String {
        let base = host.trim_end_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            format!("{base}/{SIGN_CREDENTIAL_PATH}/{}", self.token)
        } else {
            format!("https://{base}/{SIGN_CREDENTIAL_PATH}/{}", self.token)
        }
    }

    /// Extracts the token from a signing URL. Query strings and fragments are ignored.
    pub fn parse_url(url: &str) -> Result<Self, CodecError> {
        let marker = format!("/{SIGN_CREDENTIAL_PATH}/");
        let start = url
            .find(&marker)
            .map(|idx| idx + marker.len())
            .ok_or_else(|| CodecError::InvalidLink(format!("no `{marker}` segment in url")))?;
        let rest = &url[start..];
        let end = rest.find(['?', '#', '/']).unwrap_or(rest.len());
        let token = &rest[..end];
        if token.is_empty() {
            return Err(CodecError::InvalidLink("url carries no token".into()));
        }
        Ok(Self::from_token(token))
    }
}
