//! HTTP client for the credit and liquidity API.

use std::time::Duration;

use corridor_codec::{template_from_link_json, CodecError};
use corridor_types::{is_valid_address, ErrorKind, TransactionTemplate};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::{classify::classify_message, config::ApiConfig};

pub const DEFAULT_CREDENTIAL_AMOUNT: &str = "1000000";
pub const DEFAULT_CREDENTIAL_CURRENCY: &str = "CORRIDOR_ELIGIBLE";
pub const MAX_LIQUIDITY_XRP: f64 = 1_000_000_000.0;
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("endpoint not found: {url}")]
    NotFound { url: String },
    #[error("API returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("cannot connect to backend at {0}")]
    Connection(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidInput,
            Self::Status { status, detail } => match classify_message(detail) {
                ErrorKind::NetworkError if (400..500).contains(status) => ErrorKind::InvalidInput,
                kind => kind,
            },
            Self::NotFound { .. } | Self::Connection(_) | Self::Http(_) | Self::Parse(_) => {
                ErrorKind::NetworkError
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub network: String,
    #[serde(default)]
    pub issuer_configured: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct CredentialIssueRequest<'a> {
    principal_address: &'a str,
    amount: &'a str,
    currency: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CredentialIssueResponse {
    /// Unsigned trust-line transaction prepared by the issuer.
    pub transaction: Value,
    pub issuer: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub original_currency: Option<String>,
}

impl CredentialIssueResponse {
    /// The prepared transaction as a template, ready to share or sign.
    pub fn template(&self) -> Result<TransactionTemplate, CodecError> {
        template_from_link_json(self.transaction.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidityRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_did: Option<String>,
    pub principal_address: String,
    pub amount_xrp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchedBank {
    pub name: String,
    pub wallet: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LiquidityRequestResponse {
    pub status: String,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub transaction: Option<Value>,
    #[serde(default)]
    pub amount_xrp: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub credit: Option<CreditScore>,
    #[serde(default)]
    pub unlock_timestamp: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub matched_bank: Option<MatchedBank>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreditFactors {
    pub trust_lines: u32,
    pub successful_payments: u32,
    pub default_rate: f64,
    pub volatility: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreditScore {
    pub score: u32,
    pub rating: String,
    pub max_eligible: f64,
    pub factors: CreditFactors,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProofVerificationResponse {
    pub valid: bool,
    pub confidence_score: f64,
    #[serde(default)]
    pub default_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Payment {
    pub id: String,
    pub date: String,
    pub time: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(rename = "txHash")]
    pub tx_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankRegistration {
    pub bank_name: String,
    pub wallet_address: String,
    pub max_per_loan: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_credit_score: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Bank {
    pub bank_name: String,
    pub wallet_address: String,
    pub max_per_loan: f64,
    pub min_credit_score: u32,
    pub balance_xrp: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BankRegistrationResponse {
    pub status: String,
    pub bank: Bank,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct FinishEscrowRequest<'a> {
    borrower_wallet: &'a str,
    escrow_sequence: u32,
    owner_wallet: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FinishEscrowResponse {
    pub status: String,
    pub transaction: Value,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

/// Client for the credit/liquidity API. Every address is validated before a
/// request leaves the process.
#[derive(Debug, Clone)]
pub struct CorridorApiClient {
    client: Client,
    base_url: String,
}

impl CorridorApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get("/health").await
    }

    /// Asks the issuer to prepare a trust-line credential for `principal`.
    /// `amount` and `currency` default to `1000000` and `CORRIDOR_ELIGIBLE`.
    pub async fn issue_credential(
        &self,
        principal: &str,
        amount: Option<&str>,
        currency: Option<&str>,
    ) -> Result<CredentialIssueResponse, ApiError> {
        let amount = amount.unwrap_or(DEFAULT_CREDENTIAL_AMOUNT);
        let currency = currency.unwrap_or(DEFAULT_CREDENTIAL_CURRENCY);
        check_address(principal)?;
        if !is_decimal(amount) {
            return Err(ApiError::InvalidRequest(
                "amount must be a positive number".into(),
            ));
        }
        if !(3..=40).contains(&currency.len())
            || !currency
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
        {
            return Err(ApiError::InvalidRequest(
                "currency must be 3-40 uppercase alphanumeric characters".into(),
            ));
        }
        self.post(
            "/api/credentials/issue",
            &CredentialIssueRequest {
                principal_address: principal,
                amount,
                currency,
            },
        )
        .await
    }

    pub async fn request_liquidity(
        &self,
        request: &LiquidityRequest,
    ) -> Result<LiquidityRequestResponse, ApiError> {
        check_address(&request.principal_address)?;
        if !(request.amount_xrp > 0.0 && request.amount_xrp <= MAX_LIQUIDITY_XRP) {
            return Err(ApiError::InvalidRequest(
                "amount must be between 0 and 1,000,000,000 XRP".into(),
            ));
        }
        self.post("/api/liquidity/request", request).await
    }

    pub async fn credit_score(&self, address: &str) -> Result<CreditScore, ApiError> {
        check_address(address)?;
        self.get(&format!("/api/credentials/score/{address}")).await
    }

    pub async fn verify_proof(&self, metrics: &Value) -> Result<ProofVerificationResponse, ApiError> {
        if !metrics.is_object() {
            return Err(ApiError::InvalidRequest("invalid proof data".into()));
        }
        self.post("/api/liquidity/verify-proof", metrics).await
    }

    pub async fn payment_history(&self, address: &str, limit: u32) -> Result<Vec<Payment>, ApiError> {
        check_address(address)?;
        let url = self.url("/api/payments/history");
        let request = self
            .client
            .get(&url)
            .query(&[("address", address.to_string()), ("limit", limit.to_string())]);
        self.send(request, &url).await
    }

    pub async fn register_bank(
        &self,
        registration: &BankRegistration,
    ) -> Result<BankRegistrationResponse, ApiError> {
        check_address(&registration.wallet_address)?;
        self.post("/api/banks/register", registration).await
    }

    pub async fn finish_escrow(
        &self,
        borrower_wallet: &str,
        escrow_sequence: u32,
        owner_wallet: &str,
    ) -> Result<FinishEscrowResponse, ApiError> {
        check_address(borrower_wallet)?;
        check_address(owner_wallet)?;
        self.post(
            "/api/liquidity/finish-escrow",
            &FinishEscrowRequest {
                borrower_wallet,
                escrow_sequence,
                owner_wallet,
            },
        )
        .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        self.send(self.client.get(&url), &url).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        self.send(self.client.post(&url).json(body), &url).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T, ApiError> {
        debug!(%url, "calling corridor API");
        let response = request.send().await.map_err(|err| {
            if err.is_connect() {
                ApiError::Connection(self.base_url.clone())
            } else {
                ApiError::Http(err)
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("error").to_string();
            let detail = match response.json::<ErrorBody>().await {
                Ok(ErrorBody {
                    detail: Some(Value::String(detail)),
                }) => detail,
                Ok(ErrorBody {
                    detail: Some(detail),
                }) => detail.to_string(),
                _ => reason,
            };
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json()
            .await
            .map_err(|err| ApiError::Parse(err.to_string()))
    }
}

fn check_address(address: &str) -> Result<(), ApiError> {
    if is_valid_address(address) {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest(format!("invalid XRPL address `{address}`")))
    }
}

fn is_decimal(value: &str) -> bool {
    let (int, frac) = match value.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (value, None),
    };
    !int.is_empty()
        && int.bytes().all(|b| b.is_ascii_digit())
        && frac.map_or(true, |f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use axum::{
        extract::{Path, Query},
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use corridor_types::{ErrorKind, TransactionKind};
    use serde_json::{json, Value};

    use super::{ApiError, CorridorApiClient, LiquidityRequest};
    use crate::config::ApiConfig;

    const PRINCIPAL: &str = "rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe";
    const ISSUER: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

    async fn serve(router: Router) -> CorridorApiClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        CorridorApiClient::new(&ApiConfig {
            base_url: format!("http://{addr}/"),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn stub() -> Router {
        Router::new()
            .route(
                "/health",
                get(|| async { Json(json!({"status": "ok", "network": "testnet", "issuer_configured": true})) }),
            )
            .route(
                "/api/credentials/issue",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({
                        "transaction": {
                            "transaction_type": "TrustSet",
                            "account": body["principal_address"],
                            "limit_amount": {
                                "currency": "434F525249444F525F454C494749424C45000000",
                                "issuer": ISSUER,
                                "value": body["amount"]
                            },
                            "fee": "12",
                            "sequence": 7,
                            "last_ledger_sequence": 120,
                            "flags": 0
                        },
                        "issuer": ISSUER,
                        "status": "prepared",
                        "original_currency": body["currency"]
                    }))
                }),
            )
            .route(
                "/api/credentials/score/{address}",
                get(|Path(address): Path<String>| async move {
                    Json(json!({
                        "score": 640,
                        "rating": "Fair",
                        "max_eligible": 250.0,
                        "factors": {"trust_lines": 2, "successful_payments": 6, "default_rate": 0.004, "volatility": 0.12},
                        "address": address
                    }))
                }),
            )
            .route(
                "/api/liquidity/request",
                post(|| async {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"detail": "Principal account is not funded"})),
                    )
                }),
            )
            .route(
                "/api/payments/history",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    let limit: usize = params["limit"].parse().unwrap();
                    let payments: Vec<Value> = (0..limit.min(2))
                        .map(|i| json!({
                            "id": format!("H{i}"),
                            "date": "2026-01-02",
                            "time": "10:00:00",
                            "amount": 12.5,
                            "type": "Payment",
                            "status": "Completed",
                            "txHash": format!("H{i}")
                        }))
                        .collect();
                    Json(Value::Array(payments))
                }),
            )
            .route(
                "/api/liquidity/verify-proof",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
    }

    #[tokio::test]
    async fn health_and_score() {
        let client = serve(stub()).await;
        let health = client.health().await.unwrap();
        assert_eq!(health.network, "testnet");
        assert_eq!(health.issuer_configured, Some(true));

        let score = client.credit_score(PRINCIPAL).await.unwrap();
        assert_eq!(score.score, 640);
        assert_eq!(score.factors.successful_payments, 6);
    }

    #[tokio::test]
    async fn issued_credential_converts_to_template() {
        let client = serve(stub()).await;
        let issued = client.issue_credential(PRINCIPAL, None, None).await.unwrap();
        assert_eq!(issued.status, "prepared");
        assert_eq!(issued.original_currency.as_deref(), Some("CORRIDOR_ELIGIBLE"));
        let tx = issued.template().unwrap();
        assert_eq!(tx.kind(), TransactionKind::TrustLineGrant);
        assert_eq!(tx.account().as_str(), PRINCIPAL);
        assert_eq!(tx.last_ledger_sequence(), Some(120));
    }

    #[tokio::test]
    async fn history_passes_query() {
        let client = serve(stub()).await;
        let payments = client.payment_history(PRINCIPAL, 1).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].kind, "Payment");
        assert_eq!(payments[0].tx_hash, "H0");
    }

    #[tokio::test]
    async fn server_errors_keep_detail() {
        let client = serve(stub()).await;
        let err = client
            .request_liquidity(&LiquidityRequest {
                principal_did: None,
                principal_address: PRINCIPAL.into(),
                amount_xrp: 100.0,
                proof_data: None,
            })
            .await
            .unwrap_err();
        match &err {
            ApiError::Status { status, detail } => {
                assert_eq!(*status, 400);
                assert_eq!(detail, "Principal account is not funded");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::AccountNotFunded);

        let err = client.verify_proof(&json!({"default_rate": 0.1})).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));

        let err = client
            .register_bank(&super::BankRegistration {
                bank_name: "First".into(),
                wallet_address: ISSUER.into(),
                max_per_loan: 100.0,
                min_credit_score: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { ref url } if url.ends_with("/api/banks/register")));
        assert_eq!(err.kind(), ErrorKind::NetworkError);
    }

    #[tokio::test]
    async fn validates_before_sending() {
        let client = serve(Router::new()).await;
        let invalid = |err: ApiError| matches!(err, ApiError::InvalidRequest(_));
        assert!(invalid(client.credit_score("rI1nvalid").await.unwrap_err()));
        assert!(invalid(client.issue_credential(PRINCIPAL, Some("1e6"), None).await.unwrap_err()));
        assert!(invalid(client.issue_credential(PRINCIPAL, None, Some("usd")).await.unwrap_err()));
        assert!(invalid(
            client
                .request_liquidity(&LiquidityRequest {
                    principal_did: None,
                    principal_address: PRINCIPAL.into(),
                    amount_xrp: 0.0,
                    proof_data: None,
                })
                .await
                .unwrap_err()
        ));
        assert!(invalid(client.verify_proof(&json!([1, 2])).await.unwrap_err()));
        assert!(invalid(client.finish_escrow(PRINCIPAL, 3, "bad").await.unwrap_err()));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = CorridorApiClient::new(&ApiConfig {
            base_url: format!("http://{addr}"),
            timeout: Duration::from_secs(2),
        })
        .unwrap();
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, ApiError::Connection(_)), "{err:?}");
        assert_eq!(err.kind(), ErrorKind::NetworkError);
    }
}
