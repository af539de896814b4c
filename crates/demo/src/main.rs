//! Corridor demo binary.
//!
//! Builds and inspects shareable signing links and memos, talks to the
//! credit/liquidity API, and runs a full credential and repayment walkthrough
//! against the in-memory ledger.

use clap::{Parser, Subcommand};
use corridor_client::{
    prepare_trust_line, prepare_value_payment, AdapterId, ApiConfig, ClientConfig,
    CorridorApiClient, Dispatch, TxBuilder,
};
use corridor_codec::{decode_memo, decode_memo_type, encode_memo, template_digest, ShareableLink};
use corridor_types::{CurrencyCode, Drops};
use corridor_wallet_mock::DemoScenario;
use serde_json::{json, Value};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "corridor-demo", about = "Corridor ledger orchestration demo")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a trust-line grant and print its shareable signing link.
    Link {
        #[arg(long)]
        principal: String,
        #[arg(long)]
        issuer: String,
        /// 3-character code, 40-hex code, or a longer label such as CORRIDOR_ELIGIBLE.
        #[arg(long, default_value = "CORRIDOR_ELIGIBLE")]
        currency: String,
        #[arg(long, default_value = "1000000")]
        limit: String,
        #[arg(long, default_value = "1")]
        sequence: u32,
        /// Fee in drops.
        #[arg(long, default_value = "12")]
        fee: u64,
        #[arg(long)]
        last_ledger_sequence: Option<u32>,
        /// Host that serves the signing page.
        #[arg(long, env = "CORRIDOR_LINK_HOST", default_value = "localhost:3000")]
        host: String,
    },
    /// Decode a link token or signing URL and print the ledger JSON.
    Decode { link: String },
    /// Encode JSON metadata as memo hex, or decode memo hex with --decode.
    Memo {
        input: String,
        #[arg(long)]
        decode: bool,
    },
    /// Query the credit/liquidity API for an address.
    Score {
        address: String,
        #[arg(long, env = "CORRIDOR_API_URL")]
        api_url: Option<String>,
    },
    /// Run the credential and repayment flows against the in-memory ledger.
    Walkthrough,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Link {
            principal,
            issuer,
            currency,
            limit,
            sequence,
            fee,
            last_ledger_sequence,
            host,
        } => {
            let currency = match CurrencyCode::parse(&currency) {
                Ok(code) => code,
                Err(_) => CurrencyCode::from_label(&currency)?,
            };
            let mut builder = TxBuilder::new()
                .with_trust_line(principal, issuer, currency.as_str(), limit)
                .with_sequence(sequence)
                .with_fee(Drops::new(fee)?);
            if let Some(last) = last_ledger_sequence {
                builder = builder.with_last_ledger_sequence(last);
            }
            let tx = builder.build()?;
            let link = ShareableLink::encode(&tx);
            info!(digest = %template_digest(&tx), "template built");
            println!("{}", link.url(&host));
        }
        Command::Decode { link } => {
            let link = if link.contains("://") {
                ShareableLink::parse_url(&link)?
            } else {
                ShareableLink::from_token(link)
            };
            let tx = link.decode()?;
            println!("{}", serde_json::to_string_pretty(&tx.to_ledger_json())?);
            if let Some(memo) = tx.memo() {
                let memo_type = memo.memo_type().map(decode_memo_type).transpose()?;
                info!(memo_type = memo_type.as_deref().unwrap_or("-"), "memo attached");
                println!("{}", decode_memo(memo.memo_data())?);
            }
        }
        Command::Memo { input, decode } => {
            if decode {
                println!("{}", decode_memo(&input)?);
            } else {
                let metadata: Value = serde_json::from_str(&input)?;
                println!("{}", encode_memo(&metadata));
            }
        }
        Command::Score { address, api_url } => {
            let mut config = ClientConfig::from_env().api;
            if let Some(url) = api_url {
                config = ApiConfig {
                    base_url: url,
                    ..config
                };
            }
            let api = CorridorApiClient::new(&config)?;
            let health = api.health().await?;
            info!(status = %health.status, network = %health.network, "backend reachable");
            let score = api.credit_score(&address).await?;
            println!(
                "{address}: score {} ({}), eligible up to {} XRP",
                score.score, score.rating, score.max_eligible
            );
        }
        Command::Walkthrough => walkthrough().await?,
    }
    Ok(())
}

async fn walkthrough() -> Result<(), Box<dyn std::error::Error>> {
    let scenario = DemoScenario::new()?;
    let accounts = scenario.accounts.clone();
    let ledger = scenario.ledger.clone();

    // Issuer prepares a credential trust line for the principal and shares it.
    let currency = CurrencyCode::from_label("CORRIDOR_ELIGIBLE")?;
    let grant = prepare_trust_line(
        &ledger,
        accounts.principal.as_str(),
        accounts.issuer.as_str(),
        currency.as_str(),
        "1000000",
    )
    .await?;
    let issuer_wallet = scenario.wallet(AdapterId::Crossmark, &accounts.issuer);
    let issuer = scenario.orchestrator(issuer_wallet);
    issuer.session().connect(AdapterId::Crossmark).await?;
    let Dispatch::Deferred(link) = issuer.dispatch(&grant).await? else {
        return Err("issuer session unexpectedly signed the principal's grant".into());
    };
    info!(url = %link.url("corridor.example"), "credential link shared");

    // The issuer cannot sign the principal's link.
    match issuer.sign_link(link.token()).await {
        Err(err) => warn!(kind = %err.kind(), "{err}"),
        Ok(_) => return Err("wrong account was allowed to sign".into()),
    }

    // The principal opens the link in their own session.
    let principal_wallet = scenario.wallet(AdapterId::Crossmark, &accounts.principal);
    let principal = scenario.orchestrator(principal_wallet.clone());
    principal.session().connect(AdapterId::Crossmark).await?;
    let result = principal.sign_link(link.token()).await?;
    info!(
        success = result.success,
        explorer = principal.explorer_url(&result).as_deref().unwrap_or("-"),
        "credential accepted"
    );

    // Repayment with loan metadata, signed immediately.
    let payment = prepare_value_payment(
        &ledger,
        accounts.principal.as_str(),
        accounts.lender.as_str(),
        Drops::from_xrp("12.5")?,
        json!({"loanId": "L-1", "type": "LOAN_PAYMENT"}),
        None,
    )
    .await?;
    if let Dispatch::Submitted(result) = principal.dispatch(&payment).await? {
        info!(success = result.success, engine_result = ?result.engine_result, "repayment submitted");
    }

    // A payment that cannot create its destination is classified, not retried.
    let unfunded = prepare_value_payment(
        &ledger,
        accounts.principal.as_str(),
        accounts.unfunded.as_str(),
        Drops::from_xrp("1")?,
        json!({"loanId": "L-2"}),
        None,
    )
    .await?;
    let result = principal.submit(&unfunded).await?;
    warn!(failure = ?result.failure, engine_result = ?result.engine_result, "payment rejected");

    principal.session().disconnect().await;
    info!(
        sign_calls = principal_wallet.sign_calls(),
        submissions = ledger.submissions(),
        validated = ledger.validated(),
        "walkthrough complete"
    );
    Ok(())
}
