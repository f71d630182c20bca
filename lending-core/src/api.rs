//! HTTP surface of the lending node
//!
//! JSON routes over a [`PoolHandle`], plus `/health` and `/metrics`.
//! Amounts travel as decimal strings of base units, since most JSON clients
//! cannot hold a `u128`.
//!
//! | Route | Operation |
//! |---|---|
//! | `GET /health` | liveness |
//! | `GET /metrics` | Prometheus exposition |
//! | `GET /pool` | pool summary |
//! | `GET /pool/accounts/:account` | position and borrowing capacity |
//! | `POST /pool/lend` | [`PoolHandle::lend`] |
//! | `POST /pool/collateral/deposit` | [`PoolHandle::deposit_collateral`] |
//! | `POST /pool/borrow` | [`PoolHandle::borrow_eth`] |
//! | `POST /pool/repay` | [`PoolHandle::repay_loan`] |
//! | `POST /pool/collateral/withdraw` | [`PoolHandle::withdraw_collateral`] |
//! | `POST /pool/ltv` | [`PoolHandle::set_ltv_ratio`] |
//! | `POST /wallets/credit` | fund an in-memory wallet |
//! | `GET /wallets/:account` | in-memory wallet balances |

use crate::{
    actor::PoolHandle,
    metrics::Metrics,
    transfer::InMemoryTransfer,
    types::{AccountId, Amount, Asset},
    Error,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state of the HTTP handlers
#[derive(Clone, Debug)]
pub struct ApiState {
    /// Pool actor
    pub pool: PoolHandle,

    /// Wallet book behind the pool's transfer adapter
    pub wallets: Arc<InMemoryTransfer>,

    /// Metrics exposed at `/metrics`
    pub metrics: Metrics,
}

/// Build the node router
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/pool", get(pool_summary))
        .route("/pool/accounts/:account", get(account_summary))
        .route("/pool/lend", post(lend))
        .route("/pool/collateral/deposit", post(deposit_collateral))
        .route("/pool/borrow", post(borrow_eth))
        .route("/pool/repay", post(repay_loan))
        .route("/pool/collateral/withdraw", post(withdraw_collateral))
        .route("/pool/ltv", post(set_ltv_ratio))
        .route("/wallets/credit", post(credit_wallet))
        .route("/wallets/:account", get(wallet_balances))
        .with_state(state)
}

// ============== Request/Response Types ==============

/// Amount-carrying request for one account
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    /// Calling account
    pub account: String,
    /// Base units, as a decimal string
    pub amount: String,
}

/// LTV change request
#[derive(Debug, Deserialize)]
pub struct LtvRequest {
    /// Calling account (must be the administrator)
    pub caller: String,
    /// New ratio in percent
    pub ltv_ratio: u64,
}

/// Wallet funding request
#[derive(Debug, Deserialize)]
pub struct CreditRequest {
    /// Wallet owner
    pub account: String,
    /// Asset to credit
    pub asset: Asset,
    /// Base units, as a decimal string
    pub amount: String,
}

/// Pool summary
#[derive(Debug, Serialize, Deserialize)]
pub struct PoolSummary {
    /// Settlement asset available for borrowing
    pub pool_balance: String,
    /// Current LTV ratio
    pub ltv_ratio: u64,
    /// Sum of outstanding debt
    pub total_borrowed: String,
    /// Sum of posted collateral
    pub total_collateral: String,
    /// Journal length
    pub events: usize,
}

/// Per-account summary
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountSummary {
    /// Account identity
    pub account: String,
    /// Collateral posted
    pub collateral_deposited: String,
    /// Current debt
    pub amount_borrowed: String,
    /// Debt cap at the current rate
    pub max_borrowable: String,
}

/// Repayment outcome
#[derive(Debug, Serialize, Deserialize)]
pub struct RepaymentResponse {
    /// Debt cleared
    pub repaid: String,
    /// Overpayment refunded
    pub refunded: String,
}

/// Wallet balances outside the pool
#[derive(Debug, Serialize, Deserialize)]
pub struct WalletResponse {
    /// Wallet owner
    pub account: String,
    /// Settlement asset held
    pub settlement: String,
    /// Collateral held
    pub collateral: String,
}

// ============== HTTP Handlers ==============

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "lending-node",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn metrics_handler(State(state): State<ApiState>) -> Result<String, ApiError> {
    Ok(state.metrics.export()?)
}

async fn pool_summary(State(state): State<ApiState>) -> Result<Json<PoolSummary>, ApiError> {
    let snapshot = state.pool.snapshot().await?;
    Ok(Json(PoolSummary {
        pool_balance: snapshot.pool_balance.to_string(),
        ltv_ratio: snapshot.ltv_ratio,
        total_borrowed: snapshot.total_borrowed().to_string(),
        total_collateral: snapshot.total_collateral().to_string(),
        events: snapshot.events.len(),
    }))
}

async fn account_summary(
    State(state): State<ApiState>,
    Path(account): Path<String>,
) -> Result<Json<AccountSummary>, ApiError> {
    let id = AccountId::new(account.clone());
    let position = state.pool.position(id.clone()).await?;
    let max_borrowable = state.pool.max_borrowable(id).await?;

    Ok(Json(AccountSummary {
        account,
        collateral_deposited: position.collateral_deposited.to_string(),
        amount_borrowed: position.amount_borrowed.to_string(),
        max_borrowable: max_borrowable.to_string(),
    }))
}

async fn lend(
    State(state): State<ApiState>,
    Json(request): Json<AmountRequest>,
) -> Result<StatusCode, ApiError> {
    let amount = parse_amount(&request.amount)?;
    state.pool.lend(AccountId::new(request.account), amount).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn deposit_collateral(
    State(state): State<ApiState>,
    Json(request): Json<AmountRequest>,
) -> Result<StatusCode, ApiError> {
    let amount = parse_amount(&request.amount)?;
    state
        .pool
        .deposit_collateral(AccountId::new(request.account), amount)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn borrow_eth(
    State(state): State<ApiState>,
    Json(request): Json<AmountRequest>,
) -> Result<StatusCode, ApiError> {
    let amount = parse_amount(&request.amount)?;
    state.pool.borrow_eth(AccountId::new(request.account), amount).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn repay_loan(
    State(state): State<ApiState>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<RepaymentResponse>, ApiError> {
    let amount = parse_amount(&request.amount)?;
    let repayment = state
        .pool
        .repay_loan(AccountId::new(request.account), amount)
        .await?;

    Ok(Json(RepaymentResponse {
        repaid: repayment.repaid.to_string(),
        refunded: repayment.refunded.to_string(),
    }))
}

async fn withdraw_collateral(
    State(state): State<ApiState>,
    Json(request): Json<AmountRequest>,
) -> Result<StatusCode, ApiError> {
    let amount = parse_amount(&request.amount)?;
    state
        .pool
        .withdraw_collateral(AccountId::new(request.account), amount)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_ltv_ratio(
    State(state): State<ApiState>,
    Json(request): Json<LtvRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .pool
        .set_ltv_ratio(AccountId::new(request.caller), request.ltv_ratio)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn credit_wallet(
    State(state): State<ApiState>,
    Json(request): Json<CreditRequest>,
) -> Result<StatusCode, ApiError> {
    let amount = parse_amount(&request.amount)?;
    let account = AccountId::new(request.account);
    state.wallets.credit(&account, request.asset, amount);

    tracing::info!(account = %account, asset = %request.asset, amount, "Wallet credited");
    Ok(StatusCode::NO_CONTENT)
}

async fn wallet_balances(
    State(state): State<ApiState>,
    Path(account): Path<String>,
) -> Json<WalletResponse> {
    let id = AccountId::new(account.clone());
    Json(WalletResponse {
        settlement: state.wallets.balance_of(&id, Asset::Settlement).to_string(),
        collateral: state.wallets.balance_of(&id, Asset::Collateral).to_string(),
        account,
    })
}

fn parse_amount(raw: &str) -> Result<Amount, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("amount {:?} is not a base-unit integer", raw)))
}

// ============== Error Handling ==============

/// HTTP-facing error
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request
    BadRequest(String),
    /// Pool or infrastructure error
    Pool(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Pool(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BadRequest", msg),
            ApiError::Pool(err) => {
                let status = match &err {
                    Error::Unauthorized { .. } => StatusCode::FORBIDDEN,
                    Error::Reentrant { .. } => StatusCode::CONFLICT,
                    Error::Concurrency(_) => StatusCode::SERVICE_UNAVAILABLE,
                    e if e.is_rejection() => StatusCode::UNPROCESSABLE_ENTITY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.code(), err.to_string())
            }
        };

        (status, Json(serde_json::json!({ "code": code, "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::spawn_pool_actor;
    use crate::oracle::FixedPriceOracle;
    use crate::pool::LendingPool;
    use crate::types::{AssetId, OracleId, PoolParams};
    use crate::valuation::DEFAULT_PRICE_SCALE;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tower::ServiceExt;

    const ONE: Amount = DEFAULT_PRICE_SCALE;

    fn test_router() -> Router {
        let wallets = Arc::new(InMemoryTransfer::new());
        let oracle = Arc::new(FixedPriceOracle::new(ONE));
        let params = PoolParams {
            administrator: AccountId::new("admin"),
            collateral_asset: AssetId::new("COLL"),
            price_oracle: OracleId::new("COLL/ETH"),
            price_scale: ONE,
            initial_ltv_ratio: 75,
        };
        let metrics = Metrics::new().unwrap();
        let pool = LendingPool::new(params, wallets.clone(), oracle)
            .unwrap()
            .with_metrics(metrics.clone());

        router(ApiState {
            pool: spawn_pool_actor(pool, 16),
            wallets,
            metrics,
        })
    }

    async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(app: &Router, uri: &str) -> T {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_borrow_flow_over_http() {
        let app = test_router();
        let thousand = (1_000 * ONE).to_string();

        let (status, _) = post_json(
            &app,
            "/wallets/credit",
            serde_json::json!({ "account": "bob", "asset": "Collateral", "amount": thousand }),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        for (uri, account) in [("/pool/lend", "alice"), ("/pool/collateral/deposit", "bob")] {
            let (status, _) =
                post_json(&app, uri, serde_json::json!({ "account": account, "amount": thousand }))
                    .await;
            assert_eq!(status, StatusCode::NO_CONTENT);
        }

        let summary: AccountSummary = get_json(&app, "/pool/accounts/bob").await;
        assert_eq!(summary.max_borrowable, (750 * ONE).to_string());

        let (status, _) = post_json(
            &app,
            "/pool/borrow",
            serde_json::json!({ "account": "bob", "amount": (750 * ONE).to_string() }),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = post_json(
            &app,
            "/pool/borrow",
            serde_json::json!({ "account": "bob", "amount": "1" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error["code"], "LtvExceeded");

        let (status, body) = post_json(
            &app,
            "/pool/repay",
            serde_json::json!({ "account": "bob", "amount": (751 * ONE).to_string() }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let repayment: RepaymentResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(repayment.refunded, ONE.to_string());

        let pool: PoolSummary = get_json(&app, "/pool").await;
        assert_eq!(pool.pool_balance, (1_000 * ONE).to_string());
        assert_eq!(pool.total_borrowed, "0");

        let wallet: WalletResponse = get_json(&app, "/wallets/bob").await;
        assert_eq!(wallet.settlement, (751 * ONE).to_string());
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let app = test_router();

        let (status, _) = post_json(
            &app,
            "/pool/lend",
            serde_json::json!({ "account": "alice", "amount": "-5" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_json(
            &app,
            "/pool/ltv",
            serde_json::json!({ "caller": "mallory", "ltv_ratio": 90 }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = post_json(
            &app,
            "/pool/ltv",
            serde_json::json!({ "caller": "admin", "ltv_ratio": 60 }),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let pool: PoolSummary = get_json(&app, "/pool").await;
        assert_eq!(pool.ltv_ratio, 60);
    }

    #[tokio::test]
    async fn test_metrics_route() {
        let app = test_router();
        post_json(
            &app,
            "/pool/lend",
            serde_json::json!({ "account": "alice", "amount": "5" }),
        )
        .await;

        let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("lending_pool_balance 5"));
    }
}
