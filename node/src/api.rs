//! # REST API
//!
//! Builds the axum router that exposes the desk node's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                          | Description                      |
//! |--------|-------------------------------|----------------------------------|
//! | GET    | `/health`                     | Liveness probe                   |
//! | GET    | `/status`                     | Desk status summary              |
//! | GET    | `/supply`                     | Total supply, cap, and headroom  |
//! | GET    | `/accounts/:account/balance`  | Token balance for one account    |
//! | GET    | `/treasury/:currency`         | Treasury report for one currency |
//! | GET    | `/events`                     | The desk's audit log             |
//! | POST   | `/transfer`                   | Move tokens between accounts     |
//! | POST   | `/purchases/native`           | Buy tokens with native payment   |
//! | POST   | `/purchases/wrapped`          | Buy tokens with the wrapped asset|
//! | POST   | `/withdrawals`                | Owner withdrawal of proceeds     |
//! | POST   | `/dev/fund-native`            | Devnet faucet: native balance    |
//! | POST   | `/dev/fund-wrapped`           | Devnet faucet: wrapped balance   |
//! | POST   | `/dev/approve-wrapped`        | Devnet faucet: wrapped allowance |
//!
//! The `/dev/*` faucets seed the in-memory payment rails so a devnet desk
//! is usable without external payment infrastructure. A production rail
//! integration would replace them.

use axum::{
    extract::{Path, Request, State},
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use mintdesk_core::account::{AccountId, Currency};
use mintdesk_core::desk::{DeskError, PurchaseReceipt, WithdrawalReceipt};
use mintdesk_core::ledger::BalanceEvent;
use mintdesk_core::rails::memory::{MemoryNativeRail, MemoryWrappedLedger};
use mintdesk_core::rails::RailError;
use mintdesk_core::service::DeskService;
use mintdesk_core::store::DeskStore;

use crate::metrics::SharedMetrics;

/// The concrete service type this node runs: the desk wired to the
/// in-memory devnet rails.
pub type NodeService = DeskService<MemoryNativeRail, MemoryWrappedLedger>;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Network identifier (e.g., "devnet").
    pub network: String,
    /// The desk service all operations route through.
    pub service: Arc<NodeService>,
    /// Snapshot store; `None` for ephemeral (in-memory) nodes.
    pub store: Option<Arc<DeskStore>>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

impl AppState {
    /// Persists the current desk snapshot after a settled mutation.
    /// A failed save is logged but does not fail the request — the
    /// in-memory state is authoritative until the next successful flush.
    fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.service.snapshot()) {
                tracing::warn!("failed to persist desk snapshot: {}", e);
            }
        }
    }

    /// Refreshes the supply and treasury gauges from current desk state.
    fn refresh_gauges(&self) {
        self.metrics
            .token_supply
            .set(self.service.total_supply() as i64);
        self.metrics
            .treasury_native_held
            .set(self.service.treasury_held(Currency::Native) as i64);
        self.metrics
            .treasury_wrapped_held
            .set(self.service.treasury_held(Currency::Wrapped) as i64);
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured API port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/supply", get(supply_handler))
        .route("/accounts/:account/balance", get(balance_handler))
        .route("/treasury/:currency", get(treasury_handler))
        .route("/events", get(events_handler))
        .route("/transfer", post(transfer_handler))
        .route("/purchases/native", post(purchase_native_handler))
        .route("/purchases/wrapped", post(purchase_wrapped_handler))
        .route("/withdrawals", post(withdrawal_handler))
        .route("/dev/fund-native", post(fund_native_handler))
        .route("/dev/fund-wrapped", post(fund_wrapped_handler))
        .route("/dev/approve-wrapped", post(approve_wrapped_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            track_latency,
        ))
        .with_state(state)
}

/// Observes end-to-end handling latency for every API request.
async fn track_latency(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> axum::response::Response {
    let started = Instant::now();
    let response = next.run(req).await;
    state
        .metrics
        .request_latency_seconds
        .observe(started.elapsed().as_secs_f64());
    response
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Network identifier.
    pub network: String,
    /// The desk's owner account.
    pub owner: String,
    /// Current total token supply.
    pub total_supply: u64,
    /// The supply cap.
    pub cap: u64,
    /// Fixed exchange rate (tokens per payment unit).
    pub exchange_rate: u64,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `GET /supply`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SupplyResponse {
    /// Current total token supply.
    pub total_supply: u64,
    /// The supply cap.
    pub cap: u64,
    /// Supply still available for issuance.
    pub remaining: u64,
}

/// Response payload for `GET /accounts/:account/balance`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// The queried account.
    pub account: String,
    /// Token balance (zero for accounts the desk has never seen).
    pub balance: u64,
}

/// Request payload for `POST /transfer`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Sending account.
    pub from: String,
    /// Receiving account.
    pub to: String,
    /// Token amount to move.
    pub amount: u64,
}

/// Request payload for `POST /purchases/native` and `/purchases/wrapped`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseRequest {
    /// The buying account.
    pub buyer: String,
    /// Payment amount in the chosen currency.
    pub payment: u64,
}

/// Request payload for `POST /withdrawals`.
#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    /// Currency to withdraw from the treasury.
    pub currency: Currency,
    /// Amount to withdraw.
    pub amount: u64,
    /// Account requesting the withdrawal; must be the owner.
    pub requester: String,
}

/// Request payload for the `/dev/fund-*` faucets.
#[derive(Debug, Serialize, Deserialize)]
pub struct FundRequest {
    /// Account to fund.
    pub account: String,
    /// Payment-currency amount to add.
    pub amount: u64,
}

/// Request payload for `POST /dev/approve-wrapped`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApproveRequest {
    /// The wrapped asset holder granting the allowance.
    pub owner: String,
    /// The spender being approved (the desk account for purchases).
    pub spender: String,
    /// Allowance amount.
    pub amount: u64,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Error Mapping
// ---------------------------------------------------------------------------

/// Maps a desk rejection to an HTTP status.
///
/// - authorization failures → 403
/// - malformed amounts (conversion overflow) → 400
/// - state conflicts (balance, cap, allowance, treasury) → 409
/// - configuration errors → 500 (should not surface after startup)
fn desk_error_status(err: &DeskError) -> StatusCode {
    match err {
        DeskError::NotAuthorized { .. } => StatusCode::FORBIDDEN,
        DeskError::ConversionOverflow { .. } => StatusCode::BAD_REQUEST,
        DeskError::Ledger(_) | DeskError::Cap(_) | DeskError::Treasury(_) => StatusCode::CONFLICT,
        DeskError::Rail(RailError::AllowanceInsufficient { .. })
        | DeskError::Rail(RailError::InsufficientFunds { .. }) => StatusCode::CONFLICT,
        DeskError::Rail(RailError::Rejected(_)) => StatusCode::BAD_GATEWAY,
        DeskError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Renders a desk rejection as an HTTP response and bumps the rejection
/// counter.
fn reject(state: &AppState, err: DeskError) -> axum::response::Response {
    state.metrics.operations_rejected_total.inc();
    let status = desk_error_status(&err);
    tracing::debug!(%err, %status, "operation rejected");
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Read Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
///
/// This is the liveness probe for orchestrators (k8s, systemd, etc.).
/// It intentionally does not check internal subsystem health — that
/// belongs in `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — returns a desk status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let resp = StatusResponse {
        version: state.version.clone(),
        network: state.network.clone(),
        owner: state.service.owner().to_string(),
        total_supply: state.service.total_supply(),
        cap: state.service.cap(),
        exchange_rate: state.service.exchange_rate(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    Json(resp)
}

/// `GET /supply` — returns total supply, cap, and remaining headroom.
async fn supply_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(SupplyResponse {
        total_supply: state.service.total_supply(),
        cap: state.service.cap(),
        remaining: state.service.remaining_supply(),
    })
}

/// `GET /accounts/:account/balance` — returns an account's token balance.
///
/// Unknown accounts report a zero balance rather than 404; the desk treats
/// every identifier as an account that simply has not received tokens yet.
async fn balance_handler(
    Path(account): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let balance = state.service.balance_of(&AccountId::new(account.as_str()));
    Json(BalanceResponse { account, balance })
}

/// `GET /treasury/:currency` — returns the treasury report for a currency.
///
/// Returns 400 for a currency identifier other than "native" or "wrapped".
async fn treasury_handler(
    Path(currency): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match currency.parse::<Currency>() {
        Ok(c) => Json(state.service.treasury_report(c)).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// `GET /events` — returns the desk's full audit log, oldest first.
async fn events_handler(State(state): State<AppState>) -> Json<Vec<BalanceEvent>> {
    Json(state.service.events())
}

// ---------------------------------------------------------------------------
// Mutation Handlers
// ---------------------------------------------------------------------------

/// `POST /transfer` — moves tokens between two accounts.
async fn transfer_handler(
    State(state): State<AppState>,
    Json(req): Json<TransferRequest>,
) -> impl IntoResponse {
    let from = AccountId::new(req.from.as_str());
    let to = AccountId::new(req.to.as_str());

    match state.service.transfer(&from, &to, req.amount) {
        Ok(()) => {
            state.metrics.transfers_total.inc();
            state.persist();
            (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))).into_response()
        }
        Err(e) => reject(&state, e),
    }
}

/// `POST /purchases/native` — buys tokens with native payment.
async fn purchase_native_handler(
    State(state): State<AppState>,
    Json(req): Json<PurchaseRequest>,
) -> impl IntoResponse {
    let buyer = AccountId::new(req.buyer.as_str());
    match state.service.buy_with_native(&buyer, req.payment) {
        Ok(receipt) => settle_purchase(&state, receipt),
        Err(e) => reject(&state, e),
    }
}

/// `POST /purchases/wrapped` — buys tokens with the wrapped asset.
async fn purchase_wrapped_handler(
    State(state): State<AppState>,
    Json(req): Json<PurchaseRequest>,
) -> impl IntoResponse {
    let buyer = AccountId::new(req.buyer.as_str());
    match state.service.buy_with_wrapped(&buyer, req.payment) {
        Ok(receipt) => settle_purchase(&state, receipt),
        Err(e) => reject(&state, e),
    }
}

/// Shared settlement tail for both purchase handlers.
fn settle_purchase(state: &AppState, receipt: PurchaseReceipt) -> axum::response::Response {
    state.metrics.purchases_total.inc();
    state.refresh_gauges();
    state.persist();
    (StatusCode::OK, Json(receipt)).into_response()
}

/// `POST /withdrawals` — owner withdrawal of collected proceeds.
async fn withdrawal_handler(
    State(state): State<AppState>,
    Json(req): Json<WithdrawalRequest>,
) -> impl IntoResponse {
    let requester = AccountId::new(req.requester.as_str());
    match state.service.withdraw(req.currency, req.amount, &requester) {
        Ok(receipt) => {
            state.metrics.withdrawals_total.inc();
            state.refresh_gauges();
            state.persist();
            (StatusCode::OK, Json::<WithdrawalReceipt>(receipt)).into_response()
        }
        Err(e) => reject(&state, e),
    }
}

// ---------------------------------------------------------------------------
// Devnet Faucets
// ---------------------------------------------------------------------------

/// `POST /dev/fund-native` — seeds an account's native payment balance.
async fn fund_native_handler(
    State(state): State<AppState>,
    Json(req): Json<FundRequest>,
) -> impl IntoResponse {
    let account = AccountId::new(req.account.as_str());
    state
        .service
        .with_rails_mut(|native, _| native.seed(&account, req.amount));
    tracing::debug!(%account, amount = req.amount, "native faucet");
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `POST /dev/fund-wrapped` — seeds an account's wrapped asset balance.
async fn fund_wrapped_handler(
    State(state): State<AppState>,
    Json(req): Json<FundRequest>,
) -> impl IntoResponse {
    let account = AccountId::new(req.account.as_str());
    state
        .service
        .with_rails_mut(|_, wrapped| wrapped.seed(&account, req.amount));
    tracing::debug!(%account, amount = req.amount, "wrapped faucet");
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `POST /dev/approve-wrapped` — sets a wrapped asset allowance.
async fn approve_wrapped_handler(
    State(state): State<AppState>,
    Json(req): Json<ApproveRequest>,
) -> impl IntoResponse {
    let owner = AccountId::new(req.owner.as_str());
    let spender = AccountId::new(req.spender.as_str());
    state
        .service
        .with_rails_mut(|_, wrapped| wrapped.approve(&owner, &spender, req.amount));
    tracing::debug!(%owner, %spender, amount = req.amount, "wrapped allowance set");
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
