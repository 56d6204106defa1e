//! REST endpoints for the contest service.
//!
//! Provides HTTP endpoints for:
//! - Contest listing, detail, and stats
//! - Join pre-validation and post-transaction confirmation
//! - Membership probes and per-user contest history
//! - Operator-signed contest creation and reward distribution
//!
//! The source this service replaces grew several inconsistent endpoint
//! variants; this is the unified surface. Every error body carries a
//! machine-readable `error` kind alongside the human-readable message.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::info;
use web3::types::{Address, U256};

use crate::confirm::Confirmer;
use crate::error::{Result, ServiceError};
use crate::query::ContestQuery;
use crate::submit::Submitter;
use crate::types::{ConfirmationRecord, ContestStats, ContestView, NewContest, UserContestEntry};
use crate::util::{parse_address, unix_now};
use crate::validate::validate_join;

/// RPC configuration
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

/// RPC server state
pub struct RpcState {
    pub query: ContestQuery,
    pub submitter: Submitter,
    pub confirmer: Confirmer,
    /// Registry address and gas ceiling, echoed to clients that build their
    /// own join transaction.
    pub contract_address: Address,
    pub gas_limit: u64,
}

/// Contest service RPC server
pub struct ContestRpc {
    config: RpcConfig,
    state: Arc<RpcState>,
}

impl ContestRpc {
    pub fn new(config: RpcConfig, state: RpcState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Create the router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api", get(health))
            // Reads
            .route("/api/contests", get(list_contests))
            .route("/api/contests/:id", get(get_contest))
            .route("/api/contests/:id/stats", get(get_stats))
            .route("/api/contests/:id/joined/:address", get(get_joined))
            // Join workflow
            .route("/api/contests/:id/pre-join", post(pre_join))
            .route("/api/contests/:id/confirm-join", post(confirm_join))
            // Admin (operator-signed)
            .route("/api/contests/create", post(create_contest))
            .route("/api/contests/distribute", post(distribute_rewards))
            // History
            .route("/api/users/:address/contests", get(user_contests))
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Start the RPC server
    pub async fn start(&self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("Contest service listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}

// ==================== Request/Response Types ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreJoinRequest {
    pub user_address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionParams {
    pub contract_address: Address,
    pub method: &'static str,
    pub params: Vec<u64>,
    pub value: String,
    pub gas_limit: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreJoinResponse {
    pub allowed: bool,
    pub reasons: Vec<String>,
    pub contest: ContestView,
    pub transaction: TransactionParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmJoinRequest {
    pub user_address: String,
    pub tx_hash: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmJoinResponse {
    pub confirmed: bool,
    #[serde(flatten)]
    pub record: ConfirmationRecord,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContestRequest {
    pub name: String,
    pub stake_amount: String,
    pub start_time: u64,
    pub end_time: u64,
    pub max_participants: u32,
    pub min_participants: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContestResponse {
    pub tx_hash: String,
    pub contest_id: Option<u64>,
    pub confirmed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributeRequest {
    pub contest_id: u64,
    pub winner1: String,
    pub winner2: String,
    pub winner3: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributeResponse {
    pub tx_hash: String,
    pub confirmed: bool,
}

#[derive(Debug, Serialize)]
pub struct ListContestsResponse {
    pub contests: Vec<ContestView>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ContestResponse {
    pub contest: ContestView,
    pub participants: Vec<Address>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedResponse {
    pub contest_id: u64,
    pub user_address: Address,
    pub has_joined: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContestsResponse {
    pub user_address: Address,
    pub total: usize,
    pub contests: Vec<UserContestEntry>,
}

fn parse_contest_id(raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| ServiceError::InvalidRequest(format!("invalid contest id: {}", raw)))
}

// ==================== Handlers ====================

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": "fitstake" }))
}

async fn list_contests(State(state): State<Arc<RpcState>>) -> Result<Json<ListContestsResponse>> {
    let contests = state.query.list().await?;
    let total = contests.len();
    Ok(Json(ListContestsResponse { contests, total }))
}

async fn get_contest(
    State(state): State<Arc<RpcState>>,
    Path(id): Path<String>,
) -> Result<Json<ContestResponse>> {
    let id = parse_contest_id(&id)?;
    let (contest, participants) = state.query.contest(id).await?;
    Ok(Json(ContestResponse {
        contest,
        participants,
    }))
}

async fn get_stats(
    State(state): State<Arc<RpcState>>,
    Path(id): Path<String>,
) -> Result<Json<ContestStats>> {
    let id = parse_contest_id(&id)?;
    Ok(Json(state.query.stats(id).await?))
}

async fn get_joined(
    State(state): State<Arc<RpcState>>,
    Path((id, address)): Path<(String, String)>,
) -> Result<Json<JoinedResponse>> {
    let id = parse_contest_id(&id)?;
    let user_address = parse_address(&address)?;
    let has_joined = state.query.joined(id, user_address).await?;
    Ok(Json(JoinedResponse {
        contest_id: id,
        user_address,
        has_joined,
    }))
}

async fn pre_join(
    State(state): State<Arc<RpcState>>,
    Path(id): Path<String>,
    Json(req): Json<PreJoinRequest>,
) -> Result<Json<PreJoinResponse>> {
    let id = parse_contest_id(&id)?;
    let candidate = parse_address(&req.user_address)?;

    let (contest, participants) = state.query.snapshot(id).await?;
    let check = validate_join(&contest, &participants, candidate, unix_now());
    if !check.allowed {
        return Err(ServiceError::ValidationFailed(check.reasons));
    }

    let view = ContestView::live(&contest, participants.len(), unix_now());
    Ok(Json(PreJoinResponse {
        allowed: true,
        reasons: Vec::new(),
        transaction: TransactionParams {
            contract_address: state.contract_address,
            method: "joinContest",
            params: vec![id],
            value: contest.stake_amount.to_string(),
            gas_limit: state.gas_limit,
        },
        contest: view,
    }))
}

async fn confirm_join(
    State(state): State<Arc<RpcState>>,
    Path(id): Path<String>,
    Json(req): Json<ConfirmJoinRequest>,
) -> Result<Json<ConfirmJoinResponse>> {
    let id = parse_contest_id(&id)?;
    let address = parse_address(&req.user_address)?;
    if req.tx_hash.is_empty() {
        return Err(ServiceError::InvalidRequest("missing txHash".into()));
    }
    let record = state
        .confirmer
        .confirm_join(id, address, &req.tx_hash)
        .await?;
    Ok(Json(ConfirmJoinResponse {
        confirmed: true,
        record,
    }))
}

async fn create_contest(
    State(state): State<Arc<RpcState>>,
    Json(req): Json<CreateContestRequest>,
) -> Result<Json<CreateContestResponse>> {
    let stake_amount = U256::from_dec_str(&req.stake_amount).map_err(|_| {
        ServiceError::InvalidRequest(format!("invalid stake amount: {}", req.stake_amount))
    })?;
    let params = NewContest {
        name: req.name,
        stake_amount,
        start_time: req.start_time,
        end_time: req.end_time,
        max_participants: req.max_participants,
        min_participants: req.min_participants,
    };
    let created = state.submitter.create_contest(&params).await?;
    Ok(Json(CreateContestResponse {
        tx_hash: format!("{:?}", created.tx_hash),
        contest_id: created.contest_id,
        confirmed: created.confirmed,
    }))
}

async fn distribute_rewards(
    State(state): State<Arc<RpcState>>,
    Json(req): Json<DistributeRequest>,
) -> Result<Json<DistributeResponse>> {
    let winners = [
        parse_address(&req.winner1)?,
        parse_address(&req.winner2)?,
        parse_address(&req.winner3)?,
    ];
    let outcome = state
        .submitter
        .distribute_rewards(req.contest_id, winners)
        .await?;
    Ok(Json(DistributeResponse {
        tx_hash: format!("{:?}", outcome.tx_hash),
        confirmed: outcome.confirmed,
    }))
}

async fn user_contests(
    State(state): State<Arc<RpcState>>,
    Path(address): Path<String>,
) -> Result<Json<UserContestsResponse>> {
    let user_address = parse_address(&address)?;
    let contests = state.query.user_contests(user_address).await?;
    Ok(Json(UserContestsResponse {
        user_address,
        total: contests.len(),
        contests,
    }))
}
