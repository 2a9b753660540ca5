//! HTTP API for transfer orchestration and health checks

use crate::config::ApiConfig;
use crate::error::{TransferError, TransferResult};
use crate::orchestrator::{PollStatus, TransferOrchestrator, TransferRequest};
use crate::tx::TransferSigner;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TransferOrchestrator>,
    /// Signing seeds of principals with an active transfer
    pub signers: Arc<DashMap<String, String>>,
}

/// Run the HTTP API server
pub async fn run_server(
    config: ApiConfig,
    orchestrator: Arc<TransferOrchestrator>,
) -> TransferResult<()> {
    let state = AppState {
        orchestrator,
        signers: Arc::new(DashMap::new()),
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/transfers", post(start_transfer))
        .route("/transfers/:principal/poll", post(poll_transfer))
        .route("/transfers/:principal", delete(abandon_transfer))
        .route("/names", post(register_name))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();

    Ok(())
}

/// Health check endpoint - basic liveness
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Start a transfer for the signing principal
async fn start_transfer(
    State(state): State<AppState>,
    Json(body): Json<StartTransferBody>,
) -> Result<Json<StartTransferResponse>, ApiError> {
    let signer = TransferSigner::from_seed_hex(&body.seed)?;
    let principal = signer.address();

    let tx_hash = state
        .orchestrator
        .start(TransferRequest {
            signer: &signer,
            destination: body.destination,
            source_chain: body.source_chain,
            destination_chain: body.destination_chain,
            symbol: body.symbol,
            amount_or_id: body.amount_or_id,
            fungible: body.fungible,
        })
        .await?;

    state.signers.insert(principal.clone(), body.seed);

    Ok(Json(StartTransferResponse { principal, tx_hash }))
}

/// Advance the principal's transfer by one step
async fn poll_transfer(
    State(state): State<AppState>,
    Path(principal): Path<String>,
) -> Result<Json<PollResponse>, ApiError> {
    let seed = state
        .signers
        .get(&principal)
        .map(|s| s.clone())
        .ok_or_else(|| TransferError::NoPendingTransfer {
            principal: principal.clone(),
        })?;
    let signer = TransferSigner::from_seed_hex(&seed)?;

    let status = state.orchestrator.poll(&principal, &signer).await?;

    if status == PollStatus::Completed {
        state.signers.remove(&principal);
    }

    Ok(Json(PollResponse::from(status)))
}

/// Drop local tracking of the principal's transfer
async fn abandon_transfer(
    State(state): State<AppState>,
    Path(principal): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.orchestrator.abandon(&principal).await?;
    state.signers.remove(&principal);
    Ok(StatusCode::NO_CONTENT)
}

/// Submit a name registration for the signing principal
async fn register_name(
    State(state): State<AppState>,
    Json(body): Json<RegisterNameBody>,
) -> Result<Json<RegisterNameResponse>, ApiError> {
    let signer = TransferSigner::from_seed_hex(&body.seed)?;
    let tx_hash = state
        .orchestrator
        .register_name(&signer, &body.chain, &body.name)
        .await?;

    Ok(Json(RegisterNameResponse { tx_hash }))
}

// Request and response types

#[derive(Deserialize)]
struct StartTransferBody {
    seed: String,
    destination: String,
    source_chain: String,
    destination_chain: String,
    symbol: String,
    amount_or_id: String,
    fungible: bool,
}

#[derive(Serialize)]
struct StartTransferResponse {
    principal: String,
    tx_hash: String,
}

#[derive(Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
enum PollResponse {
    HopConfirming {
        tx_hash: String,
        hop_index: usize,
        confirmations: u64,
    },
    SettlementConfirming {
        tx_hash: String,
        confirmations: u64,
    },
    Completed,
}

impl From<PollStatus> for PollResponse {
    fn from(status: PollStatus) -> Self {
        match status {
            PollStatus::HopConfirming {
                tx_hash,
                hop_index,
                confirmations,
            } => PollResponse::HopConfirming {
                tx_hash,
                hop_index,
                confirmations,
            },
            PollStatus::SettlementConfirming {
                tx_hash,
                confirmations,
            } => PollResponse::SettlementConfirming {
                tx_hash,
                confirmations,
            },
            PollStatus::Completed => PollResponse::Completed,
        }
    }
}

#[derive(Deserialize)]
struct RegisterNameBody {
    seed: String,
    chain: String,
    name: String,
}

#[derive(Serialize)]
struct RegisterNameResponse {
    tx_hash: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Maps domain errors to HTTP responses
struct ApiError(TransferError);

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TransferError::Validation(_)
            | TransferError::ChainNotFound(_)
            | TransferError::TokenNotFound(_)
            | TransferError::RouteNotFound { .. } => StatusCode::BAD_REQUEST,
            TransferError::TransferInProgress { .. } => StatusCode::CONFLICT,
            TransferError::NoPendingTransfer { .. } => StatusCode::NOT_FOUND,
            TransferError::Rpc { .. } | TransferError::Settlement(_) => StatusCode::BAD_GATEWAY,
            TransferError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            TransferError::Config(_) | TransferError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            crate::metrics::record_transfer_failed(self.0.kind());
        }

        let body = Json(ErrorResponse {
            error: self.0.kind().to_string(),
            message: self.0.to_string(),
            retryable: self.0.is_retryable(),
        });

        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    retryable: bool,
}
