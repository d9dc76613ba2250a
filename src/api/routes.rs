//! HTTP route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<ServiceState>`.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::engine::Orchestrator;
use crate::session::SessionLauncher;
use crate::types::{Batch, BatchResult, Category, Stake, WagerError, WagerRequest};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct ServiceState {
    pub launcher: Arc<dyn SessionLauncher>,
    pub orchestrator: Orchestrator,
    /// One batch at a time: every batch drives the same account.
    batch_lock: Mutex<()>,
}

impl ServiceState {
    pub fn new(launcher: Arc<dyn SessionLauncher>, orchestrator: Orchestrator) -> Self {
        Self {
            launcher,
            orchestrator,
            batch_lock: Mutex::new(()),
        }
    }
}

pub type AppState = Arc<ServiceState>;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub horse_number: Option<u32>,
    pub horse_name: String,
    /// win | gagnant | place | placé | deuzio | boulet
    pub bet_type: String,
    #[serde(default)]
    pub bet_amount: Option<Decimal>,
    /// Fraction of the balance (0.05 = 5%). Takes precedence over `bet_amount`.
    #[serde(default)]
    pub bet_percentage: Option<Decimal>,
    #[serde(default)]
    pub race_id: Option<String>,
}

/// Caller-side tallies; informational only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub total_bets: Option<usize>,
    #[serde(default)]
    pub total_bet_amount: Option<Decimal>,
    #[serde(default)]
    pub win_bets: Option<usize>,
    #[serde(default)]
    pub place_bets: Option<usize>,
    #[serde(default)]
    pub deuzio_bets: Option<usize>,
    #[serde(default, alias = "boulot_bets")]
    pub boulet_bets: Option<usize>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceBetsRequest {
    pub race_url: String,
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub summary: Option<Summary>,
}

impl Recommendation {
    fn into_wager(self) -> Result<WagerRequest, ApiError> {
        let category: Category = self
            .bet_type
            .parse()
            .map_err(|e: WagerError| ApiError::Invalid(e.to_string()))?;

        let stake = match (self.bet_percentage, self.bet_amount) {
            (Some(fraction), _) => Stake::Fraction(fraction),
            (None, Some(amount)) => Stake::Amount(amount),
            (None, None) => {
                return Err(ApiError::Invalid(format!(
                    "recommendation for '{}' has neither bet_amount nor bet_percentage",
                    self.horse_name
                )))
            }
        };

        Ok(WagerRequest {
            // 0 is never a displayed number; treat it as unresolved
            competitor_number: self.horse_number.filter(|n| *n > 0),
            competitor_name: self.horse_name,
            category,
            stake,
            race_id: self.race_id,
        })
    }
}

impl PlaceBetsRequest {
    /// Validate and convert into the race URL and an ordered batch.
    pub fn into_batch(self) -> Result<(String, Batch), ApiError> {
        let race_url = self.race_url.trim().to_string();
        if !(race_url.starts_with("https://") || race_url.starts_with("http://")) {
            return Err(ApiError::Invalid(format!("race_url is not an http(s) URL: '{race_url}'")));
        }

        if let Some(total) = self.summary.as_ref().and_then(|s| s.total_bets) {
            if total != self.recommendations.len() {
                warn!(
                    summary_total = total,
                    recommendations = self.recommendations.len(),
                    "Summary disagrees with recommendations; using recommendations"
                );
            }
        }

        let wagers = self
            .recommendations
            .into_iter()
            .map(Recommendation::into_wager)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((race_url, Batch::new(wagers)))
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Invalid(String),

    #[error("batch task aborted: {0}")]
    Aborted(String),

    #[error(transparent)]
    Wager(#[from] WagerError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ApiError::Invalid(_) => (StatusCode::UNPROCESSABLE_ENTITY, None),
            ApiError::Aborted(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
            ApiError::Wager(e) => (StatusCode::BAD_GATEWAY, Some(e.kind())),
        };
        let body = ErrorBody {
            error: self.to_string(),
            kind,
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// POST /place-bets
pub async fn place_bets(
    State(state): State<AppState>,
    payload: Result<Json<PlaceBetsRequest>, JsonRejection>,
) -> Result<Json<BatchResult>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::Invalid(rejection.body_text()))?;
    let (race_url, batch) = request.into_batch()?;
    info!(race_url = %race_url, wagers = batch.len(), "Batch received");

    // The batch outlives the request: a client disconnect neither cuts a
    // wager off mid-slip nor skips closing the browser.
    let batch_task = tokio::spawn(run_batch(state, race_url, batch));
    match batch_task.await {
        Ok(result) => result.map(Json),
        Err(e) => {
            error!(error = %e, "Batch task did not complete");
            Err(ApiError::Aborted(e.to_string()))
        }
    }
}

/// Launch a session, run the batch and close the session on every path.
async fn run_batch(state: AppState, race_url: String, batch: Batch) -> Result<BatchResult, ApiError> {
    let _turn = state.batch_lock.lock().await;

    let mut session = state.launcher.launch(&race_url).await?;
    let result = state.orchestrator.run(session.surface(), &batch).await;

    if let Err(e) = session.close().await {
        warn!(error = %e, "Failed to close session");
    }

    result.map_err(|e| {
        error!(error = %e, "Batch aborted");
        e.into()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
