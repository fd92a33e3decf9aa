//! Axum REST API handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use carbonmax_progress::{
    tiers, AggregateImpact, Quest, QuestCatalog, QuestOutcome, QuestProgressRecord, QuestStatus,
    Tier, UserImpact, UserTierProgress,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::registry::{validate_user_id, TrackerRegistry};

pub struct ApiState {
    pub registry: TrackerRegistry,
    pub catalog: QuestCatalog,
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/quests", get(list_quests))
        .route("/quests/:id", get(get_quest))
        .route("/tiers", get(list_tiers))
        .route("/impact", get(aggregate_impact))
        .route("/users/:user_id/progress", get(get_progress))
        .route("/users/:user_id/quests/:quest_id", get(get_quest_status))
        .route("/users/:user_id/quests/:quest_id/start", post(start_quest))
        .route(
            "/users/:user_id/quests/:quest_id/complete",
            post(complete_quest),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct QuestsResponse<'a> {
    pub count: usize,
    pub quests: &'a [Quest],
}

#[derive(Serialize)]
pub struct TiersResponse {
    pub tiers: &'static [Tier],
}

/// Quest status as seen by clients; "not started" is explicit here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl From<Option<QuestStatus>> for ProgressStatus {
    fn from(status: Option<QuestStatus>) -> Self {
        match status {
            None => Self::NotStarted,
            Some(QuestStatus::InProgress) => Self::InProgress,
            Some(QuestStatus::Completed) => Self::Completed,
        }
    }
}

#[derive(Serialize)]
pub struct ProgressResponse {
    pub user_id: String,
    pub total_points: u64,
    pub impact: UserImpact,
    pub tier_progress: UserTierProgress,
    pub records: BTreeMap<String, QuestProgressRecord>,
}

#[derive(Serialize)]
pub struct QuestStatusResponse {
    pub user_id: String,
    pub quest_id: String,
    pub status: ProgressStatus,
    pub record: Option<QuestProgressRecord>,
}

#[derive(Serialize)]
pub struct StartResponse {
    pub user_id: String,
    pub quest_id: String,
    /// `false` when the quest was already completed.
    pub started: bool,
    pub status: ProgressStatus,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    #[serde(default)]
    pub bonus_earned: bool,
    #[serde(default)]
    pub outcome: Option<QuestOutcome>,
}

#[derive(Serialize)]
pub struct CompleteResponse {
    pub user_id: String,
    pub quest_id: String,
    pub points_awarded: u32,
    pub record: QuestProgressRecord,
    pub total_points: u64,
    pub impact: UserImpact,
    pub tier_progress: UserTierProgress,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn quest_not_found(quest_id: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("Unknown quest: {quest_id}"))
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /quests`
pub async fn list_quests(State(state): State<Arc<ApiState>>) -> Response {
    let quests = state.catalog.quests();
    Json(QuestsResponse {
        count: quests.len(),
        quests,
    })
    .into_response()
}

/// `GET /quests/:id`
pub async fn get_quest(State(state): State<Arc<ApiState>>, Path(id): Path<String>) -> Response {
    match state.catalog.get(&id) {
        Some(quest) => Json(quest).into_response(),
        None => quest_not_found(&id),
    }
}

/// `GET /tiers`
pub async fn list_tiers() -> impl IntoResponse {
    Json(TiersResponse { tiers: tiers::TIERS })
}

/// `GET /impact`
///
/// Impact summed across every user with stored progress.
pub async fn aggregate_impact(State(state): State<Arc<ApiState>>) -> Json<AggregateImpact> {
    Json(state.registry.aggregate_impact())
}

/// `GET /users/:user_id/progress`
pub async fn get_progress(
    State(state): State<Arc<ApiState>>,
    Path(user_id): Path<String>,
) -> Response {
    if let Err(e) = validate_user_id(&user_id) {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }
    let result = state.registry.read_tracker(&user_id, |tracker| ProgressResponse {
        user_id: user_id.clone(),
        total_points: tracker.total_points(),
        impact: tracker.user_impact().clone(),
        tier_progress: tracker.tier_progress(),
        records: tracker.records().clone(),
    });
    match result {
        Ok(progress) => Json(progress).into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// `GET /users/:user_id/quests/:quest_id`
pub async fn get_quest_status(
    State(state): State<Arc<ApiState>>,
    Path((user_id, quest_id)): Path<(String, String)>,
) -> Response {
    if let Err(e) = validate_user_id(&user_id) {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }
    if state.catalog.get(&quest_id).is_none() {
        return quest_not_found(&quest_id);
    }
    let result = state.registry.read_tracker(&user_id, |tracker| QuestStatusResponse {
        user_id: user_id.clone(),
        quest_id: quest_id.clone(),
        status: tracker.status(&quest_id).into(),
        record: tracker.record(&quest_id).cloned(),
    });
    match result {
        Ok(status) => Json(status).into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// `POST /users/:user_id/quests/:quest_id/start`
pub async fn start_quest(
    State(state): State<Arc<ApiState>>,
    Path((user_id, quest_id)): Path<(String, String)>,
) -> Response {
    if let Err(e) = validate_user_id(&user_id) {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }
    if state.catalog.get(&quest_id).is_none() {
        return quest_not_found(&quest_id);
    }
    let result = state.registry.with_tracker(&user_id, |tracker| {
        let started = tracker.start_quest(&quest_id);
        StartResponse {
            user_id: user_id.clone(),
            quest_id: quest_id.clone(),
            started,
            status: tracker.status(&quest_id).into(),
        }
    });
    match result {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// `POST /users/:user_id/quests/:quest_id/complete`
///
/// Awards the catalog's points for the quest. A quest can be completed once;
/// later attempts get `409 Conflict` and leave the balance untouched.
/// Outcome amounts must be finite and non-negative.
pub async fn complete_quest(
    State(state): State<Arc<ApiState>>,
    Path((user_id, quest_id)): Path<(String, String)>,
    body: std::result::Result<Json<CompleteRequest>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };
    if let Err(e) = validate_user_id(&user_id) {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }
    let Some(quest) = state.catalog.get(&quest_id) else {
        return quest_not_found(&quest_id);
    };
    if let Some(outcome) = &body.outcome {
        if outcome.kind() != quest.kind {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!(
                    "Quest {quest_id} expects a {} outcome, got {}",
                    quest.kind.as_str(),
                    outcome.kind().as_str()
                ),
            );
        }
        if let Err(e) = outcome.validate() {
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
        }
    }

    let bonus_earned = body.bonus_earned && quest.bonus_points.is_some();
    let points = quest.points_for(bonus_earned);
    let outcome = body.outcome;

    let result = state.registry.with_tracker(&user_id, |tracker| {
        if tracker.is_quest_completed(&quest_id) {
            return None;
        }
        let record = tracker
            .complete_quest(&quest_id, points, bonus_earned, outcome)
            .clone();
        Some(CompleteResponse {
            user_id: user_id.clone(),
            quest_id: quest_id.clone(),
            points_awarded: points,
            record,
            total_points: tracker.total_points(),
            impact: tracker.user_impact().clone(),
            tier_progress: tracker.tier_progress(),
        })
    });

    match result {
        Ok(Some(response)) => {
            info!(
                "User {user_id} completed {quest_id}: +{points} points, now {} ({})",
                response.total_points, response.tier_progress.current_tier.name
            );
            Json(response).into_response()
        }
        Ok(None) => error_response(
            StatusCode::CONFLICT,
            format!("Quest {quest_id} already completed"),
        ),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
