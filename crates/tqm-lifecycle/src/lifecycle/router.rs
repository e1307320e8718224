use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::board::StageBoard;
use super::closure::{ApproverDirectory, ClosureGate};
use super::completeness::{evaluate, evaluate_capa};
use super::domain::{AppDocument, CapaReport, LifecycleArtifact, PdcaCycle, Project, UserId};
use super::readiness::{PortfolioSnapshot, ReadinessScorer};
use super::transition::{advance_stage, TransitionRequest};
use crate::config::ClosureConfig;
use crate::error::AppError;

/// Organization-wide settings the handlers fall back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleSettings {
    pub strict_capa_closure: bool,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            strict_capa_closure: true,
        }
    }
}

impl From<&ClosureConfig> for LifecycleSettings {
    fn from(config: &ClosureConfig) -> Self {
        Self {
            strict_capa_closure: config.strict_validation,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AdvanceRequest {
    pub(crate) artifact: LifecycleArtifact,
    #[serde(default)]
    pub(crate) notes: String,
    #[serde(default)]
    pub(crate) attachments: Vec<String>,
    pub(crate) actor_id: UserId,
    #[serde(default)]
    pub(crate) now: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum CompletenessRequest {
    Capa(CapaReport),
    Cycle(PdcaCycle),
    Document(AppDocument),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClosureRequest {
    pub(crate) capa: CapaReport,
    #[serde(default)]
    pub(crate) strict_validation_enabled: Option<bool>,
}

/// Shared by the handlers: configured closure mode plus an optional approver lookup.
#[derive(Clone, Default)]
pub(crate) struct LifecycleState {
    pub(crate) settings: LifecycleSettings,
    pub(crate) approvers: Option<Arc<dyn ApproverDirectory>>,
}

impl LifecycleState {
    fn closure_gate(&self, strict_validation: bool) -> ClosureGate {
        let gate = ClosureGate::new(strict_validation);
        match &self.approvers {
            Some(directory) => gate.with_approver_directory(Arc::clone(directory)),
            None => gate,
        }
    }
}

/// Router exposing the lifecycle engine over JSON. Closure exceptions are
/// trusted as signed.
pub fn lifecycle_router(settings: LifecycleSettings) -> Router {
    build_router(LifecycleState {
        settings,
        approvers: None,
    })
}

/// Same routes, with closure exceptions checked against `approvers`.
pub fn lifecycle_router_with_approvers(
    settings: LifecycleSettings,
    approvers: Arc<dyn ApproverDirectory>,
) -> Router {
    build_router(LifecycleState {
        settings,
        approvers: Some(approvers),
    })
}

fn build_router(state: LifecycleState) -> Router {
    Router::new()
        .route("/api/v1/lifecycle/advance", post(advance_handler))
        .route("/api/v1/lifecycle/completeness", post(completeness_handler))
        .route("/api/v1/lifecycle/capa/closure", post(closure_handler))
        .route("/api/v1/lifecycle/readiness", post(readiness_handler))
        .route("/api/v1/lifecycle/board", post(board_handler))
        .with_state(Arc::new(state))
}

pub(crate) async fn advance_handler(
    Json(payload): Json<AdvanceRequest>,
) -> Result<Json<LifecycleArtifact>, AppError> {
    let AdvanceRequest {
        artifact,
        notes,
        attachments,
        actor_id,
        now,
    } = payload;

    let request = TransitionRequest::new(notes, actor_id).with_attachments(attachments);
    let now = now.unwrap_or_else(Utc::now);

    let updated = advance_stage(&artifact, &request, now)?;
    Ok(Json(updated))
}

pub(crate) async fn completeness_handler(Json(payload): Json<CompletenessRequest>) -> Response {
    match &payload {
        CompletenessRequest::Capa(capa) => (StatusCode::OK, Json(evaluate_capa(capa))).into_response(),
        CompletenessRequest::Cycle(cycle) => (StatusCode::OK, Json(evaluate(cycle))).into_response(),
        CompletenessRequest::Document(document) => {
            (StatusCode::OK, Json(evaluate(document))).into_response()
        }
    }
}

pub(crate) async fn closure_handler(
    State(state): State<Arc<LifecycleState>>,
    Json(payload): Json<ClosureRequest>,
) -> Response {
    let strict = payload
        .strict_validation_enabled
        .unwrap_or(state.settings.strict_capa_closure);
    let decision = state.closure_gate(strict).evaluate(&payload.capa);
    (StatusCode::OK, Json(decision)).into_response()
}

pub(crate) async fn readiness_handler(Json(snapshot): Json<PortfolioSnapshot>) -> Response {
    let readiness = ReadinessScorer::default().score_snapshot(&snapshot);
    (StatusCode::OK, Json(readiness)).into_response()
}

pub(crate) async fn board_handler(Json(project): Json<Project>) -> Response {
    let board = StageBoard::from_project(&project);
    (StatusCode::OK, Json(board)).into_response()
}
