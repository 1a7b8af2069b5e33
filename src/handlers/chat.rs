use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::KpiReport;
use crate::services::flow::{self, SessionView};
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct StartSessionRequest {
    pub session_id: Option<String>,
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct OptionRequest {
    pub option_id: String,
}

// POST /api/chat/sessions
//
// Resumes the session when the widget still holds an id with a live
// snapshot; otherwise starts a fresh conversation.
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    body: Option<Json<StartSessionRequest>>,
) -> Result<Json<SessionView>, AppError> {
    let session_id = body
        .and_then(|Json(req)| req.session_id)
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let view = flow::start_session(&state, &session_id).await?;
    Ok(Json(view))
}

// GET /api/chat/sessions/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let view = flow::session_view(&state, &session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
    Ok(Json(view))
}

// POST /api/chat/sessions/:id/message
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(body): Json<MessageRequest>,
) -> Result<Json<SessionView>, AppError> {
    let view = flow::process_message(&state, &session_id, &body.text)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
    Ok(Json(view))
}

// POST /api/chat/sessions/:id/option
pub async fn post_option(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(body): Json<OptionRequest>,
) -> Result<Json<SessionView>, AppError> {
    if body.option_id.trim().is_empty() {
        return Err(AppError::BadRequest("option_id is required".to_string()));
    }

    let view = flow::process_option(&state, &session_id, &body.option_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
    Ok(Json(view))
}

// POST /api/chat/sessions/:id/restart
pub async fn restart_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let view = flow::restart_session(&state, &session_id).await?;
    Ok(Json(view))
}

// GET /api/chat/sessions/:id/kpis
pub async fn get_kpis(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<KpiReport>, AppError> {
    let report = flow::kpi_report(&state, &session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
    Ok(Json(report))
}
