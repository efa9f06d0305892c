//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::{Language, SessionId, UserId},
    infrastructure::dto::http::{
        EndSessionRequest, ErrorResponse, LeaveSessionRequest, RunCodeRequest, RunCodeResponse,
        SessionStateDto,
    },
    ui::state::AppState,
    usecase::{EndSessionError, RunCodeError},
};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn parse_session_id(raw: String) -> Result<SessionId, ApiError> {
    SessionId::try_from(raw).map_err(bad_request)
}

fn parse_user_id(raw: String) -> Result<UserId, ApiError> {
    UserId::try_from(raw).map_err(bad_request)
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Run code in the session sandbox
///
/// The selected language is stored on the session and broadcast on the meta
/// channel before execution, so every subscriber follows the language switch.
pub async fn run_code(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<RunCodeRequest>,
) -> Result<Json<RunCodeResponse>, ApiError> {
    let session_id = parse_session_id(session_id)?;
    let user_id = parse_user_id(request.user_id)?;
    let language = Language::try_from(request.language.as_str()).map_err(bad_request)?;

    state
        .update_meta_usecase
        .execute(&session_id, language, &user_id)
        .await;

    match state
        .run_code_usecase
        .execute(&session_id, language, &request.code)
        .await
    {
        Ok(output) => Ok(Json(RunCodeResponse { output })),
        // 作成・起動の失敗はリトライ可能
        Err(e @ (RunCodeError::CreateFailed(_) | RunCodeError::StartFailed(_))) => {
            tracing::warn!("Sandbox lifecycle failed: {}", e);
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
        Err(e @ RunCodeError::ExecFailed(_)) => {
            tracing::error!("Code execution failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// Stop the session sandbox (best-effort, never fails)
pub async fn stop_sandbox(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session_id = parse_session_id(session_id)?;
    state.stop_sandbox_usecase.execute(&session_id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// End the session: tear down the sandbox, drop state, notify subscribers
pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<EndSessionRequest>,
) -> Result<StatusCode, ApiError> {
    let session_id = parse_session_id(session_id)?;
    let by = parse_user_id(request.by)?;

    match state.end_session_usecase.execute(&session_id, &by).await {
        // relay の購読は残す: 終了通知の転送前に解放すると取りこぼすため、
        // 解放はローカル購読者がいなくなった時点（切断経路）で行う
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e @ EndSessionError::SessionNotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// Explicitly leave the session (presence only, connections stay open)
pub async fn leave_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<LeaveSessionRequest>,
) -> Result<StatusCode, ApiError> {
    let session_id = parse_session_id(session_id)?;
    let user_id = parse_user_id(request.user_id)?;
    state
        .leave_session_usecase
        .execute(&session_id, &user_id)
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// Get the authoritative session state
pub async fn get_session_state(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStateDto>, ApiError> {
    let session_id = parse_session_id(session_id)?;

    if !state.repository.exists(&session_id).await {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("session not found: '{}'", session_id.as_str()),
            }),
        ));
    }

    let snapshot = state.repository.snapshot(&session_id).await;
    Ok(Json(SessionStateDto {
        session_id: session_id.as_str().to_string(),
        document: snapshot.document,
        version: snapshot.version,
        language: snapshot.language.map(|l| l.as_str().to_string()),
    }))
}
