use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::models::chat::*;
use crate::services::ConversationEngine;
use crate::state::AppState;
use crate::utils::error::ApiError;

pub async fn create_session_handler(
    State(engine): State<Arc<ConversationEngine>>,
    Json(request): Json<CreateSessionRequest>,
) -> Json<CreateSessionResponse> {
    let outcome = engine.create_session(&request.session_id);
    Json(CreateSessionResponse {
        status: outcome.status,
        created: outcome.created,
    })
}

/// Always answers 200: generation failures come back as the reply text.
pub async fn message_handler(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Json<MessageResponse> {
    let session_id = request
        .session_id
        .unwrap_or_else(|| state.default_session_id.to_string());

    info!(
        "Chat message: session={}, message_len={}",
        session_id,
        request.message.len()
    );

    let reply = state.engine.handle_message(&session_id, &request.message).await;

    Json(MessageResponse {
        reply: reply.reply,
        is_in_domain: reply.in_domain,
    })
}

pub async fn session_history_handler(
    State(engine): State<Arc<ConversationEngine>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionHistoryResponse>, ApiError> {
    let turns = engine.session_history(&session_id)?;
    Ok(Json(SessionHistoryResponse { session_id, turns }))
}

pub async fn delete_session_handler(
    State(engine): State<Arc<ConversationEngine>>,
    Path(session_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    engine.delete_session(&session_id)?;
    Ok(Json(StatusResponse {
        status: format!("Session '{}' deleted", session_id),
    }))
}
