use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::services::conversation::{ConversationEngine, EngineStats};

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
pub struct InfoResponse {
    message: String,
    version: String,
    conversation: EngineStats,
}

pub async fn root_info(State(engine): State<Arc<ConversationEngine>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        message: "Dota 2 Heroes API Proxy is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        conversation: engine.stats(),
    })
}

pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
