use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::chat::{AdviceRequest, AdviceResponse};
use crate::services::ConversationEngine;

/// Stateless coaching advice for a hero in a role. Failures are reported in
/// the body as `{"error": ..}` with a 200 status.
pub async fn advice_handler(
    State(engine): State<Arc<ConversationEngine>>,
    Json(request): Json<AdviceRequest>,
) -> Json<AdviceResponse> {
    info!("(Gemini) Advice request: hero={}, role={}", request.hero, request.role);

    match engine.advise(&request.hero, &request.role).await {
        Ok(advice) => Json(AdviceResponse::Advice { advice }),
        Err(e) => {
            warn!("Advice request failed: {}", e);
            Json(AdviceResponse::Error {
                error: e.to_string(),
            })
        }
    }
}
