use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Hero catalog (stateless pass-through)
    let hero_routes = Router::new()
        .route("/heroes", get(handlers::heroes::list_heroes))
        .route("/heroes/{id}", get(handlers::heroes::get_hero))
        .route("/heroes/name/{name}", get(handlers::heroes::get_hero_by_name))
        .route("/heroes/role/{role}", get(handlers::heroes::get_heroes_by_role))
        .route("/heroes/matches/{id}", get(handlers::heroes::get_hero_matches));

    // Session-scoped assistant
    let chat_routes = Router::new()
        .route("/chat/create_session", post(handlers::chat::create_session_handler))
        .route("/chat/message", post(handlers::chat::message_handler))
        .route(
            "/chat/session/{id}",
            get(handlers::chat::session_history_handler)
                .delete(handlers::chat::delete_session_handler),
        )
        .route("/gemini/advice", post(handlers::gemini::advice_handler));

    Router::new()
        .route("/", get(handlers::health::root_info))
        .route("/health", get(handlers::health::health_check))
        .merge(hero_routes)
        .merge(chat_routes)
        .with_state(state)
        // CORS
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Tracing
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
}
