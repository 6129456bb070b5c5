use std::sync::Arc;
use axum::extract::FromRef;

use crate::config::Settings;
use crate::services::conversation::HistoryPolicy;
use crate::services::{
    ConversationEngine, GeminiService, HeroCatalog, KeywordClassifier, SessionStore,
};
use crate::utils::limiters::Limiters;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub hero_catalog: Arc<HeroCatalog>,
    pub engine: Arc<ConversationEngine>,
    pub default_session_id: Arc<str>,
}

impl AppState {
    /// Wire the production services from configuration.
    pub fn from_settings(settings: &Settings) -> Self {
        let limiters = Arc::new(Limiters::new(&settings.limits));
        let generator = Arc::new(GeminiService::new(settings.gemini.clone(), limiters));

        let store = Arc::new(SessionStore::new(
            settings.prompts.system_instruction.clone(),
            settings.conversation.idle_ttl(),
        ));

        let engine = Arc::new(ConversationEngine::new(
            store,
            Arc::new(KeywordClassifier::new()),
            generator,
            HistoryPolicy::from(&settings.conversation),
            &settings.prompts,
        ));

        Self {
            hero_catalog: Arc::new(HeroCatalog::new(&settings.upstream)),
            engine,
            default_session_id: settings.conversation.default_session_id.as_str().into(),
        }
    }
}

impl FromRef<AppState> for Arc<ConversationEngine> {
    fn from_ref(state: &AppState) -> Self {
        state.engine.clone()
    }
}

impl FromRef<AppState> for Arc<HeroCatalog> {
    fn from_ref(state: &AppState) -> Self {
        state.hero_catalog.clone()
    }
}
