use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::store::{SessionStore, StoreError};
use crate::config::{ConversationConfig, PromptsConfig};
use crate::models::chat::Turn;
use crate::services::domain_classifier::DomainClassifier;
use crate::services::gemini::{GenerationError, TextGenerator};

/// How a chat turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Classifier rejected the message, history untouched
    Refused,
    /// Generated reply appended to history
    Replied,
    /// Generation failed, only the user turn was appended
    Failed,
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub reply: String,
    pub in_domain: bool,
    pub outcome: TurnOutcome,
}

#[derive(Debug, Clone)]
pub struct CreateSessionOutcome {
    pub created: bool,
    pub status: String,
}

#[derive(Debug, Clone, Copy)]
pub struct HistoryPolicy {
    pub max_len: usize,
    pub keep_tail: usize,
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self {
            max_len: 20,
            keep_tail: 10,
        }
    }
}

impl From<&ConversationConfig> for HistoryPolicy {
    fn from(cfg: &ConversationConfig) -> Self {
        Self {
            max_len: cfg.max_history,
            keep_tail: cfg.keep_tail,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub active_sessions: usize,
    pub replies: u64,
    pub refused_messages: u64,
    pub generation_failures: u64,
}

#[derive(Default)]
struct Counters {
    replies: AtomicU64,
    refused: AtomicU64,
    generation_failures: AtomicU64,
}

/// Runs one chat turn at a time per session:
/// receive -> classify -> refuse | generate -> reply | fail.
pub struct ConversationEngine {
    store: Arc<SessionStore>,
    classifier: Arc<dyn DomainClassifier>,
    generator: Arc<dyn TextGenerator>,
    policy: HistoryPolicy,
    refusal_message: String,
    advice_template: String,
    counters: Counters,
}

impl ConversationEngine {
    pub fn new(
        store: Arc<SessionStore>,
        classifier: Arc<dyn DomainClassifier>,
        generator: Arc<dyn TextGenerator>,
        policy: HistoryPolicy,
        prompts: &PromptsConfig,
    ) -> Self {
        Self {
            store,
            classifier,
            generator,
            policy,
            refusal_message: prompts.refusal_message.clone(),
            advice_template: prompts.advice_template.clone(),
            counters: Counters::default(),
        }
    }

    pub async fn handle_message(&self, session_id: &str, text: &str) -> ChatReply {
        let request_id = uuid::Uuid::new_v4();
        let span = info_span!("chat_turn", session_id = %session_id, %request_id);
        self.run_turn(session_id, text).instrument(span).await
    }

    async fn run_turn(&self, session_id: &str, text: &str) -> ChatReply {
        // RECEIVED
        let mut handle = self.store.get_or_create(session_id);
        debug!("Message received, len={}", text.len());

        // CLASSIFIED
        if !self.classifier.is_in_domain(text) {
            self.counters.refused.fetch_add(1, Ordering::Relaxed);
            info!("Message refused: out of domain");
            return ChatReply {
                reply: self.refusal_message.clone(),
                in_domain: false,
                outcome: TurnOutcome::Refused,
            };
        }

        // GENERATING
        // Retry if the id was deleted or recreated while waiting on the lock
        let _turn = loop {
            let guard = handle.lock_turn().await;
            if self.store.is_current(session_id, &handle) {
                break guard;
            }
            warn!("Session replaced while waiting for its turn, retrying");
            handle = self.store.get_or_create(session_id);
        };

        let history = handle.snapshot().turns;
        handle.append(Turn::user(text));

        let outcome = self.generator.generate(&history, text).await;

        // Writes target the slot this turn started on
        let chat_reply = match outcome {
            Ok(reply) => {
                // REPLIED
                handle.append(Turn::assistant(reply.clone()));
                self.counters.replies.fetch_add(1, Ordering::Relaxed);
                info!("Reply generated, len={}", reply.len());

                ChatReply {
                    reply,
                    in_domain: true,
                    outcome: TurnOutcome::Replied,
                }
            }
            Err(e) => {
                // FAILED
                self.counters.generation_failures.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "Text generation failed");

                ChatReply {
                    reply: format!("Sorry, I could not generate an answer: {}", e),
                    in_domain: true,
                    outcome: TurnOutcome::Failed,
                }
            }
        };

        handle.truncate(self.policy.max_len, self.policy.keep_tail);
        chat_reply
    }

    pub fn create_session(&self, session_id: &str) -> CreateSessionOutcome {
        let created = self.store.create(session_id);
        let status = if created {
            format!("Session '{}' created", session_id)
        } else {
            format!("Session '{}' already exists", session_id)
        };
        CreateSessionOutcome { created, status }
    }

    pub fn delete_session(&self, session_id: &str) -> Result<(), StoreError> {
        if self.store.delete(session_id) {
            Ok(())
        } else {
            Err(StoreError::SessionNotFound(session_id.to_string()))
        }
    }

    pub fn session_history(&self, session_id: &str) -> Result<Vec<Turn>, StoreError> {
        self.store
            .get(session_id)
            .map(|s| s.turns)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))
    }

    /// One-shot coaching advice, outside any session.
    pub async fn advise(&self, hero: &str, role: &str) -> Result<String, GenerationError> {
        let prompt = self
            .advice_template
            .replace("{hero}", hero)
            .replace("{role}", role);

        self.generator.generate(&[], &prompt).await.inspect_err(|e| {
            self.counters.generation_failures.fetch_add(1, Ordering::Relaxed);
            error!(error = %e, hero, role, "Advice generation failed");
        })
    }

    /// Drop idle sessions. Returns number removed.
    pub fn sweep_idle(&self) -> usize {
        self.store.cleanup_idle()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            active_sessions: self.store.len(),
            replies: self.counters.replies.load(Ordering::Relaxed),
            refused_messages: self.counters.refused.load(Ordering::Relaxed),
            generation_failures: self.counters.generation_failures.load(Ordering::Relaxed),
        }
    }
}
