use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type SessionId = String;

// ===== CONVERSATION MODELS =====

/// Who produced a turn. The persona instruction is stored as a `User` turn
/// because the generation API only knows user/model roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

// ===== REQUEST MODELS =====

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdviceRequest {
    pub hero: String,
    pub role: String,
}

// ===== RESPONSE MODELS =====

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub status: String,
    pub created: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub reply: String,
    #[serde(rename = "isInDomain")]
    pub is_in_domain: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionHistoryResponse {
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
    pub turns: Vec<Turn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Mirrors the advice endpoint contract: either `{"advice": ..}` or `{"error": ..}`
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdviceResponse {
    Advice { advice: String },
    Error { error: String },
}
