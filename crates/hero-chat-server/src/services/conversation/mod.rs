//! Conversation memory management module
//!
//! Provides in-memory session state and the per-turn state machine:
//! - Thread-safe session store (DashMap) with idle eviction
//! - Per-session turn serialization
//! - Bounded history (instruction turn + recent tail)

pub mod engine;
mod store;
pub mod types;

pub use engine::{
    ChatReply, ConversationEngine, CreateSessionOutcome, EngineStats, HistoryPolicy, TurnOutcome,
};
pub use store::{SessionHandle, SessionStore, StoreError};
pub use types::Session;
