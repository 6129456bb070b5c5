use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

use super::types::Session;
use crate::models::chat::{SessionId, Turn};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("session '{0}' not found")]
    SessionNotFound(SessionId),
}

struct SessionSlot {
    session: Mutex<Session>,
    /// Held for a whole chat turn so exchanges on one id never interleave
    turn_lock: Arc<tokio::sync::Mutex<()>>,
}

impl SessionSlot {
    fn new(session_id: &str, system_instruction: &str) -> Self {
        Self {
            session: Mutex::new(Session::new(session_id.to_string(), system_instruction)),
            turn_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    fn is_idle(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.session.lock().is_idle(ttl))
    }
}

/// Handle to a live session returned by [`SessionStore::get_or_create`].
#[derive(Clone)]
pub struct SessionHandle {
    slot: Arc<SessionSlot>,
}

impl SessionHandle {
    /// Serialize turn processing for this session.
    pub async fn lock_turn(&self) -> OwnedMutexGuard<()> {
        self.slot.turn_lock.clone().lock_owned().await
    }

    pub fn snapshot(&self) -> Session {
        self.slot.session.lock().clone()
    }

    /// Append to this slot even if the id has since been deleted or reused.
    pub fn append(&self, turn: Turn) {
        let mut session = self.slot.session.lock();
        session.turns.push(turn);
        session.touch();
        debug!("Session {} now has {} turns", session.session_id, session.turns.len());
    }

    pub fn truncate(&self, max_len: usize, keep_tail: usize) -> usize {
        let mut session = self.slot.session.lock();
        let dropped = session.truncate(max_len, keep_tail);
        if dropped > 0 {
            debug!("Session {} truncated, dropped {} turns", session.session_id, dropped);
        }
        dropped
    }
}

/// Thread-safe in-memory session store.
/// Uses DashMap for the id index and a mutex per session for its turns.
pub struct SessionStore {
    sessions: DashMap<SessionId, Arc<SessionSlot>>,
    system_instruction: String,
    idle_ttl: Option<Duration>,
}

impl SessionStore {
    pub fn new(system_instruction: impl Into<String>, idle_ttl: Option<Duration>) -> Self {
        info!(
            "Initializing session store (idle ttl: {:?})",
            idle_ttl
        );
        Self {
            sessions: DashMap::new(),
            system_instruction: system_instruction.into(),
            idle_ttl,
        }
    }

    /// Returns `true` when a new session was created, `false` when it already
    /// existed (left untouched).
    pub fn create(&self, session_id: &str) -> bool {
        self.evict_if_idle(session_id);

        match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(SessionSlot::new(session_id, &self.system_instruction)));
                info!("Session {} created", session_id);
                true
            }
        }
    }

    /// Snapshot of a session. Idle sessions are expired lazily here.
    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.evict_if_idle(session_id);
        self.sessions.get(session_id).map(|slot| slot.session.lock().clone())
    }

    pub fn get_or_create(&self, session_id: &str) -> SessionHandle {
        self.evict_if_idle(session_id);

        let slot = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                info!("Session {} created on first message", session_id);
                Arc::new(SessionSlot::new(session_id, &self.system_instruction))
            })
            .clone();

        SessionHandle { slot }
    }

    pub fn append(&self, session_id: &str, turn: Turn) -> Result<(), StoreError> {
        let slot = self.slot(session_id)?;
        let mut session = slot.session.lock();
        session.turns.push(turn);
        session.touch();
        debug!("Session {} now has {} turns", session_id, session.turns.len());
        Ok(())
    }

    /// Returns the number of dropped turns.
    pub fn truncate_if_oversized(
        &self,
        session_id: &str,
        max_len: usize,
        keep_tail: usize,
    ) -> Result<usize, StoreError> {
        let slot = self.slot(session_id)?;
        let dropped = slot.session.lock().truncate(max_len, keep_tail);
        if dropped > 0 {
            debug!("Session {} truncated, dropped {} turns", session_id, dropped);
        }
        Ok(dropped)
    }

    pub fn delete(&self, session_id: &str) -> bool {
        self.evict_if_idle(session_id);
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            info!("Session {} deleted", session_id);
        }
        removed
    }

    /// `false` once the handle's session was deleted, expired or replaced.
    pub fn is_current(&self, session_id: &str, handle: &SessionHandle) -> bool {
        self.sessions
            .get(session_id)
            .is_some_and(|slot| Arc::ptr_eq(slot.value(), &handle.slot))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop every idle session. Returns number of sessions removed.
    pub fn cleanup_idle(&self) -> usize {
        if self.idle_ttl.is_none() {
            return 0;
        }

        let start_len = self.sessions.len();
        self.sessions.retain(|_, slot| !slot.is_idle(self.idle_ttl));
        let count = start_len.saturating_sub(self.sessions.len());

        if count > 0 {
            info!("Evicted {} idle sessions", count);
        }
        count
    }

    fn slot(&self, session_id: &str) -> Result<Arc<SessionSlot>, StoreError> {
        self.sessions
            .get(session_id)
            .map(|slot| slot.clone())
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))
    }

    fn evict_if_idle(&self, session_id: &str) {
        if self
            .sessions
            .remove_if(session_id, |_, slot| slot.is_idle(self.idle_ttl))
            .is_some()
        {
            debug!("Session {} expired, removed from store", session_id);
        }
    }
}
