use std::time::{Duration, Instant};

use crate::models::chat::{SessionId, Turn};

/// One conversation as held by the session store.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: SessionId,

    /// Turn 0 is always the persona instruction
    pub turns: Vec<Turn>,

    pub created_at: Instant,

    /// Refreshed on every mutation, drives idle eviction
    pub last_activity: Instant,
}

impl Session {
    pub fn new(session_id: SessionId, system_instruction: &str) -> Self {
        let now = Instant::now();
        let mut turns = Vec::with_capacity(4);
        turns.push(Turn::user(system_instruction));
        Self {
            session_id,
            turns,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn is_idle(&self, ttl: Duration) -> bool {
        self.last_activity.elapsed() > ttl
    }

    /// History without the persona instruction.
    pub fn exchanges(&self) -> &[Turn] {
        &self.turns[1..]
    }

    /// Keep turn 0 plus the newest `keep_tail` turns once the history grows
    /// past `max_len`. Returns how many turns were dropped.
    pub fn truncate(&mut self, max_len: usize, keep_tail: usize) -> usize {
        if self.turns.len() <= max_len {
            return 0;
        }

        let tail_start = self.turns.len().saturating_sub(keep_tail).max(1);
        self.turns.drain(1..tail_start);
        tail_start - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(n_exchanges: usize) -> Session {
        let mut session = Session::new("s".to_string(), "persona");
        for i in 0..n_exchanges {
            session.turns.push(Turn::user(format!("q{}", i)));
        }
        session
    }

    #[test]
    fn test_new_session_has_instruction_only() {
        let session = Session::new("s".to_string(), "persona");
        assert_eq!(session.turns.len(), 1);
        assert_eq!(session.turns[0].content, "persona");
        assert!(session.exchanges().is_empty());
    }

    #[test]
    fn test_truncate_keeps_head_and_tail() {
        let mut session = session_with(20); // 21 turns
        let dropped = session.truncate(20, 10);

        assert_eq!(dropped, 10);
        assert_eq!(session.turns.len(), 11);
        assert_eq!(session.turns[0].content, "persona");
        assert_eq!(session.turns[1].content, "q10");
        assert_eq!(session.turns[10].content, "q19");
    }

    #[test]
    fn test_truncate_at_limit_is_noop() {
        let mut session = session_with(19); // exactly 20 turns
        assert_eq!(session.truncate(20, 10), 0);
        assert_eq!(session.turns.len(), 20);
    }

    #[test]
    fn test_truncate_with_large_tail_keeps_everything() {
        let mut session = session_with(5);
        assert_eq!(session.truncate(2, 50), 0);
        assert_eq!(session.turns.len(), 6);
    }

    #[test]
    fn test_truncate_with_zero_tail_leaves_instruction() {
        let mut session = session_with(5);
        assert_eq!(session.truncate(2, 0), 5);
        assert_eq!(session.turns.len(), 1);
        assert_eq!(session.turns[0].content, "persona");
    }
}
