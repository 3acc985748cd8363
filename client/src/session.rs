//! Client-owned session identity and per-turn local state.

use crate::typing::TypingSession;
use shared::PlayerId;
use std::time::Duration;

/// Identity assigned by the server on join. Never changes for the lifetime
/// of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub player_id: PlayerId,
    pub room_id: String,
}

/// Choices made on this client that the server has not confirmed yet.
/// Rebuilt at phase-entry boundaries, never sent as a unit.
#[derive(Debug, Clone)]
pub struct LocalTurnState {
    pub spell_id: Option<String>,
    pub target_id: Option<PlayerId>,
    pub typing: TypingSession,
}

impl LocalTurnState {
    pub fn new(auto_submit_delay: Duration) -> Self {
        Self {
            spell_id: None,
            target_id: None,
            typing: TypingSession::new(auto_submit_delay),
        }
    }

    /// Starts a fresh turn: drops selections and re-arms the submission guard.
    pub fn reset(&mut self) {
        self.spell_id = None;
        self.target_id = None;
        self.typing.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_reset_clears_selections_and_guard() {
        let now = Instant::now();
        let mut local = LocalTurnState::new(Duration::from_millis(300));
        local.spell_id = Some("fireball".to_string());
        local.target_id = Some("p2".to_string());
        local.typing.begin("ignis", now);
        assert!(local.typing.submit(false, now).is_some());

        local.reset();
        assert!(local.spell_id.is_none());
        assert!(local.target_id.is_none());
        assert!(!local.typing.is_submitted());
        assert!(local.typing.started_at().is_none());
    }
}
