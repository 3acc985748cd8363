//! Phase reconciliation: mirrors the server's game and runs phase-scoped local state.
//!
//! The current phase is always the phase of the latest `GameSnapshot`. The session
//! only remembers which phase it last applied side effects for, so each distinct
//! phase transition triggers its entry/exit work exactly once no matter how many
//! times the server re-sends the same phase.

use crate::config::ClientConfig;
use crate::dispatch::MessageHandler;
use crate::session::{LocalTurnState, Session};
use crate::timer::{Countdown, CountdownKind, Tick};
use crate::typing::TypingSession;
use log::{debug, info, warn};
use shared::{
    ClientMessage, GameSnapshot, JoinedState, Phase, PlayerId, PlayerState, RoomSnapshot,
};
use std::time::Instant;

/// Presentation state the rendering layer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Connecting,
    Lobby,
    SpellSelection,
    TargetSelection,
    Typing,
    Resolution,
    GameOver,
    /// Own participant is dead. Takes precedence over every phase.
    Spectating,
    ConnectionLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownView {
    pub remaining_secs: u64,
    pub near_expiry: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub screen: Screen,
    pub turn: u32,
    /// Dismissible server rejection message.
    pub notice: Option<String>,
    pub countdown: Option<CountdownView>,
    /// This client already acted in the current phase and waits for the others.
    pub waiting: bool,
}

pub struct GameSession {
    config: ClientConfig,
    session: Option<Session>,
    room: Option<RoomSnapshot>,
    game: Option<GameSnapshot>,
    game_received_at: Option<Instant>,
    applied_phase: Option<Phase>,
    local: LocalTurnState,
    challenge: Countdown,
    resolution: Countdown,
    notice: Option<String>,
    connection_lost: bool,
    outbox: Vec<ClientMessage>,
}

impl GameSession {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            local: LocalTurnState::new(config.auto_submit_delay),
            challenge: Countdown::new(CountdownKind::Challenge, config.near_expiry),
            resolution: Countdown::new(CountdownKind::Resolution, config.near_expiry),
            config,
            session: None,
            room: None,
            game: None,
            game_received_at: None,
            applied_phase: None,
            notice: None,
            connection_lost: false,
            outbox: Vec::new(),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn room(&self) -> Option<&RoomSnapshot> {
        self.room.as_ref()
    }

    pub fn game(&self) -> Option<&GameSnapshot> {
        self.game.as_ref()
    }

    pub fn local(&self) -> &LocalTurnState {
        &self.local
    }

    pub fn typing(&self) -> &TypingSession {
        &self.local.typing
    }

    pub fn challenge(&self) -> &Countdown {
        &self.challenge
    }

    pub fn resolution(&self) -> &Countdown {
        &self.resolution
    }

    pub fn phase(&self) -> Option<Phase> {
        self.game.as_ref().map(|g| g.phase)
    }

    /// Own participant in the current snapshot. Unknown until identity is assigned.
    pub fn me(&self) -> Option<&PlayerState> {
        let session = self.session.as_ref()?;
        self.game.as_ref()?.player(&session.player_id)
    }

    pub fn is_connection_lost(&self) -> bool {
        self.connection_lost
    }

    /// Messages produced since the last drain, in order.
    pub fn drain_outbox(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn join(&mut self, room_id: &str, player_name: &str, timer_seconds: u32) {
        self.outbox.push(ClientMessage::JoinRoom {
            room_id: room_id.to_string(),
            player_name: player_name.to_string(),
            timer_seconds,
        });
    }

    pub fn apply_joined_room(
        &mut self,
        player_id: PlayerId,
        room_id: String,
        state: JoinedState,
        now: Instant,
    ) {
        if let Some(existing) = &self.session {
            warn!(
                "Ignoring second join acknowledgment, already {} in {}",
                existing.player_id, existing.room_id
            );
            return;
        }
        info!("Joined room {} as {}", room_id, player_id);
        self.session = Some(Session { player_id, room_id });
        match state {
            JoinedState::Room(room) => self.room = Some(room),
            JoinedState::Game(game) => self.store_game(game, now),
        }
        self.reconcile(now);
    }

    pub fn apply_room_update(&mut self, room: RoomSnapshot, now: Instant) {
        self.room = Some(room);
        // Back in the lobby after a finished match.
        if self.phase() == Some(Phase::GameOver) {
            debug!("Room update after game over, leaving match view");
            self.game = None;
            self.game_received_at = None;
            self.transition(Phase::Lobby, now);
        }
    }

    pub fn apply_game_update(&mut self, game: GameSnapshot, now: Instant) {
        self.store_game(game, now);
        self.reconcile(now);
    }

    pub fn apply_error(&mut self, message: String) {
        warn!("Server error: {}", message);
        self.notice = Some(message);
    }

    pub fn dismiss_error(&mut self) {
        self.notice = None;
    }

    pub fn connection_lost(&mut self) {
        if !self.connection_lost {
            warn!("Connection lost");
        }
        self.connection_lost = true;
        self.challenge.stop();
        self.resolution.stop();
        self.local.typing.end();
    }

    /// Sends the chosen spell. A different choice replaces the pending one and is
    /// sent again, so a rejected or mistyped id can be corrected within the phase.
    pub fn select_spell(&mut self, spell_id: &str) -> bool {
        if !self.can_act(Phase::SpellSelection)
            || self.local.spell_id.as_deref() == Some(spell_id)
        {
            debug!("Ignoring spell selection {}", spell_id);
            return false;
        }
        self.local.spell_id = Some(spell_id.to_string());
        self.outbox.push(ClientMessage::SelectSpell {
            spell_id: spell_id.to_string(),
        });
        true
    }

    pub fn select_target(&mut self, target_id: &str) -> bool {
        if !self.can_act(Phase::TargetSelection)
            || self.local.target_id.as_deref() == Some(target_id)
        {
            debug!("Ignoring target selection {}", target_id);
            return false;
        }
        self.local.target_id = Some(target_id.to_string());
        self.outbox.push(ClientMessage::SelectTarget {
            target_ids: vec![target_id.to_string()],
        });
        true
    }

    pub fn input_typing(&mut self, text: &str, now: Instant) {
        if self.can_act(Phase::Typing) {
            self.local.typing.input(text, now);
        }
    }

    /// One-shot typing submission. Every trigger path ends up here.
    pub fn submit_typing(&mut self, finished: bool, now: Instant) -> bool {
        if !self.can_act(Phase::Typing) || !self.local.typing.is_active() {
            return false;
        }
        match self.local.typing.submit(finished, now) {
            Some(message) => {
                self.outbox.push(message);
                true
            }
            None => false,
        }
    }

    pub fn play_again(&mut self) -> bool {
        if self.connection_lost || self.phase() != Some(Phase::GameOver) {
            return false;
        }
        self.outbox.push(ClientMessage::PlayAgain);
        true
    }

    /// Advances countdowns and deferred submissions.
    pub fn tick(&mut self, now: Instant) {
        if let Some(message) = self.local.typing.poll_auto_submit(now) {
            self.outbox.push(message);
        }

        if self.challenge.tick(now) == Tick::Expired {
            info!("Typing time is up");
            if let Some(message) = self.local.typing.submit(false, now) {
                self.outbox.push(message);
            }
        }

        // Phase advancement comes from the next snapshot, not from this timer.
        self.resolution.tick(now);
    }

    pub fn view(&self, now: Instant) -> View {
        let turn = self.game.as_ref().map_or(0, |g| g.turn);
        let countdown = [&self.challenge, &self.resolution]
            .into_iter()
            .find(|c| c.is_running())
            .map(|c| CountdownView {
                remaining_secs: c.remaining_secs(now),
                near_expiry: c.near_expiry(now),
            });

        let screen = self.screen();
        let waiting = match screen {
            Screen::SpellSelection => self.local.spell_id.is_some(),
            Screen::TargetSelection => self.local.target_id.is_some(),
            Screen::Typing => self.local.typing.is_submitted(),
            _ => false,
        };

        View {
            screen,
            turn,
            notice: self.notice.clone(),
            countdown,
            waiting,
        }
    }

    fn screen(&self) -> Screen {
        if self.connection_lost {
            return Screen::ConnectionLost;
        }
        if self.session.is_none() {
            return Screen::Connecting;
        }
        if self.me().is_some_and(|me| !me.is_alive) {
            return Screen::Spectating;
        }
        match self.phase() {
            None | Some(Phase::Lobby) => Screen::Lobby,
            Some(Phase::SpellSelection) => Screen::SpellSelection,
            Some(Phase::TargetSelection) => Screen::TargetSelection,
            Some(Phase::Typing) => Screen::Typing,
            Some(Phase::Resolution) => Screen::Resolution,
            Some(Phase::GameOver) => Screen::GameOver,
        }
    }

    fn can_act(&self, phase: Phase) -> bool {
        !self.connection_lost
            && self.phase() == Some(phase)
            && self.me().is_some_and(|me| me.is_alive)
    }

    fn store_game(&mut self, game: GameSnapshot, now: Instant) {
        self.game = Some(game);
        self.game_received_at = Some(now);
    }

    /// Applies the edge between the last applied phase and the current snapshot's phase.
    fn reconcile(&mut self, now: Instant) {
        if self.session.is_none() {
            debug!("Snapshot buffered until identity is known");
            return;
        }
        let Some(phase) = self.phase() else {
            return;
        };
        if self.me().is_some_and(|me| !me.is_alive) && self.challenge.is_running() {
            info!("Defeated during typing, abandoning the challenge");
            self.challenge.stop();
            self.local.typing.end();
        }
        if self.applied_phase == Some(phase) {
            // A challenge that was missing from the entering snapshot can still start late.
            if phase == Phase::Typing && !self.local.typing.is_active() {
                self.begin_typing(now);
            }
            return;
        }
        self.transition(phase, now);
    }

    fn transition(&mut self, phase: Phase, now: Instant) {
        let previous = self.applied_phase.replace(phase);
        debug!("Phase edge {:?} -> {:?}", previous, phase);

        match previous {
            Some(Phase::Typing) => {
                self.local.typing.end();
                self.challenge.stop();
            }
            Some(Phase::Resolution) => self.resolution.stop(),
            _ => {}
        }

        match phase {
            Phase::SpellSelection => {
                self.local.reset();
                self.challenge.stop();
                self.resolution.stop();
            }
            Phase::Typing => self.begin_typing(now),
            Phase::Resolution => {
                let hint = self.game.as_ref().and_then(|g| g.time_remaining);
                let anchor = self.game_received_at.unwrap_or(now);
                self.resolution
                    .start_secs(anchor, hint.unwrap_or(self.config.resolution_secs));
            }
            Phase::GameOver => {
                self.challenge.stop();
                self.resolution.stop();
                if let Some(outcome) = self.game.as_ref().and_then(|g| g.outcome.as_ref()) {
                    info!(
                        "Match over, winner: {}",
                        outcome.winner_name.as_deref().unwrap_or("none (draw)")
                    );
                }
            }
            Phase::Lobby | Phase::TargetSelection => {}
        }
    }

    fn begin_typing(&mut self, now: Instant) {
        if self.local.typing.is_submitted() || !self.me().is_some_and(|me| me.is_alive) {
            return;
        }
        let Some(challenge) = self.game.as_ref().and_then(|g| g.typing_challenge.clone()) else {
            debug!("Typing phase without a challenge yet");
            return;
        };
        self.local.typing.begin(&challenge.incantation, now);
        self.challenge.start_secs(now, challenge.time_limit_secs);
    }
}

impl MessageHandler for GameSession {
    fn on_joined_room(
        &mut self,
        player_id: PlayerId,
        room_id: String,
        state: JoinedState,
        now: Instant,
    ) {
        self.apply_joined_room(player_id, room_id, state, now);
    }

    fn on_operation_error(&mut self, message: String) {
        self.apply_error(message);
    }

    fn on_room_update(&mut self, room: RoomSnapshot, now: Instant) {
        self.apply_room_update(room, now);
    }

    fn on_game_update(&mut self, game: GameSnapshot, now: Instant) {
        self.apply_game_update(game, now);
    }
}
