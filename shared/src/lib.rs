//! Wire protocol shared between the duel client and the authoritative server.
//!
//! Every message is a self-describing JSON record tagged by a `type` field.
//! Snapshots always arrive whole; the client never patches them.

use serde::{Deserialize, Serialize};

/// Interval between liveness pings while the connection is open.
pub const KEEPALIVE_INTERVAL_MS: u64 = 30_000;
/// Countdown tick interval.
pub const COUNTDOWN_TICK_MS: u64 = 100;
/// Delay between the final keystroke of an incantation and its automatic submission.
pub const AUTO_SUBMIT_DELAY_MS: u64 = 300;
/// Countdowns at or below this many seconds are flagged for emphasis.
pub const NEAR_EXPIRY_SECS: f64 = 5.0;
/// Length of the resolution phase. Must agree with the server's value.
pub const RESOLUTION_PHASE_SECS: f64 = 6.0;
/// Default typing timer requested when creating a room.
pub const DEFAULT_TIMER_SECONDS: u32 = 30;

pub type PlayerId = String;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Lobby,
    SpellSelection,
    TargetSelection,
    Typing,
    Resolution,
    GameOver,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RoomMember {
    pub id: PlayerId,
    pub name: String,
}

/// Pre-game lobby view.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub room_id: String,
    pub max_players: u32,
    #[serde(default)]
    pub players: Vec<RoomMember>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    #[serde(default)]
    pub shield: u32,
    pub is_alive: bool,
    #[serde(default)]
    pub has_selected_spell: bool,
    #[serde(default)]
    pub has_selected_target: bool,
    #[serde(default)]
    pub has_submitted_typing: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpellKind {
    Attack,
    Heal,
    Shield,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Spell {
    pub id: String,
    pub name: String,
    pub kind: SpellKind,
    #[serde(default)]
    pub power: u32,
    #[serde(default)]
    pub description: String,
    /// Incantation this spell will ask for, when the server reveals it up front.
    #[serde(default)]
    pub incantation: Option<String>,
}

/// The incantation the player must type during one typing phase.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TypingChallenge {
    pub incantation: String,
    pub time_limit_secs: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TargetOutcome {
    pub target_id: PlayerId,
    pub target_name: String,
    pub kind: SpellKind,
    pub amount: u32,
    pub resulting_hp: u32,
    #[serde(default)]
    pub killed: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EffectRecord {
    pub caster_id: PlayerId,
    pub caster_name: String,
    pub spell_name: String,
    /// Typing accuracy the server scored for the caster, 0.0..=1.0.
    pub accuracy: f64,
    #[serde(default)]
    pub outcomes: Vec<TargetOutcome>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ResolutionReport {
    #[serde(default)]
    pub effects: Vec<EffectRecord>,
}

/// Final result of a match. No winner means a draw.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct MatchOutcome {
    #[serde(default)]
    pub winner_id: Option<PlayerId>,
    #[serde(default)]
    pub winner_name: Option<String>,
}

/// Authoritative point-in-time view of a match.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GameSnapshot {
    pub room_id: String,
    pub turn: u32,
    pub phase: Phase,
    #[serde(default)]
    pub players: Vec<PlayerState>,
    #[serde(default)]
    pub spells: Vec<Spell>,
    #[serde(default)]
    pub typing_challenge: Option<TypingChallenge>,
    #[serde(default)]
    pub resolution: Option<ResolutionReport>,
    /// Seconds left in the current phase, valid at the moment the server sent it.
    #[serde(default)]
    pub time_remaining: Option<f64>,
    #[serde(default)]
    pub outcome: Option<MatchOutcome>,
}

impl GameSnapshot {
    pub fn player(&self, id: &str) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn spell(&self, id: &str) -> Option<&Spell> {
        self.spells.iter().find(|s| s.id == id)
    }
}

/// State attached to a join acknowledgment. A join can land in a room that
/// is still gathering players or in a match already under way.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum JoinedState {
    Game(GameSnapshot),
    Room(RoomSnapshot),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    JoinedRoom {
        player_id: PlayerId,
        room_id: String,
        #[serde(flatten)]
        state: JoinedState,
    },
    Error {
        message: String,
    },
    RoomUpdate {
        room: RoomSnapshot,
    },
    GameUpdate {
        game: GameSnapshot,
    },
    Pong,
    /// Any tag this client version does not know about.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinRoom {
        room_id: String,
        player_name: String,
        timer_seconds: u32,
    },
    SelectSpell {
        spell_id: String,
    },
    SelectTarget {
        /// Always exactly one id for now; array-shaped for multi-target spells.
        target_ids: Vec<PlayerId>,
    },
    SubmitTyping {
        typed_text: String,
        completion_time_ms: Option<u64>,
    },
    PlayAgain,
    Ping,
}

impl ClientMessage {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl ServerMessage {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_game(phase: Phase) -> serde_json::Value {
        json!({
            "room_id": "abc",
            "turn": 3,
            "phase": phase,
            "players": [
                {"id": "p1", "name": "Ada", "hp": 80, "max_hp": 100, "is_alive": true},
                {"id": "p2", "name": "Bo", "hp": 0, "max_hp": 100, "is_alive": false}
            ],
            "time_remaining": 4.5
        })
    }

    #[test]
    fn test_phase_tags_are_snake_case() {
        assert_eq!(json!(Phase::SpellSelection), json!("spell_selection"));
        assert_eq!(json!(Phase::GameOver), json!("game_over"));
        let phase: Phase = serde_json::from_value(json!("target_selection")).unwrap();
        assert_eq!(phase, Phase::TargetSelection);
    }

    #[test]
    fn test_joined_room_with_room_snapshot() {
        let text = json!({
            "type": "joined_room",
            "player_id": "p1",
            "room_id": "abc",
            "room": {"room_id": "abc", "max_players": 4, "players": [{"id": "p1", "name": "Ada"}]}
        })
        .to_string();

        match ServerMessage::from_json(&text).unwrap() {
            ServerMessage::JoinedRoom {
                player_id,
                room_id,
                state: JoinedState::Room(room),
            } => {
                assert_eq!(player_id, "p1");
                assert_eq!(room_id, "abc");
                assert_eq!(room.max_players, 4);
                assert_eq!(room.players.len(), 1);
            }
            other => panic!("Wrong message after decoding: {:?}", other),
        }
    }

    #[test]
    fn test_joined_room_with_game_snapshot() {
        let text = json!({
            "type": "joined_room",
            "player_id": "p2",
            "room_id": "abc",
            "game": sample_game(Phase::Resolution)
        })
        .to_string();

        match ServerMessage::from_json(&text).unwrap() {
            ServerMessage::JoinedRoom {
                state: JoinedState::Game(game),
                ..
            } => {
                assert_eq!(game.phase, Phase::Resolution);
                assert_eq!(game.time_remaining, Some(4.5));
                assert!(!game.player("p2").unwrap().is_alive);
                assert_eq!(game.players[0].shield, 0);
            }
            other => panic!("Wrong message after decoding: {:?}", other),
        }
    }

    #[test]
    fn test_game_update_defaults_optional_fields() {
        let text = json!({"type": "game_update", "game": sample_game(Phase::Typing)}).to_string();
        let ServerMessage::GameUpdate { game } = ServerMessage::from_json(&text).unwrap() else {
            panic!("expected game_update");
        };
        assert!(game.spells.is_empty());
        assert!(game.typing_challenge.is_none());
        assert!(game.outcome.is_none());
    }

    #[test]
    fn test_spell_incantation_is_optional() {
        let spells: Vec<Spell> = serde_json::from_value(json!([
            {"id": "fireball", "name": "Fireball", "kind": "attack", "power": 25,
             "incantation": "ignis flamma"},
            {"id": "mend", "name": "Mend", "kind": "heal"}
        ]))
        .unwrap();
        assert_eq!(spells[0].incantation.as_deref(), Some("ignis flamma"));
        assert!(spells[1].incantation.is_none());
        assert_eq!(spells[1].power, 0);
    }

    #[test]
    fn test_unknown_tag_decodes_as_unknown() {
        let text = json!({"type": "spectator_joined", "name": "Cy"}).to_string();
        assert_eq!(ServerMessage::from_json(&text).unwrap(), ServerMessage::Unknown);
    }

    #[test]
    fn test_pong_and_error() {
        assert_eq!(
            ServerMessage::from_json(r#"{"type":"pong"}"#).unwrap(),
            ServerMessage::Pong
        );
        assert_eq!(
            ServerMessage::from_json(r#"{"type":"error","message":"Room is full"}"#).unwrap(),
            ServerMessage::Error {
                message: "Room is full".to_string()
            }
        );
    }

    #[test]
    fn test_submit_typing_serializes_null_completion_time() {
        let msg = ClientMessage::SubmitTyping {
            typed_text: "ignis fa".to_string(),
            completion_time_ms: None,
        };
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "submit_typing", "typed_text": "ignis fa", "completion_time_ms": null})
        );
    }

    #[test]
    fn test_outbound_shapes() {
        let target = ClientMessage::SelectTarget {
            target_ids: vec!["p2".to_string()],
        };
        assert_eq!(
            serde_json::to_value(&target).unwrap(),
            json!({"type": "select_target", "target_ids": ["p2"]})
        );
        assert_eq!(
            serde_json::to_value(ClientMessage::Ping).unwrap(),
            json!({"type": "ping"})
        );
        assert_eq!(
            serde_json::to_value(ClientMessage::PlayAgain).unwrap(),
            json!({"type": "play_again"})
        );
        let join = ClientMessage::JoinRoom {
            room_id: "abc".to_string(),
            player_name: "Ada".to_string(),
            timer_seconds: DEFAULT_TIMER_SECONDS,
        };
        assert_eq!(
            serde_json::to_value(&join).unwrap(),
            json!({"type": "join_room", "room_id": "abc", "player_name": "Ada", "timer_seconds": 30})
        );
    }
}
