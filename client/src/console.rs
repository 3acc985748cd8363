//! Plain-text summaries of the session for the console front end.

use crate::error::ClientError;
use crate::game::{GameSession, Screen, View};
use crate::typing::{accuracy, CharClass, Segment};
use shared::{GameSnapshot, SpellKind};
use std::fmt::Write;

pub const HELP: &str = "\
Commands:
  /spell <id|number>   choose a spell
  /target <id|number>  choose a target
  <text>               type the incantation (each line replaces the text)
  /submit              submit the incantation
  /again               play again after the match
  /dismiss             hide the last server error
  /quit                leave";

/// Accepts a spell id or its 1-based position in the spell list.
pub fn resolve_spell(game: &GameSnapshot, arg: &str) -> String {
    arg.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| game.spells.get(i))
        .map_or_else(|| arg.to_string(), |s| s.id.clone())
}

/// Accepts a player id or its 1-based position among living players.
pub fn resolve_target(game: &GameSnapshot, arg: &str) -> String {
    arg.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| game.players.iter().filter(|p| p.is_alive).nth(i))
        .map_or_else(|| arg.to_string(), |p| p.id.clone())
}

/// Completed and correct characters print as typed, mistakes in brackets,
/// untyped characters as underscores. Whitespace passes through.
pub fn render_typing(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (c, class) in segments.iter().flat_map(|s| s.chars.iter()) {
        match class {
            CharClass::Completed | CharClass::Correct => out.push(*c),
            CharClass::Incorrect => {
                let _ = write!(out, "[{}]", c);
            }
            CharClass::Pending if c.is_whitespace() => out.push(*c),
            CharClass::Pending => out.push('_'),
        }
    }
    out
}

/// Countdown ticks only warrant a new line once they are near expiry.
pub fn should_present(previous: Option<&View>, next: &View) -> bool {
    let Some(previous) = previous else {
        return true;
    };
    let visible = |v: &View| v.countdown.filter(|c| c.near_expiry);
    previous.screen != next.screen
        || previous.turn != next.turn
        || previous.notice != next.notice
        || previous.waiting != next.waiting
        || visible(previous) != visible(next)
}

fn kind_label(kind: SpellKind) -> &'static str {
    match kind {
        SpellKind::Attack => "attack",
        SpellKind::Heal => "heal",
        SpellKind::Shield => "shield",
    }
}

pub fn render(session: &GameSession, view: &View) -> String {
    let mut out = String::new();

    let _ = match view.screen {
        Screen::Connecting => write!(out, "Waiting for the server..."),
        Screen::Lobby => match session.room() {
            Some(room) => write!(
                out,
                "Lobby {} ({}/{}): {}",
                room.room_id,
                room.players.len(),
                room.max_players,
                room.players
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            None => write!(out, "Lobby"),
        },
        Screen::SpellSelection => {
            let _ = write!(out, "Turn {}: choose a spell", view.turn);
            if let Some(game) = session.game() {
                for (i, spell) in game.spells.iter().enumerate() {
                    let _ = write!(
                        out,
                        "\n  {}. {} [{} {}] {}",
                        i + 1,
                        spell.name,
                        kind_label(spell.kind),
                        spell.power,
                        spell.description
                    );
                }
            }
            Ok(())
        }
        Screen::TargetSelection => {
            let _ = write!(out, "Turn {}: choose a target", view.turn);
            if let Some(game) = session.game() {
                for (i, player) in game.players.iter().filter(|p| p.is_alive).enumerate() {
                    let _ = write!(
                        out,
                        "\n  {}. {} ({}/{} hp)",
                        i + 1,
                        player.name,
                        player.hp,
                        player.max_hp
                    );
                }
            }
            Ok(())
        }
        Screen::Typing => {
            let typing = session.typing();
            write!(
                out,
                "Type: {}\n      {}",
                typing.target(),
                render_typing(&typing.segments())
            )
        }
        Screen::Resolution => {
            let _ = write!(out, "Turn {} resolves", view.turn);
            let report = session.game().and_then(|g| g.resolution.as_ref());
            for effect in report.iter().flat_map(|r| r.effects.iter()) {
                let _ = write!(
                    out,
                    "\n  {} casts {} ({:.0}% accuracy)",
                    effect.caster_name,
                    effect.spell_name,
                    effect.accuracy * 100.0
                );
                for outcome in &effect.outcomes {
                    let _ = write!(
                        out,
                        "\n    {} {} {} -> {} hp{}",
                        outcome.target_name,
                        kind_label(outcome.kind),
                        outcome.amount,
                        outcome.resulting_hp,
                        if outcome.killed { " (defeated)" } else { "" }
                    );
                }
            }
            Ok(())
        }
        Screen::GameOver => {
            let winner = session
                .game()
                .and_then(|g| g.outcome.as_ref())
                .and_then(|o| o.winner_name.clone());
            match winner {
                Some(name) => write!(out, "Match over, {} wins. /again to play again", name),
                None => write!(out, "Match over, draw. /again to play again"),
            }
        }
        Screen::Spectating => write!(out, "You have been defeated. Spectating..."),
        Screen::ConnectionLost => write!(out, "Connection lost. Restart to play again."),
    };

    if view.waiting {
        out.push_str("\n  (waiting for other players)");
        let typing = session.typing();
        if view.screen == Screen::Typing {
            let _ = write!(
                out,
                " accuracy {:.0}%",
                accuracy(typing.target(), typing.typed())
            );
        }
    }
    if let Some(countdown) = view.countdown {
        let _ = write!(
            out,
            "\n  {}s left{}",
            countdown.remaining_secs,
            if countdown.near_expiry { "!" } else { "" }
        );
    }
    if let Some(notice) = &view.notice {
        let _ = write!(
            out,
            "\n  {} (/dismiss)",
            ClientError::Operation(notice.clone())
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::game::CountdownView;
    use crate::typing::diff;
    use shared::{Phase, PlayerState, Spell};
    use std::time::Instant;

    fn game() -> GameSnapshot {
        GameSnapshot {
            room_id: "room".to_string(),
            turn: 2,
            phase: Phase::SpellSelection,
            players: vec![PlayerState {
                id: "p1".to_string(),
                name: "Ada".to_string(),
                hp: 90,
                max_hp: 100,
                shield: 0,
                is_alive: true,
                has_selected_spell: false,
                has_selected_target: false,
                has_submitted_typing: false,
            }],
            spells: vec![Spell {
                id: "fireball".to_string(),
                name: "Fireball".to_string(),
                kind: SpellKind::Attack,
                power: 25,
                description: String::new(),
                incantation: None,
            }],
            typing_challenge: None,
            resolution: None,
            time_remaining: None,
            outcome: None,
        }
    }

    fn view(screen: Screen, countdown: Option<CountdownView>) -> View {
        View {
            screen,
            turn: 1,
            notice: None,
            countdown,
            waiting: false,
        }
    }

    #[test]
    fn test_resolve_by_index_or_id() {
        let game = game();
        assert_eq!(resolve_spell(&game, "1"), "fireball");
        assert_eq!(resolve_spell(&game, "heal"), "heal");
        assert_eq!(resolve_spell(&game, "0"), "0");
        assert_eq!(resolve_target(&game, "1"), "p1");
        assert_eq!(resolve_target(&game, "7"), "7");
    }

    #[test]
    fn test_render_typing_marks() {
        assert_eq!(render_typing(&diff("ignis flamma", "igx")), "ig[n]__ ______");
        assert_eq!(render_typing(&diff("ab cd", "ab cd")), "ab cd");
    }

    #[test]
    fn test_should_present_skips_calm_countdown_ticks() {
        let calm = |secs| {
            view(
                Screen::Resolution,
                Some(CountdownView {
                    remaining_secs: secs,
                    near_expiry: false,
                }),
            )
        };
        assert!(should_present(None, &calm(9)));
        assert!(!should_present(Some(&calm(9)), &calm(8)));

        let urgent = view(
            Screen::Resolution,
            Some(CountdownView {
                remaining_secs: 4,
                near_expiry: true,
            }),
        );
        assert!(should_present(Some(&calm(6)), &urgent));
        assert!(should_present(Some(&urgent), &view(Screen::SpellSelection, None)));
    }

    #[test]
    fn test_render_connecting() {
        let session = GameSession::new(ClientConfig::default());
        let view = session.view(Instant::now());
        assert_eq!(render(&session, &view), "Waiting for the server...");
    }
}
