//! User input events for the console front end.
//!
//! Each stdin line is either a slash command or the current typing text.
//! Commands are resolved through a table built once at startup, so the
//! mapping from words to logical actions never depends on what is on screen.

use std::collections::HashMap;

/// A logical user intent, independent of how it was entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    SelectSpell(String),
    SelectTarget(String),
    /// Replaces the typed incantation text.
    Type(String),
    Submit,
    PlayAgain,
    DismissError,
    Help,
    Quit,
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionKind {
    SelectSpell,
    SelectTarget,
    Submit,
    PlayAgain,
    DismissError,
    Help,
    Quit,
}

pub struct CommandTable {
    bindings: HashMap<&'static str, ActionKind>,
}

impl CommandTable {
    pub fn new() -> Self {
        let bindings = HashMap::from([
            ("/spell", ActionKind::SelectSpell),
            ("/s", ActionKind::SelectSpell),
            ("/target", ActionKind::SelectTarget),
            ("/t", ActionKind::SelectTarget),
            ("/submit", ActionKind::Submit),
            ("/again", ActionKind::PlayAgain),
            ("/dismiss", ActionKind::DismissError),
            ("/help", ActionKind::Help),
            ("/quit", ActionKind::Quit),
        ]);
        Self { bindings }
    }

    pub fn parse(&self, line: &str) -> UserAction {
        let line = line.trim_end_matches(['\r', '\n']);
        if !line.starts_with('/') {
            return UserAction::Type(line.to_string());
        }

        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let argument = parts.next().map(str::to_string);

        match (self.bindings.get(command), argument) {
            (Some(ActionKind::SelectSpell), Some(arg)) => UserAction::SelectSpell(arg),
            (Some(ActionKind::SelectTarget), Some(arg)) => UserAction::SelectTarget(arg),
            (Some(ActionKind::Submit), _) => UserAction::Submit,
            (Some(ActionKind::PlayAgain), _) => UserAction::PlayAgain,
            (Some(ActionKind::DismissError), _) => UserAction::DismissError,
            (Some(ActionKind::Help), _) => UserAction::Help,
            (Some(ActionKind::Quit), _) => UserAction::Quit,
            _ => UserAction::Unknown(line.to_string()),
        }
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}
