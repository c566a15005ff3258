//! Fixed vocabulary shared by every game.

use std::fmt;

use duel_core::{Action, PlayerId};

/// Lifecycle callbacks forwarded from a proxy player to its remote game
/// handle, one per line as `:<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleCommand {
    SetGame(PlayerId),
    RequestMove,
    NotYourMove,
    TimeToQuit,
    InvalidRequest,
    IllegalMove,
    GameIsOver,
    StateChanged,
    FinishUp,
}

impl LifecycleCommand {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleCommand::SetGame(_) => "setGame",
            LifecycleCommand::RequestMove => "requestMove",
            LifecycleCommand::NotYourMove => "notYourMove",
            LifecycleCommand::TimeToQuit => "timeToQuit",
            LifecycleCommand::InvalidRequest => "invalidRequest",
            LifecycleCommand::IllegalMove => "illegalMove",
            LifecycleCommand::GameIsOver => "gameIsOver",
            LifecycleCommand::StateChanged => "stateChanged",
            LifecycleCommand::FinishUp => "finishUp",
        }
    }

    /// Parse the body of a `:` line.
    ///
    /// `setGame` is matched as a prefix and takes its seat from the text
    /// after the first blank; a missing or malformed seat reads as `0`.
    pub fn parse(body: &str) -> Option<Self> {
        if body.starts_with("setGame") {
            let seat = body
                .split_once(' ')
                .and_then(|(_, rest)| rest.trim().parse().ok())
                .unwrap_or(0);
            return Some(LifecycleCommand::SetGame(PlayerId(seat)));
        }

        let cmd = match body {
            "requestMove" => LifecycleCommand::RequestMove,
            "notYourMove" => LifecycleCommand::NotYourMove,
            "timeToQuit" => LifecycleCommand::TimeToQuit,
            "invalidRequest" => LifecycleCommand::InvalidRequest,
            "illegalMove" => LifecycleCommand::IllegalMove,
            "gameIsOver" => LifecycleCommand::GameIsOver,
            "stateChanged" => LifecycleCommand::StateChanged,
            "finishUp" => LifecycleCommand::FinishUp,
            _ => return None,
        };
        Some(cmd)
    }
}

impl fmt::Display for LifecycleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleCommand::SetGame(id) => write!(f, "setGame {id}"),
            other => f.write_str(other.name()),
        }
    }
}

/// The game-independent actions, sent as `#<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericAction {
    Null,
    Quit,
    QuitAcknowledge,
}

impl GenericAction {
    pub fn name(self) -> &'static str {
        match self {
            GenericAction::Null => "null",
            GenericAction::Quit => "quit",
            GenericAction::QuitAcknowledge => "quitAcknowledge",
        }
    }

    /// Unknown names read as `Null`.
    pub fn parse(body: &str) -> Self {
        match body {
            "quit" => GenericAction::Quit,
            "quitAcknowledge" => GenericAction::QuitAcknowledge,
            _ => GenericAction::Null,
        }
    }

    /// `None` for moves and timer ticks.
    pub fn from_action<M>(action: &Action<M>) -> Option<Self> {
        match action {
            Action::Null { .. } => Some(GenericAction::Null),
            Action::Quit { .. } => Some(GenericAction::Quit),
            Action::QuitAck { .. } => Some(GenericAction::QuitAcknowledge),
            Action::Move { .. } | Action::Timer { .. } => None,
        }
    }

    pub fn into_action<M>(self, source: PlayerId) -> Action<M> {
        match self {
            GenericAction::Null => Action::Null { source },
            GenericAction::Quit => Action::Quit { source },
            GenericAction::QuitAcknowledge => Action::QuitAck { source },
        }
    }
}
