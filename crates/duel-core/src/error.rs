//! Error types for the core engine.
//!
//! Rule violations (illegal or out-of-turn moves, disallowed quits) are not
//! errors: they are reported to the offending player through its lifecycle
//! callbacks. Errors here cover roster setup and state queries.

use thiserror::Error;

use crate::action::PlayerId;

/// Why a roster was rejected by `set_players`.
///
/// The `Display` text is meant to be shown to whoever is setting the game
/// up; the caller is responsible for aborting startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("no players selected")]
    NoPlayers,

    #[error("all player-slots must be filled")]
    EmptySeat,

    #[error("not enough players for the game (need {min}, got {got})")]
    NotEnoughPlayers { min: usize, got: usize },

    #[error("too many players for the game (at most {max}, got {got})")]
    TooManyPlayers { max: usize, got: usize },

    #[error("players have already been seated")]
    AlreadySeated,
}

/// Why a `get_state` call could not be answered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The game is a proxy for a single local player and was asked on
    /// behalf of someone else.
    #[error("player {0} is not hosted by this game")]
    ForeignPlayer(PlayerId),

    /// A proxy supports one outstanding state request at a time.
    #[error("a state request is already in flight")]
    RequestInFlight,

    #[error("not connected to the remote game")]
    NotConnected,
}
