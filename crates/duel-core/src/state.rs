//! State answers and roster bounds.

use crate::action::PlayerId;

/// `state_type` reserved for "what is my seat?".
pub const IDENTITY_QUERY: i32 = -1;

/// Answer to a `get_state` call.
///
/// `S` is the game-specific snapshot type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameState<S> {
    /// Answer to an [`IDENTITY_QUERY`]: the asking player's seat,
    /// or [`PlayerId::UNSEATED`] if the game does not know the player.
    Identity(PlayerId),

    /// Game-specific view of the state, as visible to the asking player.
    Snapshot(S),
}

impl<S> GameState<S> {
    pub fn identity(&self) -> Option<PlayerId> {
        match self {
            GameState::Identity(id) => Some(*id),
            GameState::Snapshot(_) => None,
        }
    }

    pub fn into_snapshot(self) -> Option<S> {
        match self {
            GameState::Snapshot(s) => Some(s),
            GameState::Identity(_) => None,
        }
    }
}

/// How many players a game accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerBounds {
    pub min: usize,
    pub max: usize,

    /// Whether the roster may contain empty seats.
    pub empty_seats_allowed: bool,
}

impl PlayerBounds {
    /// Exactly `n` players, no empty seats.
    pub const fn exactly(n: usize) -> Self {
        PlayerBounds {
            min: n,
            max: n,
            empty_seats_allowed: false,
        }
    }

    /// Whether `id` names a seat that can exist under these bounds.
    pub fn admits(&self, id: PlayerId) -> bool {
        id.index().is_some_and(|i| i < self.max)
    }
}
