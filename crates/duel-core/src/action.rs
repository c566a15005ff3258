//! Actions flowing from players (and timers) into the engine.
//!
//! An [`Action`] is a closed sum type; the dispatch loop matches on it
//! exhaustively. Every player-originated variant carries the seat of the
//! player that produced it so the engine can address replies. Timer ticks
//! carry the id of the timer that produced them instead.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Marker for game-specific payloads (moves and state snapshots).
///
/// Payloads cross task boundaries and are cloned into broadcasts, so they
/// must be cheap to clone and thread-safe.
pub trait Payload: Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> Payload for T where T: Clone + fmt::Debug + Send + Sync + 'static {}

/// Seat of a player in the roster, as handed out by `set_game`.
///
/// `-1` means "no seat": a player that has not been seated yet, or a
/// player the game does not know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub i32);

impl PlayerId {
    /// The "no seat" id.
    pub const UNSEATED: PlayerId = PlayerId(-1);

    /// Roster index for this id, if it is non-negative.
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    /// Id for a roster index.
    pub fn from_index(index: usize) -> Self {
        PlayerId(i32::try_from(index).unwrap_or(i32::MAX))
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a [`GameTimer`](crate::GameTimer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

impl TimerId {
    pub(crate) fn next() -> Self {
        TimerId(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A request to the engine.
///
/// `M` is the game-specific move payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<M> {
    /// A game move; validated by the rules before it is applied.
    Move { source: PlayerId, payload: M },

    /// The player wants to end the game.
    Quit { source: PlayerId },

    /// The player acknowledges that the game is ending.
    QuitAck { source: PlayerId },

    /// A periodic tick from a timer.
    Timer { timer: TimerId },

    /// "Nothing to do". Treated like an empty queue by the engine.
    Null { source: PlayerId },
}

/// Discriminant of an [`Action`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Move,
    Quit,
    QuitAck,
    Timer,
    Null,
}

impl<M> Action<M> {
    /// Convenience constructor for a move.
    pub fn play(source: PlayerId, payload: M) -> Self {
        Action::Move { source, payload }
    }

    /// Player that originated the action; `None` for timer ticks.
    pub fn source(&self) -> Option<PlayerId> {
        match self {
            Action::Move { source, .. }
            | Action::Quit { source }
            | Action::QuitAck { source }
            | Action::Null { source } => Some(*source),
            Action::Timer { .. } => None,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Move { .. } => ActionKind::Move,
            Action::Quit { .. } => ActionKind::Quit,
            Action::QuitAck { .. } => ActionKind::QuitAck,
            Action::Timer { .. } => ActionKind::Timer,
            Action::Null { .. } => ActionKind::Null,
        }
    }
}
