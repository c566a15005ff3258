//! The two sides of the engine boundary.
//!
//! - [`Game`]: what a player talks to. Implemented by the real
//!   [`Engine`](crate::Engine) and by network proxies standing in for a
//!   remote engine.
//! - [`GamePlayer`]: what the game talks to. Implemented by local humans,
//!   computer players and network proxies standing in for a remote player.
//!
//! Both sides only ever see each other through these traits, so a player
//! cannot tell whether its game is local or remote, and vice versa.

use std::sync::Arc;

use async_trait::async_trait;

use crate::action::{Action, Payload, PlayerId};
use crate::error::{SetupError, StateError};
use crate::state::{GameState, PlayerBounds};

/// Shared handle to a game.
pub type GameRef<M, S> = Arc<dyn Game<M, S>>;

/// Shared handle to a player.
pub type PlayerRef<M, S> = Arc<dyn GamePlayer<M, S>>;

/// How a call to [`Game::play_game`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    /// Every seated player acknowledged the quit and was told to finish up.
    Finished,

    /// `play_game` had already been called; nothing was done.
    AlreadyStarted,

    /// `play_game` was called before a roster was accepted.
    NotSeated,

    /// The real game runs elsewhere; this handle only relays.
    Remote,
}

#[async_trait]
pub trait Game<M: Payload, S: Payload>: Send + Sync {
    /// Queue an action for the dispatch loop. Never blocks beyond
    /// acquiring the queue.
    fn apply_action(&self, action: Action<M>);

    /// Ask for state visible to `player`. `state_type` is game-defined,
    /// except [`IDENTITY_QUERY`](crate::IDENTITY_QUERY) which asks for the
    /// player's seat.
    async fn get_state(&self, player: PlayerId, state_type: i32)
        -> Result<GameState<S>, StateError>;

    /// Seat the players. The index of each entry is the player's id.
    fn set_players(&self, players: Vec<Option<PlayerRef<M, S>>>) -> Result<(), SetupError>;

    /// Run the game. Idempotent: only the first call does anything.
    async fn play_game(&self) -> GameOutcome;

    fn player_bounds(&self) -> PlayerBounds;
}

/// Lifecycle surface of every participant.
///
/// The dispatch loop calls these directly or from short-lived tasks; none
/// of them may block for long. Anything that takes real time (choosing a
/// move, waiting on the network) must be handed to a spawned task.
pub trait GamePlayer<M: Payload, S: Payload>: Send + Sync {
    /// Tell the player which game it is in and which seat it holds.
    fn set_game(&self, game: GameRef<M, S>, id: PlayerId);

    /// The game would like a move from this player.
    fn request_move(&self);

    /// The player tried to move out of turn.
    fn not_your_move(&self);

    /// The game is ending; the player should answer with `QuitAck`.
    fn time_to_quit(&self);

    /// The player sent a request that is not allowed right now.
    fn invalid_request(&self);

    /// The player's move was rejected by the rules.
    fn illegal_move(&self);

    /// The game is over; the player should answer with `QuitAck`.
    fn game_is_over(&self);

    /// Something visible to the player changed.
    fn state_changed(&self);

    /// Every player acknowledged the quit; last chance to clean up.
    fn finish_up(&self);

    fn id(&self) -> PlayerId;

    /// Whether the player can take part yet. The engine does not start
    /// dispatching until every seated player is ready.
    fn is_ready(&self) -> bool {
        true
    }
}
