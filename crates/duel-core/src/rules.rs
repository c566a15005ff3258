//! The rules collaborator plugged into an [`Engine`](crate::Engine).
//!
//! The engine owns a single `GameRules` value and is its only writer:
//! every hook taking `&mut self` runs on the dispatch loop, one at a time.
//! Read-only hooks may also be called from state queries running on other
//! tasks, so they must not assume they are on the dispatch loop.

use crate::action::{Payload, PlayerId, TimerId};
use crate::state::PlayerBounds;

pub trait GameRules: Send + Sync + 'static {
    /// Game-specific move payload carried by `Action::Move`.
    type Move: Payload;

    /// Game-specific snapshot returned from state queries.
    type State: Payload;

    /// Roster bounds checked by `set_players`.
    fn player_bounds(&self) -> PlayerBounds;

    /// Called once, just before waiting for players to become ready.
    fn initialize_game(&mut self, player_count: usize);

    /// Called once, after every seated player reported ready.
    fn perform_after_all_are_ready(&mut self) {}

    fn game_over(&self) -> bool;

    fn can_move(&self, player: PlayerId) -> bool;

    fn can_quit(&self, player: PlayerId) -> bool;

    /// Apply a move already known to be in turn. Returns `false` if the
    /// move is illegal, in which case the state must be left untouched.
    fn make_move(&mut self, player: PlayerId, mv: &Self::Move) -> bool;

    /// State visible to `player` for a game-defined `state_type`.
    fn game_state(&self, player: PlayerId, state_type: i32) -> Self::State;

    /// A timer ticked. Returns `true` if players should be told the state
    /// changed.
    fn handle_timer_event(&mut self, _timer: TimerId) -> bool {
        false
    }
}
