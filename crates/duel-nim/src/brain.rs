use std::time::Duration;

use async_trait::async_trait;
use duel_core::{Action, ComputerBrain, GameRef, GameState, PlayerId};
use tracing::{debug, warn};

use crate::rules::{NimState, Take, MAX_TAKE};

/// Leaves the opponent a multiple of `MAX_TAKE + 1` whenever it can, and
/// takes a single stone otherwise.
#[derive(Debug, Clone, Default)]
pub struct NimBrain {
    think: Duration,
}

impl NimBrain {
    /// Pause for `think` before each move, so humans can follow along.
    pub fn with_think_time(think: Duration) -> Self {
        NimBrain { think }
    }
}

pub fn best_take(stones: u32) -> u32 {
    match stones % (MAX_TAKE + 1) {
        0 => 1.min(stones),
        n => n,
    }
}

#[async_trait]
impl ComputerBrain<Take, NimState> for NimBrain {
    async fn choose_move(&self, game: &GameRef<Take, NimState>, me: PlayerId) {
        let state = match game.get_state(me, 0).await {
            Ok(GameState::Snapshot(state)) => state,
            Ok(other) => {
                warn!(?other, "expected a snapshot");
                return;
            }
            Err(e) => {
                warn!(error = %e, "could not read the heap");
                return;
            }
        };

        if state.winner.is_some() || state.to_move != me || state.stones == 0 {
            debug!(%me, "nothing to do");
            return;
        }

        if !self.think.is_zero() {
            tokio::time::sleep(self.think).await;
        }

        let n = best_take(state.stones);
        debug!(%me, stones = state.stones, n, "taking");
        game.apply_action(Action::play(me, Take(n)));
    }
}
