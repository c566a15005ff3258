//! Scaffold for computer-controlled players.
//!
//! A [`ComputerPlayer`] handles the lifecycle plumbing (seat binding,
//! quit acknowledgement, single-flight move requests) and delegates the
//! actual decision to a [`ComputerBrain`].

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::action::{Action, Payload, PlayerId};
use crate::game::{GamePlayer, GameRef};

/// Move selection strategy for a [`ComputerPlayer`].
#[async_trait]
pub trait ComputerBrain<M: Payload, S: Payload>: Send + Sync + 'static {
    /// Work out a move and submit it through `game.apply_action`.
    ///
    /// Runs on its own task; at most one call per player is in flight.
    async fn choose_move(&self, game: &GameRef<M, S>, me: PlayerId);

    /// Called (on its own task) whenever the game reports a state change.
    async fn on_state_changed(&self, _game: &GameRef<M, S>, _me: PlayerId) {}
}

pub struct ComputerPlayer<M: Payload, S: Payload, B> {
    brain: Arc<B>,
    game: OnceLock<GameRef<M, S>>,
    id: AtomicI32,

    /// Set while a `choose_move` task is running.
    move_requested: Arc<AtomicBool>,
}

impl<M, S, B> ComputerPlayer<M, S, B>
where
    M: Payload,
    S: Payload,
    B: ComputerBrain<M, S>,
{
    pub fn new(brain: B) -> Self {
        ComputerPlayer {
            brain: Arc::new(brain),
            game: OnceLock::new(),
            id: AtomicI32::new(PlayerId::UNSEATED.0),
            move_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn brain(&self) -> &B {
        &self.brain
    }

    /// Whether a move is currently being worked out.
    pub fn is_thinking(&self) -> bool {
        self.move_requested.load(Ordering::Acquire)
    }

    fn acknowledge_quit(&self) {
        match self.game.get() {
            Some(game) => game.apply_action(Action::QuitAck { source: self.id() }),
            None => warn!("asked to quit before joining a game"),
        }
    }
}

impl<M, S, B> GamePlayer<M, S> for ComputerPlayer<M, S, B>
where
    M: Payload,
    S: Payload,
    B: ComputerBrain<M, S>,
{
    /// Binds the first game offered; later calls only update the seat
    /// (a remote game re-announces it once the real game seats us).
    fn set_game(&self, game: GameRef<M, S>, id: PlayerId) {
        if !game.player_bounds().admits(id) {
            warn!(%id, "seat outside the game's bounds; ignoring");
            return;
        }

        self.id.store(id.0, Ordering::Release);
        if self.game.set(game).is_err() {
            debug!(%id, "already bound to a game; seat updated");
        }
    }

    fn request_move(&self) {
        let Some(game) = self.game.get().cloned() else {
            warn!("move requested before joining a game");
            return;
        };

        if self.move_requested.swap(true, Ordering::AcqRel) {
            return;
        }

        let brain = Arc::clone(&self.brain);
        let in_flight = Arc::clone(&self.move_requested);
        let me = self.id();
        tokio::spawn(async move {
            brain.choose_move(&game, me).await;
            in_flight.store(false, Ordering::Release);
        });
    }

    fn not_your_move(&self) {
        debug!(id = %self.id(), "not our move");
    }

    fn time_to_quit(&self) {
        self.acknowledge_quit();
    }

    fn invalid_request(&self) {
        debug!(id = %self.id(), "request refused");
    }

    fn illegal_move(&self) {
        debug!(id = %self.id(), "move rejected");
    }

    fn game_is_over(&self) {
        self.acknowledge_quit();
    }

    fn state_changed(&self) {
        let Some(game) = self.game.get().cloned() else {
            return;
        };
        let brain = Arc::clone(&self.brain);
        let me = self.id();
        tokio::spawn(async move {
            brain.on_state_changed(&game, me).await;
        });
    }

    fn finish_up(&self) {}

    fn id(&self) -> PlayerId {
        PlayerId(self.id.load(Ordering::Acquire))
    }
}
