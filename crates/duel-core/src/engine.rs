//! Central dispatch loop.
//!
//! The [`Engine`] owns the rules, the roster and the action queue. Players
//! (local or proxied) push actions with [`Game::apply_action`] from any
//! task; exactly one task, the one that calls [`Game::play_game`], pops
//! them and drives the rules.
//!
//! Routing policy:
//! - replies to a single action (`not_your_move`, `illegal_move`,
//!   `invalid_request`) go **only** to the originating player, called
//!   directly from the dispatch loop;
//! - lifecycle notifications (`request_move`, `time_to_quit`,
//!   `game_is_over`, `state_changed`) are **broadcast**, one
//!   fire-and-forget task per seated player, in no particular order.
//!
//! The loop never blocks on anything it does not control: it waits for
//! readiness in [`READY_POLL_INTERVAL`] steps, backs off for
//! [`STALL_POLL_INTERVAL`] when the queue is empty, and yields while
//! waiting for quit acknowledgements.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::action::{Action, PlayerId};
use crate::error::{SetupError, StateError};
use crate::game::{Game, GameOutcome, GamePlayer, PlayerRef};
use crate::rules::GameRules;
use crate::state::{GameState, PlayerBounds, IDENTITY_QUERY};

/// How long to wait between readiness checks before the game starts.
pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// How long to back off after an empty queue, once moves were re-requested.
pub const STALL_POLL_INTERVAL: Duration = Duration::from_millis(100);

type ActionTx<M> = mpsc::UnboundedSender<Action<M>>;
type ActionRx<M> = mpsc::UnboundedReceiver<Action<M>>;
type Roster<M, S> = Vec<Option<PlayerRef<M, S>>>;

/// Notifications fanned out to every player.
#[derive(Debug, Clone, Copy)]
enum Broadcast {
    RequestMove,
    TimeToQuit,
    GameIsOver,
    StateChanged,
}

impl Broadcast {
    fn deliver<M, S>(self, player: &dyn GamePlayer<M, S>)
    where
        M: crate::Payload,
        S: crate::Payload,
    {
        match self {
            Broadcast::RequestMove => player.request_move(),
            Broadcast::TimeToQuit => player.time_to_quit(),
            Broadcast::GameIsOver => player.game_is_over(),
            Broadcast::StateChanged => player.state_changed(),
        }
    }
}

/// The authoritative game: rules + roster + action queue.
pub struct Engine<R: GameRules> {
    rules: RwLock<R>,
    bounds: PlayerBounds,
    roster: OnceLock<Roster<R::Move, R::State>>,

    queue_tx: ActionTx<R::Move>,
    /// Taken by the dispatch loop when the game starts.
    queue_rx: Mutex<Option<ActionRx<R::Move>>>,
    /// Actions queued but not yet popped.
    pending: AtomicUsize,

    started: AtomicBool,
}

impl<R: GameRules> Engine<R> {
    pub fn new(rules: R) -> Self {
        let bounds = rules.player_bounds();
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();

        Engine {
            rules: RwLock::new(rules),
            bounds,
            roster: OnceLock::new(),
            queue_tx,
            queue_rx: Mutex::new(Some(queue_rx)),
            pending: AtomicUsize::new(0),
            started: AtomicBool::new(false),
        }
    }

    /// Number of actions waiting in the queue.
    pub fn pending_actions(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Number of occupied seats (0 before `set_players`).
    pub fn player_count(&self) -> usize {
        self.roster
            .get()
            .map_or(0, |roster| roster.iter().flatten().count())
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Read-only access to the rules, e.g. for inspection in tests or UIs.
    pub async fn inspect<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        let rules = self.rules.read().await;
        f(&rules)
    }

    // -------------------------------------------------------------------------
    // Dispatch loop
    // -------------------------------------------------------------------------

    async fn dispatch(&self) -> GameOutcome {
        if self.started.swap(true, Ordering::AcqRel) {
            debug!("play_game called again; ignoring");
            return GameOutcome::AlreadyStarted;
        }

        let Some(roster) = self.roster.get() else {
            warn!("play_game called before players were seated");
            self.started.store(false, Ordering::Release);
            return GameOutcome::NotSeated;
        };

        let Some(mut queue) = self.queue_rx.lock().await.take() else {
            return GameOutcome::AlreadyStarted;
        };

        let player_count = self.player_count();
        self.rules.write().await.initialize_game(player_count);
        info!(players = player_count, "game initialized; waiting for players");

        self.wait_for_all_ready(roster).await;

        loop {
            if self.game_over().await {
                break;
            }

            match self.next_action(&mut queue) {
                Some(Action::Timer { timer }) => {
                    let changed = self.rules.write().await.handle_timer_event(timer);
                    if changed {
                        self.broadcast(roster, Broadcast::StateChanged);
                    }
                }
                Some(Action::Move { source, payload }) => {
                    self.handle_move(roster, source, &payload).await;
                }
                Some(Action::Quit { source }) => {
                    if self.can_quit(source).await {
                        info!(%source, "quit accepted; telling every player");
                        self.broadcast(roster, Broadcast::TimeToQuit);
                        return self.wait_for_quit_ack(roster, &mut queue).await;
                    }
                    debug!(%source, "quit refused");
                    self.notify(source, |p| p.invalid_request());
                }
                Some(Action::QuitAck { source }) => {
                    debug!(%source, "quit-ack outside of a quit");
                    self.notify(source, |p| p.invalid_request());
                }
                // Nobody asked for anything: remind whoever may move, in
                // case a player dropped a request, then back off.
                Some(Action::Null { .. }) | None => {
                    self.request_moves(roster).await;
                    tokio::time::sleep(STALL_POLL_INTERVAL).await;
                }
            }
        }

        info!("game over");
        self.broadcast(roster, Broadcast::StateChanged);
        self.broadcast(roster, Broadcast::GameIsOver);

        self.wait_for_quit_ack(roster, &mut queue).await
    }

    async fn handle_move(&self, roster: &Roster<R::Move, R::State>, source: PlayerId, mv: &R::Move) {
        if self.seated(source).is_none() {
            warn!(%source, "move from a player that is not seated; dropping");
            return;
        }

        if !self.can_move(source).await {
            debug!(%source, "move out of turn");
            self.notify(source, |p| p.not_your_move());
            return;
        }

        let legal = self.rules.write().await.make_move(source, mv);
        if legal {
            debug!(%source, ?mv, "move applied");
            self.broadcast(roster, Broadcast::StateChanged);
        } else {
            debug!(%source, ?mv, "illegal move");
            self.notify(source, |p| p.illegal_move());
        }
    }

    /// Poll until every seated player is ready, then run the post-ready hook.
    async fn wait_for_all_ready(&self, roster: &Roster<R::Move, R::State>) {
        loop {
            let straggler = roster.iter().flatten().any(|p| !p.is_ready());
            if !straggler {
                self.rules.write().await.perform_after_all_are_ready();
                info!("all players ready");
                return;
            }

            debug!("waiting for players to become ready");
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    /// Drain the queue until every seated player has sent `QuitAck`, then
    /// tell them all to finish up.
    async fn wait_for_quit_ack(
        &self,
        roster: &Roster<R::Move, R::State>,
        queue: &mut ActionRx<R::Move>,
    ) -> GameOutcome {
        // Empty seats have nothing to acknowledge.
        let mut acknowledged: Vec<bool> = roster.iter().map(Option::is_none).collect();
        let mut remaining = acknowledged.iter().filter(|acked| !**acked).count();

        while remaining > 0 {
            match self.next_action(queue) {
                Some(Action::QuitAck { source }) => {
                    match source.index().and_then(|i| acknowledged.get_mut(i)) {
                        Some(acked) if !*acked => {
                            *acked = true;
                            remaining -= 1;
                            debug!(%source, remaining, "quit acknowledged");
                        }
                        _ => debug!(%source, "ignoring repeated or unknown quit-ack"),
                    }
                }
                Some(Action::Null { .. }) | None => tokio::task::yield_now().await,
                Some(other) => match other.source() {
                    Some(source) => self.notify(source, |p| p.invalid_request()),
                    None => debug!(kind = ?other.kind(), "ignoring action while quitting"),
                },
            }
        }

        info!("every player acknowledged; finishing up");
        for player in roster.iter().flatten() {
            player.finish_up();
        }

        GameOutcome::Finished
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    /// Pop the head of the queue, if any.
    fn next_action(&self, queue: &mut ActionRx<R::Move>) -> Option<Action<R::Move>> {
        let action = queue.try_recv().ok()?;
        self.pending.fetch_sub(1, Ordering::AcqRel);
        debug!(kind = ?action.kind(), source = ?action.source(), "de-queue");
        Some(action)
    }

    fn seated(&self, id: PlayerId) -> Option<&PlayerRef<R::Move, R::State>> {
        self.roster.get()?.get(id.index()?)?.as_ref()
    }

    /// Call back a single player directly from the dispatch loop.
    fn notify(&self, id: PlayerId, f: impl FnOnce(&dyn GamePlayer<R::Move, R::State>)) {
        match self.seated(id) {
            Some(player) => f(player.as_ref()),
            None => warn!(%id, "cannot notify a player that is not seated"),
        }
    }

    fn broadcast(&self, roster: &Roster<R::Move, R::State>, what: Broadcast) {
        spawn_each(roster.iter().flatten().cloned(), what);
    }

    /// Ask every player that may move right now for a move.
    async fn request_moves(&self, roster: &Roster<R::Move, R::State>) {
        let eligible: Vec<_> = {
            let rules = self.rules.read().await;
            roster
                .iter()
                .enumerate()
                .filter_map(|(i, p)| p.as_ref().map(|p| (PlayerId::from_index(i), p)))
                .filter(|(id, _)| rules.can_move(*id))
                .map(|(_, p)| Arc::clone(p))
                .collect()
        };
        spawn_each(eligible, Broadcast::RequestMove);
    }

    async fn game_over(&self) -> bool {
        self.rules.read().await.game_over()
    }

    async fn can_move(&self, id: PlayerId) -> bool {
        self.rules.read().await.can_move(id)
    }

    async fn can_quit(&self, id: PlayerId) -> bool {
        self.rules.read().await.can_quit(id)
    }
}

fn spawn_each<M, S>(players: impl IntoIterator<Item = PlayerRef<M, S>>, what: Broadcast)
where
    M: crate::Payload,
    S: crate::Payload,
{
    for player in players {
        tokio::spawn(async move {
            what.deliver(player.as_ref());
        });
    }
}

#[async_trait]
impl<R: GameRules> Game<R::Move, R::State> for Engine<R> {
    fn apply_action(&self, action: Action<R::Move>) {
        // Count first so the consumer can never observe a negative length.
        self.pending.fetch_add(1, Ordering::AcqRel);
        if self.queue_tx.send(action).is_err() {
            self.pending.fetch_sub(1, Ordering::AcqRel);
        }
    }

    async fn get_state(
        &self,
        player: PlayerId,
        state_type: i32,
    ) -> Result<GameState<R::State>, StateError> {
        if state_type == IDENTITY_QUERY {
            let seat = if self.seated(player).is_some() {
                player
            } else {
                PlayerId::UNSEATED
            };
            return Ok(GameState::Identity(seat));
        }

        let rules = self.rules.read().await;
        Ok(GameState::Snapshot(rules.game_state(player, state_type)))
    }

    fn set_players(&self, players: Roster<R::Move, R::State>) -> Result<(), SetupError> {
        if players.is_empty() {
            return Err(SetupError::NoPlayers);
        }

        // Seats are roster indices, so the roster itself may not be longer
        // than the game allows.
        if players.len() > self.bounds.max {
            return Err(SetupError::TooManyPlayers {
                max: self.bounds.max,
                got: players.len(),
            });
        }

        let seated = players.iter().flatten().count();
        if seated < players.len() && !self.bounds.empty_seats_allowed {
            return Err(SetupError::EmptySeat);
        }
        if seated < self.bounds.min {
            return Err(SetupError::NotEnoughPlayers {
                min: self.bounds.min,
                got: seated,
            });
        }
        if seated > self.bounds.max {
            return Err(SetupError::TooManyPlayers {
                max: self.bounds.max,
                got: seated,
            });
        }

        self.roster
            .set(players)
            .map_err(|_| SetupError::AlreadySeated)?;
        info!(seated, "players seated");
        Ok(())
    }

    async fn play_game(&self) -> GameOutcome {
        self.dispatch().await
    }

    fn player_bounds(&self) -> PlayerBounds {
        self.bounds
    }
}
