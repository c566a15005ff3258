//! Stand-in for a game running on the other end of the link.
//!
//! A `ProxyGame` hosts exactly one local player. Actions and state
//! queries from that player are written to the wire; lifecycle commands
//! from the real game are read back and invoked on the player.
//!
//! Read loop dispatch, one line at a time:
//! - `*<int>`  -> answer to an identity query
//! - ` <text>` -> answer to a state query, decoded by the codec
//! - `:<cmd>`  -> lifecycle command for the local player
//! - `%<text>` -> game-specific message, handed to the registered handler
//!
//! Every command except `setGame` is ignored until [`Game::play_game`] has
//! been called locally. `finishUp` ends the read loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

use async_trait::async_trait;
use duel_core::{
    Action, Game, GameOutcome, GameRef, GameState, PlayerBounds, PlayerId, PlayerRef,
    SetupError, StateError,
};
use duel_protocol::{
    encode_action, format_message, format_query, parse_player_bound, GameCodec,
    LifecycleCommand, PlayerBound,
};
use tokio::sync::{watch, Notify};
use tracing::{debug, error, info, warn};

use crate::config::NetConfig;
use crate::error::NetError;
use crate::transport::Transport;
use crate::types::MessageHandler;

/// Where a proxy game's link stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Open,
    /// `finishUp` was received and handed to the local player.
    Finished,
    /// The peer went away before `finishUp`.
    Lost,
}

type Answer<S> = GameState<S>;

pub struct ProxyGame<C: GameCodec> {
    codec: C,
    transport: Transport,
    me: Weak<Self>,

    player: OnceLock<PlayerRef<C::Move, C::State>>,
    player_bound: Notify,

    started: AtomicBool,
    quitting: AtomicBool,
    status: watch::Sender<LinkStatus>,

    /// Latest answer from the game; set once, cleared when consumed.
    answer: Mutex<Option<Answer<C::State>>>,
    answered: Notify,
    request_in_flight: AtomicBool,

    on_message: Mutex<Option<MessageHandler>>,
}

impl<C: GameCodec> ProxyGame<C> {
    /// Dial the hosting side and start the read loop.
    pub async fn connect(codec: C, config: &NetConfig) -> Result<Arc<Self>, NetError> {
        let (status, _) = watch::channel(LinkStatus::Open);
        let game = Arc::new_cyclic(|me| ProxyGame {
            codec,
            transport: Transport::new(),
            me: me.clone(),
            player: OnceLock::new(),
            player_bound: Notify::new(),
            started: AtomicBool::new(false),
            quitting: AtomicBool::new(false),
            status,
            answer: Mutex::new(None),
            answered: Notify::new(),
            request_in_flight: AtomicBool::new(false),
            on_message: Mutex::new(None),
        });

        let connected = game
            .transport
            .connect_as_client(&config.host, config.base_port, config.port_window)
            .await;
        if !connected {
            error!(host = %config.host, base_port = config.base_port, "could not reach the game");
            return Err(NetError::ConnectFailed {
                host: config.host.clone(),
                first_port: config.base_port,
                window: config.port_window,
            });
        }

        tokio::spawn(Arc::clone(&game).run_read_loop());
        Ok(game)
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn status(&self) -> LinkStatus {
        *self.status.borrow()
    }

    /// Resolves once the link is no longer open.
    pub async fn wait_finished(&self) -> LinkStatus {
        let mut rx = self.status.subscribe();
        let status = match rx.wait_for(|s| *s != LinkStatus::Open).await {
            Ok(status) => *status,
            Err(_) => LinkStatus::Lost,
        };
        status
    }

    /// Register the handler for `%` messages from the game.
    pub fn on_message(&self, handler: impl Fn(&str) + Send + Sync + 'static) {
        *self.on_message.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    /// Send a game-specific message to the game.
    pub fn send_message(&self, text: &str) {
        self.transport.write_output_line(&format_message(text));
    }

    // -------------------------------------------------------------------------
    // Read loop
    // -------------------------------------------------------------------------

    async fn run_read_loop(self: Arc<Self>) {
        while !self.quitting.load(Ordering::Acquire) {
            let line = self.transport.read_input_line().await;
            if line.is_empty() && !self.transport.is_complete() {
                warn!(link = %self.transport.link(), "link to the game lost; read loop stopped");
                self.status.send_replace(LinkStatus::Lost);
                // Wake a state request that will now never be answered.
                self.answered.notify_one();
                return;
            }
            self.process_input(&line).await;
        }

        info!(link = %self.transport.link(), "game finished");
        self.status.send_replace(LinkStatus::Finished);
    }

    async fn process_input(&self, line: &str) {
        match parse_player_bound(line) {
            PlayerBound::Empty => {}
            PlayerBound::Identity(id) => self.store_answer(GameState::Identity(id)),
            PlayerBound::State(body) => match self.codec.decode_state(body) {
                Some(state) => self.store_answer(GameState::Snapshot(state)),
                None => warn!(%body, "undecodable state; dropped"),
            },
            PlayerBound::Command(cmd) => self.process_command(cmd).await,
            PlayerBound::Message(text) => self.deliver_message(text),
            PlayerBound::Unknown(text) => warn!(line = %text, "unexpected line from the game"),
        }
    }

    async fn process_command(&self, cmd: LifecycleCommand) {
        if let LifecycleCommand::SetGame(id) = cmd {
            let player = self.wait_for_player().await;
            match self.handle() {
                Some(game) => player.set_game(game, id),
                None => warn!("proxy game dropped while binding its player"),
            }
            return;
        }

        if !self.started.load(Ordering::Acquire) {
            debug!(%cmd, "not started locally; ignoring");
            return;
        }
        let Some(player) = self.player.get() else {
            warn!(%cmd, "no local player; ignoring");
            return;
        };

        match cmd {
            LifecycleCommand::RequestMove => player.request_move(),
            LifecycleCommand::NotYourMove => player.not_your_move(),
            LifecycleCommand::TimeToQuit => player.time_to_quit(),
            LifecycleCommand::InvalidRequest => player.invalid_request(),
            LifecycleCommand::IllegalMove => player.illegal_move(),
            LifecycleCommand::GameIsOver => player.game_is_over(),
            // The player will likely ask for state, which needs this loop.
            LifecycleCommand::StateChanged => {
                let player = Arc::clone(player);
                tokio::spawn(async move { player.state_changed() });
            }
            LifecycleCommand::FinishUp => {
                player.finish_up();
                self.quitting.store(true, Ordering::Release);
            }
            LifecycleCommand::SetGame(_) => {}
        }
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn handle(&self) -> Option<GameRef<C::Move, C::State>> {
        let me: GameRef<C::Move, C::State> = self.me.upgrade()?;
        Some(me)
    }

    async fn wait_for_player(&self) -> PlayerRef<C::Move, C::State> {
        loop {
            if let Some(player) = self.player.get() {
                return Arc::clone(player);
            }
            self.player_bound.notified().await;
        }
    }

    /// Keep the first answer until it is consumed; later ones are dropped.
    fn store_answer(&self, answer: Answer<C::State>) {
        let mut slot = self.answer.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            debug!(?answer, "previous answer not consumed yet; dropping");
            return;
        }
        *slot = Some(answer);
        drop(slot);
        self.answered.notify_one();
    }

    fn take_answer(&self) -> Option<Answer<C::State>> {
        self.answer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn deliver_message(&self, text: &str) {
        let handler = self
            .on_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match handler {
            Some(handler) => handler(text),
            None => debug!(%text, "no message handler; dropped"),
        }
    }
}

/// Clears the in-flight flag when a state request ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[async_trait]
impl<C: GameCodec> Game<C::Move, C::State> for ProxyGame<C> {
    fn apply_action(&self, action: Action<C::Move>) {
        match encode_action(&self.codec, &action) {
            Some(line) => self.transport.write_output_line(&line),
            None => debug!(kind = ?action.kind(), "action has no wire form; dropped"),
        }
    }

    async fn get_state(
        &self,
        player: PlayerId,
        state_type: i32,
    ) -> Result<GameState<C::State>, StateError> {
        if let Some(hosted) = self.player.get() {
            if hosted.id() != player {
                return Err(StateError::ForeignPlayer(player));
            }
        }

        if self.request_in_flight.swap(true, Ordering::AcqRel) {
            warn!(%player, state_type, "state request while another is outstanding");
            return Err(StateError::RequestInFlight);
        }
        let _in_flight = InFlight(&self.request_in_flight);

        if !self.transport.is_complete() {
            return Err(StateError::NotConnected);
        }
        self.transport.write_output_line(&format_query(state_type));

        loop {
            if let Some(answer) = self.take_answer() {
                return Ok(answer);
            }
            if !self.transport.is_complete() {
                return Err(StateError::NotConnected);
            }
            self.answered.notified().await;
        }
    }

    /// Hosts the first player given; the rest of the roster is ignored.
    fn set_players(&self, players: Vec<Option<PlayerRef<C::Move, C::State>>>) -> Result<(), SetupError> {
        let first = players.into_iter().flatten().next().ok_or(SetupError::NoPlayers)?;
        self.player.set(first).map_err(|_| SetupError::AlreadySeated)?;
        self.player_bound.notify_one();
        Ok(())
    }

    async fn play_game(&self) -> GameOutcome {
        if !self.started.swap(true, Ordering::AcqRel) {
            info!(link = %self.transport.link(), "remote game started locally");
        }
        GameOutcome::Remote
    }

    fn player_bounds(&self) -> PlayerBounds {
        self.codec.player_bounds()
    }
}
