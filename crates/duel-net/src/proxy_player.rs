//! Stand-in for a player on the other end of the link.
//!
//! A `ProxyPlayer` takes a seat in the host's roster. It listens for the
//! remote side on its own task and reports ready once a peer connected,
//! which is what holds the engine back until everyone has joined.
//!
//! Read loop dispatch, one line at a time:
//! - `:<text>` -> a move, decoded by the codec and applied to the game
//! - `#<name>` -> a generic action applied to the game
//! - `%<text>` -> game-specific message, handed to the registered handler
//! - anything else -> a state query, answered with `*<id>` for the
//!   identity query and ` <state>` otherwise
//!
//! Lifecycle callbacks from the engine are forwarded as `:<name>`.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};
use std::time::Duration;

use duel_core::{GamePlayer, GameRef, GameState, PlayerId};
use duel_protocol::{
    decode_move_action, format_command, format_identity, format_message, format_state,
    parse_game_bound, GameBound, GameCodec, LifecycleCommand,
};
use tracing::{debug, error, info, warn};

use crate::config::NetConfig;
use crate::transport::Transport;
use crate::types::MessageHandler;

/// Minimum spacing between two `requestMove` lines sent to the same peer.
pub const MOVE_REQUEST_PACING: Duration = Duration::from_millis(1000);

pub struct ProxyPlayer<C: GameCodec> {
    codec: C,
    transport: Transport,
    me: Weak<Self>,

    game: OnceLock<GameRef<C::Move, C::State>>,
    id: AtomicI32,

    ready: AtomicBool,
    quitting: AtomicBool,
    /// Set while a forwarded `requestMove` is pacing.
    move_requested: AtomicBool,

    on_message: Mutex<Option<MessageHandler>>,
}

impl<C: GameCodec> ProxyPlayer<C> {
    /// Create the proxy and start waiting for the remote player in the
    /// background. Must be called from within a tokio runtime.
    pub fn listen(codec: C, config: &NetConfig) -> Arc<Self> {
        let player = Arc::new_cyclic(|me| ProxyPlayer {
            codec,
            transport: Transport::new(),
            me: me.clone(),
            game: OnceLock::new(),
            id: AtomicI32::new(PlayerId::UNSEATED.0),
            ready: AtomicBool::new(false),
            quitting: AtomicBool::new(false),
            move_requested: AtomicBool::new(false),
            on_message: Mutex::new(None),
        });

        let (base_port, window) = (config.base_port, config.port_window);
        tokio::spawn(Arc::clone(&player).run(base_port, window));
        player
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Register the handler for `%` messages from the remote player.
    pub fn on_message(&self, handler: impl Fn(&str) + Send + Sync + 'static) {
        *self.on_message.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    /// Send a game-specific message to the remote player.
    pub fn send_message(&self, text: &str) {
        self.transport.write_output_line(&format_message(text));
    }

    // -------------------------------------------------------------------------
    // Connection and read loop
    // -------------------------------------------------------------------------

    async fn run(self: Arc<Self>, base_port: u16, window: u16) {
        if !self.transport.connect_as_server(base_port, window).await {
            error!(link = %self.transport.link(), base_port, window, "remote player never connected");
            return;
        }

        self.ready.store(true, Ordering::Release);
        // The seat may have been handed out before the peer arrived.
        let id = self.id();
        if id.index().is_some() {
            self.send_command(LifecycleCommand::SetGame(id));
        }

        while !self.quitting.load(Ordering::Acquire) {
            let line = self.transport.read_input_line().await;
            if line.is_empty() && !self.transport.is_complete() {
                warn!(id = %self.id(), "link to the remote player lost; read loop stopped");
                return;
            }
            self.process_input(&line).await;
        }
        debug!(id = %self.id(), "read loop finished");
    }

    async fn process_input(&self, line: &str) {
        let parsed = parse_game_bound(line);
        if let GameBound::Empty = parsed {
            return;
        }
        if let GameBound::Message(text) = parsed {
            self.deliver_message(text);
            return;
        }

        let Some(game) = self.game.get() else {
            warn!(%line, "no game yet; dropping");
            return;
        };

        match parsed {
            GameBound::Move(body) => match decode_move_action(&self.codec, self.id(), body) {
                Some(action) => game.apply_action(action),
                None => warn!(%body, "undecodable move; dropped"),
            },
            GameBound::Generic(generic) => game.apply_action(generic.into_action(self.id())),
            GameBound::StateQuery(state_type) => self.answer_query(game, state_type).await,
            GameBound::Message(_) | GameBound::Empty => {}
        }
    }

    async fn answer_query(&self, game: &GameRef<C::Move, C::State>, state_type: i32) {
        let reply = match game.get_state(self.id(), state_type).await {
            Ok(GameState::Identity(id)) => format_identity(id),
            Ok(GameState::Snapshot(state)) => format_state(&self.codec.encode_state(&state)),
            Err(e) => {
                warn!(state_type, error = %e, "state query failed; not answered");
                return;
            }
        };
        self.transport.write_output_line(&reply);
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn send_command(&self, cmd: LifecycleCommand) {
        self.transport.write_output_line(&format_command(&cmd));
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

impl<C: GameCodec> GamePlayer<C::Move, C::State> for ProxyPlayer<C> {
    fn set_game(&self, game: GameRef<C::Move, C::State>, id: PlayerId) {
        if self.game.set(game).is_err() {
            debug!(%id, "already in a game; seat updated");
        }
        self.id.store(id.0, Ordering::Release);
        self.send_command(LifecycleCommand::SetGame(id));
    }

    /// At most one request per peer every [`MOVE_REQUEST_PACING`].
    fn request_move(&self) {
        if self.move_requested.swap(true, Ordering::AcqRel) {
            return;
        }
        let Some(me) = self.me.upgrade() else {
            self.move_requested.store(false, Ordering::Release);
            return;
        };

        tokio::spawn(async move {
            me.send_command(LifecycleCommand::RequestMove);
            tokio::time::sleep(MOVE_REQUEST_PACING).await;
            me.move_requested.store(false, Ordering::Release);
        });
    }

    fn not_your_move(&self) {
        self.send_command(LifecycleCommand::NotYourMove);
    }

    fn time_to_quit(&self) {
        self.send_command(LifecycleCommand::TimeToQuit);
    }

    fn invalid_request(&self) {
        self.send_command(LifecycleCommand::InvalidRequest);
    }

    fn illegal_move(&self) {
        self.send_command(LifecycleCommand::IllegalMove);
    }

    fn game_is_over(&self) {
        self.send_command(LifecycleCommand::GameIsOver);
    }

    fn state_changed(&self) {
        self.send_command(LifecycleCommand::StateChanged);
    }

    fn finish_up(&self) {
        self.send_command(LifecycleCommand::FinishUp);
        self.quitting.store(true, Ordering::Release);
        info!(id = %self.id(), "remote player released");
    }

    fn id(&self) -> PlayerId {
        PlayerId(self.id.load(Ordering::Acquire))
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}
