// crates/duel-net/tests/common/mod.rs
//
// A counting game small enough to drive over the wire: moves are
// `add N`, state is `total N`.

#![allow(dead_code)]

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use duel_core::{
    Action, ComputerBrain, Game, GameOutcome, GamePlayer, GameRef, GameRules, GameState,
    PlayerBounds, PlayerId, PlayerRef, SetupError, StateError,
};
use duel_net::{NetConfig, Transport};
use duel_protocol::{parse_args, parse_command, GameCodec};

pub struct CountCodec;

impl GameCodec for CountCodec {
    type Move = u32;
    type State = u32;

    fn base_port(&self) -> u16 {
        4800
    }

    fn player_bounds(&self) -> PlayerBounds {
        PlayerBounds::exactly(2)
    }

    fn encode_move(&self, mv: &u32) -> String {
        format!("add {mv}")
    }

    fn decode_move(&self, text: &str) -> Option<u32> {
        if parse_command(text) != "add" {
            return None;
        }
        u32::try_from(*parse_args(text).first()?).ok()
    }

    fn encode_state(&self, state: &u32) -> String {
        format!("total {state}")
    }

    fn decode_state(&self, text: &str) -> Option<u32> {
        if parse_command(text) != "total" {
            return None;
        }
        u32::try_from(*parse_args(text).first()?).ok()
    }
}

/// Two players alternately add 1..=3; the game ends at `target`.
pub struct RaceRules {
    pub target: u32,
    pub total: u32,
    pub turn: usize,
}

impl RaceRules {
    pub fn new(target: u32) -> Self {
        RaceRules { target, total: 0, turn: 0 }
    }
}

impl GameRules for RaceRules {
    type Move = u32;
    type State = u32;

    fn player_bounds(&self) -> PlayerBounds {
        PlayerBounds::exactly(2)
    }

    fn initialize_game(&mut self, _player_count: usize) {}

    fn game_over(&self) -> bool {
        self.total >= self.target
    }

    fn can_move(&self, player: PlayerId) -> bool {
        player.index() == Some(self.turn)
    }

    fn can_quit(&self, _player: PlayerId) -> bool {
        true
    }

    fn make_move(&mut self, _player: PlayerId, mv: &u32) -> bool {
        if !(1..=3).contains(mv) {
            return false;
        }
        self.total += mv;
        self.turn = 1 - self.turn;
        true
    }

    fn game_state(&self, _player: PlayerId, _state_type: i32) -> u32 {
        self.total
    }
}

/// Looks at the state, then always adds 3.
#[derive(Default)]
pub struct GreedyBrain {
    pub states_seen: AtomicUsize,
}

#[async_trait]
impl ComputerBrain<u32, u32> for GreedyBrain {
    async fn choose_move(&self, game: &GameRef<u32, u32>, me: PlayerId) {
        if let Ok(GameState::Snapshot(_)) = game.get_state(me, 0).await {
            self.states_seen.fetch_add(1, Ordering::SeqCst);
        }
        game.apply_action(Action::play(me, 3));
    }
}

/// Records every callback by name.
pub struct RecordingPlayer {
    events: Mutex<Vec<String>>,
    id: AtomicI32,
}

impl RecordingPlayer {
    pub fn new() -> Arc<Self> {
        Arc::new(RecordingPlayer {
            events: Mutex::new(Vec::new()),
            id: AtomicI32::new(-1),
        })
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn saw(&self, event: &str) -> bool {
        self.events().iter().any(|e| e == event)
    }

    fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

impl GamePlayer<u32, u32> for RecordingPlayer {
    fn set_game(&self, _game: GameRef<u32, u32>, id: PlayerId) {
        self.id.store(id.0, Ordering::SeqCst);
        self.record(format!("setGame {id}"));
    }
    fn request_move(&self) {
        self.record("requestMove");
    }
    fn not_your_move(&self) {
        self.record("notYourMove");
    }
    fn time_to_quit(&self) {
        self.record("timeToQuit");
    }
    fn invalid_request(&self) {
        self.record("invalidRequest");
    }
    fn illegal_move(&self) {
        self.record("illegalMove");
    }
    fn game_is_over(&self) {
        self.record("gameIsOver");
    }
    fn state_changed(&self) {
        self.record("stateChanged");
    }
    fn finish_up(&self) {
        self.record("finishUp");
    }
    fn id(&self) -> PlayerId {
        PlayerId(self.id.load(Ordering::SeqCst))
    }
}

/// Records actions; answers identity queries with the asker's seat and
/// other queries with `10 * state_type`.
pub struct RecordingGame {
    actions: Mutex<Vec<Action<u32>>>,
}

impl RecordingGame {
    pub fn new() -> Arc<Self> {
        Arc::new(RecordingGame {
            actions: Mutex::new(Vec::new()),
        })
    }

    pub fn actions(&self) -> Vec<Action<u32>> {
        self.actions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Game<u32, u32> for RecordingGame {
    fn apply_action(&self, action: Action<u32>) {
        self.actions.lock().unwrap().push(action);
    }

    async fn get_state(&self, player: PlayerId, state_type: i32) -> Result<GameState<u32>, StateError> {
        if state_type == -1 {
            return Ok(GameState::Identity(player));
        }
        Ok(GameState::Snapshot(state_type.unsigned_abs() * 10))
    }

    fn set_players(&self, _players: Vec<Option<PlayerRef<u32, u32>>>) -> Result<(), SetupError> {
        Ok(())
    }

    async fn play_game(&self) -> GameOutcome {
        GameOutcome::Remote
    }

    fn player_bounds(&self) -> PlayerBounds {
        PlayerBounds::exactly(2)
    }
}

/// A loopback port that was free a moment ago.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .expect("no free port")
}

/// Config probing a single port.
pub fn single_port(port: u16) -> NetConfig {
    NetConfig::new(port).with_port_window(1)
}

/// Next line from `t`, failing the test after 5 s.
pub async fn next_line(t: &Transport) -> String {
    tokio::time::timeout(Duration::from_secs(5), t.read_input_line())
        .await
        .expect("no line within 5s")
}

/// Whether `t` stays silent for `ms` milliseconds.
pub async fn silent_for(t: &Transport, ms: u64) -> bool {
    tokio::time::timeout(Duration::from_millis(ms), t.read_input_line())
        .await
        .is_err()
}

/// Dial `port` until someone is listening, for up to 5 s.
pub async fn dial(port: u16) -> Transport {
    let t = Transport::new();
    for _ in 0..250 {
        if t.connect_as_client("127.0.0.1", port, 1).await {
            return t;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("nobody listening on {port}");
}

/// Poll `cond` every 10 ms for up to 5 s.
pub async fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..500 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
