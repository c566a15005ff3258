// crates/duel-core/tests/common/mod.rs
//
// Shared fixtures: a tiny counting game, a player that records every
// callback, and a game double that records every action.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use duel_core::{
    Action, Engine, Game, GameOutcome, GamePlayer, GameRef, GameRules, GameState, PlayerBounds,
    PlayerId, PlayerRef, SetupError, StateError, TimerId,
};
use tokio::task::JoinHandle;

/// Players alternately add 1..=3 to a running total; the game ends once
/// the total reaches `target`.
#[derive(Debug)]
pub struct CountingRules {
    pub target: u32,
    pub total: u32,
    pub turn: usize,
    pub players: usize,
    pub quit_allowed: bool,
    pub any_turn: bool,
    pub applied: Vec<(PlayerId, u32)>,
    pub timer_events: u32,
    pub initialized: bool,
    pub ready_hook_ran: bool,
    pub bounds: PlayerBounds,
}

impl CountingRules {
    pub fn new(target: u32) -> Self {
        CountingRules {
            target,
            total: 0,
            turn: 0,
            players: 2,
            quit_allowed: true,
            any_turn: false,
            applied: Vec::new(),
            timer_events: 0,
            initialized: false,
            ready_hook_ran: false,
            bounds: PlayerBounds::exactly(2),
        }
    }

    pub fn starting_with(mut self, seat: usize) -> Self {
        self.turn = seat;
        self
    }

    pub fn without_quit(mut self) -> Self {
        self.quit_allowed = false;
        self
    }

    /// Anyone may move at any time; used to observe raw queue order.
    pub fn free_for_all(mut self) -> Self {
        self.any_turn = true;
        self
    }

    pub fn with_bounds(mut self, bounds: PlayerBounds) -> Self {
        self.bounds = bounds;
        self
    }
}

impl GameRules for CountingRules {
    type Move = u32;
    type State = u32;

    fn player_bounds(&self) -> PlayerBounds {
        self.bounds
    }

    fn initialize_game(&mut self, player_count: usize) {
        self.players = player_count;
        self.initialized = true;
    }

    fn perform_after_all_are_ready(&mut self) {
        self.ready_hook_ran = true;
    }

    fn game_over(&self) -> bool {
        self.total >= self.target
    }

    fn can_move(&self, player: PlayerId) -> bool {
        self.any_turn || player.index() == Some(self.turn)
    }

    fn can_quit(&self, _player: PlayerId) -> bool {
        self.quit_allowed
    }

    fn make_move(&mut self, player: PlayerId, mv: &u32) -> bool {
        if !(1..=3).contains(mv) && !self.any_turn {
            return false;
        }
        self.total += mv;
        self.applied.push((player, *mv));
        self.turn = (self.turn + 1) % self.players.max(1);
        true
    }

    fn game_state(&self, _player: PlayerId, _state_type: i32) -> u32 {
        self.total
    }

    fn handle_timer_event(&mut self, _timer: TimerId) -> bool {
        self.timer_events += 1;
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SetGame(PlayerId),
    RequestMove,
    NotYourMove,
    TimeToQuit,
    InvalidRequest,
    IllegalMove,
    GameIsOver,
    StateChanged,
    FinishUp,
}

/// Records every callback; optionally answers quit notifications.
pub struct RecordingPlayer {
    events: Mutex<Vec<Event>>,
    game: Mutex<Option<GameRef<u32, u32>>>,
    id: AtomicI32,
    ready: AtomicBool,
    auto_ack: bool,
}

impl RecordingPlayer {
    pub fn new() -> Arc<Self> {
        Self::build(true, true)
    }

    /// Does not answer `time_to_quit` / `game_is_over` by itself.
    pub fn silent() -> Arc<Self> {
        Self::build(true, false)
    }

    pub fn not_ready() -> Arc<Self> {
        Self::build(false, true)
    }

    fn build(ready: bool, auto_ack: bool) -> Arc<Self> {
        Arc::new(RecordingPlayer {
            events: Mutex::new(Vec::new()),
            game: Mutex::new(None),
            id: AtomicI32::new(-1),
            ready: AtomicBool::new(ready),
            auto_ack,
        })
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    pub fn saw(&self, event: &Event) -> bool {
        self.count(event) > 0
    }

    pub fn send(&self, action: Action<u32>) {
        let game = self.game.lock().unwrap().clone();
        game.expect("player not bound to a game").apply_action(action);
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn ack(&self) {
        if self.auto_ack {
            self.send(Action::QuitAck { source: self.id() });
        }
    }
}

impl GamePlayer<u32, u32> for RecordingPlayer {
    fn set_game(&self, game: GameRef<u32, u32>, id: PlayerId) {
        *self.game.lock().unwrap() = Some(game);
        self.id.store(id.0, Ordering::SeqCst);
        self.record(Event::SetGame(id));
    }

    fn request_move(&self) {
        self.record(Event::RequestMove);
    }

    fn not_your_move(&self) {
        self.record(Event::NotYourMove);
    }

    fn time_to_quit(&self) {
        self.record(Event::TimeToQuit);
        self.ack();
    }

    fn invalid_request(&self) {
        self.record(Event::InvalidRequest);
    }

    fn illegal_move(&self) {
        self.record(Event::IllegalMove);
    }

    fn game_is_over(&self) {
        self.record(Event::GameIsOver);
        self.ack();
    }

    fn state_changed(&self) {
        self.record(Event::StateChanged);
    }

    fn finish_up(&self) {
        self.record(Event::FinishUp);
    }

    fn id(&self) -> PlayerId {
        PlayerId(self.id.load(Ordering::SeqCst))
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

/// Game double that only records what it is sent.
pub struct RecordingGame {
    pub actions: Mutex<Vec<Action<u32>>>,
    pub bounds: PlayerBounds,
}

impl RecordingGame {
    pub fn new() -> Arc<Self> {
        Arc::new(RecordingGame {
            actions: Mutex::new(Vec::new()),
            bounds: PlayerBounds::exactly(2),
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

    async fn get_state(&self, _player: PlayerId, _state_type: i32) -> Result<GameState<u32>, StateError> {
        Ok(GameState::Snapshot(42))
    }

    fn set_players(&self, _players: Vec<Option<PlayerRef<u32, u32>>>) -> Result<(), SetupError> {
        Ok(())
    }

    async fn play_game(&self) -> GameOutcome {
        GameOutcome::Remote
    }

    fn player_bounds(&self) -> PlayerBounds {
        self.bounds
    }
}

/// Seat `players` in order and hand each its game.
pub fn seat(game: &GameRef<u32, u32>, players: &[Arc<RecordingPlayer>]) {
    let roster: Vec<Option<PlayerRef<u32, u32>>> = players
        .iter()
        .map(|p| Some(Arc::clone(p) as PlayerRef<u32, u32>))
        .collect();
    game.set_players(roster).expect("roster rejected");
    for (i, p) in players.iter().enumerate() {
        p.set_game(Arc::clone(game), PlayerId::from_index(i));
    }
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

/// Engine over `rules`, plus the same engine as a `GameRef`.
pub fn table(rules: CountingRules) -> (Arc<Engine<CountingRules>>, GameRef<u32, u32>) {
    let engine = Arc::new(Engine::new(rules));
    let game: GameRef<u32, u32> = engine.clone();
    (engine, game)
}

/// Run `play_game` on its own task.
pub fn start(engine: &Arc<Engine<CountingRules>>) -> JoinHandle<GameOutcome> {
    let engine = Arc::clone(engine);
    tokio::spawn(async move { engine.play_game().await })
}

/// Poll the rules every 10 ms for up to 5 s.
pub async fn eventually_rules(
    engine: &Engine<CountingRules>,
    cond: impl Fn(&CountingRules) -> bool,
) -> bool {
    for _ in 0..500 {
        if engine.inspect(&cond).await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    engine.inspect(&cond).await
}
