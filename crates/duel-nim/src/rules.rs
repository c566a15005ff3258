//! Nim: players take turns removing 1..=3 stones from a single heap; whoever
//! takes the last stone wins.
//!
//! With a turn limit set, a player that lets the limit pass (counted in
//! timer ticks) has one stone taken for them.

use duel_core::{GameRules, PlayerBounds, PlayerId, TimerId};
use tracing::{debug, info};

pub const DEFAULT_STONES: u32 = 21;
pub const MAX_TAKE: u32 = 3;

/// A move: take this many stones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Take(pub u32);

/// What every player sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NimState {
    pub stones: u32,
    pub to_move: PlayerId,
    pub winner: Option<PlayerId>,
}

#[derive(Debug, Clone)]
pub struct NimRules {
    initial: u32,
    stones: u32,
    players: usize,
    to_move: usize,
    winner: Option<PlayerId>,

    turn_limit: Option<u64>,
    idle_ticks: u64,
}

impl Default for NimRules {
    fn default() -> Self {
        Self::new(DEFAULT_STONES)
    }
}

impl NimRules {
    pub fn new(stones: u32) -> Self {
        NimRules {
            initial: stones,
            stones,
            players: 2,
            to_move: 0,
            winner: None,
            turn_limit: None,
            idle_ticks: 0,
        }
    }

    /// Take a stone for whoever is to move once `ticks` timer ticks pass
    /// without a move.
    pub fn with_turn_limit(mut self, ticks: u64) -> Self {
        self.turn_limit = Some(ticks.max(1));
        self
    }

    pub fn stones(&self) -> u32 {
        self.stones
    }

    pub fn to_move(&self) -> PlayerId {
        PlayerId::from_index(self.to_move)
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn state(&self) -> NimState {
        NimState {
            stones: self.stones,
            to_move: self.to_move(),
            winner: self.winner,
        }
    }

    fn take(&mut self, player: PlayerId, n: u32) -> bool {
        if n == 0 || n > MAX_TAKE || n > self.stones {
            return false;
        }

        self.stones -= n;
        self.idle_ticks = 0;
        if self.stones == 0 {
            info!(%player, "took the last stone");
            self.winner = Some(player);
        } else {
            self.to_move = (self.to_move + 1) % self.players;
        }
        true
    }
}

impl GameRules for NimRules {
    type Move = Take;
    type State = NimState;

    fn player_bounds(&self) -> PlayerBounds {
        PlayerBounds::exactly(2)
    }

    fn initialize_game(&mut self, player_count: usize) {
        self.players = player_count.max(1);
        self.stones = self.initial;
        self.to_move = 0;
        self.winner = None;
        self.idle_ticks = 0;
    }

    fn game_over(&self) -> bool {
        self.winner.is_some()
    }

    fn can_move(&self, player: PlayerId) -> bool {
        self.winner.is_none() && player.index() == Some(self.to_move)
    }

    fn can_quit(&self, _player: PlayerId) -> bool {
        true
    }

    fn make_move(&mut self, player: PlayerId, mv: &Take) -> bool {
        self.take(player, mv.0)
    }

    fn game_state(&self, _player: PlayerId, _state_type: i32) -> NimState {
        self.state()
    }

    fn handle_timer_event(&mut self, _timer: TimerId) -> bool {
        let Some(limit) = self.turn_limit else {
            return false;
        };
        if self.winner.is_some() {
            return false;
        }

        self.idle_ticks += 1;
        if self.idle_ticks < limit {
            return false;
        }

        let slow = self.to_move();
        debug!(%slow, "turn limit reached; taking one stone");
        self.take(slow, 1)
    }
}
