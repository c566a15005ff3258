//! A human at the terminal.
//!
//! Prompts go to stdout; answers are read from a shared [`ConsoleInput`] so
//! several console seats at one table take turns on the same stdin.
//!
//! Answers to a move prompt:
//! - a number: take that many stones
//! - `q` / `quit`: ask to end the game
//! - anything else: skip, the engine asks again

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, OnceLock};

use duel_core::{Action, GamePlayer, GameRef, GameState, PlayerId};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::rules::{NimState, Take, MAX_TAKE};

type NimGame = GameRef<Take, NimState>;
type BoxedInput = Box<dyn AsyncBufRead + Send + Unpin>;

/// Line source shared by every console seat.
pub struct ConsoleInput {
    lines: Mutex<Lines<BoxedInput>>,
}

impl ConsoleInput {
    pub fn stdin() -> Arc<Self> {
        Self::from_reader(tokio::io::stdin())
    }

    pub fn from_reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Arc<Self> {
        let buffered: BoxedInput = Box::new(BufReader::new(reader));
        Arc::new(ConsoleInput {
            lines: Mutex::new(buffered.lines()),
        })
    }

    /// Next line, or `None` once input is closed.
    pub async fn read_line(&self) -> Option<String> {
        match self.lines.lock().await.next_line().await {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "console read failed");
                None
            }
        }
    }
}

/// What a move prompt was answered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Take(u32),
    Quit,
    Skip,
}

pub fn parse_answer(line: &str) -> Answer {
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
        return Answer::Quit;
    }
    match line.parse() {
        Ok(n) => Answer::Take(n),
        Err(_) => Answer::Skip,
    }
}

pub fn describe(state: &NimState, me: PlayerId) -> String {
    match state.winner {
        Some(w) if w == me => "You took the last stone. You win!".to_string(),
        Some(w) => format!("Player {w} took the last stone."),
        None if state.to_move == me => format!("{} stones left, your move.", state.stones),
        None => format!("{} stones left, player {} to move.", state.stones, state.to_move),
    }
}

pub struct ConsolePlayer {
    name: String,
    input: Arc<ConsoleInput>,
    game: OnceLock<NimGame>,
    id: AtomicI32,

    /// Set while a prompt is waiting for an answer.
    prompting: Arc<AtomicBool>,
}

impl ConsolePlayer {
    pub fn new(name: impl Into<String>, input: Arc<ConsoleInput>) -> Self {
        ConsolePlayer {
            name: name.into(),
            input,
            game: OnceLock::new(),
            id: AtomicI32::new(PlayerId::UNSEATED.0),
            prompting: Arc::new(AtomicBool::new(false)),
        }
    }

    fn say(&self, text: &str) {
        println!("[{}] {text}", self.name);
    }

    fn acknowledge_quit(&self) {
        if let Some(game) = self.game.get() {
            game.apply_action(Action::QuitAck { source: self.id() });
        }
    }

    fn show_state(&self) {
        let Some(game) = self.game.get().cloned() else {
            return;
        };
        let me = self.id();
        let name = self.name.clone();
        tokio::spawn(async move {
            if let Ok(GameState::Snapshot(state)) = game.get_state(me, 0).await {
                println!("[{name}] {}", describe(&state, me));
            }
        });
    }
}

// ----------------------------------------------------------------------------
// GamePlayer
// ----------------------------------------------------------------------------

impl GamePlayer<Take, NimState> for ConsolePlayer {
    fn set_game(&self, game: NimGame, id: PlayerId) {
        if self.game.set(game).is_err() {
            debug!(%id, "already at a table; keeping it");
        }
        self.id.store(id.0, Ordering::Release);
        self.say(&format!("seated as player {id}"));
    }

    fn request_move(&self) {
        let Some(game) = self.game.get().cloned() else {
            return;
        };
        if self.prompting.swap(true, Ordering::AcqRel) {
            return;
        }

        let me = self.id();
        let name = self.name.clone();
        let input = Arc::clone(&self.input);
        let prompting = Arc::clone(&self.prompting);
        tokio::spawn(async move {
            if let Ok(GameState::Snapshot(state)) = game.get_state(me, 0).await {
                println!("[{name}] {}", describe(&state, me));
            }
            println!("[{name}] take how many (1-{MAX_TAKE}, q to quit)?");

            match input.read_line().await.as_deref().map(parse_answer) {
                Some(Answer::Take(n)) => game.apply_action(Action::play(me, Take(n))),
                Some(Answer::Quit) => game.apply_action(Action::Quit { source: me }),
                Some(Answer::Skip) => {}
                None => {
                    debug!(%me, "console closed; quitting");
                    game.apply_action(Action::Quit { source: me });
                }
            }
            prompting.store(false, Ordering::Release);
        });
    }

    fn not_your_move(&self) {
        self.say("It is not your turn.");
    }

    fn time_to_quit(&self) {
        self.say("The game is ending.");
        self.acknowledge_quit();
    }

    fn invalid_request(&self) {
        self.say("That request was refused.");
    }

    fn illegal_move(&self) {
        self.say(&format!("You must take between 1 and {MAX_TAKE} stones, and no more than are left."));
    }

    fn game_is_over(&self) {
        self.show_state();
        self.acknowledge_quit();
    }

    fn state_changed(&self) {
        self.show_state();
    }

    fn finish_up(&self) {
        self.say("Goodbye.");
    }

    fn id(&self) -> PlayerId {
        PlayerId(self.id.load(Ordering::Acquire))
    }
}
