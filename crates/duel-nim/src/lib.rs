//! duel-nim
//!
//! Nim on top of the duel engine:
//! - rules (the engine's collaborator)
//! - wire codec for playing across the network
//! - a computer brain and a console player

pub mod rules;
pub mod codec;
pub mod brain;
pub mod console;

pub use rules::{NimRules, NimState, Take, DEFAULT_STONES, MAX_TAKE};
pub use codec::{NimCodec, NIM_BASE_PORT};
pub use brain::{best_take, NimBrain};
pub use console::{describe, parse_answer, Answer, ConsoleInput, ConsolePlayer};
