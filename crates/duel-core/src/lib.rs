//! duel-core
//!
//! Game-agnostic turn engine:
//! - actions (what players ask the engine to do)
//! - the player capability every participant implements
//! - the rules collaborator a concrete game plugs in
//! - the single-consumer dispatch loop and quit handshake
//! - an optional periodic timer
//! - a computer-player scaffold with single-flight move requests

pub mod action;
pub mod state;
pub mod game;
pub mod rules;
pub mod engine;
pub mod timer;
pub mod computer;
pub mod error;

pub use action::{Action, ActionKind, Payload, PlayerId, TimerId};
pub use state::{GameState, PlayerBounds, IDENTITY_QUERY};

pub use game::{Game, GameOutcome, GamePlayer, GameRef, PlayerRef};
pub use rules::GameRules;
pub use engine::{Engine, READY_POLL_INTERVAL, STALL_POLL_INTERVAL};
pub use timer::GameTimer;
pub use computer::{ComputerBrain, ComputerPlayer};
pub use error::{SetupError, StateError};
