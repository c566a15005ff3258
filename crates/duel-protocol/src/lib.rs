//! duel-protocol
//!
//! Line-oriented text protocol spoken between a proxy game and a proxy
//! player. One message per line; the first character says what the rest
//! of the line is.
//!
//! - [`line`]    : tokenizer and formatters for each line prefix
//! - [`vocab`]   : the lifecycle commands and generic actions
//! - [`args`]    : `command arg arg ...` helpers for game codecs
//! - [`codec`]   : the game-specific codec trait and action encoding
//! - [`message`] : whole-line parsing for each direction of the link

pub mod line;
pub mod vocab;
pub mod args;
pub mod codec;
pub mod message;

pub use line::{
    format_command, format_generic, format_identity, format_message, format_move, format_query,
    format_state, tokenize, Line,
};
pub use vocab::{GenericAction, LifecycleCommand};
pub use args::{parse_args, parse_command};
pub use codec::{decode_move_action, encode_action, GameCodec};
pub use message::{parse_game_bound, parse_player_bound, GameBound, PlayerBound};
