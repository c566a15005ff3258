//! Game-specific half of the protocol.
//!
//! The framing and the generic vocabulary are fixed; what a move or a
//! state snapshot looks like on the wire is up to each game, through a
//! [`GameCodec`]. Both ends of a link must use the same codec (and so the
//! same base port).

use duel_core::{Action, Payload, PlayerBounds, PlayerId};

use crate::line::{format_generic, format_move};
use crate::vocab::GenericAction;

pub trait GameCodec: Send + Sync + 'static {
    type Move: Payload;
    type State: Payload;

    /// First port of the candidate window both sides probe.
    fn base_port(&self) -> u16;

    /// Roster bounds of the game, used to validate seats on the
    /// proxy side of the link.
    fn player_bounds(&self) -> PlayerBounds;

    /// Must not contain a newline.
    fn encode_move(&self, mv: &Self::Move) -> String;

    /// `None` if `text` is not a move of this game.
    fn decode_move(&self, text: &str) -> Option<Self::Move>;

    /// Must not contain a newline.
    fn encode_state(&self, state: &Self::State) -> String;

    fn decode_state(&self, text: &str) -> Option<Self::State>;
}

/// The wire line for `action`: `#<name>` for the generic actions, `:<move>`
/// for moves. Timer ticks are local to an engine and have no encoding.
pub fn encode_action<C: GameCodec>(codec: &C, action: &Action<C::Move>) -> Option<String> {
    if let Some(generic) = GenericAction::from_action(action) {
        return Some(format_generic(generic));
    }

    match action {
        Action::Move { payload, .. } => Some(format_move(&codec.encode_move(payload))),
        _ => None,
    }
}

/// Decode the body of a `:` line received from `source` into a move action.
pub fn decode_move_action<C: GameCodec>(
    codec: &C,
    source: PlayerId,
    body: &str,
) -> Option<Action<C::Move>> {
    codec
        .decode_move(body)
        .map(|payload| Action::Move { source, payload })
}
