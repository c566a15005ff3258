//! Wire form of Nim moves and state.
//!
//! - move:  `take <n>`
//! - state: `nim <stones> <to_move> <winner>`, winner `-1` while playing

use duel_core::{PlayerBounds, PlayerId};
use duel_protocol::{parse_args, parse_command, GameCodec};

use crate::rules::{NimState, Take};

pub const NIM_BASE_PORT: u16 = 4790;

#[derive(Debug, Clone, Copy, Default)]
pub struct NimCodec;

impl GameCodec for NimCodec {
    type Move = Take;
    type State = NimState;

    fn base_port(&self) -> u16 {
        NIM_BASE_PORT
    }

    fn player_bounds(&self) -> PlayerBounds {
        PlayerBounds::exactly(2)
    }

    fn encode_move(&self, mv: &Take) -> String {
        format!("take {}", mv.0)
    }

    fn decode_move(&self, text: &str) -> Option<Take> {
        if parse_command(text) != "take" {
            return None;
        }
        let n = *parse_args(text).first()?;
        u32::try_from(n).ok().map(Take)
    }

    fn encode_state(&self, state: &NimState) -> String {
        let winner = state.winner.unwrap_or(PlayerId::UNSEATED);
        format!("nim {} {} {}", state.stones, state.to_move, winner)
    }

    fn decode_state(&self, text: &str) -> Option<NimState> {
        if parse_command(text) != "nim" {
            return None;
        }
        let args = parse_args(text);
        let [stones, to_move, winner] = args[..] else {
            return None;
        };
        Some(NimState {
            stones: u32::try_from(stones).ok()?,
            to_move: PlayerId(to_move),
            winner: (winner >= 0).then_some(PlayerId(winner)),
        })
    }
}
