//! Whole-line parsing, one function per direction.
//!
//! Malformed numbers never fail a parse; they fall back to the same
//! defaults on both ends so a garbled line degrades to something the
//! engine already knows how to refuse.

use duel_core::PlayerId;

use crate::line::{tokenize, Line};
use crate::vocab::{GenericAction, LifecycleCommand};

/// What a proxy game (player side of the link) can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerBound<'a> {
    /// Seat reported for an identity query; `-1` if it did not parse.
    Identity(PlayerId),
    Command(LifecycleCommand),
    Message(&'a str),
    /// Encoded state, still to be decoded by the game's codec.
    State(&'a str),
    Empty,
    /// Anything else, whole line.
    Unknown(&'a str),
}

pub fn parse_player_bound(raw: &str) -> PlayerBound<'_> {
    match tokenize(raw) {
        Line::Empty => PlayerBound::Empty,
        Line::Identity(body) => PlayerBound::Identity(PlayerId(body.trim().parse().unwrap_or(-1))),
        Line::Command(body) => match LifecycleCommand::parse(body) {
            Some(cmd) => PlayerBound::Command(cmd),
            None => PlayerBound::Unknown(body),
        },
        Line::Message(body) => PlayerBound::Message(body),
        Line::State(body) => PlayerBound::State(body),
        Line::Generic(_) | Line::Bare(_) => PlayerBound::Unknown(raw.trim_end_matches(['\r', '\n'])),
    }
}

/// What a proxy player (game side of the link) can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameBound<'a> {
    /// Encoded move, still to be decoded by the game's codec.
    Move(&'a str),
    Generic(GenericAction),
    /// State query; a line that is not an integer (blanks aside) asks
    /// for type `0`.
    StateQuery(i32),
    Message(&'a str),
    Empty,
}

pub fn parse_game_bound(raw: &str) -> GameBound<'_> {
    match tokenize(raw) {
        Line::Empty => GameBound::Empty,
        Line::Command(body) => GameBound::Move(body),
        Line::Generic(body) => GameBound::Generic(GenericAction::parse(body)),
        Line::Message(body) => GameBound::Message(body),
        Line::Identity(_) | Line::State(_) | Line::Bare(_) => {
            GameBound::StateQuery(raw.trim().parse().unwrap_or(0))
        }
    }
}
