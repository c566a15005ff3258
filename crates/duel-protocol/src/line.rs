// crates/duel-protocol/src/line.rs

//! Line framing.
//!
//! | Prefix     | Direction      | Meaning                          |
//! |------------|----------------|----------------------------------|
//! | `*<int>`   | game -> player | answer to an identity query      |
//! | `:<text>`  | either         | lifecycle command, or a move     |
//! | `#<name>`  | player -> game | generic action                   |
//! | `%<text>`  | either         | game-specific message            |
//! | ` <text>`  | game -> player | encoded game state               |
//! | `<int>`    | player -> game | state query (`-1` = identity)    |
//!
//! Only the line terminator is stripped: a leading blank is the state
//! prefix and must survive.

use duel_core::PlayerId;

use crate::vocab::{GenericAction, LifecycleCommand};

pub const IDENTITY_PREFIX: char = '*';
pub const COMMAND_PREFIX: char = ':';
pub const GENERIC_PREFIX: char = '#';
pub const MESSAGE_PREFIX: char = '%';
pub const STATE_PREFIX: char = ' ';

/// A line split into its prefix and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// Nothing left after stripping the terminator. Also what a dead
    /// transport reads.
    Empty,
    Identity(&'a str),
    Command(&'a str),
    Generic(&'a str),
    Message(&'a str),
    State(&'a str),
    /// No known prefix; the whole line.
    Bare(&'a str),
}

pub fn tokenize(raw: &str) -> Line<'_> {
    let line = raw.trim_end_matches(['\r', '\n']);

    let Some(prefix) = line.chars().next() else {
        return Line::Empty;
    };
    let body = &line[prefix.len_utf8()..];

    match prefix {
        IDENTITY_PREFIX => Line::Identity(body),
        COMMAND_PREFIX => Line::Command(body),
        GENERIC_PREFIX => Line::Generic(body),
        MESSAGE_PREFIX => Line::Message(body),
        STATE_PREFIX => Line::State(body),
        _ => Line::Bare(line),
    }
}

// ----------------------------------------------------------------------------
// Formatters (no trailing newline; the transport adds it)
// ----------------------------------------------------------------------------

pub fn format_identity(id: PlayerId) -> String {
    format!("{IDENTITY_PREFIX}{id}")
}

pub fn format_command(cmd: &LifecycleCommand) -> String {
    format!("{COMMAND_PREFIX}{cmd}")
}

pub fn format_generic(action: GenericAction) -> String {
    format!("{GENERIC_PREFIX}{}", action.name())
}

/// A move, already encoded by the game's codec.
pub fn format_move(encoded: &str) -> String {
    format!("{COMMAND_PREFIX}{encoded}")
}

pub fn format_message(text: &str) -> String {
    format!("{MESSAGE_PREFIX}{text}")
}

/// A state snapshot, already encoded by the game's codec.
pub fn format_state(encoded: &str) -> String {
    format!("{STATE_PREFIX}{encoded}")
}

pub fn format_query(state_type: i32) -> String {
    state_type.to_string()
}
