//! Shared types for the transport and the proxies.
//!
//! This module defines:
//! - `LinkId`: a tag identifying one connection in the logs
//! - channel aliases between a proxy and its transport's writer task
//! - `MessageHandler`: the callback for game-specific `%` messages

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{BufReader, Lines};
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::mpsc;

/// Identifier for a transport, unique over the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(pub u64);

static NEXT_LINK_ID: AtomicU64 = AtomicU64::new(1);

impl LinkId {
    pub(crate) fn next() -> Self {
        LinkId(NEXT_LINK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}", self.0)
    }
}

/// Outbound lines, newline not included.
pub type LineTx = mpsc::UnboundedSender<String>;
pub type LineRx = mpsc::UnboundedReceiver<String>;

/// Inbound side of a connection, split into lines.
pub type LineReader = Lines<BufReader<OwnedReadHalf>>;

/// Receives the body of each `%` line.
pub type MessageHandler = Arc<dyn Fn(&str) + Send + Sync>;
