//! duel-net
//!
//! Plays a game across a TCP link. Each side of the link sees a local
//! stand-in for the other:
//!
//! - [`ProxyPlayer`] sits in the host's roster in place of the remote
//!   player and forwards lifecycle callbacks down the wire;
//! - [`ProxyGame`] is the remote player's handle on the host's game and
//!   forwards actions and state queries up the wire.
//!
//! Both sit on a [`Transport`]: one line-oriented TCP connection found by
//! probing a window of consecutive ports.

pub mod config;
pub mod error;
pub mod types;
pub mod transport;
pub mod proxy_game;
pub mod proxy_player;

pub use config::{NetConfig, DEFAULT_HOST, PORT_WINDOW};
pub use error::NetError;
pub use transport::Transport;
pub use proxy_game::{LinkStatus, ProxyGame};
pub use proxy_player::{ProxyPlayer, MOVE_REQUEST_PACING};
