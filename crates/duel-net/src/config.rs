//! Network configuration.
//!
//! Defaults can be overridden through a few environment variables:
//!
//! - `DUEL_HOST`        (default: "127.0.0.1") host a joining side dials
//! - `DUEL_BASE_PORT`   (default: the game codec's base port)
//! - `DUEL_PORT_WINDOW` (default: "50") consecutive ports probed

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::NetError;

pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Number of consecutive ports probed from the base port.
pub const PORT_WINDOW: u16 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetConfig {
    /// Host a joining side connects to. The hosting side always listens
    /// on every interface.
    pub host: String,

    /// First candidate port. Must match on both sides.
    pub base_port: u16,

    /// How many ports, starting at `base_port`, are tried.
    pub port_window: u16,
}

impl NetConfig {
    pub fn new(base_port: u16) -> Self {
        NetConfig {
            host: DEFAULT_HOST.to_string(),
            base_port,
            port_window: PORT_WINDOW,
        }
    }

    /// Construct from environment variables, falling back to defaults.
    /// `base_port` is the game's own default.
    pub fn from_env(base_port: u16) -> Result<Self, NetError> {
        let host = env::var("DUEL_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let base_port = read_env_or_default("DUEL_BASE_PORT", base_port)?;
        let port_window = read_env_or_default("DUEL_PORT_WINDOW", PORT_WINDOW)?;

        Ok(NetConfig {
            host,
            base_port,
            port_window,
        })
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_base_port(mut self, base_port: u16) -> Self {
        self.base_port = base_port;
        self
    }

    pub fn with_port_window(mut self, port_window: u16) -> Self {
        self.port_window = port_window;
        self
    }

    /// The candidate ports, in probing order. Stops short at `u16::MAX`.
    pub fn candidate_ports(&self) -> impl Iterator<Item = u16> {
        candidate_ports(self.base_port, self.port_window)
    }
}

pub(crate) fn candidate_ports(base_port: u16, window: u16) -> impl Iterator<Item = u16> {
    (0..window).map_while(move |delta| base_port.checked_add(delta))
}

fn read_env_or_default<T>(key: &str, default: T) -> Result<T, NetError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(val) => val.parse::<T>().map_err(|e| NetError::Config {
            key: key.to_string(),
            value: val.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
