use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    /// Every port of the window was tried and none answered.
    #[error("no game answered on {host} ({window} ports from {first_port})")]
    ConnectFailed {
        host: String,
        first_port: u16,
        window: u16,
    },

    #[error("invalid value {value:?} for {key}: {reason}")]
    Config {
        key: String,
        value: String,
        reason: String,
    },
}
