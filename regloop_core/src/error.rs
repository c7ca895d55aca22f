use thiserror::Error;

/// Fault observed while servicing one loop iteration.
///
/// These never abort the loop; they are collected on the iteration report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoopError {
    #[error("register transport fault: {0}")]
    Transport(String),
    #[error("register {addr} access fault: {msg}")]
    Register { addr: u16, msg: String },
    #[error("encoder fault: {0}")]
    Encoder(String),
    #[error("sensor fault: {0}")]
    Sensor(String),
    #[error("network fault: {0}")]
    Network(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
