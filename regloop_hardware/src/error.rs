use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("register {0} is not allocated")]
    Unallocated(u16),
    #[error("register server not started")]
    NotStarted,
    #[error("no temperature probe at index {0}")]
    NoProbe(usize),
    #[error("1-wire read failed: {0}")]
    OneWire(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
