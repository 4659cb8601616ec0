use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("pwm error: {0}")]
    Pwm(String),
    #[error("edge wait timeout")]
    EdgeTimeout,
    #[error("hc-sr04 echo timeout")]
    EchoTimeout,
    #[error("dht11 response timeout")]
    DhtTimeout,
    #[error("dht11 checksum mismatch (expected {expected:#04x}, got {actual:#04x})")]
    DhtChecksum { expected: u8, actual: u8 },
    #[error("malformed {what}: {detail}")]
    Parse { what: &'static str, detail: String },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
