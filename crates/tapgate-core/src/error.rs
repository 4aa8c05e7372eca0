use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Addressing errors
    #[error("Invalid bus address 0x{value:02X}: must be 0x08-0x77")]
    InvalidAddress { value: u8 },

    // Actuation errors
    #[error("Invalid angle {degrees}: must be 0-180 degrees")]
    InvalidAngle { degrees: u16 },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
