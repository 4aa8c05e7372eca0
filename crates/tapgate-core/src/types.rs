use crate::{
    Result,
    constants::{MAX_ANGLE_DEGREES, MAX_BUS_ADDRESS, MIN_BUS_ADDRESS},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 7-bit bus address of a peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusAddress(u8);

impl BusAddress {
    /// Create a new bus address with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidAddress` if the address falls in one of the
    /// reserved ranges (below 0x08 or above 0x77).
    pub fn new(address: u8) -> Result<Self> {
        if !(MIN_BUS_ADDRESS..=MAX_BUS_ADDRESS).contains(&address) {
            return Err(Error::InvalidAddress { value: address });
        }
        Ok(BusAddress(address))
    }

    /// Get the raw 7-bit address as u8.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

impl std::str::FromStr for BusAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            u8::from_str_radix(hex, 16)
        } else {
            s.parse()
        };
        let address = parsed.map_err(|_| Error::Config(format!("Invalid bus address: {s}")))?;
        BusAddress::new(address)
    }
}

/// Actuator angle command in whole degrees (0-180).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Angle(u16);

impl Angle {
    /// Create a new angle with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidAngle` if the value exceeds 180 degrees.
    pub fn new(degrees: u16) -> Result<Self> {
        if degrees > MAX_ANGLE_DEGREES {
            return Err(Error::InvalidAngle { degrees });
        }
        Ok(Angle(degrees))
    }

    /// Get the angle in whole degrees.
    #[must_use]
    pub fn as_degrees(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} deg", self.0)
    }
}

/// Controller pin identifier.
///
/// Pin numbering is board-specific, so no range validation happens here;
/// the driver rejects pins it cannot attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pin(u8);

impl Pin {
    /// Create a new pin identifier.
    #[must_use]
    pub fn new(pin: u8) -> Self {
        Pin(pin)
    }

    /// Get the raw pin number as u8.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "pin {}", self.0)
    }
}

/// The data/clock pin pair a bus session is opened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusPins {
    /// Data line pin.
    pub sda: Pin,

    /// Clock line pin.
    pub scl: Pin,
}

impl BusPins {
    /// Create a new pin pair.
    #[must_use]
    pub fn new(sda: Pin, scl: Pin) -> Self {
        Self { sda, scl }
    }
}

impl fmt::Display for BusPins {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "sda={}, scl={}", self.sda.as_u8(), self.scl.as_u8())
    }
}
