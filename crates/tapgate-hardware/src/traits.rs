//! Hardware driver trait definitions.
//!
//! This module defines the trait interfaces for the external collaborators of
//! the peripheral layer: the shared bus transport, the rotational actuator
//! drivers, and the contactless tag-reader chip. These traits establish the
//! contract between the peripheral manager and the underlying hardware,
//! enabling polymorphic behavior and easy substitution between mock and real
//! driver implementations.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use std::fmt;
use std::time::Duration;
use tapgate_core::constants::{
    TRANSMISSION_ACK, TRANSMISSION_ADDRESS_NACK, UID_LENGTH_DOUBLE, UID_LENGTH_SINGLE,
};
use tapgate_core::types::{Angle, BusAddress, BusPins, Pin};

/// Outcome of one addressed transmission on the bus.
///
/// The raw transport speaks in status codes; this enum names the three
/// cases the discovery protocol cares about. `AddressNack` is deliberately
/// separate from `Fault`: the former means "nobody wired at that address"
/// (an expected configuration), the latter means the bus itself misbehaved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmissionStatus {
    /// Target acknowledged the transmission.
    Ack,

    /// No target acknowledged the address.
    AddressNack,

    /// Any other transport status (arbitration loss, data NACK, timeout).
    Fault(u8),
}

impl TransmissionStatus {
    /// Map a raw transport status code onto the three-way outcome.
    ///
    /// Code 0 is an acknowledge, code 2 is the "address not acknowledged"
    /// status, everything else is a fault carrying the original code.
    ///
    /// # Examples
    ///
    /// ```
    /// use tapgate_hardware::traits::TransmissionStatus;
    ///
    /// assert_eq!(TransmissionStatus::from_code(0), TransmissionStatus::Ack);
    /// assert_eq!(TransmissionStatus::from_code(2), TransmissionStatus::AddressNack);
    /// assert_eq!(TransmissionStatus::from_code(4), TransmissionStatus::Fault(4));
    /// ```
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            TRANSMISSION_ACK => Self::Ack,
            TRANSMISSION_ADDRESS_NACK => Self::AddressNack,
            other => Self::Fault(other),
        }
    }

    /// Check if this status is an acknowledge.
    pub fn is_ack(&self) -> bool {
        matches!(self, Self::Ack)
    }
}

/// Passive-target family selector for tag detection.
///
/// Only the ISO14443A family is dispensed today; the enum exists so the
/// detection call site reads the same once more families arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TargetFamily {
    /// ISO/IEC 14443 Type A targets (MIFARE, NTAG).
    Iso14443a,
}

impl TargetFamily {
    /// Get a human-readable name for the target family.
    pub fn name(&self) -> &str {
        match self {
            Self::Iso14443a => "ISO14443A",
        }
    }
}

/// Raw unique identifier reported by a detected tag.
///
/// The bytes arrive straight from the chip and are **not** validated on
/// construction: the read protocol owns the length gate, and diagnostics
/// want to see exactly what an incompatible target presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUid {
    bytes: Vec<u8>,
}

impl TagUid {
    /// Create a tag UID from raw chip bytes.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// UID length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the UID is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Get the raw UID bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Check whether the UID length is one the read protocol accepts.
    ///
    /// Only single-size (4 byte) and double-size (7 byte) identifiers pass;
    /// everything else is reported as an incompatible target.
    ///
    /// # Examples
    ///
    /// ```
    /// use tapgate_hardware::traits::TagUid;
    ///
    /// assert!(TagUid::new(vec![0x04, 0xAB, 0xCD, 0xEF]).has_supported_length());
    /// assert!(!TagUid::new(vec![0x04, 0xAB, 0xCD]).has_supported_length());
    /// ```
    pub fn has_supported_length(&self) -> bool {
        matches!(self.bytes.len(), UID_LENGTH_SINGLE | UID_LENGTH_DOUBLE)
    }

    /// Get the UID as a hexadecimal string.
    pub fn to_hex(&self) -> String {
        self.bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join("")
    }
}

impl fmt::Display for TagUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Shared bus transport abstraction.
///
/// Represents the addressed communication channel every bus peripheral sits
/// behind. A session is opened once on a pin pair; discovery then drives
/// addressed transmissions and inspects their status.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`, which is an opaque type that cannot be used in trait objects
/// (Edition 2024 RPITIT). You cannot use `Box<dyn BusTransport>`.
///
/// For most use cases, use generic type parameters:
///
/// ```no_run
/// use tapgate_hardware::traits::BusTransport;
/// use tapgate_hardware::error::Result;
/// use tapgate_core::types::BusAddress;
///
/// async fn address_target<B: BusTransport>(bus: &mut B, addr: BusAddress) -> Result<()> {
///     bus.begin_transmission(addr).await
/// }
/// ```
///
/// For dynamic dispatch (e.g., in the peripheral manager), use the enum
/// wrapper pattern from the [`devices`](crate::devices) module.
pub trait BusTransport: Send + Sync {
    /// Open the bus session on the given pin pair.
    ///
    /// Called at most once per transport instance, during bus bring-up.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be brought up on those pins.
    async fn begin_session(&mut self, pins: BusPins) -> Result<()>;

    /// Start an addressed transmission to a target.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport rejects the transaction outright
    /// (no session, hardware gone).
    async fn begin_transmission(&mut self, address: BusAddress) -> Result<()>;

    /// Finish the pending transmission and report its status.
    ///
    /// # Errors
    ///
    /// Returns an error only when no status could be read at all; a NACK or
    /// bus fault is a successful read of a bad status, not an `Err`.
    async fn end_transmission(&mut self) -> Result<TransmissionStatus>;
}

/// Rotational actuator driver abstraction.
///
/// Both wiring variants, directly pin-wired and bus-multiplexed, expose
/// this same contract; the identical write shape is what lets the actuator
/// port unify them behind one dispatch point. How the driver reaches its
/// hardware (a PWM peripheral or an addressed bus expander) is its own
/// business.
///
/// # Object Safety
///
/// NOT object-safe (RPITIT, as with [`BusTransport`]); dispatch goes through
/// [`AnyActuatorDriver`](crate::devices::AnyActuatorDriver).
pub trait ActuatorDriver: Send + Sync {
    /// Bind the driver to an output pin.
    ///
    /// # Errors
    ///
    /// Returns an error if the pin cannot drive this actuator; the caller is
    /// expected to discard the driver instance in that case.
    async fn attach(&mut self, pin: Pin) -> Result<()>;

    /// Command the actuator to an angle.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write fails. The peripheral layer
    /// treats actuation as best-effort and only logs such failures.
    async fn write(&mut self, angle: Angle) -> Result<()>;

    /// Release the output pin.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver was not attached.
    async fn detach(&mut self) -> Result<()>;
}

/// Contactless tag-reader chip driver abstraction.
///
/// Mirrors the vendor chip's bring-up and read primitives: power-up, firmware
/// identification, secure-session configuration, passive-target detection,
/// and authenticated file reads. The session layer sequences these; the
/// driver never decides policy.
///
/// # Object Safety
///
/// NOT object-safe (RPITIT, as with [`BusTransport`]); dispatch goes through
/// [`AnyTagReaderChip`](crate::devices::AnyTagReaderChip).
pub trait TagReaderChip: Send + Sync {
    /// Run the chip's low-level begin sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the chip does not respond to the wake-up.
    async fn begin(&mut self) -> Result<()>;

    /// Read the chip's raw firmware-version word.
    ///
    /// A value of zero means the chip answered nothing meaningful and must
    /// be treated as a failed bring-up step.
    ///
    /// # Errors
    ///
    /// Returns an error on a communication failure; a garbage (zero) answer
    /// is reported through the value, not as an `Err`.
    async fn firmware_version(&mut self) -> Result<u32>;

    /// Configure the chip's secure-session (SAM) mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration handshake fails.
    async fn configure_secure_session(&mut self) -> Result<()>;

    /// Wait for a passive target of the given family and report its UID.
    ///
    /// With `Some(timeout)` the wait is bounded; with `None` the chip's own
    /// wait policy applies, which may block indefinitely. `Ok(None)` means
    /// the wait ended without a target.
    ///
    /// # Errors
    ///
    /// Returns an error on a communication failure with the chip.
    async fn detect_passive_target(
        &mut self,
        family: TargetFamily,
        timeout: Option<Duration>,
    ) -> Result<Option<TagUid>>;

    /// Check whether the currently detected tag belongs to the supported
    /// secure tag family.
    ///
    /// # Errors
    ///
    /// Returns an error on a communication failure with the chip.
    async fn is_secure_tag(&mut self) -> Result<bool>;

    /// Read the detected tag's data file into `buf`, returning the number
    /// of bytes actually read (at most `buf.len()`).
    ///
    /// # Errors
    ///
    /// Returns an error on a communication or authentication failure.
    async fn read_secure_file(&mut self, buf: &mut [u8]) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_transmission_status_from_code() {
        assert_eq!(TransmissionStatus::from_code(0), TransmissionStatus::Ack);
        assert_eq!(
            TransmissionStatus::from_code(2),
            TransmissionStatus::AddressNack
        );
        assert_eq!(
            TransmissionStatus::from_code(4),
            TransmissionStatus::Fault(4)
        );
        assert!(TransmissionStatus::Ack.is_ack());
        assert!(!TransmissionStatus::AddressNack.is_ack());
    }

    #[rstest]
    #[case(4, true)]
    #[case(7, true)]
    #[case(0, false)]
    #[case(1, false)]
    #[case(3, false)]
    #[case(5, false)]
    #[case(6, false)]
    #[case(8, false)]
    #[case(10, false)]
    fn test_uid_length_gate(#[case] len: usize, #[case] accepted: bool) {
        let uid = TagUid::new(vec![0xAB; len]);
        assert_eq!(uid.has_supported_length(), accepted);
    }

    #[test]
    fn test_uid_hex() {
        let uid = TagUid::new(vec![0x04, 0xAB, 0xCD, 0xEF]);
        assert_eq!(uid.to_hex(), "04ABCDEF");
        assert_eq!(uid.to_string(), "04ABCDEF");
        assert_eq!(uid.len(), 4);
        assert!(!uid.is_empty());
    }

    #[test]
    fn test_target_family_name() {
        assert_eq!(TargetFamily::Iso14443a.name(), "ISO14443A");
    }
}
