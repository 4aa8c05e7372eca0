//! Enum wrappers for driver dispatch.
//!
//! This module provides enum wrappers that enable the use of native async
//! traits with concrete type dispatch, avoiding the object-safety limitations
//! while maintaining zero-cost abstractions.
//!
//! # Enum Dispatch Pattern
//!
//! Native `async fn` in traits (RPITIT - Rust Edition 2024) are not
//! object-safe, so a `Box<dyn BusTransport>` cannot exist. Enums provide
//! concrete type dispatch at compile time instead:
//!
//! - Zero-cost abstraction (monomorphization at compile-time)
//! - Type-safe extensibility
//! - Support for feature flags (conditional compilation)
//!
//! # Examples
//!
//! ```
//! use tapgate_hardware::devices::AnyBusTransport;
//! use tapgate_hardware::mock::MockBus;
//!
//! let (bus, _handle) = MockBus::new();
//! let any_bus = AnyBusTransport::Mock(bus);
//!
//! // Can now be used polymorphically through the BusTransport trait
//! ```

use crate::mock::{MockActuator, MockBus, MockTagReader};
use crate::traits::{
    ActuatorDriver, BusTransport, TagReaderChip, TagUid, TargetFamily, TransmissionStatus,
};
use crate::Result;
use std::time::Duration;
use tapgate_core::types::{Angle, BusAddress, BusPins, Pin};

/// Enum wrapper for bus transport dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyBusTransport {
    /// Mock bus for development and testing.
    Mock(MockBus),
    // TODO: Add hardware implementations when ready
    // Planned variants:
    // - LinuxI2c(LinuxI2cBus) - /dev/i2c-* character devices (hardware-i2c)
}

impl BusTransport for AnyBusTransport {
    async fn begin_session(&mut self, pins: BusPins) -> Result<()> {
        match self {
            Self::Mock(bus) => bus.begin_session(pins).await,
        }
    }

    async fn begin_transmission(&mut self, address: BusAddress) -> Result<()> {
        match self {
            Self::Mock(bus) => bus.begin_transmission(address).await,
        }
    }

    async fn end_transmission(&mut self) -> Result<TransmissionStatus> {
        match self {
            Self::Mock(bus) => bus.end_transmission().await,
        }
    }
}

/// Enum wrapper for actuator driver dispatch.
///
/// One wrapper serves both wiring variants; which port slot it lands in
/// (local or bus-addressed) is the peripheral manager's bookkeeping, not a
/// property of the driver type.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyActuatorDriver {
    /// Mock actuator for development and testing.
    Mock(MockActuator),
    // TODO: Add hardware implementations when ready
    // Planned variants:
    // - Pwm(PwmActuator) - direct PWM-pin servo drive (hardware-pwm)
    // - BusExpander(BusExpanderActuator) - PCA9685-class bus servo boards (hardware-i2c)
}

impl ActuatorDriver for AnyActuatorDriver {
    async fn attach(&mut self, pin: Pin) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.attach(pin).await,
        }
    }

    async fn write(&mut self, angle: Angle) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.write(angle).await,
        }
    }

    async fn detach(&mut self) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.detach().await,
        }
    }
}

/// Enum wrapper for tag-reader chip dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTagReaderChip {
    /// Mock reader chip for development and testing.
    Mock(MockTagReader),
    // TODO: Add hardware implementations when ready
    // Planned variants:
    // - Pn5xx(Pn5xxChip) - NXP PN5xx family over the shared bus (hardware-nfc)
}

impl TagReaderChip for AnyTagReaderChip {
    async fn begin(&mut self) -> Result<()> {
        match self {
            Self::Mock(chip) => chip.begin().await,
        }
    }

    async fn firmware_version(&mut self) -> Result<u32> {
        match self {
            Self::Mock(chip) => chip.firmware_version().await,
        }
    }

    async fn configure_secure_session(&mut self) -> Result<()> {
        match self {
            Self::Mock(chip) => chip.configure_secure_session().await,
        }
    }

    async fn detect_passive_target(
        &mut self,
        family: TargetFamily,
        timeout: Option<Duration>,
    ) -> Result<Option<TagUid>> {
        match self {
            Self::Mock(chip) => chip.detect_passive_target(family, timeout).await,
        }
    }

    async fn is_secure_tag(&mut self) -> Result<bool> {
        match self {
            Self::Mock(chip) => chip.is_secure_tag().await,
        }
    }

    async fn read_secure_file(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self {
            Self::Mock(chip) => chip.read_secure_file(buf).await,
        }
    }
}
