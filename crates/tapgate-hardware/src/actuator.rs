//! Polymorphic actuator port.
//!
//! This module unifies the two actuator wiring variants (directly pin-wired
//! and bus-addressed) behind one attach/write surface. The port enforces
//! single attachment: at most one actuator of either kind is ever bound, and
//! a failed attach leaves the port exactly as it was.
//!
//! # Dispatch policy
//!
//! `write` routes to the bus-addressed actuator when one is attached,
//! otherwise to the local actuator, otherwise it is a logged no-op. With
//! single attachment the priority can never actually arbitrate between two
//! devices; it is stated (and tested) here so the policy lives in exactly
//! one place instead of leaking into call sites. Actuation is best-effort
//! by design: a unit may legitimately run with no actuator installed, so a
//! write into the void is not an error.

use crate::bus::BusHandle;
use crate::devices::AnyActuatorDriver;
use crate::traits::ActuatorDriver;
use crate::types::ProbeResult;
use std::fmt;
use tapgate_core::types::{Angle, BusAddress, Pin};
use tracing::{debug, warn};

/// Which wiring variant is currently attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorKind {
    /// Driven directly from a controller pin.
    Local,

    /// Reached through the shared bus at a fixed address.
    BusAddressed,
}

impl fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::BusAddressed => write!(f, "bus-addressed"),
        }
    }
}

/// The controller's single logical actuator slot.
///
/// A tagged union of "nothing attached", a locally-wired driver, and a
/// bus-addressed driver. All transitions happen inside the attach/detach
/// operations; failed attaches drop the candidate driver and leave the
/// port `Detached`.
#[derive(Debug, Default)]
pub enum ActuatorPort {
    /// No actuator attached; writes are no-ops.
    #[default]
    Detached,

    /// Locally-wired actuator bound to a pin.
    Local {
        driver: AnyActuatorDriver,
        pin: Pin,
    },

    /// Bus-addressed actuator, probed Present before attach.
    BusAddressed {
        driver: AnyActuatorDriver,
        address: BusAddress,
        pin: Pin,
    },
}

impl ActuatorPort {
    /// Whether exactly one actuator variant is attached.
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Detached)
    }

    /// The attached wiring variant, if any.
    pub fn kind(&self) -> Option<ActuatorKind> {
        match self {
            Self::Detached => None,
            Self::Local { .. } => Some(ActuatorKind::Local),
            Self::BusAddressed { .. } => Some(ActuatorKind::BusAddressed),
        }
    }

    /// Attach a locally-wired actuator.
    ///
    /// Fails if any variant is already attached. On a driver-level attach
    /// failure the candidate driver is dropped and the port stays
    /// `Detached`.
    pub async fn attach_local(&mut self, mut driver: AnyActuatorDriver, pin: Pin) -> bool {
        if self.is_available() {
            warn!("actuator already attached; refusing local attach on {pin}");
            return false;
        }

        match driver.attach(pin).await {
            Ok(()) => {
                debug!("local actuator attached on {pin}");
                *self = Self::Local { driver, pin };
                true
            }
            Err(e) => {
                debug!("local actuator attach on {pin} failed: {e}");
                false
            }
        }
    }

    /// Attach a bus-addressed actuator.
    ///
    /// Fails if any variant is already attached. The address is probed
    /// first; only [`ProbeResult::Present`] proceeds, and an absent or
    /// faulted address fails immediately without an attach attempt. On a
    /// driver-level attach failure the candidate driver is dropped and the
    /// port stays `Detached`.
    pub async fn attach_bus_addressed(
        &mut self,
        bus: &mut BusHandle,
        mut driver: AnyActuatorDriver,
        address: BusAddress,
        pin: Pin,
    ) -> bool {
        if self.is_available() {
            warn!("actuator already attached; refusing bus attach at {address}");
            return false;
        }

        match bus.probe(address).await {
            ProbeResult::Present => {}
            ProbeResult::AbsentAck => {
                debug!("no actuator found on bus at {address}");
                return false;
            }
            ProbeResult::BusFault => {
                warn!("bus fault while locating actuator at {address}");
                return false;
            }
        }

        match driver.attach(pin).await {
            Ok(()) => {
                debug!("bus actuator at {address} attached on {pin}");
                *self = Self::BusAddressed {
                    driver,
                    address,
                    pin,
                };
                true
            }
            Err(e) => {
                debug!("bus actuator attach at {address} failed: {e}");
                false
            }
        }
    }

    /// Command the attached actuator to an angle.
    ///
    /// The single dispatch point for the priority policy documented at the
    /// module level. Never an error: without an actuator this logs and does
    /// nothing, and driver-level write failures are logged and swallowed.
    pub async fn write(&mut self, angle: Angle) {
        let result = match self {
            Self::BusAddressed {
                driver, address, ..
            } => {
                let r = driver.write(angle).await;
                r.map_err(|e| (format!("bus actuator at {address}"), e))
            }
            Self::Local { driver, pin } => {
                let r = driver.write(angle).await;
                r.map_err(|e| (format!("local actuator on {pin}"), e))
            }
            Self::Detached => {
                debug!("no actuator available for writing {angle}");
                return;
            }
        };

        if let Err((target, e)) = result {
            warn!("write of {angle} to {target} failed: {e}");
        }
    }

    /// Detach whatever is attached, releasing the driver.
    ///
    /// Returns whether an actuator was attached. The driver-level detach is
    /// best-effort; its failure is logged and the port still empties.
    pub async fn detach(&mut self) -> bool {
        let port = std::mem::take(self);
        match port {
            Self::Detached => false,
            Self::Local { mut driver, pin } => {
                if let Err(e) = driver.detach().await {
                    warn!("local actuator detach on {pin} failed: {e}");
                }
                debug!("local actuator on {pin} detached");
                true
            }
            Self::BusAddressed {
                mut driver,
                address,
                ..
            } => {
                if let Err(e) = driver.detach().await {
                    warn!("bus actuator detach at {address} failed: {e}");
                }
                debug!("bus actuator at {address} detached");
                true
            }
        }
    }
}
