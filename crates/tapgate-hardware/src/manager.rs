//! Peripheral manager.
//!
//! This module provides the `PeripheralManager`, one owner object per
//! physical controller instance. It holds the bus session, the single
//! actuator port, the tag-reader session, and the shared scratch buffer tag
//! payloads are read into, and exposes the flat attach/initialize/read
//! surface the rest of the controller programs against.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ PeripheralManager                           │
//! │                                             │
//! │  BusHandle ──────── probe ────────┐         │
//! │      │                            │         │
//! │  ActuatorPort ◄── attach gate ────┤         │
//! │      │                            │         │
//! │  TagReaderSession ◄── bring-up ───┘         │
//! │      │                                      │
//! │      └── read ──► scratch buffer ──► callbacks
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Every operation takes `&mut self` and runs to completion before
//! returning; exclusive ownership is what makes the single-threaded model
//! hold without any locking. A multi-threaded embedding must wrap the whole
//! manager in its own mutual exclusion.
//!
//! # Examples
//!
//! ```
//! use tapgate_hardware::manager::{PeripheralConfig, PeripheralManager};
//! use tapgate_hardware::devices::{AnyActuatorDriver, AnyBusTransport};
//! use tapgate_hardware::mock::{MockActuator, MockBus};
//! use tapgate_core::types::{Angle, BusAddress, Pin};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut manager = PeripheralManager::new(PeripheralConfig::default());
//!
//!     let (bus, bus_handle) = MockBus::new();
//!     bus_handle.add_device(BusAddress::new(0x40).unwrap());
//!     assert!(manager.register_bus(AnyBusTransport::Mock(bus)));
//!     assert!(manager.init_bus().await);
//!
//!     let (servo, _servo_handle) = MockActuator::new();
//!     assert!(
//!         manager
//!             .attach_bus_actuator(
//!                 AnyActuatorDriver::Mock(servo),
//!                 BusAddress::new(0x40).unwrap(),
//!                 Pin::new(13),
//!             )
//!             .await
//!     );
//!
//!     manager.write_actuator(Angle::new(90).unwrap()).await;
//! }
//! ```

use crate::actuator::{ActuatorKind, ActuatorPort};
use crate::bus::BusHandle;
use crate::devices::{AnyActuatorDriver, AnyBusTransport, AnyTagReaderChip};
use crate::reader::TagReaderSession;
use crate::types::{FirmwareVersion, ProbeResult, ReadOutcome, ReadRecord};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tapgate_core::constants::{TAG_FILE_BUFFER_CAPACITY, TAG_READER_ADDRESS};
use tapgate_core::types::{Angle, BusAddress, BusPins, Pin};
use tracing::warn;

/// Wiring of the shared bus for one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Hardware bus index on the controller.
    pub index: u8,

    /// Data/clock pin pair the session is opened on.
    pub pins: BusPins,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            index: 0,
            pins: BusPins::new(Pin::new(21), Pin::new(22)),
        }
    }
}

/// Configuration for one controller's peripherals.
///
/// `bus: None` describes a unit with no bus wired at all, a valid
/// configuration in which bus bring-up trivially succeeds and every
/// bus-dependent operation fails fast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeripheralConfig {
    /// Shared-bus wiring, absent on bus-less units.
    pub bus: Option<BusConfig>,

    /// Bus address the tag reader is probed at.
    pub reader_address: BusAddress,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            bus: Some(BusConfig::default()),
            reader_address: BusAddress::new(TAG_READER_ADDRESS)
                .expect("TAG_READER_ADDRESS is a valid bus address"),
        }
    }
}

/// Snapshot of which peripherals are currently usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeripheralStats {
    /// Bus session is up.
    pub bus_ready: bool,

    /// An actuator is attached.
    pub actuator_attached: bool,

    /// The tag-reader session is ready.
    pub reader_ready: bool,
}

/// Manages all peripherals of one physical controller.
///
/// One instance per controller, deliberately not a process-wide singleton,
/// so several instances (e.g. in tests) never share hardware state.
///
/// # Lifecycle
///
/// 1. Create with a [`PeripheralConfig`]
/// 2. `register_bus` the transport (bus-wired units only)
/// 3. `init_bus`, then attach the actuator and/or bring up the reader
/// 4. Issue `write_actuator` / `read_tag` operations at runtime
#[derive(Debug)]
pub struct PeripheralManager {
    /// Configuration.
    config: PeripheralConfig,

    /// The shared-bus session.
    bus: BusHandle,

    /// The single logical actuator slot.
    actuator: ActuatorPort,

    /// The tag-reader session.
    reader: TagReaderSession,

    /// Scratch buffer tag payloads are read into; reused across attempts.
    scratch: [u8; TAG_FILE_BUFFER_CAPACITY],

    /// Diagnostics record of the most recent read attempt.
    last_read: Option<ReadRecord>,
}

impl PeripheralManager {
    /// Create a new peripheral manager with configuration.
    ///
    /// The bus starts unregistered; on bus-wired units, call
    /// [`register_bus`](Self::register_bus) before `init_bus`.
    #[must_use]
    pub fn new(config: PeripheralConfig) -> Self {
        Self {
            config,
            bus: BusHandle::disconnected(),
            actuator: ActuatorPort::default(),
            reader: TagReaderSession::new(),
            scratch: [0; TAG_FILE_BUFFER_CAPACITY],
            last_read: None,
        }
    }

    /// Access the configuration.
    pub fn config(&self) -> &PeripheralConfig {
        &self.config
    }

    /// Register the bus transport for this controller.
    ///
    /// Refused when the configuration has no bus section (the transport
    /// would have no pins to open on) and when a transport was already
    /// registered: the bus is created once and never reassigned.
    pub fn register_bus(&mut self, transport: AnyBusTransport) -> bool {
        let Some(bus_config) = self.config.bus else {
            warn!("bus transport registered on a bus-less configuration");
            return false;
        };
        if self.bus.is_configured() {
            warn!("bus transport already registered");
            return false;
        }
        self.bus = BusHandle::new(transport, bus_config.pins);
        true
    }

    /// Bring the bus session up (trivially succeeds on bus-less units).
    pub async fn init_bus(&mut self) -> bool {
        self.bus.initialize().await
    }

    /// Probe one bus address for a responding peripheral.
    pub async fn probe(&mut self, address: BusAddress) -> ProbeResult {
        self.bus.probe(address).await
    }

    /// Attach a locally-wired actuator to `pin`.
    pub async fn attach_local_actuator(&mut self, driver: AnyActuatorDriver, pin: Pin) -> bool {
        self.actuator.attach_local(driver, pin).await
    }

    /// Attach a bus-addressed actuator: probe `address`, then bind to `pin`.
    pub async fn attach_bus_actuator(
        &mut self,
        driver: AnyActuatorDriver,
        address: BusAddress,
        pin: Pin,
    ) -> bool {
        self.actuator
            .attach_bus_addressed(&mut self.bus, driver, address, pin)
            .await
    }

    /// Command the attached actuator to an angle (no-op without one).
    pub async fn write_actuator(&mut self, angle: Angle) {
        self.actuator.write(angle).await;
    }

    /// Whether exactly one actuator variant is attached.
    pub fn actuator_available(&self) -> bool {
        self.actuator.is_available()
    }

    /// The attached actuator wiring variant, if any.
    pub fn actuator_kind(&self) -> Option<ActuatorKind> {
        self.actuator.kind()
    }

    /// Detach the actuator; returns whether one was attached.
    pub async fn detach_actuator(&mut self) -> bool {
        self.actuator.detach().await
    }

    /// Bring the tag reader up at the configured address.
    pub async fn init_tag_reader(&mut self, chip: AnyTagReaderChip) -> bool {
        let address = self.config.reader_address;
        self.reader.initialize(chip, &mut self.bus, address).await
    }

    /// Whether the tag-reader session is ready.
    pub fn reader_available(&self) -> bool {
        self.reader.is_available()
    }

    /// Firmware identification of the ready reader, if any.
    pub fn reader_firmware(&self) -> Option<FirmwareVersion> {
        self.reader.firmware_version()
    }

    /// Tear the tag-reader session down; returns whether one was up.
    pub fn teardown_tag_reader(&mut self) -> bool {
        self.reader.teardown()
    }

    /// Run one tag-read attempt, reporting through the two callbacks.
    ///
    /// `on_status` fires exactly once per call with the attempt's
    /// [`ReadOutcome`]; `on_result` fires only on the success path, always
    /// after the status call, with the payload borrowed from the manager's
    /// scratch buffer. The buffer is reused across calls, so callers must
    /// copy out whatever they keep. Returns whether the attempt succeeded.
    ///
    /// With `Some(timeout)` the target-detection wait is bounded; with
    /// `None` the chip's own wait policy applies and the call may block
    /// indefinitely, so callers wanting bounded latency always pass a timeout.
    pub async fn read_tag<S, R>(
        &mut self,
        timeout: Option<Duration>,
        on_status: S,
        on_result: R,
    ) -> bool
    where
        S: FnOnce(ReadOutcome),
        R: FnOnce(&[u8]),
    {
        let (outcome, count) = self.reader.read_into(timeout, &mut self.scratch).await;
        self.last_read = Some(ReadRecord {
            outcome,
            bytes_read: count,
            at: chrono::Utc::now(),
        });

        on_status(outcome);
        if outcome.is_success() {
            on_result(&self.scratch[..count]);
            true
        } else {
            false
        }
    }

    /// Diagnostics record of the most recent read attempt, if any.
    pub fn last_read(&self) -> Option<&ReadRecord> {
        self.last_read.as_ref()
    }

    /// Snapshot of which peripherals are currently usable.
    pub fn stats(&self) -> PeripheralStats {
        PeripheralStats {
            bus_ready: self.bus.is_ready(),
            actuator_attached: self.actuator.is_available(),
            reader_ready: self.reader.is_available(),
        }
    }
}
