//! Mock bus transport for testing and development.
//!
//! This module provides a simulated addressed bus whose device population
//! and failure modes are scripted through a control handle, so discovery
//! and bring-up flows can be exercised without wiring.

use crate::{
    Result,
    traits::{BusTransport, TransmissionStatus},
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tapgate_core::types::{BusAddress, BusPins};

/// Scripted bus state shared between the transport and its handle.
#[derive(Debug)]
struct BusState {
    /// Addresses that acknowledge when probed.
    devices: HashSet<u8>,

    /// Addresses that answer with a transport fault instead of a NACK.
    faulted: HashSet<u8>,

    /// Whether `begin_session` succeeds.
    session_ok: bool,

    /// Session has been opened.
    session_active: bool,

    /// Address of the in-flight transmission, if any.
    pending: Option<u8>,

    /// Total addressed transmissions started.
    transmissions: usize,
}

/// Mock bus transport for testing and development.
///
/// Simulates the shared peripheral bus: targets are registered per address
/// through a [`MockBusHandle`], and each addressed transmission answers Ack,
/// AddressNack, or a fault according to that script.
///
/// # Examples
///
/// ```
/// use tapgate_hardware::mock::MockBus;
/// use tapgate_hardware::traits::{BusTransport, TransmissionStatus};
/// use tapgate_core::types::{BusAddress, BusPins, Pin};
///
/// #[tokio::main]
/// async fn main() -> tapgate_hardware::Result<()> {
///     let (mut bus, handle) = MockBus::new();
///     handle.add_device(BusAddress::new(0x24).unwrap());
///
///     bus.begin_session(BusPins::new(Pin::new(21), Pin::new(22))).await?;
///     bus.begin_transmission(BusAddress::new(0x24).unwrap()).await?;
///     assert_eq!(bus.end_transmission().await?, TransmissionStatus::Ack);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockBus {
    state: Arc<Mutex<BusState>>,
}

impl MockBus {
    /// Create a new mock bus with no devices attached.
    ///
    /// Returns a tuple of (MockBus, MockBusHandle) where the handle is used
    /// to script the bus population and failure modes.
    pub fn new() -> (Self, MockBusHandle) {
        let state = Arc::new(Mutex::new(BusState {
            devices: HashSet::new(),
            faulted: HashSet::new(),
            session_ok: true,
            session_active: false,
            pending: None,
            transmissions: 0,
        }));

        let bus = Self {
            state: Arc::clone(&state),
        };
        let handle = MockBusHandle { state };

        (bus, handle)
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BusTransport for MockBus {
    async fn begin_session(&mut self, _pins: BusPins) -> Result<()> {
        let mut state = self.lock();
        if !state.session_ok {
            return Err(crate::HardwareError::communication(
                "mock bus session refused",
            ));
        }
        state.session_active = true;
        Ok(())
    }

    async fn begin_transmission(&mut self, address: BusAddress) -> Result<()> {
        let mut state = self.lock();
        if !state.session_active {
            return Err(crate::HardwareError::communication(
                "transmission without session",
            ));
        }
        state.pending = Some(address.as_u8());
        state.transmissions += 1;
        Ok(())
    }

    async fn end_transmission(&mut self) -> Result<TransmissionStatus> {
        let mut state = self.lock();
        let address = state.pending.take().ok_or_else(|| {
            crate::HardwareError::invalid_data("end_transmission without begin_transmission")
        })?;

        if state.faulted.contains(&address) {
            return Ok(TransmissionStatus::Fault(4));
        }
        if state.devices.contains(&address) {
            return Ok(TransmissionStatus::Ack);
        }
        Ok(TransmissionStatus::AddressNack)
    }
}

/// Handle for scripting a mock bus.
///
/// Can be cloned and kept after the transport itself has been handed to the
/// peripheral manager.
#[derive(Debug, Clone)]
pub struct MockBusHandle {
    state: Arc<Mutex<BusState>>,
}

impl MockBusHandle {
    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install a device that acknowledges at `address`.
    pub fn add_device(&self, address: BusAddress) {
        self.lock().devices.insert(address.as_u8());
    }

    /// Remove the device at `address`; probes there NACK again.
    pub fn remove_device(&self, address: BusAddress) {
        self.lock().devices.remove(&address.as_u8());
    }

    /// Make transmissions to `address` answer with a transport fault.
    pub fn set_fault(&self, address: BusAddress) {
        self.lock().faulted.insert(address.as_u8());
    }

    /// Make the next `begin_session` call fail.
    pub fn fail_session(&self) {
        self.lock().session_ok = false;
    }

    /// Whether a session is currently open.
    pub fn session_active(&self) -> bool {
        self.lock().session_active
    }

    /// Total addressed transmissions started since creation.
    ///
    /// Useful to prove that an operation performed no bus traffic at all.
    pub fn transmission_count(&self) -> usize {
        self.lock().transmissions
    }
}
