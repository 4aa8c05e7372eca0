//! Shared-bus session handle and device discovery.
//!
//! This module owns the communication-bus session for one controller and
//! implements the address-scan protocol every bus peripheral runs before
//! attaching. Running without any bus is a valid configuration: bring-up
//! then succeeds trivially and every bus-dependent operation fails fast
//! without ever touching a transport.

use crate::devices::AnyBusTransport;
use crate::traits::{BusTransport, TransmissionStatus};
use crate::types::ProbeResult;
use std::time::Duration;
use tapgate_core::constants::PROBE_SETTLE_DELAY_MS;
use tapgate_core::types::{BusAddress, BusPins};
use tracing::{debug, trace, warn};

/// Owner of one controller's bus session.
///
/// Created once at startup, either connected to a transport and a pin pair
/// or deliberately disconnected, and never reassigned afterwards.
#[derive(Debug)]
pub struct BusHandle {
    /// The transport, absent on bus-less units.
    transport: Option<AnyBusTransport>,

    /// Pin pair the session is opened on.
    pins: Option<BusPins>,

    /// Session has been brought up successfully.
    session_active: bool,
}

impl BusHandle {
    /// Create a handle for a unit with no bus wired.
    ///
    /// `initialize` succeeds trivially on such a handle and every probe
    /// reports [`ProbeResult::BusFault`].
    #[must_use]
    pub fn disconnected() -> Self {
        Self {
            transport: None,
            pins: None,
            session_active: false,
        }
    }

    /// Create a handle over a transport and its configured pin pair.
    #[must_use]
    pub fn new(transport: AnyBusTransport, pins: BusPins) -> Self {
        Self {
            transport: Some(transport),
            pins: Some(pins),
            session_active: false,
        }
    }

    /// Whether a transport is configured at all.
    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// Whether the session is up and probes can run.
    pub fn is_ready(&self) -> bool {
        self.session_active
    }

    /// Bring the bus session up.
    ///
    /// Without a configured transport this is a no-op success. With one, a
    /// single `begin_session` attempt is made on the configured pin pair.
    /// No retries; the caller decides whether to retry.
    pub async fn initialize(&mut self) -> bool {
        let Some(transport) = self.transport.as_mut() else {
            debug!("initialized without bus support");
            return true;
        };

        // Invariant from construction: a transport always comes with pins.
        let Some(pins) = self.pins else {
            warn!("bus transport configured without a pin pair");
            return false;
        };

        match transport.begin_session(pins).await {
            Ok(()) => {
                debug!("bus session up on {pins}");
                self.session_active = true;
                true
            }
            Err(e) => {
                warn!("bus session bring-up failed: {e}");
                false
            }
        }
    }

    /// Probe one address for a responding peripheral.
    ///
    /// Requires an initialized session; without one this returns
    /// [`ProbeResult::BusFault`] immediately and performs no transport
    /// calls. Otherwise one addressed transmission is made, a short settle
    /// delay gives the target time to respond, and the transmission status
    /// decides the three-way outcome.
    pub async fn probe(&mut self, address: BusAddress) -> ProbeResult {
        if !self.session_active {
            warn!("probe of {address} with no initialized bus");
            return ProbeResult::BusFault;
        }
        // session_active implies the transport exists
        let Some(transport) = self.transport.as_mut() else {
            return ProbeResult::BusFault;
        };

        if let Err(e) = transport.begin_transmission(address).await {
            warn!("probe of {address}: transport refused transmission: {e}");
            return ProbeResult::BusFault;
        }

        tokio::time::sleep(Duration::from_millis(PROBE_SETTLE_DELAY_MS)).await;

        match transport.end_transmission().await {
            Ok(TransmissionStatus::Ack) => {
                trace!("device detected at {address}");
                ProbeResult::Present
            }
            Ok(TransmissionStatus::AddressNack) => {
                trace!("no device at {address}");
                ProbeResult::AbsentAck
            }
            Ok(TransmissionStatus::Fault(code)) => {
                warn!("bus fault probing {address} (status {code})");
                ProbeResult::BusFault
            }
            Err(e) => {
                warn!("bus error probing {address}: {e}");
                ProbeResult::BusFault
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBus;
    use tapgate_core::types::Pin;

    fn pins() -> BusPins {
        BusPins::new(Pin::new(21), Pin::new(22))
    }

    #[tokio::test]
    async fn test_disconnected_handle_initializes_trivially() {
        let mut bus = BusHandle::disconnected();
        assert!(bus.initialize().await);
        assert!(!bus.is_ready());
        assert!(!bus.is_configured());
    }

    #[tokio::test]
    async fn test_disconnected_handle_probes_fault() {
        let mut bus = BusHandle::disconnected();
        bus.initialize().await;

        let result = bus.probe(BusAddress::new(0x40).unwrap()).await;
        assert_eq!(result, ProbeResult::BusFault);
    }

    #[tokio::test]
    async fn test_probe_without_initialize_makes_no_transport_calls() {
        let (mock, handle) = MockBus::new();
        handle.add_device(BusAddress::new(0x40).unwrap());
        let mut bus = BusHandle::new(AnyBusTransport::Mock(mock), pins());

        let result = bus.probe(BusAddress::new(0x40).unwrap()).await;
        assert_eq!(result, ProbeResult::BusFault);
        assert_eq!(handle.transmission_count(), 0);
    }

    #[tokio::test]
    async fn test_probe_three_way_outcomes() {
        let (mock, handle) = MockBus::new();
        let present = BusAddress::new(0x40).unwrap();
        let absent = BusAddress::new(0x41).unwrap();
        let broken = BusAddress::new(0x42).unwrap();
        handle.add_device(present);
        handle.set_fault(broken);

        let mut bus = BusHandle::new(AnyBusTransport::Mock(mock), pins());
        assert!(bus.initialize().await);

        assert_eq!(bus.probe(present).await, ProbeResult::Present);
        assert_eq!(bus.probe(absent).await, ProbeResult::AbsentAck);
        assert_eq!(bus.probe(broken).await, ProbeResult::BusFault);
    }

    #[tokio::test]
    async fn test_failed_session_bring_up() {
        let (mock, handle) = MockBus::new();
        handle.fail_session();
        let mut bus = BusHandle::new(AnyBusTransport::Mock(mock), pins());

        assert!(!bus.initialize().await);
        assert!(!bus.is_ready());
        assert_eq!(
            bus.probe(BusAddress::new(0x40).unwrap()).await,
            ProbeResult::BusFault
        );
    }
}
