//! Mock actuator driver for testing and development.
//!
//! This module provides a simulated rotational actuator that records every
//! angle command it receives, with scriptable attach failures, so the
//! single-attachment and dispatch policies can be verified without hardware.

use crate::{
    Result,
    traits::ActuatorDriver,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tapgate_core::types::{Angle, Pin};

/// Scripted actuator state shared between the driver and its handle.
#[derive(Debug)]
struct ActuatorState {
    /// Pin the driver is currently bound to.
    attached: Option<Pin>,

    /// Every angle command received while attached.
    writes: Vec<Angle>,

    /// Whether the next `attach` call fails.
    fail_attach: bool,
}

/// Mock actuator driver for testing and development.
///
/// Stands in for both wiring variants: whether the peripheral manager files
/// it under the local or the bus-addressed slot is the manager's decision,
/// which is exactly the point: the driver contract is identical.
///
/// # Examples
///
/// ```
/// use tapgate_hardware::mock::MockActuator;
/// use tapgate_hardware::traits::ActuatorDriver;
/// use tapgate_core::types::{Angle, Pin};
///
/// #[tokio::main]
/// async fn main() -> tapgate_hardware::Result<()> {
///     let (mut actuator, handle) = MockActuator::new();
///
///     actuator.attach(Pin::new(13)).await?;
///     actuator.write(Angle::new(90).unwrap()).await?;
///
///     assert_eq!(handle.writes(), vec![Angle::new(90).unwrap()]);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockActuator {
    state: Arc<Mutex<ActuatorState>>,
}

impl MockActuator {
    /// Create a new detached mock actuator.
    ///
    /// Returns a tuple of (MockActuator, MockActuatorHandle) where the handle
    /// inspects writes and scripts attach failures.
    pub fn new() -> (Self, MockActuatorHandle) {
        let state = Arc::new(Mutex::new(ActuatorState {
            attached: None,
            writes: Vec::new(),
            fail_attach: false,
        }));

        let actuator = Self {
            state: Arc::clone(&state),
        };
        let handle = MockActuatorHandle { state };

        (actuator, handle)
    }

    fn lock(&self) -> MutexGuard<'_, ActuatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ActuatorDriver for MockActuator {
    async fn attach(&mut self, pin: Pin) -> Result<()> {
        let mut state = self.lock();
        if state.fail_attach {
            return Err(crate::HardwareError::attach_failed(format!(
                "mock actuator refused {pin}"
            )));
        }
        if state.attached.is_some() {
            return Err(crate::HardwareError::attach_failed(
                "mock actuator already attached",
            ));
        }
        state.attached = Some(pin);
        Ok(())
    }

    async fn write(&mut self, angle: Angle) -> Result<()> {
        let mut state = self.lock();
        if state.attached.is_none() {
            return Err(crate::HardwareError::other("write before attach"));
        }
        state.writes.push(angle);
        Ok(())
    }

    async fn detach(&mut self) -> Result<()> {
        let mut state = self.lock();
        if state.attached.take().is_none() {
            return Err(crate::HardwareError::other("detach before attach"));
        }
        Ok(())
    }
}

/// Handle for inspecting and scripting a mock actuator.
///
/// Can be cloned and kept after the driver has been handed to the
/// peripheral manager.
#[derive(Debug, Clone)]
pub struct MockActuatorHandle {
    state: Arc<Mutex<ActuatorState>>,
}

impl MockActuatorHandle {
    fn lock(&self) -> MutexGuard<'_, ActuatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Script whether `attach` calls fail.
    pub fn set_fail_attach(&self, fail: bool) {
        self.lock().fail_attach = fail;
    }

    /// Pin the driver is currently attached to, if any.
    pub fn attached_pin(&self) -> Option<Pin> {
        self.lock().attached
    }

    /// Whether the driver is currently attached.
    pub fn is_attached(&self) -> bool {
        self.lock().attached.is_some()
    }

    /// Every angle command received so far, in order.
    pub fn writes(&self) -> Vec<Angle> {
        self.lock().writes.clone()
    }

    /// Number of angle commands received so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }
}
