//! Peripheral abstraction layer for the Tapgate dispensing controller.
//!
//! This crate manages the peripherals of one embedded controller sitting on
//! a shared addressed bus: rotational actuators (directly pin-wired or
//! bus-multiplexed) and a contactless secure-tag reader. It provides the
//! device-discovery protocol, the single-attachment actuator port, the
//! tag-reader session bring-up, and the dual-callback read protocol, all
//! behind one [`PeripheralManager`] owner object per controller.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native
//!   `async fn` in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Tolerant of absent hardware**: "not installed" is an expected, quiet
//!   outcome; "bus fault" and "present but misconfigured" stay distinct and
//!   get surfaced.
//! - **Flat failure signals**: operations report success/failure through
//!   return values and outcome callbacks, never panics; detailed errors live
//!   at the driver-trait layer as [`Result<T>`][error::Result].
//! - **All-or-nothing bring-up**: a failed attach or reader initialization
//!   drops everything it allocated; no peripheral is ever half-constructed.
//!
//! # Driver Traits
//!
//! The external collaborators are modeled as three trait families in
//! [`traits`]: the [`BusTransport`], the [`ActuatorDriver`] (one contract
//! for both wiring variants), and the [`TagReaderChip`]. Enum wrappers in
//! [`devices`] provide concrete dispatch; mock implementations in [`mock`]
//! make every flow testable without hardware.
//!
//! # Example
//!
//! ```
//! use tapgate_hardware::manager::{PeripheralConfig, PeripheralManager};
//! use tapgate_hardware::devices::{AnyBusTransport, AnyTagReaderChip};
//! use tapgate_hardware::mock::{MockBus, MockTagReader, PresentedTag};
//! use tapgate_core::constants::TAG_READER_ADDRESS;
//! use tapgate_core::types::BusAddress;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut manager = PeripheralManager::new(PeripheralConfig::default());
//!
//!     let (bus, bus_handle) = MockBus::new();
//!     bus_handle.add_device(BusAddress::new(TAG_READER_ADDRESS).unwrap());
//!     manager.register_bus(AnyBusTransport::Mock(bus));
//!     assert!(manager.init_bus().await);
//!
//!     let (chip, chip_handle) = MockTagReader::new();
//!     assert!(manager.init_tag_reader(AnyTagReaderChip::Mock(chip)).await);
//!
//!     chip_handle
//!         .present_tag(PresentedTag::new(vec![0x04; 7], true, b"credit:3".to_vec()))
//!         .await
//!         .unwrap();
//!
//!     let ok = manager
//!         .read_tag(
//!             Some(Duration::from_millis(100)),
//!             |outcome| println!("outcome: {outcome}"),
//!             |payload| println!("payload: {} bytes", payload.len()),
//!         )
//!         .await;
//!     assert!(ok);
//! }
//! ```
//!
//! # Concurrency
//!
//! Every operation takes `&mut self` and runs to completion on the caller's
//! task; one manager instance has no concurrent access path and therefore no
//! locks. A multi-threaded embedding adds its own mutual exclusion around
//! the manager.
//!
//! [`BusTransport`]: traits::BusTransport
//! [`ActuatorDriver`]: traits::ActuatorDriver
//! [`TagReaderChip`]: traits::TagReaderChip
//! [`PeripheralManager`]: manager::PeripheralManager

pub mod actuator;
pub mod bus;
pub mod devices;
pub mod error;
pub mod manager;
pub mod mock;
pub mod reader;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::{
    ActuatorDriver, BusTransport, TagReaderChip, TagUid, TargetFamily, TransmissionStatus,
};
pub use types::{FirmwareVersion, ProbeResult, ReadOutcome, ReadRecord};

// Re-export the component and manager types
pub use actuator::{ActuatorKind, ActuatorPort};
pub use bus::BusHandle;
pub use manager::{BusConfig, PeripheralConfig, PeripheralManager, PeripheralStats};
pub use reader::TagReaderSession;
