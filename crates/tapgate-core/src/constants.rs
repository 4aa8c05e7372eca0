//! Core constants for the tapgate peripheral layer.
//!
//! This module centralizes the bus-protocol, addressing, and sizing constants
//! shared by the hardware abstraction and the peripheral manager. The values
//! mirror the controller's wiring reality (7-bit addressed bus, ISO14443A tag
//! UIDs, fixed reader address) and are the single source of truth for the
//! validation performed by the typed wrappers in [`crate::types`].

// ============================================================================
// Bus Transport
// ============================================================================

/// Settle delay between addressing a bus target and reading back the
/// transmission status, in milliseconds.
///
/// Slow peripherals need a couple of milliseconds after being addressed
/// before they acknowledge. Probing without this pause reports healthy
/// devices as absent.
pub const PROBE_SETTLE_DELAY_MS: u64 = 2;

/// Transport status code for an acknowledged transmission.
pub const TRANSMISSION_ACK: u8 = 0;

/// Transport status code for "address not acknowledged".
///
/// This is the one status that means "nobody is wired at that address" as
/// opposed to a bus-level failure, and the discovery protocol keys the
/// absent/faulted distinction on it.
pub const TRANSMISSION_ADDRESS_NACK: u8 = 2;

// ============================================================================
// Addressing
// ============================================================================

/// Lowest assignable 7-bit bus address.
///
/// Addresses 0x00-0x07 are reserved by the bus specification (general call,
/// CBUS, high-speed master codes) and never belong to a peripheral.
pub const MIN_BUS_ADDRESS: u8 = 0x08;

/// Highest assignable 7-bit bus address.
///
/// Addresses 0x78-0x7F are reserved for 10-bit addressing and future use.
pub const MAX_BUS_ADDRESS: u8 = 0x77;

/// Fixed bus address of the contactless tag-reader chip.
///
/// The reader ships hard-strapped to this address; it is not configurable
/// in the field, so the session bring-up always probes here.
///
/// # Examples
///
/// ```
/// use tapgate_core::constants::TAG_READER_ADDRESS;
/// use tapgate_core::types::BusAddress;
///
/// let addr = BusAddress::new(TAG_READER_ADDRESS).unwrap();
/// assert_eq!(addr.as_u8(), 0x24);
/// ```
pub const TAG_READER_ADDRESS: u8 = 0x24;

// ============================================================================
// Tag Identifiers
// ============================================================================

/// UID length of a single-size ISO14443A identifier, in bytes.
pub const UID_LENGTH_SINGLE: usize = 4;

/// UID length of a double-size ISO14443A identifier, in bytes.
///
/// Secure tags in the supported family always carry double-size UIDs, but
/// single-size UIDs pass the length gate too so that re-badged legacy stock
/// keeps working.
pub const UID_LENGTH_DOUBLE: usize = 7;

/// Largest UID any ISO14443A target can present, in bytes (triple-size).
pub const MAX_UID_LENGTH: usize = 10;

// ============================================================================
// Tag Payload
// ============================================================================

/// Capacity of the scratch buffer a tag's data file is read into, in bytes.
///
/// The final byte is reserved for a NUL terminator, so the largest file the
/// read protocol accepts is one byte less than this.
pub const TAG_FILE_BUFFER_CAPACITY: usize = 256;

// ============================================================================
// Actuation
// ============================================================================

/// Largest angle an actuator accepts, in degrees.
pub const MAX_ANGLE_DEGREES: u16 = 180;

// ============================================================================
// Timeouts
// ============================================================================

/// Default bound on a single passive-target detection wait, in milliseconds.
///
/// Callers that do not supply their own timeout through the configuration
/// get this bound; passing no timeout at the protocol level hands the wait
/// policy to the reader chip, which may block indefinitely.
pub const DEFAULT_DETECT_TIMEOUT_MS: u64 = 1000;
