//! Tag-reader session bring-up and read protocol.
//!
//! This module owns the contactless reader chip and drives its multi-step
//! initialization and single-read protocol.
//!
//! # Session states
//!
//! Bring-up walks `Uninitialized -> probing -> begin -> firmware check ->
//! secure configuration -> Ready`. The intermediate stages never escape:
//! publicly the session is either fully `Ready` or `Uninitialized`, and any
//! failed step drops everything acquired so far. The candidate chip lives in
//! a local until the last step succeeds, so a failed bring-up cannot leave a
//! half-configured chip behind.
//!
//! # Read protocol
//!
//! One read attempt is a fixed pipeline: passive-target detection (bounded
//! by the caller's timeout, or the chip's own wait policy without one), the
//! UID length gate (4- and 7-byte identifiers only), the secure-family
//! check, and the file read. Exactly one [`ReadOutcome`] is produced per
//! attempt; the payload lands in the caller's scratch buffer with a NUL
//! terminator at the byte count for safe string use downstream.

use crate::bus::BusHandle;
use crate::devices::AnyTagReaderChip;
use crate::traits::{TagReaderChip, TargetFamily};
use crate::types::{FirmwareVersion, ProbeResult, ReadOutcome};
use std::time::Duration;
use tapgate_core::types::BusAddress;
use tracing::{debug, info, warn};

/// Internal session state; `Ready` carries everything the read path needs.
#[derive(Debug, Default)]
enum SessionState {
    #[default]
    Uninitialized,
    Ready {
        chip: AnyTagReaderChip,
        firmware: FirmwareVersion,
    },
}

/// Owner of the tag-reader chip and its session lifecycle.
#[derive(Debug, Default)]
pub struct TagReaderSession {
    state: SessionState,
}

impl TagReaderSession {
    /// Create a session with no reader brought up.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the session is `Ready`.
    pub fn is_available(&self) -> bool {
        matches!(self.state, SessionState::Ready { .. })
    }

    /// Firmware identification of the ready chip, if any.
    pub fn firmware_version(&self) -> Option<FirmwareVersion> {
        match &self.state {
            SessionState::Ready { firmware, .. } => Some(*firmware),
            SessionState::Uninitialized => None,
        }
    }

    /// Bring the reader up: probe, begin, firmware check, secure config.
    ///
    /// Fails immediately if a session is already `Ready`, leaving it
    /// untouched. Every later failure path drops the candidate chip and
    /// leaves the session `Uninitialized`.
    pub async fn initialize(
        &mut self,
        mut chip: AnyTagReaderChip,
        bus: &mut BusHandle,
        address: BusAddress,
    ) -> bool {
        if self.is_available() {
            warn!("tag reader already initialized");
            return false;
        }

        match bus.probe(address).await {
            ProbeResult::Present => {}
            ProbeResult::AbsentAck => {
                debug!("no tag reader found on bus at {address}");
                return false;
            }
            ProbeResult::BusFault => {
                warn!("bus fault while locating tag reader at {address}");
                return false;
            }
        }

        if let Err(e) = chip.begin().await {
            warn!("tag reader begin sequence failed: {e}");
            return false;
        }

        let firmware = match chip.firmware_version().await {
            Ok(0) => {
                warn!("tag reader returned no firmware version data");
                return false;
            }
            Ok(raw) => FirmwareVersion::from_raw(raw),
            Err(e) => {
                warn!("tag reader firmware query failed: {e}");
                return false;
            }
        };

        if let Err(e) = chip.configure_secure_session().await {
            warn!("tag reader secure-session configuration failed: {e}");
            return false;
        }

        info!("tag reader ready at {address}: {firmware}");
        self.state = SessionState::Ready { chip, firmware };
        true
    }

    /// Drop the chip and return to `Uninitialized`.
    ///
    /// Returns whether a session was up.
    pub fn teardown(&mut self) -> bool {
        let was_ready = self.is_available();
        if was_ready {
            info!("tag reader session torn down");
        }
        self.state = SessionState::Uninitialized;
        was_ready
    }

    /// Run one read attempt into `buf`, reporting the outcome and the byte
    /// count read (nonzero only on [`ReadOutcome::Success`]).
    ///
    /// The final buffer byte is reserved so the NUL terminator written at
    /// the byte count always fits.
    pub async fn read_into(
        &mut self,
        timeout: Option<Duration>,
        buf: &mut [u8],
    ) -> (ReadOutcome, usize) {
        let SessionState::Ready { chip, .. } = &mut self.state else {
            debug!("tag read attempted with no reader session");
            return (ReadOutcome::ReaderUnavailable, 0);
        };

        let uid = match chip
            .detect_passive_target(TargetFamily::Iso14443a, timeout)
            .await
        {
            Ok(Some(uid)) => uid,
            Ok(None) => {
                debug!("no passive target detected");
                return (ReadOutcome::NoTargetDetected, 0);
            }
            Err(e) => {
                warn!("passive-target detection failed: {e}");
                return (ReadOutcome::NoTargetDetected, 0);
            }
        };

        if !uid.has_supported_length() {
            debug!("target UID {uid} has unsupported length {}", uid.len());
            return (ReadOutcome::IncompatibleTarget, 0);
        }

        match chip.is_secure_tag().await {
            Ok(true) => {}
            Ok(false) => {
                debug!("target {uid} is not a supported secure tag");
                return (ReadOutcome::WrongTagFamily, 0);
            }
            Err(e) => {
                warn!("secure-family check for {uid} failed: {e}");
                return (ReadOutcome::WrongTagFamily, 0);
            }
        }

        // Reserve the last byte for the terminator.
        let capacity = buf.len().saturating_sub(1);
        let count = match chip.read_secure_file(&mut buf[..capacity]).await {
            Ok(count) => count.min(capacity),
            Err(e) => {
                warn!("secure file read from {uid} failed: {e}");
                return (ReadOutcome::EmptyFilePayload, 0);
            }
        };
        if let Some(terminator) = buf.get_mut(count) {
            *terminator = 0;
        }

        if count == 0 {
            debug!("secure file on {uid} was empty");
            return (ReadOutcome::EmptyFilePayload, 0);
        }

        debug!("read {count} bytes from {uid}");
        (ReadOutcome::Success, count)
    }
}
