//! Common types shared across the peripheral layer.
//!
//! This module defines the outcome enumerations produced by the discovery
//! protocol and the tag-read protocol, the decoded firmware identification,
//! and the diagnostics record the manager keeps about the most recent read.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of probing one bus address for a peripheral.
///
/// Exactly one value is produced per probe. `AbsentAck` and `BusFault` are
/// both "not usable", but callers treat them differently: an absent
/// peripheral is an expected configuration and stays silent, while a bus
/// fault points at wiring or protocol trouble and is worth surfacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeResult {
    /// A target acknowledged the address.
    Present,

    /// The address went unacknowledged: nothing is installed there.
    AbsentAck,

    /// The bus is not initialized or reported a transport-level fault.
    BusFault,
}

impl ProbeResult {
    /// Check if the probed peripheral is present and usable.
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present)
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Present => "Present",
            Self::AbsentAck => "AbsentAck",
            Self::BusFault => "BusFault",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one tag-read attempt, delivered through the status callback.
///
/// Exactly one value is produced per attempt; `Success` is additionally
/// followed by the payload callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadOutcome {
    /// No reader session is up; nothing was attempted.
    ReaderUnavailable,

    /// Detection ended (or timed out) without a passive target.
    NoTargetDetected,

    /// A target answered but its UID length is not 4 or 7 bytes.
    IncompatibleTarget,

    /// The target is not a member of the supported secure tag family.
    WrongTagFamily,

    /// The tag's data file read back zero bytes.
    EmptyFilePayload,

    /// The file was read; the payload callback carries its contents.
    Success,
}

impl ReadOutcome {
    /// Check if this outcome is the success case.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ReadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ReaderUnavailable => "ReaderUnavailable",
            Self::NoTargetDetected => "NoTargetDetected",
            Self::IncompatibleTarget => "IncompatibleTarget",
            Self::WrongTagFamily => "WrongTagFamily",
            Self::EmptyFilePayload => "EmptyFilePayload",
            Self::Success => "Success",
        };
        write!(f, "{}", s)
    }
}

/// Decoded firmware identification of the tag-reader chip.
///
/// The chip reports a packed 32-bit word; the interesting fields are the IC
/// code and the major/minor firmware revision. A raw value of zero never
/// decodes: the session treats it as a failed bring-up step before this
/// type is ever constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareVersion {
    /// IC identification code (e.g. 0x32).
    pub ic: u8,

    /// Major firmware revision.
    pub major: u8,

    /// Minor firmware revision.
    pub minor: u8,
}

impl FirmwareVersion {
    /// Decode the packed firmware word reported by the chip.
    ///
    /// # Examples
    ///
    /// ```
    /// use tapgate_hardware::types::FirmwareVersion;
    ///
    /// let fw = FirmwareVersion::from_raw(0x3201_0607);
    /// assert_eq!(fw.ic, 0x32);
    /// assert_eq!(fw.major, 1);
    /// assert_eq!(fw.minor, 6);
    /// ```
    #[must_use]
    pub fn from_raw(raw: u32) -> Self {
        Self {
            ic: ((raw >> 24) & 0xFF) as u8,
            major: ((raw >> 16) & 0xFF) as u8,
            minor: ((raw >> 8) & 0xFF) as u8,
        }
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IC 0x{:02X} firmware {}.{}", self.ic, self.major, self.minor)
    }
}

/// Diagnostics record of the most recent tag-read attempt.
///
/// The manager keeps one of these per attempt so an operator can ask "what
/// happened last" without having hooked the callbacks. The payload itself is
/// never retained, only its size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRecord {
    /// Outcome reported through the status callback.
    pub outcome: ReadOutcome,

    /// Bytes handed to the payload callback (0 unless `Success`).
    pub bytes_read: usize,

    /// When the attempt finished.
    pub at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_result_display() {
        assert_eq!(ProbeResult::Present.to_string(), "Present");
        assert_eq!(ProbeResult::AbsentAck.to_string(), "AbsentAck");
        assert_eq!(ProbeResult::BusFault.to_string(), "BusFault");
        assert!(ProbeResult::Present.is_present());
        assert!(!ProbeResult::BusFault.is_present());
    }

    #[test]
    fn test_read_outcome_success() {
        assert!(ReadOutcome::Success.is_success());
        assert!(!ReadOutcome::NoTargetDetected.is_success());
        assert!(!ReadOutcome::ReaderUnavailable.is_success());
    }

    #[test]
    fn test_firmware_version_decode() {
        let fw = FirmwareVersion::from_raw(0x3201_0607);
        assert_eq!(fw.ic, 0x32);
        assert_eq!(fw.major, 1);
        assert_eq!(fw.minor, 6);
        assert_eq!(fw.to_string(), "IC 0x32 firmware 1.6");
    }

    #[test]
    fn test_probe_result_serialization() {
        let probe = ProbeResult::AbsentAck;
        let json = serde_json::to_string(&probe).unwrap();
        assert_eq!(json, "\"absent_ack\"");
        let back: ProbeResult = serde_json::from_str(&json).unwrap();
        assert_eq!(probe, back);
    }

    #[test]
    fn test_read_outcome_serialization() {
        let outcome = ReadOutcome::WrongTagFamily;
        let json = serde_json::to_string(&outcome).unwrap();
        assert_eq!(json, "\"wrong_tag_family\"");
        let back: ReadOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(outcome, back);
    }
}
