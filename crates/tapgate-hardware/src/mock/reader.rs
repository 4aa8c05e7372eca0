//! Mock tag-reader chip for testing and development.
//!
//! This module provides a simulated reader chip. Tags are presented through
//! a control handle, and every bring-up step (begin, firmware answer,
//! secure-session configuration) is individually scriptable so each failure
//! path of the session state machine can be exercised.

use crate::{
    Result,
    traits::{TagReaderChip, TagUid, TargetFamily},
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;

/// Default firmware word the mock chip answers with (IC 0x32, firmware 1.6).
pub const DEFAULT_MOCK_FIRMWARE: u32 = 0x3201_0640;

/// A tag scripted onto the mock reader's field.
#[derive(Debug, Clone)]
pub struct PresentedTag {
    /// Raw UID the chip reports on detection.
    pub uid: TagUid,

    /// Whether the tag identifies as the supported secure family.
    pub secure: bool,

    /// Contents of the tag's data file.
    pub file: Vec<u8>,
}

impl PresentedTag {
    /// Create a tag presentation from raw parts.
    #[must_use]
    pub fn new(uid: Vec<u8>, secure: bool, file: Vec<u8>) -> Self {
        Self {
            uid: TagUid::new(uid),
            secure,
            file,
        }
    }
}

/// Scripted bring-up behavior shared between the chip and its handle.
#[derive(Debug)]
struct ReaderScript {
    /// Whether `begin` succeeds.
    begin_ok: bool,

    /// Raw firmware word the chip answers with (0 = chip answers garbage).
    firmware_raw: u32,

    /// Whether secure-session configuration succeeds.
    secure_config_ok: bool,

    /// Number of `begin` calls observed.
    begin_calls: usize,

    /// Number of `configure_secure_session` calls observed.
    secure_config_calls: usize,
}

/// Mock tag-reader chip for testing and development.
///
/// Tags are presented through the [`MockTagReaderHandle`]; detection blocks
/// until one arrives (bounded by the supplied timeout, exactly like the real
/// chip's wait policy).
///
/// # Examples
///
/// ```
/// use tapgate_hardware::mock::{MockTagReader, PresentedTag};
/// use tapgate_hardware::traits::{TagReaderChip, TargetFamily};
///
/// #[tokio::main]
/// async fn main() -> tapgate_hardware::Result<()> {
///     let (mut chip, handle) = MockTagReader::new();
///
///     handle
///         .present_tag(PresentedTag::new(
///             vec![0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66],
///             true,
///             b"credit:12".to_vec(),
///         ))
///         .await?;
///
///     let uid = chip
///         .detect_passive_target(TargetFamily::Iso14443a, None)
///         .await?
///         .expect("tag was presented");
///     assert_eq!(uid.len(), 7);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTagReader {
    /// Channel receiver for tag presentations.
    tag_rx: mpsc::Receiver<PresentedTag>,

    /// Most recently detected tag; target of the family/file queries.
    current: Option<PresentedTag>,

    /// Scripted bring-up behavior.
    script: Arc<Mutex<ReaderScript>>,
}

impl MockTagReader {
    /// Create a new mock reader chip with default (all-success) scripting.
    ///
    /// Returns a tuple of (MockTagReader, MockTagReaderHandle) where the
    /// handle presents tags and scripts the bring-up steps.
    pub fn new() -> (Self, MockTagReaderHandle) {
        let (tag_tx, tag_rx) = mpsc::channel(32);
        let script = Arc::new(Mutex::new(ReaderScript {
            begin_ok: true,
            firmware_raw: DEFAULT_MOCK_FIRMWARE,
            secure_config_ok: true,
            begin_calls: 0,
            secure_config_calls: 0,
        }));

        let chip = Self {
            tag_rx,
            current: None,
            script: Arc::clone(&script),
        };
        let handle = MockTagReaderHandle { tag_tx, script };

        (chip, handle)
    }

    fn lock(&self) -> MutexGuard<'_, ReaderScript> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TagReaderChip for MockTagReader {
    async fn begin(&mut self) -> Result<()> {
        let mut script = self.lock();
        script.begin_calls += 1;
        if !script.begin_ok {
            return Err(crate::HardwareError::initialization_failed(
                "mock chip begin refused",
            ));
        }
        Ok(())
    }

    async fn firmware_version(&mut self) -> Result<u32> {
        Ok(self.lock().firmware_raw)
    }

    async fn configure_secure_session(&mut self) -> Result<()> {
        let mut script = self.lock();
        script.secure_config_calls += 1;
        if !script.secure_config_ok {
            return Err(crate::HardwareError::configuration(
                "mock secure-session configuration refused",
            ));
        }
        Ok(())
    }

    async fn detect_passive_target(
        &mut self,
        _family: TargetFamily,
        timeout: Option<Duration>,
    ) -> Result<Option<TagUid>> {
        let received = match timeout {
            Some(bound) => match tokio::time::timeout(bound, self.tag_rx.recv()).await {
                Ok(tag) => tag,
                // Wait bounded out without a presentation
                Err(_) => return Ok(None),
            },
            None => self.tag_rx.recv().await,
        };

        let tag = received
            .ok_or_else(|| crate::HardwareError::disconnected("tag presentation channel closed"))?;
        let uid = tag.uid.clone();
        self.current = Some(tag);
        Ok(Some(uid))
    }

    async fn is_secure_tag(&mut self) -> Result<bool> {
        self.current
            .as_ref()
            .map(|tag| tag.secure)
            .ok_or_else(|| crate::HardwareError::invalid_data("no target detected"))
    }

    async fn read_secure_file(&mut self, buf: &mut [u8]) -> Result<usize> {
        let tag = self
            .current
            .as_ref()
            .ok_or_else(|| crate::HardwareError::invalid_data("no target detected"))?;

        let count = tag.file.len().min(buf.len());
        buf[..count].copy_from_slice(&tag.file[..count]);
        Ok(count)
    }
}

/// Handle for controlling a mock tag-reader chip.
///
/// Can be cloned and kept after the chip has been handed to the peripheral
/// manager.
#[derive(Debug, Clone)]
pub struct MockTagReaderHandle {
    /// Channel sender for tag presentations.
    tag_tx: mpsc::Sender<PresentedTag>,

    /// Scripted bring-up behavior.
    script: Arc<Mutex<ReaderScript>>,
}

impl MockTagReaderHandle {
    fn lock(&self) -> MutexGuard<'_, ReaderScript> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Present a tag to the reader's field.
    ///
    /// The next detection call (pending or future) consumes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the chip has been dropped and the channel is closed.
    pub async fn present_tag(&self, tag: PresentedTag) -> Result<()> {
        self.tag_tx
            .send(tag)
            .await
            .map_err(|_| crate::HardwareError::disconnected("tag presentation channel closed"))
    }

    /// Script whether the chip's `begin` sequence succeeds.
    pub fn set_begin_ok(&self, ok: bool) {
        self.lock().begin_ok = ok;
    }

    /// Script the raw firmware word the chip answers with (0 simulates a
    /// chip that did not respond meaningfully).
    pub fn set_firmware_raw(&self, raw: u32) {
        self.lock().firmware_raw = raw;
    }

    /// Script whether secure-session configuration succeeds.
    pub fn set_secure_config_ok(&self, ok: bool) {
        self.lock().secure_config_ok = ok;
    }

    /// Number of `begin` calls the chip has seen.
    pub fn begin_calls(&self) -> usize {
        self.lock().begin_calls
    }

    /// Number of secure-session configuration calls the chip has seen.
    pub fn secure_config_calls(&self) -> usize {
        self.lock().secure_config_calls
    }
}
