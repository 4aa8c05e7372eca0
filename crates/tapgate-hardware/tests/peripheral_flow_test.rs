//! Integration tests for end-to-end peripheral flows.
//!
//! These tests exercise the complete controller-facing surface through the
//! `PeripheralManager`: bus bring-up and discovery, actuator attachment and
//! best-effort writes, tag-reader bring-up, and the dual-callback read
//! protocol, for both populated and absent-hardware configurations.

use std::time::Duration;

use tapgate_core::constants::TAG_READER_ADDRESS;
use tapgate_core::types::{Angle, BusAddress, Pin};
use tapgate_hardware::devices::{AnyActuatorDriver, AnyBusTransport, AnyTagReaderChip};
use tapgate_hardware::manager::{PeripheralConfig, PeripheralManager};
use tapgate_hardware::mock::{
    MockActuator, MockActuatorHandle, MockBus, MockBusHandle, MockTagReader, MockTagReaderHandle,
    PresentedTag,
};
use tapgate_hardware::types::{ProbeResult, ReadOutcome};

// ============================================================================
// Test Data Constants
// ============================================================================

/// Common test data used across multiple tests
mod test_data {
    /// Bus address a servo expander sits at in populated scenarios
    pub const SERVO_ADDRESS: u8 = 0x40;

    /// Pin the actuator is attached on
    pub const SERVO_PIN: u8 = 13;

    /// A double-size (7 byte) UID accepted by the length gate
    pub const UID_DOUBLE: [u8; 7] = [0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66];

    /// Payload used for successful read scenarios (12 bytes)
    pub const FILE_PAYLOAD: &[u8] = b"credit:00012";

    /// Detection timeout short enough to keep the suite fast
    pub const DETECT_TIMEOUT_MS: u64 = 50;
}

// ============================================================================
// Helpers
// ============================================================================

fn servo_address() -> BusAddress {
    BusAddress::new(test_data::SERVO_ADDRESS).unwrap()
}

fn reader_address() -> BusAddress {
    BusAddress::new(TAG_READER_ADDRESS).unwrap()
}

fn detect_timeout() -> Option<Duration> {
    Some(Duration::from_millis(test_data::DETECT_TIMEOUT_MS))
}

/// Manager with a registered, initialized mock bus.
async fn manager_with_bus() -> (PeripheralManager, MockBusHandle) {
    let mut manager = PeripheralManager::new(PeripheralConfig::default());
    let (bus, handle) = MockBus::new();
    assert!(manager.register_bus(AnyBusTransport::Mock(bus)));
    assert!(manager.init_bus().await);
    (manager, handle)
}

/// Manager with an initialized bus and a ready tag reader.
async fn manager_with_reader() -> (PeripheralManager, MockBusHandle, MockTagReaderHandle) {
    let (mut manager, bus_handle) = manager_with_bus().await;
    bus_handle.add_device(reader_address());

    let (chip, chip_handle) = MockTagReader::new();
    assert!(manager.init_tag_reader(AnyTagReaderChip::Mock(chip)).await);

    (manager, bus_handle, chip_handle)
}

fn mock_servo() -> (AnyActuatorDriver, MockActuatorHandle) {
    let (servo, handle) = MockActuator::new();
    (AnyActuatorDriver::Mock(servo), handle)
}

// ============================================================================
// Scenario A - No Bus Wired
// ============================================================================

#[tokio::test]
async fn test_bus_less_unit_initializes_but_probes_fault() {
    let config = PeripheralConfig {
        bus: None,
        ..PeripheralConfig::default()
    };
    let mut manager = PeripheralManager::new(config);

    // Bring-up is a no-op success on a bus-less unit
    assert!(manager.init_bus().await);

    // Every probe reports a bus fault
    assert_eq!(manager.probe(servo_address()).await, ProbeResult::BusFault);
    assert_eq!(manager.probe(reader_address()).await, ProbeResult::BusFault);
}

#[tokio::test]
async fn test_bus_less_unit_reader_bring_up_fails() {
    let config = PeripheralConfig {
        bus: None,
        ..PeripheralConfig::default()
    };
    let mut manager = PeripheralManager::new(config);
    manager.init_bus().await;

    let (chip, chip_handle) = MockTagReader::new();
    assert!(!manager.init_tag_reader(AnyTagReaderChip::Mock(chip)).await);
    assert!(!manager.reader_available());
    assert_eq!(chip_handle.begin_calls(), 0);
}

// ============================================================================
// Scenario B - Bus Present, Target Not Installed
// ============================================================================

#[tokio::test]
async fn test_absent_target_probe_and_attach() {
    let (mut manager, _bus_handle) = manager_with_bus().await;

    // Nothing installed at the servo address
    assert_eq!(manager.probe(servo_address()).await, ProbeResult::AbsentAck);

    let (servo, servo_handle) = mock_servo();
    let attached = manager
        .attach_bus_actuator(servo, servo_address(), Pin::new(test_data::SERVO_PIN))
        .await;

    assert!(!attached);
    assert!(!manager.actuator_available());
    assert!(!servo_handle.is_attached());
}

#[tokio::test]
async fn test_faulted_bus_attach_fails_without_driver_contact() {
    let (mut manager, bus_handle) = manager_with_bus().await;
    bus_handle.set_fault(servo_address());

    assert_eq!(manager.probe(servo_address()).await, ProbeResult::BusFault);

    let (servo, servo_handle) = mock_servo();
    let attached = manager
        .attach_bus_actuator(servo, servo_address(), Pin::new(test_data::SERVO_PIN))
        .await;

    assert!(!attached);
    assert!(!servo_handle.is_attached());
}

// ============================================================================
// Actuator Attachment and Dispatch
// ============================================================================

#[tokio::test]
async fn test_bus_actuator_full_flow() {
    let (mut manager, bus_handle) = manager_with_bus().await;
    bus_handle.add_device(servo_address());

    let (servo, servo_handle) = mock_servo();
    assert!(
        manager
            .attach_bus_actuator(servo, servo_address(), Pin::new(test_data::SERVO_PIN))
            .await
    );
    assert!(manager.actuator_available());

    manager.write_actuator(Angle::new(90).unwrap()).await;
    manager.write_actuator(Angle::new(0).unwrap()).await;

    assert_eq!(
        servo_handle.writes(),
        vec![Angle::new(90).unwrap(), Angle::new(0).unwrap()]
    );
}

#[tokio::test]
async fn test_second_actuator_refused_and_state_untouched() {
    let (mut manager, bus_handle) = manager_with_bus().await;
    bus_handle.add_device(servo_address());

    let (first, first_handle) = mock_servo();
    assert!(
        manager
            .attach_local_actuator(first, Pin::new(test_data::SERVO_PIN))
            .await
    );

    // A bus-addressed attach while a local one is held must fail
    let (second, second_handle) = mock_servo();
    assert!(
        !manager
            .attach_bus_actuator(second, servo_address(), Pin::new(14))
            .await
    );

    // And so must another local attach
    let (third, third_handle) = mock_servo();
    assert!(!manager.attach_local_actuator(third, Pin::new(15)).await);

    assert!(manager.actuator_available());
    assert_eq!(
        first_handle.attached_pin(),
        Some(Pin::new(test_data::SERVO_PIN))
    );
    assert!(!second_handle.is_attached());
    assert!(!third_handle.is_attached());
}

#[tokio::test]
async fn test_failed_local_attach_leaves_port_empty() {
    let mut manager = PeripheralManager::new(PeripheralConfig::default());

    let (servo, servo_handle) = mock_servo();
    servo_handle.set_fail_attach(true);

    assert!(
        !manager
            .attach_local_actuator(servo, Pin::new(test_data::SERVO_PIN))
            .await
    );
    assert!(!manager.actuator_available());
}

#[tokio::test]
async fn test_write_without_actuator_is_silent_no_op() {
    let mut manager = PeripheralManager::new(PeripheralConfig::default());

    // Never errors, never blocks
    manager.write_actuator(Angle::new(90).unwrap()).await;
    manager.write_actuator(Angle::new(180).unwrap()).await;
    assert!(!manager.actuator_available());
}

// ============================================================================
// Scenario C - Reader Present, Firmware Check Fails
// ============================================================================

#[tokio::test]
async fn test_reader_zero_firmware_aborts_bring_up() {
    let (mut manager, bus_handle) = manager_with_bus().await;
    bus_handle.add_device(reader_address());

    let (chip, chip_handle) = MockTagReader::new();
    chip_handle.set_firmware_raw(0);

    assert!(!manager.init_tag_reader(AnyTagReaderChip::Mock(chip)).await);
    assert!(!manager.reader_available());
    assert!(manager.reader_firmware().is_none());
    // Secure configuration must never have been attempted
    assert_eq!(chip_handle.secure_config_calls(), 0);
}

#[tokio::test]
async fn test_reader_double_initialize_refused() {
    let (mut manager, _bus_handle, _chip_handle) = manager_with_reader().await;

    let (second, second_handle) = MockTagReader::new();
    assert!(
        !manager
            .init_tag_reader(AnyTagReaderChip::Mock(second))
            .await
    );
    assert!(manager.reader_available());
    assert_eq!(second_handle.begin_calls(), 0);
}

// ============================================================================
// Scenario D - Successful Read with Dual Callbacks
// ============================================================================

#[tokio::test]
async fn test_successful_read_fires_both_callbacks_in_order() {
    let (mut manager, _bus_handle, chip_handle) = manager_with_reader().await;

    chip_handle
        .present_tag(PresentedTag::new(
            test_data::UID_DOUBLE.to_vec(),
            true,
            test_data::FILE_PAYLOAD.to_vec(),
        ))
        .await
        .unwrap();

    let mut statuses = Vec::new();
    let mut payloads = Vec::new();
    let ok = manager
        .read_tag(
            detect_timeout(),
            |outcome| statuses.push(outcome),
            |payload| payloads.push(payload.to_vec()),
        )
        .await;

    assert!(ok);
    // Status fires exactly once, result exactly once, status first
    assert_eq!(statuses, vec![ReadOutcome::Success]);
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].len(), 12);
    assert_eq!(payloads[0], test_data::FILE_PAYLOAD);

    let record = manager.last_read().unwrap();
    assert_eq!(record.outcome, ReadOutcome::Success);
    assert_eq!(record.bytes_read, 12);
}

#[tokio::test]
async fn test_scratch_buffer_reuse_across_reads() {
    let (mut manager, _bus_handle, chip_handle) = manager_with_reader().await;

    chip_handle
        .present_tag(PresentedTag::new(
            test_data::UID_DOUBLE.to_vec(),
            true,
            b"first-payload".to_vec(),
        ))
        .await
        .unwrap();

    let mut first = Vec::new();
    assert!(
        manager
            .read_tag(detect_timeout(), |_| {}, |p| first = p.to_vec())
            .await
    );

    chip_handle
        .present_tag(PresentedTag::new(
            vec![0x04, 0xAB, 0xCD, 0xEF],
            true,
            b"second".to_vec(),
        ))
        .await
        .unwrap();

    let mut second = Vec::new();
    assert!(
        manager
            .read_tag(detect_timeout(), |_| {}, |p| second = p.to_vec())
            .await
    );

    assert_eq!(first, b"first-payload");
    assert_eq!(second, b"second");
}

// ============================================================================
// Scenario E - Detection Timeout
// ============================================================================

#[tokio::test]
async fn test_detection_timeout_reports_no_target_once() {
    let (mut manager, _bus_handle, _chip_handle) = manager_with_reader().await;

    let mut statuses = Vec::new();
    let mut result_fired = false;
    let ok = manager
        .read_tag(
            detect_timeout(),
            |outcome| statuses.push(outcome),
            |_payload| result_fired = true,
        )
        .await;

    assert!(!ok);
    assert_eq!(statuses, vec![ReadOutcome::NoTargetDetected]);
    assert!(!result_fired);

    let record = manager.last_read().unwrap();
    assert_eq!(record.outcome, ReadOutcome::NoTargetDetected);
    assert_eq!(record.bytes_read, 0);
}

// ============================================================================
// Read Gates - UID Length and Tag Family
// ============================================================================

#[tokio::test]
async fn test_read_rejects_unsupported_uid_length() {
    let (mut manager, _bus_handle, chip_handle) = manager_with_reader().await;

    chip_handle
        .present_tag(PresentedTag::new(
            vec![0x04, 0x11, 0x22, 0x33, 0x44], // 5 bytes
            true,
            test_data::FILE_PAYLOAD.to_vec(),
        ))
        .await
        .unwrap();

    let mut statuses = Vec::new();
    let ok = manager
        .read_tag(detect_timeout(), |o| statuses.push(o), |_| {})
        .await;

    assert!(!ok);
    assert_eq!(statuses, vec![ReadOutcome::IncompatibleTarget]);
}

#[tokio::test]
async fn test_read_rejects_wrong_tag_family() {
    let (mut manager, _bus_handle, chip_handle) = manager_with_reader().await;

    chip_handle
        .present_tag(PresentedTag::new(
            test_data::UID_DOUBLE.to_vec(),
            false,
            test_data::FILE_PAYLOAD.to_vec(),
        ))
        .await
        .unwrap();

    let mut statuses = Vec::new();
    let ok = manager
        .read_tag(detect_timeout(), |o| statuses.push(o), |_| {})
        .await;

    assert!(!ok);
    assert_eq!(statuses, vec![ReadOutcome::WrongTagFamily]);
}

#[tokio::test]
async fn test_read_accepts_single_size_uid() {
    let (mut manager, _bus_handle, chip_handle) = manager_with_reader().await;

    chip_handle
        .present_tag(PresentedTag::new(
            vec![0x04, 0xAB, 0xCD, 0xEF], // 4 bytes
            true,
            b"ok".to_vec(),
        ))
        .await
        .unwrap();

    let mut statuses = Vec::new();
    assert!(
        manager
            .read_tag(detect_timeout(), |o| statuses.push(o), |_| {})
            .await
    );
    assert_eq!(statuses, vec![ReadOutcome::Success]);
}

#[tokio::test]
async fn test_read_empty_file_payload() {
    let (mut manager, _bus_handle, chip_handle) = manager_with_reader().await;

    chip_handle
        .present_tag(PresentedTag::new(
            test_data::UID_DOUBLE.to_vec(),
            true,
            Vec::new(),
        ))
        .await
        .unwrap();

    let mut statuses = Vec::new();
    let mut result_fired = false;
    let ok = manager
        .read_tag(
            detect_timeout(),
            |o| statuses.push(o),
            |_| result_fired = true,
        )
        .await;

    assert!(!ok);
    assert_eq!(statuses, vec![ReadOutcome::EmptyFilePayload]);
    assert!(!result_fired);
}

// ============================================================================
// Independent Manager Instances
// ============================================================================

#[tokio::test]
async fn test_two_managers_do_not_share_state() {
    let (mut first, bus_handle) = manager_with_bus().await;
    bus_handle.add_device(servo_address());

    let (servo, _servo_handle) = mock_servo();
    assert!(
        first
            .attach_bus_actuator(servo, servo_address(), Pin::new(test_data::SERVO_PIN))
            .await
    );

    // A second controller instance starts from scratch
    let second = PeripheralManager::new(PeripheralConfig::default());
    assert!(!second.actuator_available());
    assert!(!second.reader_available());
    assert!(first.actuator_available());
}
