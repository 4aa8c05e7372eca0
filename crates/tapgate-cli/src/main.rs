//! Demo driver for the tapgate peripheral layer.
//!
//! Wires the mock bus, actuator, and tag reader into one peripheral manager
//! and walks a full cycle: bus bring-up, discovery, actuator attachment,
//! reader bring-up, a tag read, and the resulting pour actuation. Run with
//! `RUST_LOG=debug` to watch the peripheral layer's own logging.

use anyhow::Result;
use std::time::Duration;
use tapgate_core::constants::{DEFAULT_DETECT_TIMEOUT_MS, TAG_READER_ADDRESS};
use tapgate_core::types::{Angle, BusAddress, Pin};
use tapgate_hardware::devices::{AnyActuatorDriver, AnyBusTransport, AnyTagReaderChip};
use tapgate_hardware::manager::{PeripheralConfig, PeripheralManager};
use tapgate_hardware::mock::{MockActuator, MockBus, MockTagReader, PresentedTag};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Bus address the demo servo expander sits at.
const SERVO_ADDRESS: u8 = 0x40;

/// Pin the demo servo is attached on.
const SERVO_PIN: u8 = 13;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let servo_address = BusAddress::new(SERVO_ADDRESS)?;
    let reader_address = BusAddress::new(TAG_READER_ADDRESS)?;

    let mut manager = PeripheralManager::new(PeripheralConfig::default());

    // Populate the mock bus the way a bench unit is wired
    let (bus, bus_handle) = MockBus::new();
    bus_handle.add_device(servo_address);
    bus_handle.add_device(reader_address);

    anyhow::ensure!(
        manager.register_bus(AnyBusTransport::Mock(bus)),
        "bus registration refused"
    );
    anyhow::ensure!(manager.init_bus().await, "bus bring-up failed");
    info!("bus session up");

    info!(
        "probe {servo_address}: {}",
        manager.probe(servo_address).await
    );
    info!(
        "probe {reader_address}: {}",
        manager.probe(reader_address).await
    );

    let (servo, servo_handle) = MockActuator::new();
    anyhow::ensure!(
        manager
            .attach_bus_actuator(AnyActuatorDriver::Mock(servo), servo_address, Pin::new(SERVO_PIN))
            .await,
        "actuator attach failed"
    );
    info!("actuator attached ({:?})", manager.actuator_kind());

    let (chip, chip_handle) = MockTagReader::new();
    anyhow::ensure!(
        manager.init_tag_reader(AnyTagReaderChip::Mock(chip)).await,
        "tag reader bring-up failed"
    );
    if let Some(firmware) = manager.reader_firmware() {
        info!("tag reader up: {firmware}");
    }

    // A patron badges in shortly after the read starts
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let tag = PresentedTag::new(
            vec![0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66],
            true,
            b"credit:00012".to_vec(),
        );
        let _ = chip_handle.present_tag(tag).await;
    });

    let mut payload = Vec::new();
    let ok = manager
        .read_tag(
            Some(Duration::from_millis(DEFAULT_DETECT_TIMEOUT_MS)),
            |outcome| info!("read outcome: {outcome}"),
            |bytes| payload = bytes.to_vec(),
        )
        .await;

    if ok {
        info!("tag payload: {}", String::from_utf8_lossy(&payload));
        manager.write_actuator(Angle::new(90)?).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        manager.write_actuator(Angle::new(0)?).await;
        info!("pour cycle complete, servo saw {} writes", servo_handle.write_count());
    }

    let stats = manager.stats();
    info!(
        "stats: bus_ready={} actuator_attached={} reader_ready={}",
        stats.bus_ready, stats.actuator_attached, stats.reader_ready
    );

    Ok(())
}
