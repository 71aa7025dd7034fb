//! Integration tests for the Wiegand reader driver.
//!
//! These tests run a [`WiegandReader`] against the mock controller and
//! cover line ownership, rollback of partial acquisition, completion timer
//! handling and the data-ready notification.

mod common;

use common::{D0, D1, Rig, ts};
use edgeio_core::{Error, Level, NoiseCode, WiegandReaderConfig, WiegandTiming};
use edgeio_decoder::WiegandReader;
use edgeio_hardware::mock::{MockClock, MockGpio};
use edgeio_hardware::{GpioController, LineDirection, OwnerToken, TokioScheduler};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_enable_acquires_lines() {
    let rig = Rig::new();
    let reader = rig.reader();
    assert!(!reader.is_enabled());
    assert_eq!(rig.gpio.owner(D0), None);

    reader.enable().unwrap();
    assert!(reader.is_enabled());
    for line in [D0, D1] {
        assert_eq!(rig.gpio.owner(line), Some(reader.owner()));
        assert_eq!(rig.gpio.direction_of(line), Some(LineDirection::Input));
        assert_eq!(rig.gpio.debounce_of(line), Some(0));
        assert_eq!(rig.gpio.interrupt_count(line), 1);
    }
}

#[test]
fn test_disable_is_idempotent() {
    let rig = Rig::new();
    let reader = rig.reader();
    reader.enable().unwrap();

    reader.disable();
    reader.disable();
    assert!(!reader.is_enabled());
    for line in [D0, D1] {
        assert_eq!(rig.gpio.owner(line), None);
        assert_eq!(rig.gpio.interrupt_count(line), 0);
    }
    assert!(matches!(reader.read_frame(), Err(Error::NotEnabled)));
}

#[test]
fn test_drop_releases_lines() {
    let rig = Rig::new();
    {
        let reader = rig.reader();
        reader.enable().unwrap();
        rig.pulse(D1, 0, 50);
        assert_eq!(rig.scheduler.pending_count(), 1);
    }
    assert_eq!(rig.gpio.owner(D0), None);
    assert_eq!(rig.gpio.interrupt_count(D1), 0);
    assert_eq!(rig.scheduler.pending_count(), 0);
}

#[test]
fn test_reenable_resets_without_reacquiring() {
    let rig = Rig::new();
    let reader = rig.reader();
    reader.enable().unwrap();
    rig.pulse(D0, 0, 5);

    reader.enable().unwrap();
    assert_eq!(reader.take_noise(), NoiseCode::None);
    assert_eq!(rig.gpio.interrupt_count(D0), 1);
}

#[test]
fn test_enable_busy_when_line_owned() {
    let rig = Rig::new();
    let other = OwnerToken::next();
    rig.gpio.claim(D1, other, LineDirection::Output).unwrap();

    let reader = rig.reader();
    let err = reader.enable().unwrap_err();
    assert!(err.is_busy());
    assert!(!reader.is_enabled());

    // Nothing was taken from D0, and D1 still belongs to its owner.
    assert_eq!(rig.gpio.owner(D0), None);
    assert_eq!(rig.gpio.owner(D1), Some(other));
    assert_eq!(rig.gpio.interrupt_count(D0), 0);
}

#[test]
fn test_enable_rolls_back_on_claim_failure() {
    let rig = Rig::new();
    rig.gpio.fail_claim_on(D1);

    let reader = rig.reader();
    let err = reader.enable().unwrap_err();
    assert!(matches!(err, Error::ResourceUnavailable(_)));
    assert_eq!(rig.gpio.owner(D0), None);

    rig.gpio.clear_failures();
    reader.enable().unwrap();
    assert!(reader.is_enabled());
}

#[test]
fn test_enable_rolls_back_on_interrupt_failure() {
    let rig = Rig::new();
    rig.gpio.fail_interrupt_on(D1);

    let reader = rig.reader();
    assert!(matches!(reader.enable(), Err(Error::ResourceUnavailable(_))));
    for line in [D0, D1] {
        assert_eq!(rig.gpio.owner(line), None);
        assert_eq!(rig.gpio.interrupt_count(line), 0);
    }
}

#[test]
fn test_enable_tolerates_missing_hardware_debounce() {
    let rig = Rig::new();
    rig.gpio.set_debounce_unsupported(true);

    let reader = rig.reader();
    reader.enable().unwrap();
    assert_eq!(rig.gpio.debounce_of(D0), None);
}

// ============================================================================
// Decoding through the controller
// ============================================================================

#[test]
fn test_frame_decoded_from_edges() {
    let rig = Rig::new();
    let reader = rig.reader();
    reader.enable().unwrap();

    rig.pulse(D0, 0, 50);
    rig.pulse(D1, 1_300, 60);
    assert!(reader.read_frame().unwrap_err().is_busy());

    rig.clock.set(4_100);
    let frame = reader.read_frame().unwrap();
    assert_eq!((frame.timestamp, frame.bit_count, frame.data), (ts(1_300), 2, 1));
}

#[test]
fn test_26_bit_frame() {
    let rig = Rig::new();
    let reader = rig.reader();
    reader.enable().unwrap();

    let bits = [
        1, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 0, 0, 1, 0, 0, 1,
    ];
    let last = rig.send_bits(&bits, 10_000);
    rig.scheduler.run_until(ts(last + 3_000));

    let frame = reader.read_frame().unwrap();
    assert_eq!(frame.bit_count, 26);
    assert_eq!(frame.data, 0b10000001_00000000_00110010_01);
    assert_eq!(frame.timestamp, ts(last));
}

#[test]
fn test_disabled_reader_ignores_edges() {
    let rig = Rig::new();
    let reader = rig.reader();
    reader.enable().unwrap();
    reader.disable();

    // Reclaim the line as a plain input and wiggle it.
    let owner = OwnerToken::next();
    rig.gpio.claim(D0, owner, LineDirection::Input).unwrap();
    rig.pulse(D0, 0, 50);
    rig.gpio.release(D0, owner);

    reader.enable().unwrap();
    rig.clock.set(10_000);
    assert_eq!(reader.read_frame().unwrap().bit_count, 0);
}

#[test]
fn test_spurious_interrupt_recorded_as_duplicate() {
    let rig = Rig::new();
    let reader = rig.reader();
    reader.enable().unwrap();

    rig.pulse(D1, 0, 50);
    rig.gpio.inject_edge(D1, Level::High, ts(70)).unwrap();

    assert_eq!(reader.take_noise(), NoiseCode::DuplicateEdge);
    assert_eq!(reader.take_noise(), NoiseCode::None);
    rig.clock.set(5_000);
    assert_eq!(reader.read_frame().unwrap().data, 1);
}

#[test]
fn test_threshold_setters() {
    let rig = Rig::new();
    let reader = rig.reader();
    reader.enable().unwrap();

    reader.set_pulse_width_min_us(20);
    reader.set_pulse_width_max_us(200);
    reader.set_pulse_interval_min_us(2_000);
    reader.set_pulse_interval_max_us(20_000);
    assert_eq!(
        reader.timing(),
        WiegandTiming {
            pulse_width_min_us: 20,
            pulse_width_max_us: 200,
            pulse_interval_min_us: 2_000,
            pulse_interval_max_us: 20_000,
        }
    );

    rig.pulse(D1, 0, 180);
    assert_eq!(reader.take_noise(), NoiseCode::None);
    rig.edge(D1, Level::Low, 1_500);
    assert_eq!(reader.take_noise(), NoiseCode::PulseTooEarly);
}

// ============================================================================
// Completion timer
// ============================================================================

#[test]
fn test_timer_rearmed_per_bit() {
    let rig = Rig::new();
    let reader = rig.reader();
    reader.enable().unwrap();
    let ready = reader.subscribe();

    rig.pulse(D0, 0, 50);
    assert_eq!(rig.scheduler.next_deadline(), Some(ts(2_701)));

    rig.pulse(D1, 1_500, 100);
    assert_eq!(rig.scheduler.pending_count(), 1);
    assert_eq!(rig.scheduler.next_deadline(), Some(ts(4_201)));

    assert_eq!(rig.scheduler.run_until(ts(4_200)), 0);
    assert!(!ready.has_changed().unwrap());

    assert_eq!(rig.scheduler.run_until(ts(4_201)), 1);
    assert_eq!(*ready.borrow(), 1);

    // Notified observers can read straight away.
    let frame = reader.read_frame().unwrap();
    assert_eq!((frame.bit_count, frame.data), (2, 0b01));
}

#[test]
fn test_noise_does_not_arm_timer() {
    let rig = Rig::new();
    let reader = rig.reader();
    reader.enable().unwrap();

    rig.pulse(D0, 0, 5);
    assert_eq!(rig.scheduler.pending_count(), 0);
    assert_eq!(reader.take_noise(), NoiseCode::PulseTooShort);
}

#[test]
fn test_disable_cancels_timer() {
    let rig = Rig::new();
    let reader = rig.reader();
    reader.enable().unwrap();
    let ready = reader.subscribe();

    rig.pulse(D1, 0, 50);
    reader.disable();
    assert_eq!(rig.scheduler.pending_count(), 0);
    assert_eq!(rig.scheduler.run_until(ts(100_000)), 0);
    assert_eq!(*ready.borrow(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_frame_ready_notification_on_tokio() {
    let gpio = MockGpio::with_lines([D0, D1]);
    let clock = MockClock::new();
    let config = WiegandReaderConfig {
        name: "wiegand".to_string(),
        d0: D0,
        d1: D1,
        timing: WiegandTiming::default(),
    };
    let reader = WiegandReader::new(
        &config,
        Arc::new(gpio.clone()),
        Arc::new(TokioScheduler::current().unwrap()),
        Arc::new(clock.clone()),
    );
    reader.enable().unwrap();
    let mut ready = reader.subscribe();

    gpio.set_level(D1, Level::Low, ts(0)).unwrap();
    gpio.set_level(D1, Level::High, ts(50)).unwrap();
    gpio.set_level(D0, Level::Low, ts(1_500)).unwrap();
    gpio.set_level(D0, Level::High, ts(1_550)).unwrap();

    tokio::time::timeout(Duration::from_secs(1), ready.changed())
        .await
        .expect("frame ready notification")
        .unwrap();
    assert_eq!(*ready.borrow_and_update(), 1);

    let frame = reader.read_frame_at(ts(4_300)).unwrap();
    assert_eq!((frame.bit_count, frame.data), (2, 0b10));
}
