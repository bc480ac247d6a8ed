//! E2E tests for the edge pipeline: interrupt toggle, queue, consumer task.

mod helpers;

use lc_gpio::{IsrGpio, Level};

use helpers::{EDGE_INPUT, EDGE_OUTPUT, TestHarness};

/// After N rising edges the output equals N mod 2, whether or not the
/// consumer ran in between.
#[tokio::test]
async fn e2e_output_tracks_edge_parity() {
    let h = TestHarness::new();
    let mut delivered = 0u32;

    for burst in [1usize, 2, 3, 4] {
        h.pulse_edges(burst);
        delivered += burst as u32;
        assert_eq!(h.edge_output(), Level::from_parity(delivered));
        if burst % 2 == 0 {
            h.settle().await;
        }
    }

    h.settle().await;
    assert_eq!(h.device.edge_context().edges(), 10);
    let report = h.device.shutdown().await;
    assert_eq!(report.processed, 10);
    assert_eq!(report.dropped, 0);
}

/// A burst beyond the queue capacity delivers exactly `capacity` events;
/// the rest are dropped while the output keeps toggling.
#[tokio::test]
async fn e2e_burst_beyond_capacity_drops() {
    let h = TestHarness::with_queue_capacity(10);

    // The current-thread runtime cannot run the consumer during this
    // synchronous burst.
    h.pulse_edges(25);
    assert_eq!(h.device.edge_context().edges(), 25);
    assert_eq!(h.device.edge_context().dropped(), 15);
    assert_eq!(h.edge_output(), Level::High);
    assert_eq!(h.gpio.writes(EDGE_OUTPUT), 25);

    h.settle().await;
    let report = h.device.shutdown().await;
    assert_eq!(report.processed, 10);
    assert_eq!(report.dropped, 15);
}

/// Once drained, the queue accepts a full burst again.
#[tokio::test]
async fn e2e_queue_recovers_after_drain() {
    let h = TestHarness::with_queue_capacity(4);

    h.pulse_edges(6);
    h.settle().await;
    h.pulse_edges(4);
    h.settle().await;

    assert_eq!(h.device.edge_context().dropped(), 2);
    let report = h.device.shutdown().await;
    assert_eq!(report.processed, 8);
}

/// Only rising edges count.
#[tokio::test]
async fn e2e_falling_edges_ignored() {
    let h = TestHarness::new();

    h.gpio.drive_input(EDGE_INPUT, Level::High);
    h.gpio.drive_input(EDGE_INPUT, Level::High);
    h.gpio.drive_input(EDGE_INPUT, Level::Low);
    h.gpio.drive_input(EDGE_INPUT, Level::Low);

    assert_eq!(h.device.edge_context().edges(), 1);
    assert_eq!(h.edge_output(), Level::High);
}

/// After shutdown the interrupt still toggles, but events go nowhere.
#[tokio::test]
async fn e2e_edges_after_shutdown_are_dropped() {
    let h = TestHarness::new();
    let edge = h.device.edge_context().clone();
    let report = h.device.shutdown().await;
    assert_eq!(report.processed, 0);

    h.gpio.pulse(EDGE_INPUT);
    assert_eq!(edge.edges(), 1);
    assert_eq!(edge.dropped(), 1);
    assert_eq!(h.gpio.level(EDGE_OUTPUT), Level::High);
}
