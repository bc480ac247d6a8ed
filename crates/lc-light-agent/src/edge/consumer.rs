//! Edge consumer task: the slow path for edge events.

use lc_gpio::{GpioDriver, PinControl};
use tokio_util::sync::CancellationToken;

use super::queue::EventReceiver;

/// Totals reported when the consumer stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerReport {
    pub processed: u64,
    pub dropped: u64,
}

/// Drain the edge queue until cancelled or until the queue closes.
///
/// Each event is logged with the level sampled in the interrupt and a fresh
/// snapshot of the pin. The two may differ if the input moved again before
/// the event was dequeued.
pub async fn run<G: GpioDriver + 'static>(
    mut events: EventReceiver,
    pins: &PinControl<G>,
    cancel: CancellationToken,
) -> ConsumerReport {
    let mut processed = 0u64;
    let mut reported_drops = 0u64;

    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("edge consumer cancelled");
                break;
            }
            event = events.recv() => match event {
                Some(event) => event,
                None => {
                    tracing::info!("edge queue closed");
                    break;
                }
            },
        };
        processed += 1;

        let dropped = events.dropped();
        if dropped > reported_drops {
            tracing::warn!(
                dropped = dropped - reported_drops,
                total_dropped = dropped,
                "edge queue full, events dropped"
            );
            reported_drops = dropped;
        }

        match pins.read_input(event.line_id) {
            Ok(level) => tracing::info!(
                pin = %event.line_id,
                observed = %event.observed_level,
                level = %level,
                "GPIO edge interrupt"
            ),
            Err(e) => tracing::warn!(
                pin = %event.line_id,
                error = %e,
                "edge event for unbound pin"
            ),
        }
    }

    let report = ConsumerReport {
        processed,
        dropped: events.dropped(),
    };
    tracing::info!(
        processed = report.processed,
        dropped = report.dropped,
        "edge consumer stopped"
    );
    report
}
