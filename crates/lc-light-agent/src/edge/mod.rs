//! Edge-event pipeline.
//!
//! A rising edge on the input runs [`EdgeContext::on_edge`] in interrupt
//! context: the output flips to the parity of the edge count and an
//! [`EdgeEvent`] is offered to the bounded queue. The [`consumer`] task
//! drains the queue and does the logging.
//!
//! Delivery is at-most-once and best-effort. Under burst input the queue
//! fills and further events are dropped; the toggle itself is never
//! skipped. Processing latency is bounded only by task scheduling.

pub mod consumer;
pub mod queue;

use std::sync::atomic::{AtomicU32, Ordering};

use lc_gpio::{InputHandle, Level, OutputHandle, PinId};

pub use consumer::ConsumerReport;
pub use queue::{EdgeEvent, EventQueue, EventReceiver, IsrSender, MAX_QUEUE_CAPACITY};

/// State shared between the registered interrupt callback and the rest of
/// the controller.
///
/// Created once at boot and kept alive by `Arc` for the process lifetime.
/// Every field is touched from interrupt context, so only atomics and
/// interrupt-safe handles live here.
#[derive(Debug)]
pub struct EdgeContext {
    input: InputHandle,
    output: OutputHandle,
    sender: IsrSender,
    edges: AtomicU32,
}

impl EdgeContext {
    pub fn new(input: InputHandle, output: OutputHandle, sender: IsrSender) -> Self {
        Self {
            input,
            output,
            sender,
            edges: AtomicU32::new(0),
        }
    }

    /// Interrupt handler body. No allocation, no waiting, no logging.
    ///
    /// Expects the driver to deliver edges for one pin one at a time.
    pub fn on_edge(&self, line: PinId) {
        let count = self.edges.fetch_add(1, Ordering::AcqRel).wrapping_add(1);
        self.output.set(Level::from_parity(count));

        let observed_level = self.input.level();
        // Queue full: the event is counted as dropped by the sender.
        let _ = self.sender.try_send(EdgeEvent {
            line_id: line,
            observed_level,
        });
    }

    /// Edges handled so far (wraps at `u32::MAX`).
    pub fn edges(&self) -> u32 {
        self.edges.load(Ordering::Acquire)
    }

    pub fn dropped(&self) -> u64 {
        self.sender.dropped()
    }

    pub fn input_pin(&self) -> PinId {
        self.input.pin()
    }

    pub fn output_pin(&self) -> PinId {
        self.output.pin()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lc_gpio::{
        EdgeTrigger, GpioDriver, IsrGpio, MockGpio, PinBinding, PinControl, Subsystem,
    };

    use super::*;

    const INPUT: PinId = PinId(33);
    const OUTPUT: PinId = PinId(32);

    fn armed(capacity: usize) -> (Arc<MockGpio>, Arc<EdgeContext>, EventReceiver) {
        let gpio = Arc::new(MockGpio::new());
        let pins = PinControl::bind(
            gpio.clone(),
            &[
                PinBinding::input(33),
                PinBinding::output(32, Subsystem::EdgePipeline),
            ],
        )
        .unwrap();
        let (tx, rx) = EventQueue::bounded(capacity).unwrap();
        let ctx = Arc::new(EdgeContext::new(
            pins.input(INPUT).unwrap(),
            pins.output(OUTPUT, Subsystem::EdgePipeline).unwrap(),
            tx,
        ));
        gpio.install_interrupt_service().unwrap();
        let handler = ctx.clone();
        gpio.register_edge_callback(
            INPUT,
            EdgeTrigger::Rising,
            Box::new(move |line| handler.on_edge(line)),
        )
        .unwrap();
        (gpio, ctx, rx)
    }

    #[test]
    fn output_follows_edge_parity() {
        let (gpio, ctx, _rx) = armed(16);
        assert_eq!(gpio.level(OUTPUT), Level::Low);
        for n in 1..=7u32 {
            gpio.pulse(INPUT);
            assert_eq!(ctx.edges(), n);
            assert_eq!(gpio.level(OUTPUT), Level::from_parity(n));
        }
    }

    #[test]
    fn falling_edges_ignored() {
        let (gpio, ctx, mut rx) = armed(4);
        gpio.drive_input(INPUT, Level::High);
        gpio.drive_input(INPUT, Level::Low);
        gpio.drive_input(INPUT, Level::Low);
        assert_eq!(ctx.edges(), 1);
        assert!(rx.try_recv().is_some());
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn event_carries_line_and_sampled_level() {
        let (gpio, _ctx, mut rx) = armed(4);
        gpio.drive_input(INPUT, Level::High);
        assert_eq!(
            rx.try_recv(),
            Some(EdgeEvent {
                line_id: INPUT,
                observed_level: Level::High,
            })
        );
    }

    #[test]
    fn toggle_continues_when_queue_full() {
        let (gpio, ctx, _rx) = armed(2);
        for _ in 0..5 {
            gpio.pulse(INPUT);
        }
        assert_eq!(ctx.edges(), 5);
        assert_eq!(ctx.dropped(), 3);
        assert_eq!(gpio.level(OUTPUT), Level::High);
        assert_eq!(gpio.writes(OUTPUT), 5);
    }
}
