//! Bounded event queue between the interrupt handler and the consumer task.
//!
//! Slot storage is a fixed `heapless` ring allocated once in
//! [`EventQueue::bounded`]. The producer half only ever calls `try_send`,
//! which never allocates or waits. A full queue drops the event and bumps a
//! shared counter. The consumer parks on a `tokio::sync::Notify`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use heapless::mpmc::MpMcQueue;
use lc_gpio::{Level, PinId};
use tokio::sync::Notify;

use crate::error::{StartupError, StartupResult};

/// Largest configurable queue capacity. Size of the preallocated ring.
pub const MAX_QUEUE_CAPACITY: usize = 64;

/// One qualifying edge as seen from interrupt context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    pub line_id: PinId,
    /// Input level sampled inside the interrupt.
    pub observed_level: Level,
}

struct Shared {
    slots: MpMcQueue<EdgeEvent, MAX_QUEUE_CAPACITY>,
    capacity: usize,
    /// Events enqueued and not yet fully dequeued. Never exceeds `capacity`.
    len: AtomicUsize,
    dropped: AtomicU64,
    senders: AtomicUsize,
    receiver_alive: AtomicBool,
    ready: Notify,
}

impl Shared {
    /// Claim one unit of capacity.
    fn reserve(&self) -> bool {
        self.len
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |len| {
                (len < self.capacity).then_some(len + 1)
            })
            .is_ok()
    }
}

/// Constructor for the queue halves.
pub struct EventQueue;

impl EventQueue {
    /// Create a queue holding at most `capacity` undelivered events.
    pub fn bounded(capacity: usize) -> StartupResult<(IsrSender, EventReceiver)> {
        if !(1..=MAX_QUEUE_CAPACITY).contains(&capacity) {
            return Err(StartupError::Config(format!(
                "edge event queue capacity must be between 1 and {MAX_QUEUE_CAPACITY} (got {capacity})"
            )));
        }
        let shared = Arc::new(Shared {
            slots: MpMcQueue::new(),
            capacity,
            len: AtomicUsize::new(0),
            dropped: AtomicU64::new(0),
            senders: AtomicUsize::new(1),
            receiver_alive: AtomicBool::new(true),
            ready: Notify::new(),
        });
        Ok((
            IsrSender {
                shared: shared.clone(),
            },
            EventReceiver { shared },
        ))
    }
}

/// Interrupt-side producer.
pub struct IsrSender {
    shared: Arc<Shared>,
}

impl IsrSender {
    /// Enqueue without waiting. Returns `false` when the event was dropped.
    pub fn try_send(&self, event: EdgeEvent) -> bool {
        let shared = &*self.shared;
        if shared.receiver_alive.load(Ordering::Acquire) && shared.reserve() {
            // A reserved slot is always free: `len` is released only after
            // the consumer has finished reading.
            if shared.slots.enqueue(event).is_ok() {
                shared.ready.notify_one();
                return true;
            }
            shared.len.fetch_sub(1, Ordering::AcqRel);
        }
        shared.dropped.fetch_add(1, Ordering::Relaxed);
        false
    }

    /// Events dropped since the queue was created.
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

impl Clone for IsrSender {
    fn clone(&self) -> Self {
        self.shared.senders.fetch_add(1, Ordering::Relaxed);
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl Drop for IsrSender {
    fn drop(&mut self) {
        if self.shared.senders.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.ready.notify_one();
        }
    }
}

impl std::fmt::Debug for IsrSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsrSender")
            .field("capacity", &self.shared.capacity)
            .field("dropped", &self.dropped())
            .finish_non_exhaustive()
    }
}

/// Task-side consumer.
pub struct EventReceiver {
    shared: Arc<Shared>,
}

impl EventReceiver {
    /// Wait for the next event. `None` once every sender is gone and the
    /// queue is drained.
    pub async fn recv(&mut self) -> Option<EdgeEvent> {
        loop {
            if let Some(event) = self.try_recv() {
                return Some(event);
            }
            if self.shared.senders.load(Ordering::Acquire) == 0 {
                return self.try_recv();
            }
            self.shared.ready.notified().await;
        }
    }

    pub fn try_recv(&mut self) -> Option<EdgeEvent> {
        let event = self.shared.slots.dequeue()?;
        self.shared.len.fetch_sub(1, Ordering::AcqRel);
        Some(event)
    }

    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for EventReceiver {
    fn drop(&mut self) {
        self.shared.receiver_alive.store(false, Ordering::Release);
    }
}
