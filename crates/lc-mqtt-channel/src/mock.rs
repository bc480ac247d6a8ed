//! In-memory `Channel` for tests.
//!
//! Keeps every publish and subscribe call for later assertions. Publishes
//! and subscribes can be made to fail independently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rumqttc::QoS;

use crate::channel::Channel;
use crate::error::{MqttError, MqttResult};

/// One `publish` call as the channel saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

/// Recording channel. Calls that fail by injection leave no record.
pub struct MockChannel {
    published: Mutex<Vec<PublishedMessage>>,
    subscriptions: Mutex<Vec<(String, QoS)>>,
    fail_publish: AtomicBool,
    fail_subscribe: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            fail_publish: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
        }
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        lock(&self.published).clone()
    }

    /// Every `(filter, qos)` subscribed, in call order.
    pub fn subscriptions(&self) -> Vec<(String, QoS)> {
        lock(&self.subscriptions).clone()
    }

    pub fn last_published(&self) -> Option<PublishedMessage> {
        lock(&self.published).last().cloned()
    }

    pub fn published_to(&self, topic: &str) -> Vec<PublishedMessage> {
        lock(&self.published)
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Subscribe calls made for exactly `filter`.
    pub fn subscription_count(&self, filter: &str) -> usize {
        lock(&self.subscriptions)
            .iter()
            .filter(|(f, _)| f == filter)
            .count()
    }

    pub fn is_subscribed_to(&self, filter: &str) -> bool {
        self.subscription_count(filter) > 0
    }

    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    pub fn fail_subscribes(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Forget recorded calls. Failure injection is left as is.
    pub fn reset(&self) {
        lock(&self.published).clear();
        lock(&self.subscriptions).clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for MockChannel {
    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> MqttResult<()> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(MqttError::Publish("mock publish failure".into()));
        }
        lock(&self.published).push(PublishedMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos,
            retain,
        });
        Ok(())
    }

    async fn subscribe(&self, filter: &str, qos: QoS) -> MqttResult<()> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(MqttError::Subscribe("mock subscribe failure".into()));
        }
        lock(&self.subscriptions).push((filter.to_string(), qos));
        Ok(())
    }
}
