//! MQTT event loop driver.
//!
//! Polls the rumqttc event loop, classifies each event and hands it to the
//! dispatcher. This task is the dispatcher's only caller, so exactly one
//! event is handled at a time.

use std::time::Duration;

use lc_mqtt_channel::{Channel, ChannelEvent, classify};
use rumqttc::EventLoop;
use tokio_util::sync::CancellationToken;

use crate::dispatcher::{ConnectionState, Dispatcher};

/// Drive the event loop until `cancel` fires.
///
/// rumqttc reconnects on the next poll after an error. Each error is
/// reported to the dispatcher, followed by `Disconnected` if the broker had
/// accepted the connection, then the loop waits `reconnect_delay` before polling again.
pub async fn run<C: Channel>(
    mut eventloop: EventLoop,
    dispatcher: &mut Dispatcher<'_, C>,
    reconnect_delay: Duration,
    cancel: CancellationToken,
) {
    dispatcher.handle_event(ChannelEvent::BeforeConnect).await;

    loop {
        let polled = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            polled = eventloop.poll() => polled,
        };

        match polled {
            Ok(event) => {
                if let Some(event) = classify(&event) {
                    dispatcher.handle_event(event).await;
                }
            }
            Err(e) => {
                dispatcher
                    .handle_event(ChannelEvent::Error(e.to_string()))
                    .await;
                if matches!(
                    dispatcher.state(),
                    ConnectionState::Connected | ConnectionState::Subscribed
                ) {
                    dispatcher.handle_event(ChannelEvent::Disconnected).await;
                }

                tracing::warn!(
                    delay_secs = reconnect_delay.as_secs_f32(),
                    "MQTT event loop error, reconnecting"
                );
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(reconnect_delay) => {}
                }
                dispatcher.handle_event(ChannelEvent::BeforeConnect).await;
            }
        }
    }

    tracing::info!("MQTT loop stopped");
}
