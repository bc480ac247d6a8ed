//! Transport event classification.
//!
//! Maps raw `rumqttc` events onto the small set of connection lifecycle
//! events the control dispatcher reacts to. Events with no meaning for the
//! dispatcher (pings, acks for QoS 2 flows) classify to `None`.

use rumqttc::{ConnectReturnCode, Event, Outgoing, Packet, SubscribeReasonCode};

/// Packet identifier assigned by the transport, used only for logging.
pub type RequestId = u16;

/// A connection lifecycle or data event delivered to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The transport is about to (re)open the connection.
    BeforeConnect,
    /// The broker accepted the connection.
    Connected,
    /// The connection is gone; subscriptions are no longer valid.
    Disconnected,
    /// A subscribe request left the device.
    SubscribeRequested(RequestId),
    /// A publish left the device.
    PublishRequested(RequestId),
    Subscribed(RequestId),
    Unsubscribed(RequestId),
    Published(RequestId),
    /// A message arrived on a subscribed topic.
    Data { topic: String, payload: Vec<u8> },
    Error(String),
}

/// Classify a raw transport event.
pub fn classify(event: &Event) -> Option<ChannelEvent> {
    match event {
        Event::Incoming(Packet::ConnAck(ack)) => match &ack.code {
            ConnectReturnCode::Success => Some(ChannelEvent::Connected),
            code => Some(ChannelEvent::Error(format!(
                "connection refused: {code:?}"
            ))),
        },
        Event::Incoming(Packet::Disconnect) => Some(ChannelEvent::Disconnected),
        Event::Incoming(Packet::SubAck(ack)) => {
            if ack
                .return_codes
                .iter()
                .any(|code| matches!(code, SubscribeReasonCode::Failure))
            {
                Some(ChannelEvent::Error(format!(
                    "subscription rejected, msg_id={}",
                    ack.pkid
                )))
            } else {
                Some(ChannelEvent::Subscribed(ack.pkid))
            }
        }
        Event::Incoming(Packet::UnsubAck(ack)) => Some(ChannelEvent::Unsubscribed(ack.pkid)),
        Event::Incoming(Packet::PubAck(ack)) => Some(ChannelEvent::Published(ack.pkid)),
        Event::Incoming(Packet::Publish(publish)) => Some(ChannelEvent::Data {
            topic: publish.topic.clone(),
            payload: publish.payload.to_vec(),
        }),
        Event::Outgoing(Outgoing::Subscribe(pkid)) => {
            Some(ChannelEvent::SubscribeRequested(*pkid))
        }
        Event::Outgoing(Outgoing::Publish(pkid)) => Some(ChannelEvent::PublishRequested(*pkid)),
        _ => None,
    }
}
