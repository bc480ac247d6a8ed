//! Startup routine.
//!
//! Order matters: pins are configured first, the queue and its consumer
//! exist before the interrupt can fire, and the network comes last.
//! Everything fallible that does no I/O on the board is resolved before the
//! first task is spawned.

use std::sync::Arc;
use std::time::Duration;

use lc_gpio::{EdgeTrigger, GpioDriver, GpioResult, PinControl, PinId, Subsystem};
use lc_mqtt_channel::{MqttChannel, credentials};
use rumqttc::EventLoop;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::AgentConfig;
use crate::dispatcher::Dispatcher;
use crate::edge::{ConsumerReport, EdgeContext, EventQueue, consumer};
use crate::error::StartupResult;
use crate::mqtt_loop;
use crate::router::{LightControlHandler, TopicRouter};

/// A running controller.
///
/// The edge callback stays registered with the driver for the process
/// lifetime. After [`Device::shutdown`] edges still toggle the output but
/// their events are dropped.
pub struct Device<G: GpioDriver> {
    pins: Arc<PinControl<G>>,
    edge: Arc<EdgeContext>,
    cancel: CancellationToken,
    consumer: JoinHandle<ConsumerReport>,
    mqtt: Option<JoinHandle<()>>,
}

/// Bring the controller up on `gpio`.
///
/// Must be called from within a tokio runtime. On error nothing is left
/// running.
pub fn boot<G: GpioDriver + 'static>(
    config: &AgentConfig,
    gpio: Arc<G>,
) -> StartupResult<Device<G>> {
    config.validate()?;

    // ── Pins ────────────────────────────────────────────────────
    let pins = Arc::new(PinControl::bind(gpio.clone(), &config.pins.bindings())?);
    tracing::info!(
        edge_input = %config.pins.edge_input(),
        edge_output = %config.pins.edge_output(),
        light_output = %config.pins.light_output(),
        "pins configured"
    );

    // ── Edge queue + interrupt context ──────────────────────────
    let (sender, receiver) = EventQueue::bounded(config.edge.queue_capacity)?;
    let edge = Arc::new(EdgeContext::new(
        pins.input(config.pins.edge_input())?,
        pins.output(config.pins.edge_output(), Subsystem::EdgePipeline)?,
        sender,
    ));

    // ── Control channel (resolved now, connects once spawned) ───
    let control = if config.mqtt.enabled {
        let router = control_router(config, &pins)?;
        let (channel, eventloop) = connect(config)?;
        Some((channel, eventloop, router))
    } else {
        tracing::info!("MQTT control channel disabled");
        None
    };

    // ── Consumer task ───────────────────────────────────────────
    let cancel = CancellationToken::new();
    let consumer = tokio::spawn({
        let pins = pins.clone();
        let cancel = cancel.clone();
        async move { consumer::run(receiver, &pins, cancel).await }
    });
    tracing::info!(
        capacity = config.edge.queue_capacity,
        "edge consumer started"
    );

    // ── Interrupt service ───────────────────────────────────────
    if let Err(e) = arm_edge_interrupt(gpio.as_ref(), &edge, config.pins.edge_input()) {
        cancel.cancel();
        return Err(e.into());
    }
    tracing::info!(pin = %config.pins.edge_input(), "edge interrupt armed");

    // ── Network ─────────────────────────────────────────────────
    let mqtt = control.map(|(channel, eventloop, router)| {
        let delay = Duration::from_secs(config.mqtt.reconnect_delay_secs);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let mut dispatcher = Dispatcher::new(&channel, router);
            mqtt_loop::run(eventloop, &mut dispatcher, delay, cancel).await;
        })
    });

    Ok(Device {
        pins,
        edge,
        cancel,
        consumer,
        mqtt,
    })
}

/// Router for the control channel: the light control topic, driving the
/// light output and answering on the status topic.
pub fn control_router<G: GpioDriver + 'static>(
    config: &AgentConfig,
    pins: &PinControl<G>,
) -> StartupResult<TopicRouter> {
    let light = pins.output(config.pins.light_output(), Subsystem::ControlChannel)?;
    Ok(TopicRouter::new().with_route(
        config.control_topic(),
        LightControlHandler::new(light, config.status_topic()),
    ))
}

/// Resolve credentials and build the client. No network traffic happens
/// until the event loop is polled.
fn connect(config: &AgentConfig) -> StartupResult<(MqttChannel, EventLoop)> {
    let provider = credentials::from_config(&config.mqtt)?;
    let params = provider.connection_params(&config.device, &config.region)?;
    tracing::info!(
        host = %params.host,
        port = params.port,
        client_id = %params.client_id,
        tls = params.tls,
        "MQTT connection parameters resolved"
    );
    Ok(MqttChannel::new(&params, &config.mqtt)?)
}

fn arm_edge_interrupt<G: GpioDriver>(
    gpio: &G,
    edge: &Arc<EdgeContext>,
    input: PinId,
) -> GpioResult<()> {
    gpio.install_interrupt_service()?;
    let handler = edge.clone();
    gpio.register_edge_callback(
        input,
        EdgeTrigger::Rising,
        Box::new(move |line| handler.on_edge(line)),
    )
}

impl<G: GpioDriver> Device<G> {
    pub fn pins(&self) -> &Arc<PinControl<G>> {
        &self.pins
    }

    pub fn edge_context(&self) -> &Arc<EdgeContext> {
        &self.edge
    }

    pub fn control_channel_enabled(&self) -> bool {
        self.mqtt.is_some()
    }

    /// Resolves when the MQTT task ends. Never resolves if the control
    /// channel is disabled.
    pub async fn control_channel_stopped(&mut self) {
        match self.mqtt.as_mut() {
            Some(task) => {
                if let Err(e) = task.await {
                    tracing::error!(error = %e, "MQTT task failed");
                }
                self.mqtt = None;
            }
            None => std::future::pending().await,
        }
    }

    /// Stop both tasks and wait for them.
    pub async fn shutdown(self) -> ConsumerReport {
        self.cancel.cancel();

        if let Some(task) = self.mqtt {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "MQTT task failed");
            }
        }

        match self.consumer.await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "edge consumer task failed");
                ConsumerReport::default()
            }
        }
    }
}
