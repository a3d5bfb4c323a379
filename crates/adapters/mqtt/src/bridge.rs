//! Broker session: owns the rumqttc event loop and feeds the scheduler.
//!
//! The loop never blocks on the engine. Every inbound publish is handed to
//! the scheduler's [`Submitter`]; if the queue is full the message is
//! dropped with a warning. Connection errors mark the session down, notify
//! the engine once per outage and back off before the client reconnects on
//! the next poll.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;

use mycohub_app::scheduler::{Job, Submitter};
use mycohub_domain::topic::SUBSCRIPTIONS;

use crate::config::MqttConfig;
use crate::publisher::MqttPublisher;

pub struct MqttBridge {
    client: AsyncClient,
    eventloop: EventLoop,
    connected: Arc<AtomicBool>,
    reconnect_delay: Duration,
}

impl MqttBridge {
    /// Create the client. Nothing touches the network until [`Self::spawn`].
    #[must_use]
    pub fn new(config: &MqttConfig) -> (Self, MqttPublisher) {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(config.keep_alive());
        let (client, eventloop) = AsyncClient::new(options, config.request_capacity.max(1));
        let connected = Arc::new(AtomicBool::new(false));

        let publisher = MqttPublisher::new(client.clone(), Arc::clone(&connected));
        let bridge = Self {
            client,
            eventloop,
            connected,
            reconnect_delay: config.reconnect_delay(),
        };
        (bridge, publisher)
    }

    /// Start polling the broker on the current tokio runtime.
    #[must_use]
    pub fn spawn(self, submitter: Submitter) -> BridgeHandle {
        let client = self.client.clone();
        let connected = Arc::clone(&self.connected);
        let task = tokio::spawn(self.run(submitter));
        BridgeHandle {
            client,
            connected,
            task,
        }
    }

    async fn run(mut self, submitter: Submitter) {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code == ConnectReturnCode::Success {
                        self.on_connected();
                    } else {
                        tracing::warn!(code = ?ack.code, "broker refused connection");
                    }
                }
                Ok(Event::Incoming(packet)) => {
                    if let Some(job) = job_for(&packet) {
                        forward(&submitter, job);
                    }
                }
                Ok(Event::Outgoing(_)) => {}
                Err(err) => {
                    if self.connected.swap(false, Ordering::SeqCst) {
                        tracing::warn!(error = %err, "broker connection lost");
                        forward(&submitter, Job::TransportLost);
                    } else {
                        tracing::debug!(error = %err, "broker unreachable");
                    }
                    tokio::time::sleep(self.reconnect_delay).await;
                }
            }
        }
    }

    fn on_connected(&self) {
        self.connected.store(true, Ordering::SeqCst);
        tracing::info!("connected to broker");
        for topic in SUBSCRIPTIONS {
            if let Err(err) = self.client.try_subscribe(topic, QoS::AtLeastOnce) {
                tracing::error!(topic, error = %err, "subscription failed");
            }
        }
    }
}

/// Handle on a running bridge.
pub struct BridgeHandle {
    client: AsyncClient,
    connected: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl BridgeHandle {
    /// Disconnect from the broker and stop polling.
    ///
    /// The publisher reports itself disconnected from here on, so late
    /// publishes fail fast instead of going into a dead request queue.
    pub async fn shutdown(self) {
        self.connected.store(false, Ordering::SeqCst);
        if let Err(err) = self.client.try_disconnect() {
            tracing::debug!(error = %err, "disconnect request not queued");
        }
        // Give the event loop a chance to flush the disconnect.
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.task.abort();
        tracing::info!("broker bridge stopped");
    }
}

/// The scheduler job for an inbound packet, if it carries application data.
fn job_for(packet: &Packet) -> Option<Job> {
    match packet {
        Packet::Publish(publish) => Some(Job::Message {
            topic: publish.topic.clone(),
            payload: publish.payload.to_vec(),
        }),
        _ => None,
    }
}

fn forward(submitter: &Submitter, job: Job) {
    if let Err(err) = submitter.submit(job) {
        tracing::warn!(error = %err, "scheduler rejected job, dropping it");
    }
}
