//! MQTT broker connection over `rumqttc`.
//!
//! The board talks MQTT 3.1.1 to the broker, normally over a `WebSocket`
//! (`ws://host:8083/mqtt`) so the same broker serves browser clients.
//! Plain TCP and TLS endpoints are accepted as well.
//!
//! # Event Loop
//!
//! `rumqttc` splits a connection into an [`AsyncClient`] (request queue)
//! and an [`EventLoop`] that must be polled continuously. The event loop
//! runs in its own task and forwards the packets the board cares about as
//! [`TransportEvent`]s. When polling fails, the task reports the error,
//! waits the fixed reconnect period, and polls again; the next poll
//! reconnects. There is no backoff and no retry limit.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tableside_types::DeliveryQos;
use tokio::sync::mpsc;
use tracing::{debug, info};
use url::Url;

use crate::config::BoardConfig;
use crate::error::BoardError;
use crate::transport::{Connect, EVENT_CHANNEL_CAPACITY, Transport, TransportEvent};

/// Capacity of the `rumqttc` request queue.
const REQUEST_CHANNEL_CAPACITY: usize = 16;

/// Default path of the broker's `WebSocket` listener.
const DEFAULT_WS_PATH: &str = "/mqtt";

/// How the broker is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerScheme {
    /// MQTT over a plain `WebSocket` (`ws://`).
    Ws,
    /// MQTT over a TLS `WebSocket` (`wss://`).
    Wss,
    /// MQTT over plain TCP (`mqtt://` or `tcp://`).
    Tcp,
    /// MQTT over TLS (`mqtts://`, `ssl://` or `tls://`).
    Tls,
}

impl BrokerScheme {
    /// Port used when the URL does not name one.
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Ws => 80,
            Self::Wss => 443,
            Self::Tcp => 1883,
            Self::Tls => 8883,
        }
    }

    /// Whether the connection runs over a `WebSocket`.
    pub const fn is_websocket(self) -> bool {
        matches!(self, Self::Ws | Self::Wss)
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Ws => "ws",
            Self::Wss => "wss",
            Self::Tcp => "mqtt",
            Self::Tls => "mqtts",
        }
    }
}

/// Parsed broker address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    /// Transport scheme.
    pub scheme: BrokerScheme,
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// `WebSocket` path (`/mqtt` unless the URL names another one).
    pub path: String,
}

impl BrokerEndpoint {
    /// Parse a broker URL such as `ws://localhost:8083/mqtt`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Config`] if the URL is malformed or uses an
    /// unsupported scheme.
    pub fn parse(raw: &str) -> Result<Self, BoardError> {
        let url = Url::parse(raw)
            .map_err(|e| BoardError::Config(format!("invalid broker URL {raw}: {e}")))?;

        let scheme = match url.scheme() {
            "ws" => BrokerScheme::Ws,
            "wss" => BrokerScheme::Wss,
            "mqtt" | "tcp" => BrokerScheme::Tcp,
            "mqtts" | "ssl" | "tls" => BrokerScheme::Tls,
            other => {
                return Err(BoardError::Config(format!(
                    "unsupported broker scheme {other} in {raw}"
                )));
            }
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .unwrap_or("localhost")
            .to_owned();
        let port = url.port().unwrap_or_else(|| scheme.default_port());
        let path = match url.path() {
            "" | "/" => DEFAULT_WS_PATH.to_owned(),
            other => other.to_owned(),
        };

        Ok(Self {
            scheme,
            host,
            port,
            path,
        })
    }

    /// Full `WebSocket` URL with an explicit port, as `rumqttc` expects it.
    pub fn websocket_url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.scheme.as_str(),
            self.host,
            self.port,
            self.path
        )
    }

    /// Build `rumqttc` options for this endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Config`] if `client_id` would be rejected by the
    /// MQTT client (empty or starting with whitespace).
    pub fn mqtt_options(
        &self,
        client_id: &str,
        config: &BoardConfig,
    ) -> Result<MqttOptions, BoardError> {
        if client_id.is_empty() || client_id.starts_with(char::is_whitespace) {
            return Err(BoardError::Config(format!(
                "invalid MQTT client id {client_id:?}"
            )));
        }

        let mut options = if self.scheme.is_websocket() {
            MqttOptions::new(client_id, self.websocket_url(), self.port)
        } else {
            MqttOptions::new(client_id, self.host.clone(), self.port)
        };

        match self.scheme {
            BrokerScheme::Ws => {
                options.set_transport(rumqttc::Transport::Ws);
            }
            BrokerScheme::Wss => {
                options.set_transport(rumqttc::Transport::wss_with_default_config());
            }
            BrokerScheme::Tls => {
                options.set_transport(rumqttc::Transport::tls_with_default_config());
            }
            BrokerScheme::Tcp => {}
        }

        options
            .set_keep_alive(config.keep_alive)
            .set_clean_session(true);
        Ok(options)
    }
}

impl std::fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.scheme.is_websocket() {
            f.write_str(&self.websocket_url())
        } else {
            write!(f, "{}://{}:{}", self.scheme.as_str(), self.host, self.port)
        }
    }
}

/// Map a delivery level onto the `rumqttc` enum.
const fn to_mqtt_qos(qos: DeliveryQos) -> QoS {
    match qos {
        DeliveryQos::AtMostOnce => QoS::AtMostOnce,
        DeliveryQos::AtLeastOnce => QoS::AtLeastOnce,
        DeliveryQos::ExactlyOnce => QoS::ExactlyOnce,
    }
}

/// Outbound half of an MQTT connection.
#[derive(Clone)]
pub struct MqttTransport {
    client: AsyncClient,
}

impl Transport for MqttTransport {
    async fn subscribe(&self, topic: &str, qos: DeliveryQos) -> Result<(), BoardError> {
        self.client
            .subscribe(topic, to_mqtt_qos(qos))
            .await
            .map_err(|e| BoardError::Transport(format!("failed to subscribe to {topic}: {e}")))
    }

    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: DeliveryQos,
    ) -> Result<(), BoardError> {
        self.client
            .publish(topic, to_mqtt_qos(qos), false, payload)
            .await
            .map_err(|e| BoardError::Transport(format!("failed to publish to {topic}: {e}")))
    }

    async fn disconnect(&self) -> Result<(), BoardError> {
        self.client
            .disconnect()
            .await
            .map_err(|e| BoardError::Transport(format!("failed to disconnect: {e}")))
    }
}

impl std::fmt::Debug for MqttTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttTransport").finish_non_exhaustive()
    }
}

/// Opens [`MqttTransport`] connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct MqttConnector;

impl Connect for MqttConnector {
    type Transport = MqttTransport;

    fn connect(
        &self,
        config: &BoardConfig,
        client_id: &str,
    ) -> Result<(MqttTransport, mpsc::Receiver<TransportEvent>), BoardError> {
        let endpoint = BrokerEndpoint::parse(&config.broker_url)?;
        let options = endpoint.mqtt_options(client_id, config)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| BoardError::Transport(format!("no tokio runtime: {e}")))?;

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        runtime.spawn(drive_event_loop(eventloop, tx, config.reconnect_period));

        info!(broker = %endpoint, client_id = client_id, "MQTT client created");
        Ok((MqttTransport { client }, rx))
    }
}

/// Poll the `rumqttc` event loop until disconnected or nobody listens.
async fn drive_event_loop(
    mut eventloop: EventLoop,
    events: mpsc::Sender<TransportEvent>,
    reconnect_period: Duration,
) {
    let mut disconnecting = false;

    loop {
        let event = match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                debug!(session_present = ack.session_present, "MQTT ConnAck received");
                TransportEvent::Connected
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => TransportEvent::Message {
                topic: publish.topic,
                payload: publish.payload.to_vec(),
            },
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                debug!("MQTT disconnect sent");
                disconnecting = true;
                continue;
            }
            Ok(_) => continue,
            Err(e) if disconnecting => {
                debug!(error = %e, "MQTT connection closed after disconnect");
                break;
            }
            Err(e) => {
                if events.send(TransportEvent::Error(e.to_string())).await.is_err() {
                    break;
                }
                tokio::time::sleep(reconnect_period).await;
                continue;
            }
        };

        if events.send(event).await.is_err() {
            debug!("transport event receiver dropped, stopping MQTT event loop");
            break;
        }
    }

    if events.send(TransportEvent::Closed).await.is_err() {
        debug!("transport event receiver already gone, Closed not delivered");
    }
}
