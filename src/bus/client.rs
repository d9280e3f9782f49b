//! MQTT bus client — subscription side of the bridge plus the publish handle.
//!
//! [`BusClient`] owns the one long-lived broker connection. Lifecycle:
//!
//! ```text
//! Connecting ──CONNACK──▶ Connected ──poll error──▶ Disconnected
//!     ▲                                                  │
//!     └──────────────── fixed 5 s delay ◀────────────────┘
//! ```
//!
//! Retries are an explicit infinite loop — no retry cap, no backoff growth,
//! no recursion. The subscription is re-issued on every CONNACK, so a
//! reconnect automatically restores it. Inbound payloads are decoded and
//! handed to the pipeline over a bounded queue; a full queue drops the
//! message with a warning instead of stalling keepalive handling.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, Packet, QoS};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::config::BusConfig;
use crate::intent::TranscriptionMessage;

/// MQTT keepalive interval for the broker connection.
pub const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Fixed wait between reconnection attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

const CLIENT_ID: &str = "voice-intent-bridge";

/// Capacity of rumqttc's internal request channel (subscribe/publish ops).
const REQUEST_CHANNEL_CAPACITY: usize = 10;

// ---------------------------------------------------------------------------
// BusError
// ---------------------------------------------------------------------------

/// Errors surfaced by bus operations.
#[derive(Debug, Error)]
pub enum BusError {
    /// The publish request could not be handed to the connection task.
    #[error("MQTT publish failed: {0}")]
    Publish(String),
}

// ---------------------------------------------------------------------------
// BusPublisher trait
// ---------------------------------------------------------------------------

/// Outbound side of the bus, injected into the pipeline as
/// `Arc<dyn BusPublisher>` so extraction can be tested without a broker.
#[async_trait]
pub trait BusPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError>;
}

/// Publishes with QoS 1 (at-least-once). Retransmission of unacknowledged
/// deliveries is owned by the connection task; a failure here means the
/// request never reached it and is logged by the caller, not retried.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

#[async_trait]
impl BusPublisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| BusError::Publish(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ConnectionState
// ---------------------------------------------------------------------------

/// Connection lifecycle state, tracked for logging and inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

// ---------------------------------------------------------------------------
// BusAction
// ---------------------------------------------------------------------------

/// What an inbound packet asks the client to do.
#[derive(Debug)]
enum BusAction {
    /// CONNACK received — (re)establish the inbound subscription.
    Resubscribe,
    /// A decodable transcription arrived.
    Deliver(TranscriptionMessage),
    /// Payload was not a transcription; log and move on.
    Drop(String),
    /// Protocol traffic of no interest (pings, acks, …).
    Ignore,
}

fn action_for_packet(packet: &Packet) -> BusAction {
    match packet {
        Packet::ConnAck(_) => BusAction::Resubscribe,
        Packet::Publish(publish) => match decode_transcription(&publish.payload) {
            Ok(message) => BusAction::Deliver(message),
            Err(e) => BusAction::Drop(format!(
                "invalid transcription payload on {}: {e}",
                publish.topic
            )),
        },
        _ => BusAction::Ignore,
    }
}

/// Decode an inbound payload. Payloads that are not JSON, or that lack the
/// `text` key, are rejected here and dropped by the caller.
fn decode_transcription(payload: &[u8]) -> Result<TranscriptionMessage, serde_json::Error> {
    serde_json::from_slice(payload)
}

// ---------------------------------------------------------------------------
// BusClient
// ---------------------------------------------------------------------------

/// Owns the broker connection and feeds decoded transcriptions into the
/// pipeline queue.
///
/// Create with [`BusClient::new`], spawn the pipeline worker, then call
/// [`run`](Self::run) — it never returns.
pub struct BusClient {
    client: AsyncClient,
    eventloop: EventLoop,
    topic_text: String,
    queue: mpsc::Sender<TranscriptionMessage>,
    state: ConnectionState,
}

impl BusClient {
    /// Build the client and its paired publish handle.
    ///
    /// No network traffic happens here — the connection is first attempted
    /// when [`run`](Self::run) starts polling.
    pub fn new(
        config: &BusConfig,
        queue: mpsc::Sender<TranscriptionMessage>,
    ) -> (Self, MqttPublisher) {
        let mut options = MqttOptions::new(CLIENT_ID, config.host.clone(), config.port);
        options.set_keep_alive(KEEP_ALIVE);

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);
        let publisher = MqttPublisher {
            client: client.clone(),
        };

        let bus = Self {
            client,
            eventloop,
            topic_text: config.topic_text.clone(),
            queue,
            state: ConnectionState::Connecting,
        };

        (bus, publisher)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------

    /// Drive the connection forever.
    ///
    /// Polling yields broker traffic and connection failures alike; failures
    /// put the client into `Disconnected`, wait [`RECONNECT_DELAY`], and let
    /// the next poll attempt a fresh connection. There is no terminal state —
    /// only process termination ends the loop.
    pub async fn run(mut self) {
        log::info!("bus: starting event loop, inbound topic {}", self.topic_text);
        loop {
            let event = self.eventloop.poll().await;
            self.handle_event(event).await;
        }
    }

    // -----------------------------------------------------------------------
    // Event handling
    // -----------------------------------------------------------------------

    async fn handle_event(&mut self, event: Result<Event, ConnectionError>) {
        match event {
            Ok(Event::Incoming(packet)) => self.handle_packet(&packet).await,
            Ok(Event::Outgoing(_)) => {}
            Err(e) => {
                match self.state {
                    ConnectionState::Connected => log::warn!("bus: connection lost: {e}"),
                    _ => log::warn!("bus: connect failed: {e}"),
                }
                self.state = ConnectionState::Disconnected;

                tokio::time::sleep(RECONNECT_DELAY).await;

                self.state = ConnectionState::Connecting;
                log::info!("bus: retrying connection");
            }
        }
    }

    async fn handle_packet(&mut self, packet: &Packet) {
        match action_for_packet(packet) {
            BusAction::Resubscribe => {
                self.state = ConnectionState::Connected;
                log::info!("bus: connected, subscribing to {}", self.topic_text);
                if let Err(e) = self
                    .client
                    .subscribe(self.topic_text.as_str(), QoS::AtLeastOnce)
                    .await
                {
                    log::error!("bus: subscribe to {} failed: {e}", self.topic_text);
                }
            }
            BusAction::Deliver(message) => match self.queue.try_send(message) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    log::warn!("bus: work queue full, dropping transcription");
                }
                Err(TrySendError::Closed(_)) => {
                    log::error!("bus: work queue closed, dropping transcription");
                }
            },
            BusAction::Drop(reason) => log::warn!("bus: {reason}"),
            BusAction::Ignore => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rumqttc::{ConnAck, ConnectReturnCode, Publish};

    fn make_config() -> BusConfig {
        BusConfig {
            host: "localhost".into(),
            port: 1883,
            topic_text: "voice/text".into(),
            topic_intent: "voice/intent".into(),
        }
    }

    fn make_client(queue_capacity: usize) -> (BusClient, mpsc::Receiver<TranscriptionMessage>) {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let (bus, _publisher) = BusClient::new(&make_config(), tx);
        (bus, rx)
    }

    fn connack() -> Packet {
        Packet::ConnAck(ConnAck {
            session_present: false,
            code: ConnectReturnCode::Success,
        })
    }

    fn publish_packet(payload: &str) -> Packet {
        Packet::Publish(Publish::new(
            "voice/text",
            QoS::AtLeastOnce,
            payload.as_bytes().to_vec(),
        ))
    }

    // -----------------------------------------------------------------------
    // Payload decoding
    // -----------------------------------------------------------------------

    #[test]
    fn decodes_valid_transcription() {
        let message = decode_transcription(br#"{"text":"turn on the light"}"#).unwrap();
        assert_eq!(message.text, "turn on the light");
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(decode_transcription(b"not json at all").is_err());
    }

    #[test]
    fn rejects_payload_without_text_key() {
        assert!(decode_transcription(br#"{"speech":"hello"}"#).is_err());
    }

    #[test]
    fn accepts_empty_text() {
        // Empty transcriptions are valid payloads; the pipeline skips them.
        let message = decode_transcription(br#"{"text":""}"#).unwrap();
        assert_eq!(message.text, "");
    }

    // -----------------------------------------------------------------------
    // Packet classification
    // -----------------------------------------------------------------------

    #[test]
    fn connack_requests_resubscribe() {
        assert!(matches!(action_for_packet(&connack()), BusAction::Resubscribe));
    }

    #[test]
    fn valid_publish_requests_delivery() {
        let action = action_for_packet(&publish_packet(r#"{"text":"hi"}"#));
        match action {
            BusAction::Deliver(message) => assert_eq!(message.text, "hi"),
            other => panic!("expected Deliver, got {other:?}"),
        }
    }

    #[test]
    fn malformed_publish_is_dropped() {
        let action = action_for_packet(&publish_packet("{{{"));
        assert!(matches!(action, BusAction::Drop(_)));
    }

    #[test]
    fn ping_traffic_is_ignored() {
        assert!(matches!(
            action_for_packet(&Packet::PingResp),
            BusAction::Ignore
        ));
    }

    // -----------------------------------------------------------------------
    // Connection state machine
    // -----------------------------------------------------------------------

    #[test]
    fn reconnect_delay_is_five_seconds() {
        assert_eq!(RECONNECT_DELAY, Duration::from_secs(5));
    }

    #[test]
    fn keepalive_is_sixty_seconds() {
        assert_eq!(KEEP_ALIVE, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn connack_moves_client_to_connected() {
        let (mut bus, _rx) = make_client(4);
        assert_eq!(bus.state(), ConnectionState::Connecting);

        bus.handle_event(Ok(Event::Incoming(connack()))).await;

        assert_eq!(bus.state(), ConnectionState::Connected);
    }

    /// A poll failure must drop to `Disconnected`, wait the fixed delay, and
    /// come back up as `Connecting` for the next attempt.
    #[tokio::test(start_paused = true)]
    async fn poll_failure_waits_then_retries() {
        let (mut bus, _rx) = make_client(4);
        bus.handle_event(Ok(Event::Incoming(connack()))).await;
        assert_eq!(bus.state(), ConnectionState::Connected);

        let before = tokio::time::Instant::now();
        let error = ConnectionError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "broker went away",
        ));
        bus.handle_event(Err(error)).await;

        assert_eq!(bus.state(), ConnectionState::Connecting);
        assert!(before.elapsed() >= RECONNECT_DELAY);
    }

    /// Reconnecting delivers a fresh CONNACK, which re-issues the
    /// subscription.
    #[tokio::test(start_paused = true)]
    async fn reconnect_resubscribes_on_new_connack() {
        let (mut bus, _rx) = make_client(4);

        let error = ConnectionError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        bus.handle_event(Err(error)).await;
        assert_eq!(bus.state(), ConnectionState::Connecting);

        bus.handle_event(Ok(Event::Incoming(connack()))).await;
        assert_eq!(bus.state(), ConnectionState::Connected);
    }

    // -----------------------------------------------------------------------
    // Delivery into the work queue
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn valid_payload_reaches_the_queue() {
        let (mut bus, mut rx) = make_client(4);

        bus.handle_packet(&publish_packet(r#"{"text":"play music"}"#))
            .await;

        let message = rx.try_recv().unwrap();
        assert_eq!(message.text, "play music");
    }

    #[tokio::test]
    async fn malformed_payload_never_reaches_the_queue() {
        let (mut bus, mut rx) = make_client(4);

        bus.handle_packet(&publish_packet("not json")).await;
        bus.handle_packet(&publish_packet(r#"{"no_text":1}"#)).await;

        assert!(rx.try_recv().is_err());
    }

    /// A full queue drops the message instead of blocking the network loop.
    #[tokio::test]
    async fn full_queue_drops_without_blocking() {
        let (mut bus, mut rx) = make_client(1);

        bus.handle_packet(&publish_packet(r#"{"text":"first"}"#)).await;
        bus.handle_packet(&publish_packet(r#"{"text":"second"}"#)).await;

        assert_eq!(rx.try_recv().unwrap().text, "first");
        assert!(rx.try_recv().is_err());
    }
}
