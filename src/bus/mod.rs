//! MQTT bus layer: connection lifecycle, inbound decoding, outbound publish.

pub mod client;

pub use client::{
    BusClient, BusError, BusPublisher, ConnectionState, MqttPublisher, KEEP_ALIVE, RECONNECT_DELAY,
};
