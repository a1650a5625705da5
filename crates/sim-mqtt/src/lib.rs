//! MQTT broker adapter for mqtt-sim.
//!
//! [`MqttBrokerAdapter`] implements the runtime's [`BrokerAdapter`] trait on
//! top of `rumqttc`. One adapter owns one client connection:
//!
//! ```text
//!   SimulationEngine
//!        │ publish(topic, payload, qos, retain)
//!        ▼
//! ┌──────────────────┐   requests   ┌──────────────────┐
//! │    AsyncClient   │ ───────────► │    EventLoop     │ ──► broker
//! │ (adapter-owned)  │              │ (background task)│
//! └──────────────────┘              └──────────────────┘
//! ```
//!
//! `connect()` polls the event loop until the broker's `ConnAck`, then moves
//! it into a tokio task that keeps the connection alive. A successful publish
//! means the request was queued for the event loop.
//!
//! # Example
//!
//! ```rust,ignore
//! use sim_mqtt::MqttBrokerAdapter;
//!
//! let engine = SimulationEngine::new(brokers, streams, MqttBrokerAdapter::factory(), renderer);
//! ```
//!
//! [`BrokerAdapter`]: sim_runtime::BrokerAdapter

pub mod adapter;
pub mod error;

pub use adapter::{
    client_id_for, mqtt_options, qos_from_level, MqttBrokerAdapter, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_PUBLISH_TIMEOUT,
};
pub use error::MqttAdapterError;
