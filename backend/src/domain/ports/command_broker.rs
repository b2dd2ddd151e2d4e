//! Broker ports used by the command pipeline.
//!
//! [`CommandBroker`] is the producer side and [`CommandSource`] the consumer
//! side of a single topic. Delivery is at-least-once: a message is redelivered
//! until its offset is acknowledged for the consumer group.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by broker adapters.
    pub enum BrokerError {
        /// Broker infrastructure is unreachable.
        Unavailable { message: String } => "command broker is unavailable: {message}",
        /// The broker refused the operation.
        Rejected { message: String } => "command broker rejected the request: {message}",
    }
}

/// Message as written to and read from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    pub key: String,
    pub headers: BTreeMap<String, String>,
    pub payload: Vec<u8>,
}

impl BrokerMessage {
    /// Look up a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// A message handed to a consumer, positioned within its topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub topic: String,
    pub offset: i64,
    pub message: BrokerMessage,
}

/// Producer side of the broker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandBroker: Send + Sync {
    /// Publish one message and wait for the broker to accept it.
    async fn publish(&self, topic: &str, message: BrokerMessage) -> Result<(), BrokerError>;
}

/// Consumer side of the broker, bound to one topic and consumer group.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandSource: Send + Sync {
    /// Wait until the next unacknowledged message is available.
    async fn next_message(&self) -> Result<Delivery, BrokerError>;

    /// Commit the consumer position past `delivery`.
    async fn acknowledge(&self, delivery: &Delivery) -> Result<(), BrokerError>;
}
