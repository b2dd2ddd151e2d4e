//! Producer side of the command pipeline.
//!
//! [`CommandEncoder`] turns a [`Command`] into a broker message and publishes
//! it on the configured topic. Publishing is fire-and-forget: the write API
//! has already answered its caller, so failures are logged and dropped.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};
use uuid::Uuid;

use super::command::{COMMAND_HEADER, Command};
use super::ports::{BrokerMessage, CommandBroker, CommandPublisher};

/// Publishes commands to a single broker topic.
#[derive(Clone)]
pub struct CommandEncoder {
    broker: Arc<dyn CommandBroker>,
    topic: String,
}

impl CommandEncoder {
    pub fn new(broker: Arc<dyn CommandBroker>, topic: impl Into<String>) -> Self {
        Self {
            broker,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        self.topic.as_str()
    }

    /// Build the broker message for `command`.
    ///
    /// The key is a fresh UUID v4 so the broker can spread messages; it is
    /// not a business idempotency token.
    pub fn encode(command: &Command) -> Result<BrokerMessage, serde_json::Error> {
        let payload = command.encode()?;
        let headers = BTreeMap::from([(
            COMMAND_HEADER.to_owned(),
            command.name().as_str().to_owned(),
        )]);
        Ok(BrokerMessage {
            key: Uuid::new_v4().to_string(),
            headers,
            payload,
        })
    }
}

#[async_trait]
impl CommandPublisher for CommandEncoder {
    async fn send(&self, command: &Command) {
        let name = command.name();
        let message = match Self::encode(command) {
            Ok(message) => message,
            Err(err) => {
                error!(command = %name, error = %err, "failed to encode command");
                return;
            }
        };
        let key = message.key.clone();
        match self.broker.publish(&self.topic, message).await {
            Ok(()) => debug!(command = %name, %key, topic = %self.topic, "command published"),
            Err(err) => {
                error!(command = %name, %key, topic = %self.topic, error = %err, "failed to publish command");
            }
        }
    }
}
