//! Process-local broker with the same checkpoint semantics as the command log.
//!
//! Messages are kept per topic in publish order; each consumer group holds a
//! checkpoint per topic. Used by tests and by single-process setups that do
//! not need durability.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::debug;

use crate::domain::ports::{BrokerError, BrokerMessage, CommandBroker, CommandSource, Delivery};

#[derive(Debug, Default)]
struct BrokerLog {
    topics: HashMap<String, Vec<BrokerMessage>>,
    checkpoints: HashMap<(String, String), i64>,
}

#[derive(Debug, Default)]
struct Shared {
    log: Mutex<BrokerLog>,
    published: Notify,
}

impl Shared {
    fn lock(&self) -> Result<MutexGuard<'_, BrokerLog>, BrokerError> {
        self.log
            .lock()
            .map_err(|_| BrokerError::unavailable("in-memory broker lock poisoned"))
    }
}

/// In-memory implementation of the broker ports.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCommandBroker {
    shared: Arc<Shared>,
}

impl InMemoryCommandBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a consumer for `topic` on behalf of `consumer_group`.
    pub fn consumer(
        &self,
        topic: impl Into<String>,
        consumer_group: impl Into<String>,
    ) -> InMemoryCommandConsumer {
        InMemoryCommandConsumer {
            shared: Arc::clone(&self.shared),
            topic: topic.into(),
            consumer_group: consumer_group.into(),
        }
    }

    /// Every message published on `topic`, in order.
    pub fn published(&self, topic: &str) -> Result<Vec<BrokerMessage>, BrokerError> {
        let log = self.shared.lock()?;
        Ok(log.topics.get(topic).cloned().unwrap_or_default())
    }

    /// Rewind a consumer group so that `offset` is delivered again.
    pub fn redeliver_from(
        &self,
        topic: &str,
        consumer_group: &str,
        offset: i64,
    ) -> Result<(), BrokerError> {
        let mut log = self.shared.lock()?;
        log.checkpoints
            .insert((consumer_group.to_owned(), topic.to_owned()), offset.max(0));
        drop(log);
        self.shared.published.notify_waiters();
        Ok(())
    }
}

#[async_trait]
impl CommandBroker for InMemoryCommandBroker {
    async fn publish(&self, topic: &str, message: BrokerMessage) -> Result<(), BrokerError> {
        let mut log = self.shared.lock()?;
        let messages = log.topics.entry(topic.to_owned()).or_default();
        messages.push(message);
        debug!(topic, offset = messages.len() - 1, "message appended");
        drop(log);
        self.shared.published.notify_waiters();
        Ok(())
    }
}

/// Consumer bound to one topic and consumer group.
#[derive(Debug, Clone)]
pub struct InMemoryCommandConsumer {
    shared: Arc<Shared>,
    topic: String,
    consumer_group: String,
}

impl InMemoryCommandConsumer {
    fn checkpoint_key(&self) -> (String, String) {
        (self.consumer_group.clone(), self.topic.clone())
    }

    /// Return the next unacknowledged message without waiting.
    pub fn try_next_message(&self) -> Result<Option<Delivery>, BrokerError> {
        let log = self.shared.lock()?;
        let checkpoint = log
            .checkpoints
            .get(&self.checkpoint_key())
            .copied()
            .unwrap_or(0);
        let Ok(position) = usize::try_from(checkpoint) else {
            return Ok(None);
        };
        Ok(log
            .topics
            .get(&self.topic)
            .and_then(|messages| messages.get(position))
            .map(|message| Delivery {
                topic: self.topic.clone(),
                offset: checkpoint,
                message: message.clone(),
            }))
    }
}

#[async_trait]
impl CommandSource for InMemoryCommandConsumer {
    async fn next_message(&self) -> Result<Delivery, BrokerError> {
        loop {
            let published = self.shared.published.notified();
            if let Some(delivery) = self.try_next_message()? {
                return Ok(delivery);
            }
            published.await;
        }
    }

    async fn acknowledge(&self, delivery: &Delivery) -> Result<(), BrokerError> {
        let mut log = self.shared.lock()?;
        log.checkpoints
            .insert(self.checkpoint_key(), delivery.offset.saturating_add(1));
        Ok(())
    }
}
