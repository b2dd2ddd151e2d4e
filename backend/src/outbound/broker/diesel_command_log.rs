//! PostgreSQL command log acting as the message broker.
//!
//! Producers append rows to `command_log`; the sequence column orders them
//! within a topic. Appends to one topic are serialised by a transaction-level
//! advisory lock, so rows become visible in sequence order and a consumer
//! never moves its checkpoint past a row that has yet to commit.
//!
//! Consumers keep one checkpoint per consumer group in `consumer_offsets` and
//! read the oldest row at or after it. A consumer group has a single owner:
//! the consumer holds a session advisory lock on (group, topic) over its own
//! connection, and other instances stand by until that session ends. A row
//! stays deliverable until the checkpoint moves past it, which gives
//! at-least-once delivery across restarts.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Bool, Text, Timestamptz};
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use mockable::Clock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::ports::{BrokerError, BrokerMessage, CommandBroker, CommandSource, Delivery};
use crate::outbound::persistence::diesel_error_mapping::{map_diesel_error, map_pool_error};
use crate::outbound::persistence::models::{CommandLogRow, NewCommandLogRow};
use crate::outbound::persistence::schema::{command_log, consumer_offsets};
use crate::outbound::persistence::{DbPool, PoolError};

const LOCK_TOPIC_SQL: &str = "SELECT pg_advisory_xact_lock(hashtext($1)::bigint)";

const CLAIM_GROUP_SQL: &str =
    "SELECT pg_try_advisory_lock(hashtext($1), hashtext($2)) AS acquired";

const CHECKPOINT_SQL: &str = r#"
INSERT INTO consumer_offsets (consumer_group, topic, next_seq, updated_at)
VALUES ($1, $2, $3, $4)
ON CONFLICT (consumer_group, topic) DO UPDATE
SET next_seq = GREATEST(consumer_offsets.next_seq, excluded.next_seq),
    updated_at = excluded.updated_at
"#;

fn pool_error(error: PoolError) -> BrokerError {
    map_pool_error(error, BrokerError::unavailable)
}

fn diesel_error(error: diesel::result::Error) -> BrokerError {
    map_diesel_error(error, BrokerError::rejected, BrokerError::unavailable)
}

#[derive(QueryableByName)]
struct GroupClaim {
    #[diesel(sql_type = Bool)]
    acquired: bool,
}

/// Producer side: appends messages to the command log.
#[derive(Clone)]
pub struct DieselCommandLog {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl DieselCommandLog {
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl CommandBroker for DieselCommandLog {
    async fn publish(&self, topic: &str, message: BrokerMessage) -> Result<(), BrokerError> {
        let headers = serde_json::to_value(&message.headers)
            .map_err(|err| BrokerError::rejected(err.to_string()))?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = NewCommandLogRow {
            topic,
            message_key: message.key.as_str(),
            headers,
            payload: message.payload.as_slice(),
            published_at: self.clock.utc(),
        };

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                sql_query(LOCK_TOPIC_SQL)
                    .bind::<Text, _>(row.topic)
                    .execute(conn)
                    .await?;
                diesel::insert_into(command_log::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(diesel_error)
    }
}

/// Consumer side: reads one topic on behalf of one consumer group.
///
/// The group lease lives on a dedicated connection rather than a pooled one,
/// so dropping the consumer or losing the connection releases it.
pub struct DieselCommandConsumer {
    database_url: String,
    clock: Arc<dyn Clock>,
    topic: String,
    consumer_group: String,
    poll_interval: Duration,
    lease: Mutex<Option<AsyncPgConnection>>,
}

impl DieselCommandConsumer {
    pub fn new(
        database_url: impl Into<String>,
        clock: Arc<dyn Clock>,
        topic: impl Into<String>,
        consumer_group: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            database_url: database_url.into(),
            clock,
            topic: topic.into(),
            consumer_group: consumer_group.into(),
            poll_interval,
            lease: Mutex::new(None),
        }
    }

    /// Open a connection and try to take ownership of the consumer group.
    ///
    /// Returns `None` while another consumer owns the group.
    async fn claim(&self) -> Result<Option<AsyncPgConnection>, BrokerError> {
        let mut conn = AsyncPgConnection::establish(&self.database_url)
            .await
            .map_err(|err| BrokerError::unavailable(err.to_string()))?;
        let claim: GroupClaim = sql_query(CLAIM_GROUP_SQL)
            .bind::<Text, _>(&self.consumer_group)
            .bind::<Text, _>(&self.topic)
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;

        if !claim.acquired {
            debug!(
                consumer_group = %self.consumer_group,
                topic = %self.topic,
                "consumer group owned by another processor; standing by"
            );
            return Ok(None);
        }
        info!(
            consumer_group = %self.consumer_group,
            topic = %self.topic,
            "claimed consumer group"
        );
        Ok(Some(conn))
    }

    /// Fetch the oldest message at or after the group's checkpoint.
    async fn poll_once(&self) -> Result<Option<Delivery>, BrokerError> {
        let mut lease = self.lease.lock().await;
        if lease.is_none() {
            *lease = self.claim().await?;
        }
        let Some(conn) = lease.as_mut() else {
            return Ok(None);
        };

        let polled = read_next(conn, &self.consumer_group, &self.topic).await;
        if polled.is_err() {
            // Closing the session gives up the group; the next poll reclaims it.
            *lease = None;
        }
        polled
    }
}

async fn read_next(
    conn: &mut AsyncPgConnection,
    consumer_group: &str,
    topic: &str,
) -> Result<Option<Delivery>, BrokerError> {
    let checkpoint: i64 = consumer_offsets::table
        .filter(consumer_offsets::consumer_group.eq(consumer_group))
        .filter(consumer_offsets::topic.eq(topic))
        .select(consumer_offsets::next_seq)
        .first(conn)
        .await
        .optional()
        .map_err(diesel_error)?
        .unwrap_or(0);

    let row: Option<CommandLogRow> = command_log::table
        .filter(command_log::topic.eq(topic))
        .filter(command_log::seq.ge(checkpoint))
        .order(command_log::seq.asc())
        .select(CommandLogRow::as_select())
        .first(conn)
        .await
        .optional()
        .map_err(diesel_error)?;

    Ok(row.map(row_to_delivery))
}

fn row_to_delivery(row: CommandLogRow) -> Delivery {
    let headers: BTreeMap<String, String> = serde_json::from_value(row.headers)
        .unwrap_or_else(|err| {
            warn!(seq = row.seq, error = %err, "command log headers are not a string map");
            BTreeMap::new()
        });
    Delivery {
        topic: row.topic,
        offset: row.seq,
        message: BrokerMessage {
            key: row.message_key,
            headers,
            payload: row.payload,
        },
    }
}

#[async_trait]
impl CommandSource for DieselCommandConsumer {
    async fn next_message(&self) -> Result<Delivery, BrokerError> {
        loop {
            if let Some(delivery) = self.poll_once().await? {
                return Ok(delivery);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn acknowledge(&self, delivery: &Delivery) -> Result<(), BrokerError> {
        let mut lease = self.lease.lock().await;
        let Some(conn) = lease.as_mut() else {
            return Err(BrokerError::unavailable(
                "consumer group lease was lost; the message will be redelivered",
            ));
        };

        let committed = sql_query(CHECKPOINT_SQL)
            .bind::<Text, _>(&self.consumer_group)
            .bind::<Text, _>(&self.topic)
            .bind::<BigInt, _>(delivery.offset.saturating_add(1))
            .bind::<Timestamptz, _>(self.clock.utc())
            .execute(conn)
            .await
            .map(|_| ())
            .map_err(diesel_error);
        if committed.is_err() {
            *lease = None;
        }
        committed
    }
}
