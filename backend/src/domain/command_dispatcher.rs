//! Consumer side of the command pipeline.
//!
//! One [`CommandDispatcher`] runs per process. It alternates between
//! [`DispatcherState::Polling`] and [`DispatcherState::Handling`] until the
//! shutdown signal fires. The signal is only observed while polling; a
//! message already taken from the broker is always handled and acknowledged
//! first. Every delivered message is acknowledged after one attempt,
//! whatever happened to it, so malformed messages are dropped and handler
//! failures are not retried.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::command::{COMMAND_HEADER, Command, CommandDecodeError, CommandName};
use super::command_handler::{CommandOutcome, RouteCommandHandler};
use super::ports::{BrokerError, CommandSource, Delivery, RouteStoreRepository};

/// Where the dispatch loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Waiting for the broker to deliver a message.
    Polling,
    /// Decoding, applying and acknowledging a delivered message.
    Handling,
}

/// What a single dispatch cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchReport {
    /// The broker could not be polled; nothing was consumed.
    PollFailed { reason: String },
    /// The message could not be decoded and was dropped.
    Rejected {
        offset: i64,
        error: CommandDecodeError,
        acknowledged: bool,
    },
    /// The message was decoded and handed to its handler.
    Handled {
        offset: i64,
        command: CommandName,
        outcome: CommandOutcome,
        acknowledged: bool,
    },
}

/// Sequential poll, decode, handle, acknowledge loop.
pub struct CommandDispatcher<S, R> {
    source: Arc<S>,
    handler: RouteCommandHandler<R>,
    poll_retry_delay: Duration,
    state: DispatcherState,
}

impl<S, R> CommandDispatcher<S, R>
where
    S: CommandSource,
    R: RouteStoreRepository,
{
    pub fn new(source: Arc<S>, handler: RouteCommandHandler<R>, poll_retry_delay: Duration) -> Self {
        Self {
            source,
            handler,
            poll_retry_delay,
            state: DispatcherState::Polling,
        }
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    /// Run one cycle: wait for a message, apply it, acknowledge it.
    pub async fn dispatch_next(&mut self) -> DispatchReport {
        self.state = DispatcherState::Polling;
        let polled = self.source.next_message().await;
        self.process(polled).await
    }

    /// Dispatch until `shutdown` turns true or its sender is dropped.
    ///
    /// Poll failures back off for the retry delay. Shutdown interrupts a
    /// poll or a back-off, never a message being handled.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            self.state = DispatcherState::Polling;
            let polled = tokio::select! {
                polled = self.source.next_message() => polled,
                _ = shutdown.changed() => break,
            };
            if let DispatchReport::PollFailed { .. } = self.process(polled).await {
                tokio::select! {
                    () = tokio::time::sleep(self.poll_retry_delay) => {}
                    _ = shutdown.changed() => break,
                }
            }
        }
        self.state = DispatcherState::Polling;
        info!("command dispatcher stopped");
    }

    async fn process(&mut self, polled: Result<Delivery, BrokerError>) -> DispatchReport {
        let delivery = match polled {
            Ok(delivery) => delivery,
            Err(err) => {
                error!(error = %err, "failed to poll command broker");
                return DispatchReport::PollFailed {
                    reason: err.to_string(),
                };
            }
        };

        self.state = DispatcherState::Handling;
        let header = delivery.message.header(COMMAND_HEADER);
        let report = match Command::decode(header, &delivery.message.payload) {
            Ok(command) => {
                let outcome = self.handler.handle(&command).await;
                debug!(offset = delivery.offset, command = %command.name(), ?outcome, "command handled");
                DispatchReport::Handled {
                    offset: delivery.offset,
                    command: command.name(),
                    outcome,
                    acknowledged: self.acknowledge(&delivery).await,
                }
            }
            Err(err) => {
                log_rejection(&delivery, &err);
                DispatchReport::Rejected {
                    offset: delivery.offset,
                    error: err,
                    acknowledged: self.acknowledge(&delivery).await,
                }
            }
        };
        self.state = DispatcherState::Polling;
        report
    }

    async fn acknowledge(&self, delivery: &Delivery) -> bool {
        match self.source.acknowledge(delivery).await {
            Ok(()) => true,
            Err(err) => {
                error!(offset = delivery.offset, error = %err, "failed to acknowledge command; it may be redelivered");
                false
            }
        }
    }
}

fn log_rejection(delivery: &Delivery, err: &CommandDecodeError) {
    match err {
        CommandDecodeError::MissingHeader | CommandDecodeError::UnknownCommand { .. } => {
            warn!(offset = delivery.offset, key = %delivery.message.key, error = %err, "skipping message without a known command");
        }
        CommandDecodeError::Payload { .. } => {
            error!(offset = delivery.offset, key = %delivery.message.key, error = %err, "dropping undecodable command");
        }
    }
}

#[cfg(test)]
mod tests;
