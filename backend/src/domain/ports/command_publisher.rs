//! Driving port for write requests.
//!
//! Inbound adapters hand commands to this port and respond immediately; the
//! outcome of the eventual mutation is never reported back.

use async_trait::async_trait;

use crate::domain::Command;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandPublisher: Send + Sync {
    /// Publish a command, fire-and-forget.
    async fn send(&self, command: &Command);
}

/// Publisher that drops every command; used where writes are not wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCommandPublisher;

#[async_trait]
impl CommandPublisher for FixtureCommandPublisher {
    async fn send(&self, _command: &Command) {}
}
