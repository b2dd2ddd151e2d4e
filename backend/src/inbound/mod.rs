//! Inbound adapters that translate external requests into domain port calls
//! while keeping framework details at the edge.
//!
//! The HTTP surface lives under [`http`]; the broker consumer is driven by
//! the command processor binary through [`crate::domain::CommandDispatcher`].

pub mod http;
