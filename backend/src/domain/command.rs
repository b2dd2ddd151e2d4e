//! Write-side command vocabulary.
//!
//! Every mutation travels through the broker as one [`Command`]. The wire
//! carries the command name in the [`COMMAND_HEADER`] header and the payload
//! as UTF-8 JSON. [`CommandName`] owns the only mapping between wire names and
//! variants; unknown names are rejected there and nowhere else.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::identity::RouteAuthorization;
use super::route::{RouteId, RouteName, WaypointName};
use super::user::{ExternalUserId, PublicToken, UserId, UserName};

/// Broker header carrying the command's wire name.
pub const COMMAND_HEADER: &str = "command";

/// Closed set of command kinds understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    /// Register a user; conflicts are ignored.
    CreateUser,
    /// Store a route followed by its waypoints.
    AddRoute,
    /// Delete a route owned by a token.
    DeleteRoute,
    /// Rename a route owned by a user id.
    RenameRouteById,
    /// Rename a route owned by a token.
    RenameRouteByToken,
}

const WIRE_NAMES: [(CommandName, &str); 5] = [
    (CommandName::CreateUser, "create-user"),
    (CommandName::AddRoute, "add-route"),
    (CommandName::DeleteRoute, "delete-route"),
    (CommandName::RenameRouteById, "rename-route-id"),
    (CommandName::RenameRouteByToken, "rename-route-token"),
];

impl CommandName {
    /// All command kinds in wire-table order.
    pub fn all() -> impl Iterator<Item = Self> {
        WIRE_NAMES.iter().map(|(name, _)| *name)
    }

    /// Wire name placed in the [`COMMAND_HEADER`] header.
    pub fn as_str(self) -> &'static str {
        WIRE_NAMES
            .iter()
            .find_map(|(name, wire)| (*name == self).then_some(*wire))
            .unwrap_or_default()
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = CommandDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WIRE_NAMES
            .iter()
            .find_map(|(name, wire)| (*wire == s).then_some(*name))
            .ok_or_else(|| CommandDecodeError::UnknownCommand {
                name: s.to_owned(),
            })
    }
}

/// Reasons a broker message cannot be turned into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandDecodeError {
    #[error("message has no `{COMMAND_HEADER}` header")]
    MissingHeader,
    #[error("unknown command `{name}`")]
    UnknownCommand { name: String },
    #[error("invalid `{command}` payload: {message}")]
    Payload {
        command: CommandName,
        message: String,
    },
}

/// `create-user` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateUser {
    pub external_id: ExternalUserId,
    pub token: PublicToken,
    pub user_name: UserName,
}

/// One waypoint inside an `add-route` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RouteWaypoint {
    pub waypoint_name: WaypointName,
    pub lat: f64,
    pub lon: f64,
}

/// `add-route` payload. Waypoints keep their submitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddRoute {
    pub user_id: UserId,
    pub route_name: RouteName,
    pub waypoints: Vec<RouteWaypoint>,
}

/// `delete-route` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeleteRoute {
    pub token: PublicToken,
    pub route_id: RouteId,
}

/// `rename-route-id` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RenameRouteById {
    pub user_id: UserId,
    pub route_id: RouteId,
    pub new_name: RouteName,
}

/// `rename-route-token` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RenameRouteByToken {
    pub token: PublicToken,
    pub route_id: RouteId,
    pub route_name: RouteName,
}

/// A decoded write command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateUser(CreateUser),
    AddRoute(AddRoute),
    DeleteRoute(DeleteRoute),
    RenameRouteById(RenameRouteById),
    RenameRouteByToken(RenameRouteByToken),
}

impl Command {
    pub fn name(&self) -> CommandName {
        match self {
            Self::CreateUser(_) => CommandName::CreateUser,
            Self::AddRoute(_) => CommandName::AddRoute,
            Self::DeleteRoute(_) => CommandName::DeleteRoute,
            Self::RenameRouteById(_) => CommandName::RenameRouteById,
            Self::RenameRouteByToken(_) => CommandName::RenameRouteByToken,
        }
    }

    /// Serialise the payload to its JSON wire form.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            Self::CreateUser(payload) => serde_json::to_vec(payload),
            Self::AddRoute(payload) => serde_json::to_vec(payload),
            Self::DeleteRoute(payload) => serde_json::to_vec(payload),
            Self::RenameRouteById(payload) => serde_json::to_vec(payload),
            Self::RenameRouteByToken(payload) => serde_json::to_vec(payload),
        }
    }

    /// Decode a broker message given its header value and payload bytes.
    ///
    /// Decoding is strict: unknown fields, missing fields and values that
    /// fail domain validation are all rejected. Domain validation is stricter
    /// than the wire contract, so a `create-user` or `add-route` carrying an
    /// empty or over-long name is dropped rather than stored.
    ///
    /// # Examples
    /// ```
    /// use route_ledger::domain::{Command, CommandName};
    ///
    /// let payload = br#"{"token":"tok01","routeId":3}"#;
    /// let command = Command::decode(Some("delete-route"), payload).unwrap();
    /// assert_eq!(command.name(), CommandName::DeleteRoute);
    /// ```
    pub fn decode(header: Option<&str>, payload: &[u8]) -> Result<Self, CommandDecodeError> {
        let name: CommandName = header.ok_or(CommandDecodeError::MissingHeader)?.parse()?;
        let payload_error = |err: serde_json::Error| CommandDecodeError::Payload {
            command: name,
            message: err.to_string(),
        };
        let command = match name {
            CommandName::CreateUser => {
                Self::CreateUser(serde_json::from_slice(payload).map_err(payload_error)?)
            }
            CommandName::AddRoute => {
                Self::AddRoute(serde_json::from_slice(payload).map_err(payload_error)?)
            }
            CommandName::DeleteRoute => {
                Self::DeleteRoute(serde_json::from_slice(payload).map_err(payload_error)?)
            }
            CommandName::RenameRouteById => {
                Self::RenameRouteById(serde_json::from_slice(payload).map_err(payload_error)?)
            }
            CommandName::RenameRouteByToken => {
                Self::RenameRouteByToken(serde_json::from_slice(payload).map_err(payload_error)?)
            }
        };
        Ok(command)
    }
}

impl DeleteRoute {
    pub fn authorization(&self) -> RouteAuthorization {
        RouteAuthorization::by_token(self.token.clone(), self.route_id)
    }
}

impl RenameRouteById {
    pub fn authorization(&self) -> RouteAuthorization {
        RouteAuthorization::by_owner(self.user_id, self.route_id)
    }
}

impl RenameRouteByToken {
    pub fn authorization(&self) -> RouteAuthorization {
        RouteAuthorization::by_token(self.token.clone(), self.route_id)
    }
}

#[cfg(test)]
mod tests;
