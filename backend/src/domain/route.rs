//! Route and waypoint data model.
//!
//! Routes are owned by exactly one user. Waypoints carry the zero-based
//! position they had in the submitted list; positions are never renumbered,
//! so gaps appear when an individual waypoint insert fails.

use std::cmp::Ordering;
use std::fmt;
use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::{NAME_MAX, UserId};

/// Validation errors returned by the route value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteValidationError {
    #[error("route name must not be empty")]
    EmptyRouteName,
    #[error("route name must be at most {max} characters")]
    RouteNameTooLong { max: usize },
    #[error("waypoint name must not be empty")]
    EmptyWaypointName,
    #[error("waypoint name must be at most {max} characters")]
    WaypointNameTooLong { max: usize },
}

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            pub const fn new(value: i32) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

integer_id! {
    /// Store-assigned route identifier.
    RouteId
}

integer_id! {
    /// Store-assigned waypoint identifier.
    WaypointId
}

integer_id! {
    /// Zero-based position of a waypoint within its submitted route.
    OrderIndex
}

fn validate_name(
    raw: &str,
    empty: RouteValidationError,
    too_long: RouteValidationError,
) -> Result<(), RouteValidationError> {
    if raw.trim().is_empty() {
        return Err(empty);
    }
    if raw.chars().count() > NAME_MAX {
        return Err(too_long);
    }
    Ok(())
}

/// Human readable route name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RouteName(String);

impl RouteName {
    /// Validate and construct a [`RouteName`].
    pub fn new(name: impl Into<String>) -> Result<Self, RouteValidationError> {
        let name = name.into();
        validate_name(
            &name,
            RouteValidationError::EmptyRouteName,
            RouteValidationError::RouteNameTooLong { max: NAME_MAX },
        )?;
        Ok(Self(name))
    }
}

impl AsRef<str> for RouteName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<RouteName> for String {
    fn from(value: RouteName) -> Self {
        value.0
    }
}

impl TryFrom<String> for RouteName {
    type Error = RouteValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Human readable waypoint name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WaypointName(String);

impl WaypointName {
    /// Validate and construct a [`WaypointName`].
    pub fn new(name: impl Into<String>) -> Result<Self, RouteValidationError> {
        let name = name.into();
        validate_name(
            &name,
            RouteValidationError::EmptyWaypointName,
            RouteValidationError::WaypointNameTooLong { max: NAME_MAX },
        )?;
        Ok(Self(name))
    }
}

impl AsRef<str> for WaypointName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<WaypointName> for String {
    fn from(value: WaypointName) -> Self {
        value.0
    }
}

impl TryFrom<String> for WaypointName {
    type Error = RouteValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Maximum number of routes returned by a listing.
///
/// Zero is not representable; callers treat a zero or missing limit as
/// "no limit" through [`RouteLimit::from_query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteLimit(NonZeroU32);

impl RouteLimit {
    /// Interpret an optional query value, mapping `None` and `0` to no limit.
    ///
    /// # Examples
    /// ```
    /// use route_ledger::domain::RouteLimit;
    ///
    /// assert!(RouteLimit::from_query(Some(0)).is_none());
    /// assert_eq!(RouteLimit::from_query(Some(3)).map(RouteLimit::get), Some(3));
    /// ```
    pub fn from_query(value: Option<u32>) -> Option<Self> {
        value.and_then(NonZeroU32::new).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// Route row without its waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRecord {
    pub id: RouteId,
    pub user_id: UserId,
    pub name: RouteName,
    pub uploaded_at: DateTime<Utc>,
}

/// Waypoint row tagged with its owning route.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointRecord {
    pub id: WaypointId,
    pub route_id: RouteId,
    pub name: WaypointName,
    pub latitude: f64,
    pub longitude: f64,
    pub order_index: OrderIndex,
}

/// Route fields supplied by `add-route`; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRoute {
    pub user_id: UserId,
    pub name: RouteName,
    pub uploaded_at: DateTime<Utc>,
}

/// Waypoint fields inserted after the owning route exists.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWaypoint {
    pub route_id: RouteId,
    pub name: WaypointName,
    pub latitude: f64,
    pub longitude: f64,
    pub order_index: OrderIndex,
}

/// Waypoint as returned to readers.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    #[schema(value_type = i32, example = 10)]
    pub id: WaypointId,
    #[schema(value_type = String, example = "Start")]
    pub waypoint_name: WaypointName,
    #[schema(example = 10.0)]
    pub lat: f64,
    #[schema(example = 20.0)]
    pub lon: f64,
    #[schema(value_type = i32, example = 0)]
    pub order_index: OrderIndex,
}

impl From<WaypointRecord> for Waypoint {
    fn from(record: WaypointRecord) -> Self {
        Self {
            id: record.id,
            waypoint_name: record.name,
            lat: record.latitude,
            lon: record.longitude,
            order_index: record.order_index,
        }
    }
}

/// Route with its ordered waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[schema(value_type = i32, example = 3)]
    pub id: RouteId,
    #[schema(value_type = i64, example = 1)]
    pub user_id: UserId,
    #[schema(value_type = String, example = "Morning Ride")]
    pub route_name: RouteName,
    pub uploaded_at: DateTime<Utc>,
    pub waypoints: Vec<Waypoint>,
}

impl Route {
    /// Assemble a route from its record and the waypoints belonging to it.
    ///
    /// Waypoints are sorted by order index, then by waypoint id.
    pub fn assemble(record: RouteRecord, waypoints: Vec<WaypointRecord>) -> Self {
        let mut waypoints: Vec<Waypoint> = waypoints.into_iter().map(Waypoint::from).collect();
        waypoints.sort_by(waypoint_order);
        Self {
            id: record.id,
            user_id: record.user_id,
            route_name: record.name,
            uploaded_at: record.uploaded_at,
            waypoints,
        }
    }
}

fn waypoint_order(left: &Waypoint, right: &Waypoint) -> Ordering {
    left.order_index
        .cmp(&right.order_index)
        .then(left.id.cmp(&right.id))
}
