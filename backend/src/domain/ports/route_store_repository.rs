//! Port abstraction for the user and route store.
//!
//! Each method maps to exactly one statement against the store. Nothing here
//! spans a transaction: `add-route` issues one route insert followed by one
//! insert per waypoint, and a failure part-way leaves what was written.

use async_trait::async_trait;

use crate::domain::{
    ExternalUserId, NewRoute, NewUser, NewWaypoint, PublicToken, RouteAuthorization, RouteId,
    RouteLimit, RouteName, RouteRecord, User, UserId, WaypointId, WaypointRecord,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by route store adapters.
    pub enum RouteStorePersistenceError {
        /// Store connection could not be established.
        Connection { message: String } => "route store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "route store query failed: {message}",
    }
}

/// Result of inserting a user with conflict-ignore semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInsertOutcome {
    /// A new row was written.
    Created(UserId),
    /// A user with the same external id or token already exists.
    AlreadyExists,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteStoreRepository: Send + Sync {
    /// Insert a user, ignoring conflicts on external id or token.
    async fn insert_user(&self, user: &NewUser)
    -> Result<UserInsertOutcome, RouteStorePersistenceError>;

    /// Insert a route row and return its new id.
    async fn insert_route(&self, route: &NewRoute) -> Result<RouteId, RouteStorePersistenceError>;

    /// Insert one waypoint row and return its new id.
    async fn insert_waypoint(
        &self,
        waypoint: &NewWaypoint,
    ) -> Result<WaypointId, RouteStorePersistenceError>;

    /// Delete the route matched by `authorization`; returns affected rows.
    async fn delete_route(
        &self,
        authorization: &RouteAuthorization,
    ) -> Result<u64, RouteStorePersistenceError>;

    /// Rename the route matched by `authorization`; returns affected rows.
    async fn rename_route(
        &self,
        authorization: &RouteAuthorization,
        name: &RouteName,
    ) -> Result<u64, RouteStorePersistenceError>;

    /// Fetch a user by the upstream platform id.
    async fn find_user_by_external_id(
        &self,
        external_id: ExternalUserId,
    ) -> Result<Option<User>, RouteStorePersistenceError>;

    /// List the token owner's routes, newest upload first.
    async fn list_routes(
        &self,
        token: &PublicToken,
        limit: Option<RouteLimit>,
    ) -> Result<Vec<RouteRecord>, RouteStorePersistenceError>;

    /// List every waypoint of every route owned by the token's user.
    async fn list_waypoints(
        &self,
        token: &PublicToken,
    ) -> Result<Vec<WaypointRecord>, RouteStorePersistenceError>;
}
