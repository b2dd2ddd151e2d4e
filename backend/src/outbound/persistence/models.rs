//! Internal Diesel row structs for database operations.
//!
//! These types never leave the persistence layer. Conversion into domain
//! values re-runs domain validation, so a row written by another tool that
//! breaks an invariant surfaces as a query error rather than a panic.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{
    ExternalUserId, OrderIndex, PublicToken, RouteId, RouteName, RouteRecord, User, UserId,
    UserName, WaypointId, WaypointName, WaypointRecord,
};

use super::schema::{app_users, command_log, routes, waypoints};

/// Row struct for reading from the app_users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = app_users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub public_token: String,
    pub external_id: i64,
    pub user_name: String,
    pub registered_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let token = PublicToken::new(row.public_token).map_err(|err| err.to_string())?;
        let user_name = UserName::new(row.user_name).map_err(|err| err.to_string())?;
        Ok(User::new(
            UserId::new(row.id),
            token,
            ExternalUserId::new(row.external_id),
            user_name,
            row.registered_at,
        ))
    }
}

/// Insertable struct for creating user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = app_users)]
pub(crate) struct NewUserRow<'a> {
    pub public_token: &'a str,
    pub external_id: i64,
    pub user_name: &'a str,
    pub registered_at: DateTime<Utc>,
}

/// Row struct for reading from the routes table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = routes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RouteRow {
    pub id: i32,
    pub user_id: i64,
    pub route_name: String,
    pub uploaded_at: DateTime<Utc>,
}

impl TryFrom<RouteRow> for RouteRecord {
    type Error = String;

    fn try_from(row: RouteRow) -> Result<Self, Self::Error> {
        Ok(RouteRecord {
            id: RouteId::new(row.id),
            user_id: UserId::new(row.user_id),
            name: RouteName::new(row.route_name).map_err(|err| err.to_string())?,
            uploaded_at: row.uploaded_at,
        })
    }
}

/// Insertable struct for creating route records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = routes)]
pub(crate) struct NewRouteRow<'a> {
    pub user_id: i64,
    pub route_name: &'a str,
    pub uploaded_at: DateTime<Utc>,
}

/// Row struct for reading from the waypoints table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = waypoints)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct WaypointRow {
    pub id: i32,
    pub route_id: i32,
    pub waypoint_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub order_index: i32,
}

impl TryFrom<WaypointRow> for WaypointRecord {
    type Error = String;

    fn try_from(row: WaypointRow) -> Result<Self, Self::Error> {
        Ok(WaypointRecord {
            id: WaypointId::new(row.id),
            route_id: RouteId::new(row.route_id),
            name: WaypointName::new(row.waypoint_name).map_err(|err| err.to_string())?,
            latitude: row.latitude,
            longitude: row.longitude,
            order_index: OrderIndex::new(row.order_index),
        })
    }
}

/// Insertable struct for creating waypoint records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = waypoints)]
pub(crate) struct NewWaypointRow<'a> {
    pub route_id: i32,
    pub waypoint_name: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub order_index: i32,
}

// ---------------------------------------------------------------------------
// Command log models
// ---------------------------------------------------------------------------

/// Row struct for reading from the command_log table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = command_log)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommandLogRow {
    pub seq: i64,
    pub topic: String,
    pub message_key: String,
    pub headers: serde_json::Value,
    pub payload: Vec<u8>,
}

/// Insertable struct for appending to the command log.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = command_log)]
pub(crate) struct NewCommandLogRow<'a> {
    pub topic: &'a str,
    pub message_key: &'a str,
    pub headers: serde_json::Value,
    pub payload: &'a [u8],
    pub published_at: DateTime<Utc>,
}
