//! PostgreSQL-backed `RouteStoreRepository` implementation using Diesel ORM.
//!
//! Each port method issues one statement on one pooled connection. Mutations
//! addressed by token resolve the owner through a sub-select inside the same
//! statement, so authorization and mutation cannot drift apart.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{RouteStorePersistenceError, RouteStoreRepository, UserInsertOutcome};
use crate::domain::{
    ExternalUserId, NewRoute, NewUser, NewWaypoint, PublicToken, RouteAuthorization, RouteId,
    RouteLimit, RouteName, RouteRecord, User, UserId, WaypointId, WaypointRecord,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewRouteRow, NewUserRow, NewWaypointRow, RouteRow, UserRow, WaypointRow};
use super::pool::{DbPool, PoolError};
use super::schema::{app_users, routes, waypoints};

/// Diesel-backed implementation of the `RouteStoreRepository` port.
#[derive(Clone)]
pub struct DieselRouteStoreRepository {
    pool: DbPool,
}

impl DieselRouteStoreRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> RouteStorePersistenceError {
    map_pool_error(error, RouteStorePersistenceError::connection)
}

fn diesel_error(error: diesel::result::Error) -> RouteStorePersistenceError {
    map_diesel_error(
        error,
        RouteStorePersistenceError::query,
        RouteStorePersistenceError::connection,
    )
}

fn affected(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}

fn convert_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>, RouteStorePersistenceError>
where
    T: TryFrom<R, Error = String>,
{
    rows.into_iter()
        .map(|row| T::try_from(row).map_err(RouteStorePersistenceError::query))
        .collect()
}

#[async_trait]
impl RouteStoreRepository for DieselRouteStoreRepository {
    async fn insert_user(
        &self,
        user: &NewUser,
    ) -> Result<UserInsertOutcome, RouteStorePersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = NewUserRow {
            public_token: user.token.as_ref(),
            external_id: user.external_id.get(),
            user_name: user.user_name.as_ref(),
            registered_at: user.registered_at,
        };

        let inserted: Option<i64> = diesel::insert_into(app_users::table)
            .values(&row)
            .on_conflict_do_nothing()
            .returning(app_users::id)
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        Ok(inserted.map_or(UserInsertOutcome::AlreadyExists, |id| {
            UserInsertOutcome::Created(UserId::new(id))
        }))
    }

    async fn insert_route(&self, route: &NewRoute) -> Result<RouteId, RouteStorePersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = NewRouteRow {
            user_id: route.user_id.get(),
            route_name: route.name.as_ref(),
            uploaded_at: route.uploaded_at,
        };

        let id: i32 = diesel::insert_into(routes::table)
            .values(&row)
            .returning(routes::id)
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(RouteId::new(id))
    }

    async fn insert_waypoint(
        &self,
        waypoint: &NewWaypoint,
    ) -> Result<WaypointId, RouteStorePersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = NewWaypointRow {
            route_id: waypoint.route_id.get(),
            waypoint_name: waypoint.name.as_ref(),
            latitude: waypoint.latitude,
            longitude: waypoint.longitude,
            order_index: waypoint.order_index.get(),
        };

        let id: i32 = diesel::insert_into(waypoints::table)
            .values(&row)
            .returning(waypoints::id)
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(WaypointId::new(id))
    }

    async fn delete_route(
        &self,
        authorization: &RouteAuthorization,
    ) -> Result<u64, RouteStorePersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let rows = match authorization {
            RouteAuthorization::ByOwner { user_id, route_id } => {
                diesel::delete(
                    routes::table
                        .filter(routes::id.eq(route_id.get()))
                        .filter(routes::user_id.eq(user_id.get())),
                )
                .execute(&mut conn)
                .await
            }
            RouteAuthorization::ByToken { token, route_id } => {
                let owner = app_users::table
                    .filter(app_users::public_token.eq(token.as_ref()))
                    .select(app_users::id);
                diesel::delete(
                    routes::table
                        .filter(routes::id.eq(route_id.get()))
                        .filter(routes::user_id.eq_any(owner)),
                )
                .execute(&mut conn)
                .await
            }
        }
        .map_err(diesel_error)?;

        Ok(affected(rows))
    }

    async fn rename_route(
        &self,
        authorization: &RouteAuthorization,
        name: &RouteName,
    ) -> Result<u64, RouteStorePersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let rows = match authorization {
            RouteAuthorization::ByOwner { user_id, route_id } => {
                diesel::update(
                    routes::table
                        .filter(routes::id.eq(route_id.get()))
                        .filter(routes::user_id.eq(user_id.get())),
                )
                .set(routes::route_name.eq(name.as_ref()))
                .execute(&mut conn)
                .await
            }
            RouteAuthorization::ByToken { token, route_id } => {
                let owner = app_users::table
                    .filter(app_users::public_token.eq(token.as_ref()))
                    .select(app_users::id);
                diesel::update(
                    routes::table
                        .filter(routes::id.eq(route_id.get()))
                        .filter(routes::user_id.eq_any(owner)),
                )
                .set(routes::route_name.eq(name.as_ref()))
                .execute(&mut conn)
                .await
            }
        }
        .map_err(diesel_error)?;

        Ok(affected(rows))
    }

    async fn find_user_by_external_id(
        &self,
        external_id: ExternalUserId,
    ) -> Result<Option<User>, RouteStorePersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<UserRow> = app_users::table
            .filter(app_users::external_id.eq(external_id.get()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(User::try_from)
            .transpose()
            .map_err(RouteStorePersistenceError::query)
    }

    async fn list_routes(
        &self,
        token: &PublicToken,
        limit: Option<RouteLimit>,
    ) -> Result<Vec<RouteRecord>, RouteStorePersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let mut query = routes::table
            .inner_join(app_users::table)
            .filter(app_users::public_token.eq(token.as_ref()))
            .order((routes::uploaded_at.desc(), routes::id.desc()))
            .select(RouteRow::as_select())
            .into_boxed();
        if let Some(limit) = limit {
            query = query.limit(i64::from(limit.get()));
        }

        let rows: Vec<RouteRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        convert_rows(rows)
    }

    async fn list_waypoints(
        &self,
        token: &PublicToken,
    ) -> Result<Vec<WaypointRecord>, RouteStorePersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let rows: Vec<WaypointRow> = waypoints::table
            .inner_join(routes::table.inner_join(app_users::table))
            .filter(app_users::public_token.eq(token.as_ref()))
            .order((
                waypoints::route_id.asc(),
                waypoints::order_index.asc(),
                waypoints::id.asc(),
            ))
            .select(WaypointRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        convert_rows(rows)
    }
}
