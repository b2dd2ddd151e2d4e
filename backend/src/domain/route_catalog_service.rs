//! Read-side service backing the user and route queries.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::ports::{RouteCatalogQuery, RouteStorePersistenceError, RouteStoreRepository};
use super::route::{Route, RouteId, RouteLimit, WaypointRecord};
use super::user::{ExternalUserId, PublicToken, User};
use super::Error;

/// Read service that queries the store directly.
#[derive(Clone)]
pub struct RouteCatalogService<R> {
    store: Arc<R>,
}

impl<R> RouteCatalogService<R> {
    pub fn new(store: Arc<R>) -> Self {
        Self { store }
    }
}

fn map_store_error(err: RouteStorePersistenceError) -> Error {
    match err {
        RouteStorePersistenceError::Connection { message } => {
            Error::service_unavailable(format!("route store unavailable: {message}"))
        }
        RouteStorePersistenceError::Query { message } => {
            Error::internal(format!("route store query failed: {message}"))
        }
    }
}

#[async_trait]
impl<R> RouteCatalogQuery for RouteCatalogService<R>
where
    R: RouteStoreRepository,
{
    async fn get_user(&self, external_id: ExternalUserId) -> Result<User, Error> {
        self.store
            .find_user_by_external_id(external_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found(format!("user {external_id} not found")))
    }

    async fn list_routes(
        &self,
        token: &PublicToken,
        limit: Option<RouteLimit>,
    ) -> Result<Vec<Route>, Error> {
        let records = self
            .store
            .list_routes(token, limit)
            .await
            .map_err(map_store_error)?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let waypoints = self
            .store
            .list_waypoints(token)
            .await
            .map_err(map_store_error)?;
        let mut by_route: HashMap<RouteId, Vec<WaypointRecord>> = HashMap::new();
        for waypoint in waypoints {
            by_route.entry(waypoint.route_id).or_default().push(waypoint);
        }

        Ok(records
            .into_iter()
            .map(|record| {
                let waypoints = by_route.remove(&record.id).unwrap_or_default();
                Route::assemble(record, waypoints)
            })
            .collect())
    }
}
