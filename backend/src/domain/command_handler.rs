//! Applies decoded commands to the route store.
//!
//! Handlers contain every store error: failures are logged here and reported
//! as [`CommandOutcome::Failed`], never re-raised. Mutations that target
//! another user's route, or a route that no longer exists, match zero rows
//! and succeed as [`CommandOutcome::Unchanged`].

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, error, info, warn};

use super::command::{AddRoute, Command, CommandName, CreateUser};
use super::identity::RouteAuthorization;
use super::ports::{RouteStorePersistenceError, RouteStoreRepository, UserInsertOutcome};
use super::route::{NewRoute, NewWaypoint, OrderIndex, RouteId, RouteName};
use super::user::NewUser;

/// What applying one command did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Rows were written or removed.
    Applied { rows: u64 },
    /// Some waypoints of a new route could not be written.
    PartiallyApplied { rows: u64, failed_waypoints: usize },
    /// Nothing matched, or the record already existed.
    Unchanged,
    /// The store rejected the mutation.
    Failed { reason: String },
}

impl CommandOutcome {
    fn from_rows(rows: u64) -> Self {
        if rows == 0 {
            Self::Unchanged
        } else {
            Self::Applied { rows }
        }
    }

    fn failed(command: CommandName, err: &RouteStorePersistenceError) -> Self {
        error!(%command, error = %err, "command handler failed");
        Self::Failed {
            reason: err.to_string(),
        }
    }
}

/// Dispatches each [`Command`] variant to its store mutation.
#[derive(Clone)]
pub struct RouteCommandHandler<R> {
    store: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> RouteCommandHandler<R> {
    pub fn new(store: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

impl<R> RouteCommandHandler<R>
where
    R: RouteStoreRepository,
{
    /// Apply one command. Never fails; the outcome is for logging only.
    pub async fn handle(&self, command: &Command) -> CommandOutcome {
        match command {
            Command::CreateUser(payload) => self.create_user(payload).await,
            Command::AddRoute(payload) => self.add_route(payload).await,
            Command::DeleteRoute(payload) => {
                self.delete(CommandName::DeleteRoute, &payload.authorization())
                    .await
            }
            Command::RenameRouteById(payload) => {
                self.rename(
                    CommandName::RenameRouteById,
                    &payload.authorization(),
                    &payload.new_name,
                )
                .await
            }
            Command::RenameRouteByToken(payload) => {
                self.rename(
                    CommandName::RenameRouteByToken,
                    &payload.authorization(),
                    &payload.route_name,
                )
                .await
            }
        }
    }

    async fn create_user(&self, payload: &CreateUser) -> CommandOutcome {
        let user = NewUser {
            external_id: payload.external_id,
            token: payload.token.clone(),
            user_name: payload.user_name.clone(),
            registered_at: self.clock.utc(),
        };
        match self.store.insert_user(&user).await {
            Ok(UserInsertOutcome::Created(id)) => {
                info!(user_id = %id, external_id = %user.external_id, "user created");
                CommandOutcome::Applied { rows: 1 }
            }
            Ok(UserInsertOutcome::AlreadyExists) => {
                debug!(external_id = %user.external_id, "user already exists");
                CommandOutcome::Unchanged
            }
            Err(err) => CommandOutcome::failed(CommandName::CreateUser, &err),
        }
    }

    // Not idempotent: a redelivered message creates a second route.
    async fn add_route(&self, payload: &AddRoute) -> CommandOutcome {
        let route = NewRoute {
            user_id: payload.user_id,
            name: payload.route_name.clone(),
            uploaded_at: self.clock.utc(),
        };
        let route_id = match self.store.insert_route(&route).await {
            Ok(id) => id,
            Err(err) => return CommandOutcome::failed(CommandName::AddRoute, &err),
        };

        let mut rows = 1_u64;
        let mut failed_waypoints = 0_usize;
        for (index, waypoint) in payload.waypoints.iter().enumerate() {
            let Some(order_index) = order_index(index) else {
                warn!(%route_id, index, "waypoint index exceeds the order range");
                failed_waypoints += 1;
                continue;
            };
            let row = NewWaypoint {
                route_id,
                name: waypoint.waypoint_name.clone(),
                latitude: waypoint.lat,
                longitude: waypoint.lon,
                order_index,
            };
            match self.store.insert_waypoint(&row).await {
                Ok(_) => rows += 1,
                Err(err) => {
                    error!(%route_id, index, error = %err, "failed to insert waypoint");
                    failed_waypoints += 1;
                }
            }
        }

        log_route_added(route_id, rows, failed_waypoints);
        if failed_waypoints == 0 {
            CommandOutcome::Applied { rows }
        } else {
            CommandOutcome::PartiallyApplied {
                rows,
                failed_waypoints,
            }
        }
    }

    async fn delete(
        &self,
        command: CommandName,
        authorization: &RouteAuthorization,
    ) -> CommandOutcome {
        match self.store.delete_route(authorization).await {
            Ok(rows) => {
                debug!(%command, route_id = %authorization.route_id(), rows, "route delete applied");
                CommandOutcome::from_rows(rows)
            }
            Err(err) => CommandOutcome::failed(command, &err),
        }
    }

    async fn rename(
        &self,
        command: CommandName,
        authorization: &RouteAuthorization,
        name: &RouteName,
    ) -> CommandOutcome {
        match self.store.rename_route(authorization, name).await {
            Ok(rows) => {
                debug!(%command, route_id = %authorization.route_id(), rows, "route rename applied");
                CommandOutcome::from_rows(rows)
            }
            Err(err) => CommandOutcome::failed(command, &err),
        }
    }
}

fn order_index(index: usize) -> Option<OrderIndex> {
    i32::try_from(index).ok().map(OrderIndex::new)
}

fn log_route_added(route_id: RouteId, rows: u64, failed_waypoints: usize) {
    if failed_waypoints == 0 {
        info!(%route_id, rows, "route added");
    } else {
        warn!(%route_id, rows, failed_waypoints, "route added with missing waypoints");
    }
}

#[cfg(test)]
mod tests;
