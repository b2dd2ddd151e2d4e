//! In-memory route store mirroring the PostgreSQL constraints.
//!
//! Uniqueness of user tokens and external ids, foreign keys from routes to
//! users and from waypoints to routes, and cascading route deletes all
//! behave as the migrations define them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{RouteStorePersistenceError, RouteStoreRepository, UserInsertOutcome};
use crate::domain::{
    ExternalUserId, NewRoute, NewUser, NewWaypoint, PublicToken, RouteAuthorization, RouteId,
    RouteLimit, RouteName, RouteRecord, User, UserId, WaypointId, WaypointRecord,
};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    routes: Vec<RouteRecord>,
    waypoints: Vec<WaypointRecord>,
    next_user_id: i64,
    next_route_id: i32,
    next_waypoint_id: i32,
}

impl Tables {
    fn owner_of(&self, route: &RouteRecord) -> Option<&User> {
        self.users.iter().find(|user| user.id() == route.user_id)
    }

    fn matching_routes(&self, authorization: &RouteAuthorization) -> Vec<RouteId> {
        self.routes
            .iter()
            .filter(|route| {
                self.owner_of(route).is_some_and(|owner| {
                    authorization.permits(route.id, owner.id(), owner.token())
                })
            })
            .map(|route| route.id)
            .collect()
    }

    fn user_ids_for(&self, token: &PublicToken) -> Vec<UserId> {
        self.users
            .iter()
            .filter(|user| user.token() == token)
            .map(User::id)
            .collect()
    }
}

/// Route store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryRouteStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl InMemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a connection error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of all stored routes, in insertion order.
    pub fn routes(&self) -> Result<Vec<RouteRecord>, RouteStorePersistenceError> {
        Ok(self.tables()?.routes.clone())
    }

    /// Snapshot of all stored waypoints, in insertion order.
    pub fn waypoints(&self) -> Result<Vec<WaypointRecord>, RouteStorePersistenceError> {
        Ok(self.tables()?.waypoints.clone())
    }

    /// Snapshot of all stored users, in insertion order.
    pub fn users(&self) -> Result<Vec<User>, RouteStorePersistenceError> {
        Ok(self.tables()?.users.clone())
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RouteStorePersistenceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RouteStorePersistenceError::connection(
                "in-memory store marked unavailable",
            ));
        }
        self.tables
            .lock()
            .map_err(|_| RouteStorePersistenceError::connection("in-memory store lock poisoned"))
    }
}

#[async_trait]
impl RouteStoreRepository for InMemoryRouteStore {
    async fn insert_user(
        &self,
        user: &NewUser,
    ) -> Result<UserInsertOutcome, RouteStorePersistenceError> {
        let mut tables = self.tables()?;
        let conflict = tables
            .users
            .iter()
            .any(|existing| existing.external_id() == user.external_id || *existing.token() == user.token);
        if conflict {
            return Ok(UserInsertOutcome::AlreadyExists);
        }

        tables.next_user_id += 1;
        let id = UserId::new(tables.next_user_id);
        tables.users.push(User::new(
            id,
            user.token.clone(),
            user.external_id,
            user.user_name.clone(),
            user.registered_at,
        ));
        Ok(UserInsertOutcome::Created(id))
    }

    async fn insert_route(&self, route: &NewRoute) -> Result<RouteId, RouteStorePersistenceError> {
        let mut tables = self.tables()?;
        if !tables.users.iter().any(|user| user.id() == route.user_id) {
            return Err(RouteStorePersistenceError::query(format!(
                "routes.user_id {} violates foreign key",
                route.user_id
            )));
        }

        tables.next_route_id += 1;
        let id = RouteId::new(tables.next_route_id);
        tables.routes.push(RouteRecord {
            id,
            user_id: route.user_id,
            name: route.name.clone(),
            uploaded_at: route.uploaded_at,
        });
        Ok(id)
    }

    async fn insert_waypoint(
        &self,
        waypoint: &NewWaypoint,
    ) -> Result<WaypointId, RouteStorePersistenceError> {
        let mut tables = self.tables()?;
        if !tables.routes.iter().any(|route| route.id == waypoint.route_id) {
            return Err(RouteStorePersistenceError::query(format!(
                "waypoints.route_id {} violates foreign key",
                waypoint.route_id
            )));
        }

        tables.next_waypoint_id += 1;
        let id = WaypointId::new(tables.next_waypoint_id);
        tables.waypoints.push(WaypointRecord {
            id,
            route_id: waypoint.route_id,
            name: waypoint.name.clone(),
            latitude: waypoint.latitude,
            longitude: waypoint.longitude,
            order_index: waypoint.order_index,
        });
        Ok(id)
    }

    async fn delete_route(
        &self,
        authorization: &RouteAuthorization,
    ) -> Result<u64, RouteStorePersistenceError> {
        let mut tables = self.tables()?;
        let doomed = tables.matching_routes(authorization);
        tables.routes.retain(|route| !doomed.contains(&route.id));
        tables
            .waypoints
            .retain(|waypoint| !doomed.contains(&waypoint.route_id));
        Ok(doomed.len() as u64)
    }

    async fn rename_route(
        &self,
        authorization: &RouteAuthorization,
        name: &RouteName,
    ) -> Result<u64, RouteStorePersistenceError> {
        let mut tables = self.tables()?;
        let targets = tables.matching_routes(authorization);
        for route in tables
            .routes
            .iter_mut()
            .filter(|route| targets.contains(&route.id))
        {
            route.name = name.clone();
        }
        Ok(targets.len() as u64)
    }

    async fn find_user_by_external_id(
        &self,
        external_id: ExternalUserId,
    ) -> Result<Option<User>, RouteStorePersistenceError> {
        let tables = self.tables()?;
        Ok(tables
            .users
            .iter()
            .find(|user| user.external_id() == external_id)
            .cloned())
    }

    async fn list_routes(
        &self,
        token: &PublicToken,
        limit: Option<RouteLimit>,
    ) -> Result<Vec<RouteRecord>, RouteStorePersistenceError> {
        let tables = self.tables()?;
        let owners = tables.user_ids_for(token);
        let mut routes: Vec<RouteRecord> = tables
            .routes
            .iter()
            .filter(|route| owners.contains(&route.user_id))
            .cloned()
            .collect();
        routes.sort_by(|left, right| {
            right
                .uploaded_at
                .cmp(&left.uploaded_at)
                .then(right.id.cmp(&left.id))
        });
        if let Some(limit) = limit {
            routes.truncate(usize::try_from(limit.get()).unwrap_or(usize::MAX));
        }
        Ok(routes)
    }

    async fn list_waypoints(
        &self,
        token: &PublicToken,
    ) -> Result<Vec<WaypointRecord>, RouteStorePersistenceError> {
        let tables = self.tables()?;
        let owners = tables.user_ids_for(token);
        let owned_routes: Vec<RouteId> = tables
            .routes
            .iter()
            .filter(|route| owners.contains(&route.user_id))
            .map(|route| route.id)
            .collect();
        let mut waypoints: Vec<WaypointRecord> = tables
            .waypoints
            .iter()
            .filter(|waypoint| owned_routes.contains(&waypoint.route_id))
            .cloned()
            .collect();
        waypoints.sort_by_key(|waypoint| (waypoint.route_id, waypoint.order_index, waypoint.id));
        Ok(waypoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderIndex, UserName, WaypointName};
    use chrono::{Duration, TimeZone, Utc};
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> InMemoryRouteStore {
        InMemoryRouteStore::new()
    }

    fn new_user(external_id: i64, token: &str) -> NewUser {
        NewUser {
            external_id: ExternalUserId::new(external_id),
            token: PublicToken::new(token).expect("token"),
            user_name: UserName::new("Ann").expect("name"),
            registered_at: Utc::now(),
        }
    }

    fn new_route(user_id: UserId, name: &str, minutes: i64) -> NewRoute {
        let base = Utc
            .with_ymd_and_hms(2025, 3, 1, 0, 0, 0)
            .single()
            .expect("timestamp");
        NewRoute {
            user_id,
            name: RouteName::new(name).expect("name"),
            uploaded_at: base + Duration::minutes(minutes),
        }
    }

    fn new_waypoint(route_id: RouteId, order: i32) -> NewWaypoint {
        NewWaypoint {
            route_id,
            name: WaypointName::new(format!("wp-{order}")).expect("name"),
            latitude: 1.0,
            longitude: 2.0,
            order_index: OrderIndex::new(order),
        }
    }

    async fn created(store: &InMemoryRouteStore, external_id: i64, token: &str) -> UserId {
        match store
            .insert_user(&new_user(external_id, token))
            .await
            .expect("insert user")
        {
            UserInsertOutcome::Created(id) => id,
            UserInsertOutcome::AlreadyExists => panic!("user {external_id} already exists"),
        }
    }

    #[rstest]
    #[case(555, "other")]
    #[case(777, "tok01")]
    #[tokio::test]
    async fn user_conflicts_are_ignored(
        store: InMemoryRouteStore,
        #[case] external_id: i64,
        #[case] token: &str,
    ) {
        created(&store, 555, "tok01").await;

        let outcome = store
            .insert_user(&new_user(external_id, token))
            .await
            .expect("insert");

        assert_eq!(outcome, UserInsertOutcome::AlreadyExists);
        assert_eq!(store.users().expect("users").len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn route_insert_requires_existing_user(store: InMemoryRouteStore) {
        let result = store.insert_route(&new_route(UserId::new(42), "Loop", 0)).await;
        assert!(matches!(
            result,
            Err(RouteStorePersistenceError::Query { .. })
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn delete_cascades_to_waypoints(store: InMemoryRouteStore) {
        let user = created(&store, 555, "tok01").await;
        let route = store
            .insert_route(&new_route(user, "Loop", 0))
            .await
            .expect("route");
        store
            .insert_waypoint(&new_waypoint(route, 0))
            .await
            .expect("waypoint");

        let auth = RouteAuthorization::by_token(PublicToken::new("tok01").expect("token"), route);
        assert_eq!(store.delete_route(&auth).await.expect("delete"), 1);
        assert_eq!(store.delete_route(&auth).await.expect("delete"), 0);
        assert!(store.waypoints().expect("waypoints").is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn mutations_ignore_routes_of_other_users(store: InMemoryRouteStore) {
        let owner = created(&store, 555, "tok01").await;
        created(&store, 777, "tok02").await;
        let route = store
            .insert_route(&new_route(owner, "Loop", 0))
            .await
            .expect("route");

        let intruder = RouteAuthorization::by_token(PublicToken::new("tok02").expect("token"), route);
        let rename = RouteName::new("Hijacked").expect("name");

        assert_eq!(store.rename_route(&intruder, &rename).await.expect("rename"), 0);
        assert_eq!(store.delete_route(&intruder).await.expect("delete"), 0);
        assert_eq!(store.routes().expect("routes")[0].name.as_ref(), "Loop");
    }

    #[rstest]
    #[tokio::test]
    async fn list_routes_is_newest_first_and_limited(store: InMemoryRouteStore) {
        let user = created(&store, 555, "tok01").await;
        for (name, minutes) in [("first", 0), ("second", 10), ("third", 5)] {
            store
                .insert_route(&new_route(user, name, minutes))
                .await
                .expect("route");
        }
        let token = PublicToken::new("tok01").expect("token");

        let all = store.list_routes(&token, None).await.expect("list");
        let names: Vec<&str> = all.iter().map(|route| route.name.as_ref()).collect();
        assert_eq!(names, vec!["second", "third", "first"]);

        let limited = store
            .list_routes(&token, RouteLimit::from_query(Some(1)))
            .await
            .expect("list");
        assert_eq!(limited.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn unavailable_store_fails_with_connection_error(store: InMemoryRouteStore) {
        store.set_unavailable(true);
        let result = store.find_user_by_external_id(ExternalUserId::new(1)).await;
        assert!(matches!(
            result,
            Err(RouteStorePersistenceError::Connection { .. })
        ));
    }
}
