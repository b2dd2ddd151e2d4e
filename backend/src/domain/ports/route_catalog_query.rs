//! Driving port for read requests.
//!
//! Reads bypass the broker and go straight to the store, so a write accepted
//! a moment ago may not be visible yet.

use async_trait::async_trait;

use crate::domain::{Error, ExternalUserId, PublicToken, Route, RouteLimit, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteCatalogQuery: Send + Sync {
    /// Fetch a user by upstream platform id.
    async fn get_user(&self, external_id: ExternalUserId) -> Result<User, Error>;

    /// List the token owner's routes with their waypoints, newest first.
    async fn list_routes(
        &self,
        token: &PublicToken,
        limit: Option<RouteLimit>,
    ) -> Result<Vec<Route>, Error>;
}

/// Query that knows no users and no routes.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRouteCatalogQuery;

#[async_trait]
impl RouteCatalogQuery for FixtureRouteCatalogQuery {
    async fn get_user(&self, external_id: ExternalUserId) -> Result<User, Error> {
        Err(Error::not_found(format!("user {external_id} not found")))
    }

    async fn list_routes(
        &self,
        _token: &PublicToken,
        _limit: Option<RouteLimit>,
    ) -> Result<Vec<Route>, Error> {
        Ok(Vec::new())
    }
}
