//! Ownership predicates carried by route mutations.
//!
//! Commands never perform a separate lookup before mutating. Instead each
//! rename or delete carries a [`RouteAuthorization`] that the store folds into
//! the mutation statement itself, so a command for someone else's route
//! matches zero rows and succeeds silently.

use super::route::RouteId;
use super::user::{PublicToken, UserId};

/// How a mutation proves that the caller owns the target route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAuthorization {
    /// Internal user id supplied by a trusted producer.
    ByOwner { user_id: UserId, route_id: RouteId },
    /// Public token resolved to its user inside the statement.
    ByToken {
        token: PublicToken,
        route_id: RouteId,
    },
}

impl RouteAuthorization {
    pub fn by_owner(user_id: UserId, route_id: RouteId) -> Self {
        Self::ByOwner { user_id, route_id }
    }

    pub fn by_token(token: PublicToken, route_id: RouteId) -> Self {
        Self::ByToken { token, route_id }
    }

    /// Route targeted by the mutation.
    pub fn route_id(&self) -> RouteId {
        match self {
            Self::ByOwner { route_id, .. } | Self::ByToken { route_id, .. } => *route_id,
        }
    }

    /// Whether a stored route satisfies the predicate.
    ///
    /// `owner` and `owner_token` describe the user who owns `route_id`.
    pub fn permits(&self, route_id: RouteId, owner: UserId, owner_token: &PublicToken) -> bool {
        if self.route_id() != route_id {
            return false;
        }
        match self {
            Self::ByOwner { user_id, .. } => *user_id == owner,
            Self::ByToken { token, .. } => token == owner_token,
        }
    }
}
