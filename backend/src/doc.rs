//! OpenAPI document for the HTTP surface.
//!
//! Served through Swagger UI in debug builds and printed by the
//! `openapi-dump` binary.

use utoipa::OpenApi;

use crate::domain::{Error, ErrorCode, Route, User, Waypoint};
use crate::inbound::http::routes::RenameRouteRequest;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Route ledger API",
        description = "Reads users and routes from the store; route edits are queued as commands."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::users::get_user,
        crate::inbound::http::routes::list_routes,
        crate::inbound::http::routes::rename_route,
        crate::inbound::http::routes::delete_route,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(User, Route, Waypoint, RenameRouteRequest, Error, ErrorCode)),
    tags(
        (name = "users", description = "User lookups"),
        (name = "routes", description = "Route listings and queued route edits"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
