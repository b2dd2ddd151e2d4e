//! Route read and write endpoints.
//!
//! ```text
//! GET    /route-store/users/{token}/routes?limit=N
//! PUT    /route-store/users/{token}/routes/{routeId}   {"routeName": "..."}
//! DELETE /route-store/users/{token}/routes/{routeId}
//! ```
//!
//! Writes are published to the command broker and answered immediately; the
//! outcome is only visible through later reads.

use actix_web::{HttpResponse, delete, get, put, web};
use serde::Deserialize;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Command, DeleteRoute, Error, RenameRouteByToken, Route, RouteLimit};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_route_id, parse_route_name, parse_token};

/// Query parameters for the route listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
pub struct ListRoutesQuery {
    /// Maximum number of routes; zero or absent returns every route.
    pub limit: Option<u32>,
}

/// Request body for renaming a route.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RenameRouteRequest {
    #[schema(example = "Evening Loop")]
    pub route_name: String,
}

/// List a user's routes, newest first, with their ordered waypoints.
#[utoipa::path(
    get,
    path = "/route-store/users/{token}/routes",
    params(
        ("token" = String, Path, description = "Public token of the route owner"),
        ListRoutesQuery
    ),
    responses(
        (status = 200, description = "Routes", body = [Route]),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "No routes for this token", body = Error),
        (status = 503, description = "Store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["routes"],
    operation_id = "listRoutes"
)]
#[get("/route-store/users/{token}/routes")]
pub async fn list_routes(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<ListRoutesQuery>,
) -> ApiResult<web::Json<Vec<Route>>> {
    let token = parse_token(&path.into_inner())?;
    let limit = RouteLimit::from_query(query.into_inner().limit);
    let routes = state.catalog.list_routes(&token, limit).await?;
    if routes.is_empty() {
        return Err(Error::not_found(format!("no routes for token {token}")));
    }
    Ok(web::Json(routes))
}

/// Publish a rename for a route owned by the token holder.
#[utoipa::path(
    put,
    path = "/route-store/users/{token}/routes/{routeId}",
    params(
        ("token" = String, Path, description = "Public token of the route owner"),
        ("routeId" = i32, Path, description = "Route id")
    ),
    request_body = RenameRouteRequest,
    responses(
        (status = 200, description = "Rename accepted"),
        (status = 400, description = "Invalid request", body = Error)
    ),
    tags = ["routes"],
    operation_id = "renameRoute"
)]
#[put("/route-store/users/{token}/routes/{route_id}")]
pub async fn rename_route(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
    payload: web::Json<RenameRouteRequest>,
) -> ApiResult<HttpResponse> {
    let (raw_token, raw_route_id) = path.into_inner();
    let token = parse_token(&raw_token)?;
    let route_id = parse_route_id(&raw_route_id)?;
    let route_name = parse_route_name(&payload.into_inner().route_name)?;

    let command = Command::RenameRouteByToken(RenameRouteByToken {
        token,
        route_id,
        route_name,
    });
    state.commands.send(&command).await;
    debug!(%route_id, "rename-route-token published");
    Ok(HttpResponse::Ok().finish())
}

/// Publish a delete for a route owned by the token holder.
#[utoipa::path(
    delete,
    path = "/route-store/users/{token}/routes/{routeId}",
    params(
        ("token" = String, Path, description = "Public token of the route owner"),
        ("routeId" = i32, Path, description = "Route id")
    ),
    responses(
        (status = 200, description = "Delete accepted"),
        (status = 400, description = "Invalid request", body = Error)
    ),
    tags = ["routes"],
    operation_id = "deleteRoute"
)]
#[delete("/route-store/users/{token}/routes/{route_id}")]
pub async fn delete_route(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (raw_token, raw_route_id) = path.into_inner();
    let token = parse_token(&raw_token)?;
    let route_id = parse_route_id(&raw_route_id)?;

    let command = Command::DeleteRoute(DeleteRoute { token, route_id });
    state.commands.send(&command).await;
    debug!(%route_id, "delete-route published");
    Ok(HttpResponse::Ok().finish())
}
