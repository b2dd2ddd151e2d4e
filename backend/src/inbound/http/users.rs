//! User read endpoint.
//!
//! ```text
//! GET /user-store/users/{externalId}
//! ```

use actix_web::{get, web};

use crate::domain::{Error, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_external_id;

/// Fetch a user by the upstream platform id.
#[utoipa::path(
    get,
    path = "/user-store/users/{externalId}",
    params(("externalId" = i64, Path, description = "Upstream platform user id")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Unknown user", body = Error),
        (status = 503, description = "Store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/user-store/users/{external_id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<User>> {
    let external_id = parse_external_id(&path.into_inner())?;
    let user = state.catalog.get_user(external_id).await?;
    Ok(web::Json(user))
}
